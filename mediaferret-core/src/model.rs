use mediaferret_engine::{FileEntry, ThumbnailConnection};
use serde::{Deserialize, Serialize};

/// Units accepted by the size filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeUnit {
    KB,
    MB,
}

/// One bound of a size filter, e.g. `{"size": 500, "unit": "KB"}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FileSizeFilter {
    pub size: f64,
    pub unit: SizeUnit,
}

impl FileSizeFilter {
    pub fn bytes(&self) -> u64 {
        let multiplier = match self.unit {
            SizeUnit::KB => 1024.0,
            SizeUnit::MB => 1024.0 * 1024.0,
        };
        (self.size * multiplier) as u64
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeFilters {
    #[serde(default)]
    pub min_size: Option<FileSizeFilter>,
    #[serde(default)]
    pub max_size: Option<FileSizeFilter>,
}

/// A crawl request as callers submit it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlRequest {
    pub website: String,
    /// Extensions to collect, without dots (e.g. `["pdf", "mp4"]`).
    pub extensions: Vec<String>,
    #[serde(default)]
    pub crawl_depth: usize,
    #[serde(default)]
    pub size_filters: Option<SizeFilters>,
}

impl CrawlRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.website.trim().is_empty() {
            return Err("Website URL is required".to_string());
        }
        if self.extensions.is_empty() {
            return Err("At least one file extension is required".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlInfo {
    pub pages_visited: usize,
    /// Milliseconds.
    pub duration: u128,
    pub base_url: String,
}

/// What a crawl returns to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlResponse {
    pub files: Vec<FileEntry>,
    pub thumbnail_connections: Vec<ThumbnailConnection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crawl_info: Option<CrawlInfo>,
}
