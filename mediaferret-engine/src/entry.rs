use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A downloadable file discovered during traversal.
///
/// Identity is the `url` field: the engine never holds two entries with the
/// same URL. Size fields stay at their sentinel values (`0` / `None`) until
/// the enrichment pass fills them in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub url: String,
    pub file_name: String,
    /// Extension without the dot, lower-cased. `"embedded"` for player and
    /// iframe sources that matched no requested extension.
    pub file_type: String,
    /// Page the file was found on.
    pub source_url: String,
    /// Preview image or link that led traversal here, if any.
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub is_embedded: bool,
    /// Bytes; 0 means unknown.
    #[serde(default)]
    pub size: u64,
    pub formatted_size: Option<String>,
    #[serde(default)]
    pub related_files: Vec<RelatedFile>,
}

impl FileEntry {
    pub fn new(url: String, file_name: String, file_type: String, source_url: String) -> Self {
        Self {
            url,
            file_name,
            file_type,
            source_url,
            thumbnail_url: None,
            is_embedded: false,
            size: 0,
            formatted_size: None,
            related_files: Vec::new(),
        }
    }

    pub fn with_thumbnail(mut self, thumbnail_url: Option<String>) -> Self {
        self.thumbnail_url = thumbnail_url;
        self
    }

    pub fn embedded(mut self) -> Self {
        self.is_embedded = true;
        self
    }
}

/// A secondary resource attached to a file entry, e.g. its thumbnail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedFile {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
}

/// Edge recording that a thumbnail led traversal to a piece of content.
/// One thumbnail may map to several content URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailConnection {
    pub thumbnail: String,
    pub content: String,
}

/// Everything one crawl invocation produced.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub files: Vec<FileEntry>,
    pub thumbnail_connections: Vec<ThumbnailConnection>,
    pub pages_visited: usize,
    pub duration: Duration,
}

const SIZE_UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Format a byte count with the largest unit whose value is >= 1, two
/// decimal places with trailing zeros trimmed. Zero formats as "Unknown"
/// since a failed size probe leaves the sentinel behind.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "Unknown".to_string();
    }

    let mut value = bytes as f64;
    let mut exponent = 0;
    while value >= 1024.0 && exponent < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        exponent += 1;
    }

    let mut formatted = format!("{:.2}", value);
    if formatted.contains('.') {
        formatted = formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string();
    }

    format!("{} {}", formatted, SIZE_UNITS[exponent])
}
