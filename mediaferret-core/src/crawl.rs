use crate::model::{CrawlInfo, CrawlResponse, SizeFilters};
use mediaferret_engine::{Crawler, FileEntry};
use std::time::Duration;
use url::Url;

/// Options for configuring a crawl operation
pub struct CrawlOptions {
    pub url: String,
    pub extensions: Vec<String>,
    pub crawl_depth: usize,
    pub workers: usize,
    pub deadline_secs: u64,
    pub size_filters: Option<SizeFilters>,
}

impl CrawlOptions {
    pub fn new(url: String, extensions: Vec<String>) -> Self {
        Self {
            url,
            extensions,
            crawl_depth: 0,
            workers: 8,
            deadline_secs: 120,
            size_filters: None,
        }
    }
}

/// Callback for reporting crawl progress (worker id, current URL)
pub use mediaferret_engine::crawler::ProgressCallback as CrawlProgressCallback;

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Execute a crawl with the given options and return the caller-facing
/// response. Size filters are applied here, after enrichment — the engine
/// itself never enforces them.
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<CrawlResponse, String> {
    let CrawlOptions {
        url,
        extensions,
        crawl_depth,
        workers,
        deadline_secs,
        size_filters,
    } = options;

    let mut crawler = Crawler::new()
        .with_crawl_depth(crawl_depth)
        .with_workers(workers)
        .with_deadline(Duration::from_secs(deadline_secs));
    if let Some(callback) = progress_callback {
        crawler = crawler.with_progress_callback(callback);
    }

    let outcome = crawler
        .crawl(&url, &extensions)
        .await
        .map_err(|e| format!("Crawl failed: {}", e))?;

    let files = apply_size_filters(outcome.files, size_filters.as_ref());

    Ok(CrawlResponse {
        files,
        thumbnail_connections: outcome.thumbnail_connections,
        crawl_info: Some(CrawlInfo {
            pages_visited: outcome.pages_visited,
            duration: outcome.duration.as_millis(),
            base_url: url,
        }),
    })
}

/// Drop entries outside the requested size window. Entries whose size
/// probe failed (size 0) are kept — there is nothing to judge them by.
pub fn apply_size_filters(files: Vec<FileEntry>, filters: Option<&SizeFilters>) -> Vec<FileEntry> {
    let Some(filters) = filters else {
        return files;
    };

    files
        .into_iter()
        .filter(|file| {
            if file.size == 0 {
                return true;
            }
            if let Some(min) = &filters.min_size
                && file.size < min.bytes()
            {
                return false;
            }
            if let Some(max) = &filters.max_size
                && file.size > max.bytes()
            {
                return false;
            }
            true
        })
        .collect()
}
