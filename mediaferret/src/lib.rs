// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{parse_extension_list, parse_seed_url, parse_size_filter};

// Re-export crawl functionality from mediaferret-core
pub use mediaferret_core::crawl::{
    CrawlOptions, CrawlProgressCallback, execute_crawl, extract_url_path,
};
