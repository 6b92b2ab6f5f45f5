pub mod crawler;
pub mod entry;
pub mod error;
pub mod extract;
pub mod probe;
pub mod profile;

pub use crawler::Crawler;
pub use entry::{CrawlOutcome, FileEntry, ThumbnailConnection};
pub use error::CrawlError;
pub use profile::SiteProfile;
