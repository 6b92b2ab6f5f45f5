// Tests for the request/response model

use mediaferret_core::model::{CrawlRequest, CrawlResponse, FileSizeFilter, SizeFilters, SizeUnit};

// ============================================================================
// Request Validation Tests
// ============================================================================

#[test]
fn test_validate_accepts_complete_request() {
    let request = CrawlRequest {
        website: "https://example.com".to_string(),
        extensions: vec!["pdf".to_string()],
        crawl_depth: 2,
        size_filters: None,
    };
    assert!(request.validate().is_ok());
}

#[test]
fn test_validate_rejects_missing_website() {
    let request = CrawlRequest {
        website: "  ".to_string(),
        extensions: vec!["pdf".to_string()],
        crawl_depth: 0,
        size_filters: None,
    };
    let err = request.validate().unwrap_err();
    assert!(err.contains("Website URL is required"));
}

#[test]
fn test_validate_rejects_empty_extensions() {
    let request = CrawlRequest {
        website: "https://example.com".to_string(),
        extensions: vec![],
        crawl_depth: 0,
        size_filters: None,
    };
    let err = request.validate().unwrap_err();
    assert!(err.contains("At least one file extension"));
}

// ============================================================================
// Size Filter Math Tests
// ============================================================================

#[test]
fn test_filter_bytes_kb() {
    let filter = FileSizeFilter {
        size: 500.0,
        unit: SizeUnit::KB,
    };
    assert_eq!(filter.bytes(), 500 * 1024);
}

#[test]
fn test_filter_bytes_mb() {
    let filter = FileSizeFilter {
        size: 2.0,
        unit: SizeUnit::MB,
    };
    assert_eq!(filter.bytes(), 2 * 1024 * 1024);
}

#[test]
fn test_filter_bytes_fractional() {
    let filter = FileSizeFilter {
        size: 1.5,
        unit: SizeUnit::MB,
    };
    assert_eq!(filter.bytes(), 1_572_864);
}

// ============================================================================
// Wire Format Tests
// ============================================================================

#[test]
fn test_request_deserializes_camel_case() {
    let json = r#"{
        "website": "https://example.com",
        "extensions": ["pdf", "mp4"],
        "crawlDepth": 2,
        "sizeFilters": {
            "minSize": {"size": 500, "unit": "KB"},
            "maxSize": {"size": 100, "unit": "MB"}
        }
    }"#;

    let request: CrawlRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.website, "https://example.com");
    assert_eq!(request.crawl_depth, 2);
    let filters: SizeFilters = request.size_filters.unwrap();
    assert_eq!(filters.min_size.unwrap().unit, SizeUnit::KB);
    assert_eq!(filters.max_size.unwrap().bytes(), 100 * 1024 * 1024);
}

#[test]
fn test_request_depth_defaults_to_zero() {
    let json = r#"{"website": "https://example.com", "extensions": ["pdf"]}"#;
    let request: CrawlRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.crawl_depth, 0);
    assert!(request.size_filters.is_none());
}

#[test]
fn test_response_serializes_camel_case() {
    let response = CrawlResponse {
        files: vec![],
        thumbnail_connections: vec![],
        crawl_info: Some(mediaferret_core::model::CrawlInfo {
            pages_visited: 3,
            duration: 1500,
            base_url: "https://example.com".to_string(),
        }),
    };

    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains("\"thumbnailConnections\""));
    assert!(json.contains("\"crawlInfo\""));
    assert!(json.contains("\"pagesVisited\""));
}
