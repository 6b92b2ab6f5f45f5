use mediaferret_core::model::{FileSizeFilter, SizeUnit};
use url::Url;

// Helper functions for the crawl handler

/// Parse a comma-separated extension list: trimmed, dots stripped,
/// lower-cased, duplicates removed while keeping first-seen order.
pub fn parse_extension_list(input: &str) -> Result<Vec<String>, String> {
    let mut extensions: Vec<String> = Vec::new();

    for raw in input.split(',') {
        let ext = raw.trim().trim_start_matches('.').to_lowercase();
        if ext.is_empty() {
            continue;
        }
        if !extensions.contains(&ext) {
            extensions.push(ext);
        }
    }

    if extensions.is_empty() {
        return Err(format!("No valid extensions in '{}'", input));
    }
    Ok(extensions)
}

/// Parse a size filter argument such as `500KB` or `2.5MB`.
pub fn parse_size_filter(input: &str) -> Result<FileSizeFilter, String> {
    let trimmed = input.trim();
    let upper = trimmed.to_uppercase();

    let (number_part, unit) = if let Some(number) = upper.strip_suffix("KB") {
        (number, SizeUnit::KB)
    } else if let Some(number) = upper.strip_suffix("MB") {
        (number, SizeUnit::MB)
    } else {
        return Err(format!(
            "Invalid size '{}': expected a number followed by KB or MB",
            input
        ));
    };

    let size: f64 = number_part
        .trim()
        .parse()
        .map_err(|_| format!("Invalid size '{}': '{}' is not a number", input, number_part))?;
    if size <= 0.0 {
        return Err(format!("Invalid size '{}': must be positive", input));
    }

    Ok(FileSizeFilter { size, unit })
}

/// Parse a seed URL, trying to add https:// if the bare form fails.
pub fn parse_seed_url(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if Url::parse(trimmed).is_ok() {
        return Some(trimmed.to_string());
    }

    let with_scheme = format!("https://{}", trimmed);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    None
}
