// Report generation from crawl responses

use crate::model::CrawlResponse;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "csv" => Some(ReportFormat::Csv),
            _ => None,
        }
    }
}

pub fn generate_report(response: &CrawlResponse, format: &ReportFormat) -> Result<String, String> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(response)),
        ReportFormat::Json => serde_json::to_string_pretty(response)
            .map_err(|e| format!("Failed to serialize report: {}", e)),
        ReportFormat::Csv => Ok(generate_csv_report(response)),
    }
}

pub fn save_report(
    response: &CrawlResponse,
    format: &ReportFormat,
    path: &Path,
) -> Result<(), String> {
    let content = generate_report(response, format)?;
    let mut file =
        File::create(path).map_err(|e| format!("Failed to create {}: {}", path.display(), e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
    Ok(())
}

fn host_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}

fn generate_text_report(response: &CrawlResponse) -> String {
    let mut report = String::new();

    report.push_str("\n═══════════════════════════════════════════════════════════════\n");
    report.push_str("                      CRAWL RESULTS\n");
    report.push_str("═══════════════════════════════════════════════════════════════\n\n");

    report.push_str(&format!(
        "Generated: {}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    if let Some(info) = &response.crawl_info {
        report.push_str(&format!("Seed URL:  {}\n", info.base_url));
        report.push_str(&format!("Pages visited: {}\n", info.pages_visited));
        report.push_str(&format!("Duration: {} ms\n", info.duration));
    }
    report.push_str(&format!("Files found: {}\n\n", response.files.len()));

    // Count by type
    let mut by_type: HashMap<&str, usize> = HashMap::new();
    for file in &response.files {
        *by_type.entry(file.file_type.as_str()).or_default() += 1;
    }
    let mut type_counts: Vec<(&str, usize)> = by_type.into_iter().collect();
    type_counts.sort();
    for (file_type, count) in type_counts {
        report.push_str(&format!("  .{}: {}\n", file_type, count));
    }

    // Group files by host
    let mut by_host: HashMap<String, Vec<&mediaferret_engine::FileEntry>> = HashMap::new();
    for file in &response.files {
        by_host.entry(host_of(&file.url)).or_default().push(file);
    }
    let mut hosts: Vec<&String> = by_host.keys().collect();
    hosts.sort();

    for host in hosts {
        report.push_str(&format!("\n  {}\n", host));
        report.push_str(&format!("  {}\n", "─".repeat(host.len())));
        for file in &by_host[host] {
            let size = file.formatted_size.as_deref().unwrap_or("Unknown");
            report.push_str(&format!("    {} ({})", file.file_name, size));
            if file.is_embedded {
                report.push_str(" [embedded]");
            }
            report.push('\n');
            report.push_str(&format!("      {}\n", file.url));
        }
    }

    if !response.thumbnail_connections.is_empty() {
        report.push_str(&format!(
            "\nThumbnail connections: {}\n",
            response.thumbnail_connections.len()
        ));
        report.push_str("───────────────────────────────────────────────────────────────\n");
        for edge in &response.thumbnail_connections {
            report.push_str(&format!("  {} -> {}\n", edge.thumbnail, edge.content));
        }
    }

    report.push_str("\n═══════════════════════════════════════════════════════════════\n");
    report
}

fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn generate_csv_report(response: &CrawlResponse) -> String {
    let mut csv = String::from("url,fileName,fileType,sourceUrl,thumbnailUrl,size,formattedSize\n");
    for file in &response.files {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            csv_escape(&file.url),
            csv_escape(&file.file_name),
            csv_escape(&file.file_type),
            csv_escape(&file.source_url),
            csv_escape(file.thumbnail_url.as_deref().unwrap_or("")),
            file.size,
            csv_escape(file.formatted_size.as_deref().unwrap_or("Unknown")),
        ));
    }
    csv
}
