use crate::entry::{FileEntry, RelatedFile, format_file_size};
use crate::extract::extension_from_path;
use crate::profile::SiteProfile;
use futures::future::join_all;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info};
use url::Url;

/// Hard cap on the result set; checked before every speculative probe.
pub const MAX_FOUND_FILES: usize = 100;

/// Existence probes are throwaway guesses; keep them short.
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Size probes hit real files and get a little longer.
const SIZE_TIMEOUT: Duration = Duration::from_secs(5);

/// Probe synthesized CDN URLs for a site family after traversal finished.
///
/// Only runs when the seed URL carries an extractable album identifier.
/// Each candidate gets one HEAD request; any status below 400 counts as
/// existing and yields a file entry with a generated name. Failures are
/// dropped without retry or logging noise.
pub async fn speculative_probe(
    client: &Client,
    profile: &SiteProfile,
    seed: &str,
    extensions: &[String],
    found: &Arc<Mutex<Vec<FileEntry>>>,
    concurrency: usize,
) {
    let Some(album_id) = profile.album_id(seed) else {
        return;
    };

    let candidates = profile.probe_candidates(&album_id, extensions);
    info!(
        "Probing {} speculative {} CDN URLs for album {}",
        candidates.len(),
        profile.name,
        album_id
    );

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let profile_name = profile.name;
    let mut tasks = Vec::new();

    for candidate in candidates {
        let client = client.clone();
        let found = found.clone();
        let semaphore = semaphore.clone();
        let seed = seed.to_string();
        let album_id = album_id.clone();

        tasks.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();

            // Cap is checked before the probe goes out, not after.
            if found.lock().await.len() >= MAX_FOUND_FILES {
                return;
            }

            if !probe_exists(&client, &candidate, &seed).await {
                return;
            }
            debug!("Speculative probe hit: {}", candidate);

            let extension = Url::parse(&candidate)
                .ok()
                .and_then(|u| extension_from_path(u.path()))
                .unwrap_or_default();
            let file_name = format!("{}_{}.{}", profile_name, album_id, extension);

            let mut found = found.lock().await;
            if found.len() < MAX_FOUND_FILES && !found.iter().any(|f| f.url == candidate) {
                found.push(FileEntry::new(candidate, file_name, extension, seed));
            }
        }));
    }

    let _ = join_all(tasks).await;
}

/// HEAD-style existence check. Any status below 400 counts.
async fn probe_exists(client: &Client, url: &str, referer: &str) -> bool {
    match client
        .head(url)
        .header("Referer", referer)
        .timeout(PROBE_TIMEOUT)
        .send()
        .await
    {
        Ok(response) => response.status().as_u16() < 400,
        Err(_) => false,
    }
}

/// Resolve byte sizes for every discovered file, concurrently, with
/// independent failure isolation: a failed probe leaves that one entry at
/// size 0 / "Unknown" and never aborts the rest.
pub async fn resolve_sizes(client: &Client, files: &mut [FileEntry], concurrency: usize) {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = Vec::new();

    for (index, file) in files.iter().enumerate() {
        let client = client.clone();
        let url = file.url.clone();
        let semaphore = semaphore.clone();

        tasks.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            (index, fetch_size(&client, &url).await)
        }));
    }

    for task in join_all(tasks).await {
        if let Ok((index, size)) = task {
            let file = &mut files[index];
            file.size = size;
            file.formatted_size = Some(format_file_size(size));
            if let Some(thumbnail) = &file.thumbnail_url {
                file.related_files = vec![RelatedFile {
                    kind: "thumbnail".to_string(),
                    url: thumbnail.clone(),
                }];
            }
        }
    }
}

/// Content-Length from a HEAD request, 0 when unavailable or on any error.
async fn fetch_size(client: &Client, url: &str) -> u64 {
    match client.head(url).timeout(SIZE_TIMEOUT).send().await {
        Ok(response) if response.status().is_success() => response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok())
            .unwrap_or(0),
        Ok(response) => {
            debug!("Size probe for {} returned {}", url, response.status());
            0
        }
        Err(e) => {
            debug!("Size probe failed for {}: {}", url, e);
            0
        }
    }
}
