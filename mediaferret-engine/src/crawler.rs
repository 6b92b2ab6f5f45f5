use crate::entry::{CrawlOutcome, FileEntry, ThumbnailConnection};
use crate::error::{CrawlError, Result};
use crate::extract::{self, FollowLink, LinkPriority};
use crate::probe;
use crate::profile::{DEFAULT_PAGE_TIMEOUT, DEFAULT_USER_AGENT, SiteProfile, profile_for_host};
use reqwest::Client;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// Hard bound on traversal breadth: once this many pages have been visited
/// or scheduled, no further fetches are issued.
pub const MAX_VISITED_PAGES: usize = 100;

/// (url, depth, thumbnail provenance, priority)
type WorkItem = (String, usize, Option<String>, LinkPriority);

/// Depth-bounded concurrent crawler for downloadable media and documents.
///
/// Traversal runs on a fixed pool of worker tasks with per-worker queues;
/// thumbnail-led links jump the queue, keyword-led links go ahead of
/// generic ones. Shared crawl state lives behind mutexes and is reset at
/// the start of every `crawl` call.
pub struct Crawler {
    client: Client,
    visited: Arc<Mutex<HashSet<String>>>,
    found: Arc<Mutex<Vec<FileEntry>>>,
    connections: Arc<Mutex<Vec<ThumbnailConnection>>>,
    crawl_depth: usize,
    workers: usize,
    deadline: Duration,
    profiles: Arc<Vec<SiteProfile>>,
    progress_callback: Option<ProgressCallback>,
}

impl Crawler {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .connect_timeout(Duration::from_secs(5))
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            visited: Arc::new(Mutex::new(HashSet::new())),
            found: Arc::new(Mutex::new(Vec::new())),
            connections: Arc::new(Mutex::new(Vec::new())),
            crawl_depth: 0,
            workers: 8,
            deadline: Duration::from_secs(120),
            profiles: Arc::new(SiteProfile::builtin()),
            progress_callback: None,
        }
    }

    /// Maximum link hops from the seed page; the seed itself is depth 0.
    pub fn with_crawl_depth(mut self, depth: usize) -> Self {
        self.crawl_depth = depth;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Overall wall-clock budget for the traversal phase.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Crawl from `website` collecting files with the requested extensions.
    ///
    /// Only a malformed seed URL or a panicked worker is fatal; every
    /// failure inside traversal is logged and recovered, so the crawl
    /// always returns whatever it found.
    pub async fn crawl(&self, website: &str, extensions: &[String]) -> Result<CrawlOutcome> {
        let started = Instant::now();
        let extensions: Arc<Vec<String>> = Arc::new(
            extensions
                .iter()
                .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
        );

        info!(
            "Starting crawl of {} (depth {}, {} workers, extensions: {:?})",
            website, self.crawl_depth, self.workers, extensions
        );

        Url::parse(website)
            .map_err(|e| CrawlError::InvalidUrl(format!("{}: {}", website, e)))?;

        // One crawl invocation, one state.
        {
            self.visited.lock().await.clear();
            self.found.lock().await.clear();
            self.connections.lock().await.clear();
            self.visited.lock().await.insert(website.to_string());
        }

        // Per-worker queues; new links are distributed round-robin and
        // thumbnail-led links are pushed to the queue front.
        let worker_queues: Arc<Vec<Mutex<VecDeque<WorkItem>>>> = Arc::new(
            (0..self.workers)
                .map(|_| Mutex::new(VecDeque::new()))
                .collect(),
        );
        {
            let mut queue = worker_queues[0].lock().await;
            queue.push_back((website.to_string(), 0, None, LinkPriority::Generic));
        }
        // Items queued or still being processed. Queues alone can look
        // drained while a worker is mid-fetch and about to refill them.
        let pending = Arc::new(AtomicUsize::new(1));

        let deadline_at = started + self.deadline;
        let mut worker_handles = Vec::new();

        for worker_id in 0..self.workers {
            let client = self.client.clone();
            let visited = self.visited.clone();
            let found = self.found.clone();
            let connections = self.connections.clone();
            let extensions = extensions.clone();
            let profiles = self.profiles.clone();
            let progress_cb = self.progress_callback.clone();
            let crawl_depth = self.crawl_depth;
            let worker_queues = worker_queues.clone();
            let pending = pending.clone();

            let handle = tokio::spawn(async move {
                debug!("Worker {} started", worker_id);
                let mut empty_iterations = 0;
                const MAX_EMPTY_ITERATIONS: usize = 10;

                loop {
                    if Instant::now() >= deadline_at {
                        warn!("Worker {} stopping: crawl deadline reached", worker_id);
                        break;
                    }

                    let work_item = {
                        let mut queue = worker_queues[worker_id].lock().await;
                        queue.pop_front()
                    };

                    let Some((url, depth, provenance, _)) = work_item else {
                        // Another worker may be mid-fetch and about to
                        // refill the queues; exit only once nothing is
                        // queued or in flight anywhere.
                        if pending.load(Ordering::SeqCst) == 0 {
                            empty_iterations += 1;
                            if empty_iterations >= MAX_EMPTY_ITERATIONS {
                                debug!("Worker {} exiting", worker_id);
                                break;
                            }
                        } else {
                            empty_iterations = 0;
                        }
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        continue;
                    };
                    empty_iterations = 0;

                    if depth <= crawl_depth {
                        if let Some(ref callback) = progress_cb {
                            callback(worker_id, url.clone());
                        }

                        debug!("Crawling {} (depth {})", url, depth);
                        match Self::fetch_page(&client, &url, &profiles).await {
                            Ok(body) => {
                                let (files, links) = Self::process_page(
                                    &body,
                                    &url,
                                    &extensions,
                                    depth,
                                    crawl_depth,
                                    provenance.as_deref(),
                                    &profiles,
                                );

                                Self::record_files(&found, &connections, files).await;

                                Self::enqueue_links(
                                    &worker_queues,
                                    &visited,
                                    &pending,
                                    links,
                                    depth,
                                )
                                .await;
                            }
                            Err(e) => {
                                // A dead branch yields no files, nothing more.
                                warn!("Fetch failed for {}: {}", url, e);
                            }
                        }
                    }

                    // Counted as in flight until its links are distributed.
                    pending.fetch_sub(1, Ordering::SeqCst);
                }
            });

            worker_handles.push(handle);
        }

        for handle in worker_handles {
            handle.await?;
        }

        // Site-family seeds get one more speculative pass over CDN guesses.
        if let Ok(seed) = Url::parse(website)
            && let Some(host) = seed.host_str()
            && let Some(profile) = profile_for_host(&self.profiles, host)
        {
            probe::speculative_probe(
                &self.client,
                profile,
                website,
                &extensions,
                &self.found,
                self.workers,
            )
            .await;
        }

        let mut files = self.found.lock().await.clone();
        probe::resolve_sizes(&self.client, &mut files, self.workers).await;

        let pages_visited = self.visited.lock().await.len();
        let thumbnail_connections = self.connections.lock().await.clone();
        let duration = started.elapsed();
        info!(
            "Crawl complete: {} files, {} pages, {:.1}s",
            files.len(),
            pages_visited,
            duration.as_secs_f64()
        );

        Ok(CrawlOutcome {
            files,
            thumbnail_connections,
            pages_visited,
            duration,
        })
    }

    /// Fetch one page with the header profile its host calls for.
    async fn fetch_page(client: &Client, url: &str, profiles: &[SiteProfile]) -> Result<String> {
        let host = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();

        let request = match profile_for_host(profiles, &host) {
            Some(profile) => {
                debug!("Using {} header profile for {}", profile.name, host);
                let mut request = client
                    .get(url)
                    .timeout(profile.page_timeout)
                    .header(reqwest::header::USER_AGENT, profile.user_agent);
                for (name, value) in &profile.headers {
                    request = request.header(*name, *value);
                }
                request
            }
            None => client.get(url).timeout(DEFAULT_PAGE_TIMEOUT),
        };

        let response = request.send().await?;
        Ok(response.text().await?)
    }

    /// DOM extraction plus, on matching hosts, the raw-HTML CDN miner.
    /// Synchronous so the parsed document never crosses an await point.
    fn process_page(
        html: &str,
        page_url: &str,
        extensions: &[String],
        depth: usize,
        crawl_depth: usize,
        provenance: Option<&str>,
        profiles: &[SiteProfile],
    ) -> (Vec<FileEntry>, Vec<FollowLink>) {
        let mut extraction =
            extract::extract_page(html, page_url, extensions, depth, crawl_depth, provenance);

        let host = Url::parse(page_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();
        if let Some(profile) = profile_for_host(profiles, &host) {
            for cdn_url in profile.mine_cdn_urls(html, extensions) {
                let Ok(parsed) = Url::parse(&cdn_url) else {
                    continue;
                };
                let Some(file_type) = extract::extension_from_path(parsed.path()) else {
                    continue;
                };
                if !extensions.contains(&file_type) {
                    continue;
                }
                let file_name = extract::file_name_from_path(parsed.path()).unwrap_or_default();
                extraction.files.push(FileEntry::new(
                    cdn_url,
                    file_name,
                    file_type,
                    page_url.to_string(),
                ));
            }
        }

        (extraction.files, extraction.links)
    }

    /// Append new files, deduplicating by URL: the first page to discover a
    /// URL keeps it. Thumbnail provenance becomes a connection edge even
    /// when the file itself was already known.
    async fn record_files(
        found: &Mutex<Vec<FileEntry>>,
        connections: &Mutex<Vec<ThumbnailConnection>>,
        new_files: Vec<FileEntry>,
    ) {
        for file in new_files {
            if let Some(thumbnail) = file.thumbnail_url.clone() {
                let edge = ThumbnailConnection {
                    thumbnail,
                    content: file.url.clone(),
                };
                let mut connections = connections.lock().await;
                if !connections.contains(&edge) {
                    connections.push(edge);
                }
            }

            let mut found = found.lock().await;
            if !found.iter().any(|f| f.url == file.url) {
                debug!("Recorded file: {} ({})", file.file_name, file.file_type);
                found.push(file);
            }
        }
    }

    /// Distribute follow-links round-robin across worker queues, highest
    /// priority first. A URL is marked visited the moment it is queued so
    /// it can never be scheduled twice.
    async fn enqueue_links(
        worker_queues: &Arc<Vec<Mutex<VecDeque<WorkItem>>>>,
        visited: &Mutex<HashSet<String>>,
        pending: &AtomicUsize,
        mut links: Vec<FollowLink>,
        depth: usize,
    ) {
        links.sort_by_key(|link| link.priority);

        let num_workers = worker_queues.len();
        let mut target_worker = 0;

        for link in links {
            let should_queue = {
                let mut visited = visited.lock().await;
                if visited.len() >= MAX_VISITED_PAGES || visited.contains(&link.url) {
                    false
                } else {
                    visited.insert(link.url.clone());
                    true
                }
            };
            if !should_queue {
                continue;
            }

            let priority = link.priority;
            let item = (link.url, depth + 1, link.thumbnail, priority);
            pending.fetch_add(1, Ordering::SeqCst);
            let mut queue = worker_queues[target_worker].lock().await;
            if priority == LinkPriority::Thumbnail {
                queue.push_front(item);
            } else {
                queue.push_back(item);
            }
            drop(queue);

            target_worker = (target_worker + 1) % num_workers;
        }
    }

    pub async fn get_visited_count(&self) -> usize {
        self.visited.lock().await.len()
    }
}

impl Default for Crawler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    async fn mount_html(server: &MockServer, page_path: &str, html: String) {
        Mock::given(method("GET"))
            .and(path(page_path))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_bytes(html.into_bytes()),
            )
            .mount(server)
            .await;
    }

    /// crawlDepth = 0 fetches the seed page but follows no links.
    #[tokio::test]
    async fn test_depth_zero_collects_seed_files_only() {
        let mock_server = MockServer::start().await;
        mount_html(
            &mock_server,
            "/",
            r#"<html><body>
                <a href="doc.pdf">report</a>
                <a href="/page2">more</a>
                <a href="https://elsewhere.org/page">external</a>
            </body></html>"#
                .to_string(),
        )
        .await;
        mount_html(
            &mock_server,
            "/page2",
            r#"<a href="other.pdf">other</a>"#.to_string(),
        )
        .await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-length", "1024"))
            .mount(&mock_server)
            .await;

        let crawler = Crawler::new().with_crawl_depth(0).with_workers(2);
        let outcome = crawler
            .crawl(&mock_server.uri(), &exts(&["pdf"]))
            .await
            .unwrap();

        assert_eq!(outcome.files.len(), 1);
        assert!(outcome.files[0].url.ends_with("/doc.pdf"));
        assert_eq!(outcome.files[0].file_type, "pdf");
        assert_eq!(outcome.files[0].size, 1024);
        assert_eq!(outcome.files[0].formatted_size.as_deref(), Some("1 KB"));
        assert_eq!(outcome.pages_visited, 1);
    }

    #[tokio::test]
    async fn test_depth_one_follows_same_host_links() {
        let mock_server = MockServer::start().await;
        mount_html(
            &mock_server,
            "/",
            r#"<a href="/page2">next</a>"#.to_string(),
        )
        .await;
        mount_html(
            &mock_server,
            "/page2",
            r#"<a href="file.mp4">clip</a>"#.to_string(),
        )
        .await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let crawler = Crawler::new().with_crawl_depth(1).with_workers(2);
        let outcome = crawler
            .crawl(&mock_server.uri(), &exts(&["mp4"]))
            .await
            .unwrap();

        assert_eq!(outcome.files.len(), 1);
        assert!(outcome.files[0].url.ends_with("/file.mp4"));
        assert!(outcome.files[0].source_url.ends_with("/page2"));
        assert_eq!(outcome.pages_visited, 2);
    }

    /// A slow seed response leaves every queue empty for longer than the
    /// idle grace period; workers must wait for in-flight work instead of
    /// exiting, or most of the frontier is dropped and the crawl runs to
    /// its deadline.
    #[tokio::test]
    async fn test_slow_seed_keeps_workers_alive() {
        let mock_server = MockServer::start().await;
        let mut root_html = String::from("<html><body>");
        for i in 0..8 {
            root_html.push_str(&format!(r#"<a href="/p{}">p{}</a>"#, i, i));
        }
        root_html.push_str("</body></html>");
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_bytes(root_html.into_bytes())
                    .set_delay(Duration::from_millis(400)),
            )
            .mount(&mock_server)
            .await;
        for i in 0..8 {
            mount_html(
                &mock_server,
                &format!("/p{}", i),
                format!(r#"<a href="f{}.pdf">f</a>"#, i),
            )
            .await;
        }
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let crawler = Crawler::new()
            .with_crawl_depth(1)
            .with_workers(4)
            .with_deadline(Duration::from_secs(5));
        let outcome = crawler
            .crawl(&mock_server.uri(), &exts(&["pdf"]))
            .await
            .unwrap();

        assert_eq!(outcome.files.len(), 8);
        assert_eq!(outcome.pages_visited, 9);
        // Finishes when the frontier drains, not at the deadline
        assert!(outcome.duration < Duration::from_secs(4));
    }

    /// Two pages linking the same file URL yield exactly one entry.
    #[tokio::test]
    async fn test_duplicate_file_urls_recorded_once() {
        let mock_server = MockServer::start().await;
        let shared = format!("{}/shared.pdf", mock_server.uri());
        mount_html(
            &mock_server,
            "/",
            r#"<a href="/p1">1</a><a href="/p2">2</a>"#.to_string(),
        )
        .await;
        mount_html(&mock_server, "/p1", format!(r#"<a href="{shared}">s</a>"#)).await;
        mount_html(&mock_server, "/p2", format!(r#"<a href="{shared}">s</a>"#)).await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let crawler = Crawler::new().with_crawl_depth(1).with_workers(2);
        let outcome = crawler
            .crawl(&mock_server.uri(), &exts(&["pdf"]))
            .await
            .unwrap();

        assert_eq!(outcome.files.len(), 1);
        assert_eq!(outcome.files[0].url, shared);
        // First page to report it wins the sourceUrl
        assert!(
            outcome.files[0].source_url.ends_with("/p1")
                || outcome.files[0].source_url.ends_with("/p2")
        );
    }

    /// Thumbnail-led traversal records a thumbnail -> content edge.
    #[tokio::test]
    async fn test_thumbnail_connection_on_deep_crawl() {
        let mock_server = MockServer::start().await;
        mount_html(
            &mock_server,
            "/",
            r#"<html><body>
                <a href="/page2"><img class="thumb" src="/t.jpg" width="100"></a>
            </body></html>"#
                .to_string(),
        )
        .await;
        mount_html(
            &mock_server,
            "/page2",
            r#"<a href="file.mp4">clip</a>"#.to_string(),
        )
        .await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let crawler = Crawler::new().with_crawl_depth(2).with_workers(2);
        let outcome = crawler
            .crawl(&mock_server.uri(), &exts(&["mp4"]))
            .await
            .unwrap();

        assert_eq!(outcome.files.len(), 1);
        assert!(outcome.files[0].url.ends_with("/file.mp4"));

        assert_eq!(outcome.thumbnail_connections.len(), 1);
        let edge = &outcome.thumbnail_connections[0];
        assert!(edge.thumbnail.ends_with("/t.jpg"));
        assert!(edge.content.ends_with("/file.mp4"));

        // The file entry itself carries the provenance too
        assert_eq!(
            outcome.files[0].thumbnail_url.as_deref(),
            Some(edge.thumbnail.as_str())
        );
    }

    /// One thumbnail page holding several files produces several edges.
    #[tokio::test]
    async fn test_thumbnail_edges_accumulate_one_to_many() {
        let mock_server = MockServer::start().await;
        mount_html(
            &mock_server,
            "/",
            r#"<a href="/album"><img src="/t.jpg" width="80"></a>"#.to_string(),
        )
        .await;
        mount_html(
            &mock_server,
            "/album",
            r#"<a href="a.mp4">a</a><a href="b.mp4">b</a>"#.to_string(),
        )
        .await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let crawler = Crawler::new().with_crawl_depth(2).with_workers(2);
        let outcome = crawler
            .crawl(&mock_server.uri(), &exts(&["mp4"]))
            .await
            .unwrap();

        // A last-write-wins mapping would only keep one of these.
        assert_eq!(outcome.thumbnail_connections.len(), 2);
        let thumbnails: HashSet<&str> = outcome
            .thumbnail_connections
            .iter()
            .map(|e| e.thumbnail.as_str())
            .collect();
        assert_eq!(thumbnails.len(), 1);
    }

    /// The visited set is capped at 100 pages across the whole crawl.
    #[tokio::test]
    async fn test_visited_cap_bounds_traversal() {
        let mock_server = MockServer::start().await;
        let mut root_html = String::from("<html><body>");
        for i in 0..150 {
            root_html.push_str(&format!(r#"<a href="/p{}">p{}</a>"#, i, i));
        }
        root_html.push_str("</body></html>");
        mount_html(&mock_server, "/", root_html).await;
        // Catch-all for the numbered pages
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_bytes(b"<html><body>leaf</body></html>".to_vec()),
            )
            .mount(&mock_server)
            .await;

        let crawler = Crawler::new().with_crawl_depth(1).with_workers(4);
        let outcome = crawler
            .crawl(&mock_server.uri(), &exts(&["pdf"]))
            .await
            .unwrap();

        assert!(outcome.pages_visited <= MAX_VISITED_PAGES);
        assert_eq!(crawler.get_visited_count().await, outcome.pages_visited);
    }

    #[tokio::test]
    async fn test_embedded_iframe_fallback() {
        let mock_server = MockServer::start().await;
        mount_html(
            &mock_server,
            "/",
            r#"<iframe src="/embed/clip123"></iframe>"#.to_string(),
        )
        .await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let crawler = Crawler::new().with_crawl_depth(0).with_workers(1);
        let outcome = crawler
            .crawl(&mock_server.uri(), &exts(&["mp4"]))
            .await
            .unwrap();

        assert_eq!(outcome.files.len(), 1);
        assert_eq!(outcome.files[0].file_type, "embedded");
        assert!(outcome.files[0].is_embedded);
    }

    /// A crawl where every fetch fails still returns an (empty) outcome.
    #[tokio::test]
    async fn test_unreachable_seed_recovers_to_empty_result() {
        let crawler = Crawler::new().with_crawl_depth(1).with_workers(2);
        let outcome = crawler
            .crawl("http://127.0.0.1:1/", &exts(&["pdf"]))
            .await
            .unwrap();

        assert!(outcome.files.is_empty());
        assert!(outcome.thumbnail_connections.is_empty());
        assert_eq!(outcome.pages_visited, 1);
    }

    /// A malformed seed is the one caller error the engine rejects.
    #[tokio::test]
    async fn test_invalid_seed_is_an_error() {
        let crawler = Crawler::new();
        let result = crawler.crawl("not a url", &exts(&["pdf"])).await;
        assert!(matches!(result, Err(CrawlError::InvalidUrl(_))));
    }
}
