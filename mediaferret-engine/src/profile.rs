use regex::Regex;
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Browser-like User-Agent for generic hosts.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Per-request timeout for generic hosts. Media pages can be slow.
pub const DEFAULT_PAGE_TIMEOUT: Duration = Duration::from_secs(8);

/// A hosting family the engine knows the HTML/CDN structure of.
///
/// Carries everything the site-specific passes need: the request header
/// profile, the raw-HTML mining patterns, and the CDN domain/template
/// guesses the speculative prober works through. Additional families are
/// added by appending to [`SiteProfile::builtin`]; the generic traversal
/// never special-cases a host itself.
pub struct SiteProfile {
    pub name: &'static str,
    /// Host suffix that activates this profile.
    host_suffix: &'static str,
    pub user_agent: &'static str,
    /// Extra request headers, Referer included.
    pub headers: Vec<(&'static str, &'static str)>,
    pub page_timeout: Duration,
    /// Raw-HTML passes for CDN URLs that never appear as DOM attributes.
    cdn_patterns: Vec<Regex>,
    /// Stream-identifier tokens used to synthesize direct media URLs.
    stream_id_pattern: Regex,
    /// Path-segment pattern holding the album/content identifier.
    album_id_pattern: Regex,
    pub cdn_domains: Vec<&'static str>,
    /// URL path templates; `{id}` and `{ext}` are substituted.
    pub path_templates: Vec<&'static str>,
    stream_template: &'static str,
}

impl SiteProfile {
    /// The Bunkr hosting family.
    pub fn bunkr() -> Self {
        Self {
            name: "bunkr",
            host_suffix: "bunkr.cr",
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                AppleWebKit/537.36 (KHTML, like Gecko) Chrome/99.0.4844.84 Safari/537.36",
            headers: vec![
                (
                    "Accept",
                    "text/html,application/xhtml+xml,application/xml;q=0.9,\
                     image/webp,image/apng,*/*;q=0.8",
                ),
                ("Accept-Language", "en-US,en;q=0.9"),
                ("Referer", "https://bunkr.cr/"),
                ("Cache-Control", "no-cache"),
                ("Pragma", "no-cache"),
            ],
            page_timeout: Duration::from_secs(15),
            cdn_patterns: vec![
                // Direct CDN-subdomain URLs
                Regex::new(
                    r"(?i)https?://cdn[0-9]*\.bunkr\.(?:ru|cr|is|sk|to)/[a-zA-Z0-9/_\-.]+\.(?:mp4|jpg|jpeg|png|gif|webm|mp3)",
                )
                .unwrap(),
                // URLs in JSON blobs and JavaScript object literals
                Regex::new(
                    r#"(?i)"(?:url|src|file)"\s*:\s*"(https?://[^"]*?\.(?:mp4|jpg|jpeg|png|gif|webm|mp3))""#,
                )
                .unwrap(),
                // Bare quoted URL literals
                Regex::new(
                    r#"(?i)['"]?(https?://[^'"]*?\.(?:mp4|jpg|jpeg|png|gif|webm|mp3))['"]?"#,
                )
                .unwrap(),
            ],
            stream_id_pattern: Regex::new(r"(?i)stream-[a-zA-Z0-9]+").unwrap(),
            album_id_pattern: Regex::new(r"/a/([a-zA-Z0-9]+)").unwrap(),
            cdn_domains: vec![
                "cdn.bunkr.cr",
                "cdn1.bunkr.cr",
                "cdn2.bunkr.cr",
                "media.bunkr.cr",
                "stream.bunkr.cr",
            ],
            path_templates: vec![
                "/a/{id}/content.{ext}",
                "/albums/{id}/media.{ext}",
                "/stream/{id}.{ext}",
                "/{id}.{ext}",
            ],
            stream_template: "https://cdn.bunkr.cr/stream/{id}.{ext}",
        }
    }

    /// All known site families.
    pub fn builtin() -> Vec<SiteProfile> {
        vec![SiteProfile::bunkr()]
    }

    pub fn matches_host(&self, host: &str) -> bool {
        host == self.host_suffix || host.ends_with(&format!(".{}", self.host_suffix))
    }

    pub fn matches_url(&self, url: &str) -> bool {
        Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| self.matches_host(h)))
            .unwrap_or(false)
    }

    /// Mine the raw HTML text for CDN URLs ending in a requested extension,
    /// and synthesize one candidate per stream-identifier token and
    /// extension. Synthesized URLs are unverified; the size enrichment pass
    /// later yields 0 for the ones that do not exist.
    pub fn mine_cdn_urls(&self, html: &str, extensions: &[String]) -> Vec<String> {
        let mut urls: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for pattern in &self.cdn_patterns {
            for captures in pattern.captures_iter(html) {
                let raw = captures
                    .get(1)
                    .or_else(|| captures.get(0))
                    .map(|m| m.as_str())
                    .unwrap_or_default();
                let cleaned: String = raw
                    .trim()
                    .trim_matches(|c| c == '"' || c == '\'')
                    .to_string();

                let extension = cleaned
                    .rsplit('.')
                    .next()
                    .map(|ext| ext.to_lowercase())
                    .unwrap_or_default();
                if extensions.contains(&extension) && seen.insert(cleaned.clone()) {
                    urls.push(cleaned);
                }
            }
        }

        let stream_ids: HashSet<&str> = self
            .stream_id_pattern
            .find_iter(html)
            .map(|m| m.as_str())
            .collect();
        for stream_id in stream_ids {
            for ext in extensions {
                let candidate = self
                    .stream_template
                    .replace("{id}", stream_id)
                    .replace("{ext}", ext);
                if seen.insert(candidate.clone()) {
                    urls.push(candidate);
                }
            }
        }

        debug!("Mined {} CDN URL candidates", urls.len());
        urls
    }

    /// Extract the album/content identifier from a seed URL, if present.
    pub fn album_id(&self, url: &str) -> Option<String> {
        self.album_id_pattern
            .captures(url)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Cross-product of CDN domain guesses, path templates and requested
    /// extensions for the speculative prober.
    pub fn probe_candidates(&self, album_id: &str, extensions: &[String]) -> Vec<String> {
        let mut candidates = Vec::new();
        for domain in &self.cdn_domains {
            for ext in extensions {
                for template in &self.path_templates {
                    let path = template.replace("{id}", album_id).replace("{ext}", ext);
                    candidates.push(format!("https://{}{}", domain, path));
                }
            }
        }
        candidates
    }
}

/// Find the profile responsible for a host, if any.
pub fn profile_for_host<'a>(profiles: &'a [SiteProfile], host: &str) -> Option<&'a SiteProfile> {
    profiles.iter().find(|p| p.matches_host(host))
}
