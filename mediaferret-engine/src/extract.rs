use crate::entry::FileEntry;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::debug;
use url::Url;

/// Substrings of class/id/alt attributes that mark an image as a preview.
const THUMBNAIL_KEYWORDS: [&str; 5] = ["thumb", "thumbnail", "preview", "small", "mini"];

/// Link-path substrings that suggest an anchor leads to a media page.
const MEDIA_PAGE_KEYWORDS: [&str; 6] = ["video", "media", "watch", "stream", "player", "gallery"];

/// Declared width/height below this counts as a weak thumbnail signal.
const THUMBNAIL_MAX_DIMENSION: u32 = 300;

/// How urgently a follow-link should be fetched. Thumbnail-led links go to
/// the front of the work queues, keyword-led links before generic ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LinkPriority {
    Thumbnail,
    Keyword,
    Generic,
}

/// A same-host anchor eligible for recursive traversal.
#[derive(Debug, Clone)]
pub struct FollowLink {
    pub url: String,
    pub priority: LinkPriority,
    /// Thumbnail provenance to hand to the child page, if traversal got
    /// here through a preview image or link.
    pub thumbnail: Option<String>,
}

/// Candidates produced from one fetched page.
#[derive(Debug, Default)]
pub struct PageExtraction {
    pub files: Vec<FileEntry>,
    pub links: Vec<FollowLink>,
}

/// Resolve a possibly-relative reference against the current page URL.
/// Returns `None` for empty references, non-navigable schemes and anything
/// the URL parser rejects. Normalizing an already-absolute URL is a no-op.
/// Fragments resolve per standard URL rules and are then stripped, so
/// `page#a` and `page#b` collapse to one visit.
pub fn normalize_url(base: &str, href: &str) -> Option<String> {
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
    {
        return None;
    }

    let base_url = Url::parse(base).ok()?;
    let mut resolved = base_url.join(href).ok()?;
    resolved.set_fragment(None);
    Some(resolved.to_string())
}

/// Heuristic preview-image detector. An `<img>` qualifies when it is
/// clickable (nested in an anchor), carries a thumbnail keyword in its
/// class/id/alt attributes, or declares a small width/height.
pub fn is_thumbnail(element: ElementRef) -> bool {
    if element.value().name() != "img" {
        return false;
    }

    let in_anchor = element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|e| e.value().name() == "a");

    let has_keyword = ["class", "id", "alt"].iter().any(|attr| {
        element
            .value()
            .attr(attr)
            .map(|value| {
                let value = value.to_lowercase();
                THUMBNAIL_KEYWORDS.iter().any(|kw| value.contains(kw))
            })
            .unwrap_or(false)
    });

    let is_small = ["width", "height"].iter().any(|attr| {
        element
            .value()
            .attr(attr)
            .and_then(|v| v.trim().parse::<u32>().ok())
            .map(|dim| dim > 0 && dim < THUMBNAIL_MAX_DIMENSION)
            .unwrap_or(false)
    });

    in_anchor || has_keyword || is_small
}

/// Basename of a URL path, if it has one.
pub fn file_name_from_path(path: &str) -> Option<String> {
    path.rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .map(|name| name.to_string())
}

/// Extension after the last dot of a URL path, lower-cased, without the dot.
pub fn extension_from_path(path: &str) -> Option<String> {
    let name = path.rsplit('/').next()?;
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_lowercase())
    }
}

fn matches_extension(path: &str, extensions: &[String]) -> bool {
    let path = path.to_lowercase();
    extensions
        .iter()
        .any(|ext| path.ends_with(&format!(".{}", ext)))
}

fn is_http_scheme(url: &Url) -> bool {
    url.scheme() == "http" || url.scheme() == "https"
}

fn same_host(url: &Url, page: &Url) -> bool {
    url.host_str().is_some() && url.host_str() == page.host_str()
}

/// Walk up from an image to its nearest enclosing anchor.
fn enclosing_anchor(element: ElementRef) -> Option<ElementRef> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "a")
}

fn timestamp_placeholder() -> String {
    format!("embedded_{}", chrono::Utc::now().timestamp_millis())
}

/// Run all extraction passes over one fetched page.
///
/// Produces file candidates (direct links and embedded media matching the
/// requested extensions) and, while `depth` is below the crawl depth,
/// classified follow-link candidates. Deduplication against the crawl-wide
/// found-file set happens later, at insertion.
pub fn extract_page(
    html: &str,
    page_url: &str,
    extensions: &[String],
    depth: usize,
    crawl_depth: usize,
    provenance: Option<&str>,
) -> PageExtraction {
    let Ok(page) = Url::parse(page_url) else {
        return PageExtraction::default();
    };

    let document = Html::parse_document(html);
    let anchor_selector = Selector::parse("a[href]").unwrap();
    let media_selector = Selector::parse("video[src], video > source[src], iframe[src]").unwrap();
    let img_selector = Selector::parse("img").unwrap();

    let mut extraction = PageExtraction::default();
    let mut seen_links: HashSet<String> = HashSet::new();

    // Thumbnail images whose enclosing anchor points at a same-host page.
    // Runs before the anchor pass so these links keep the image URL as
    // provenance; only worth the extra fetches on deep crawls.
    if crawl_depth >= 2 && depth < crawl_depth {
        for image in document.select(&img_selector) {
            if !is_thumbnail(image) {
                continue;
            }
            let Some(anchor) = enclosing_anchor(image) else {
                continue;
            };
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let Some(normalized) = normalize_url(page_url, href) else {
                continue;
            };
            let Ok(parsed) = Url::parse(&normalized) else {
                continue;
            };
            if !same_host(&parsed, &page) || !is_http_scheme(&parsed) {
                continue;
            }
            if !seen_links.insert(normalized.clone()) {
                continue;
            }

            let image_src = image
                .value()
                .attr("src")
                .and_then(|src| normalize_url(page_url, src));
            extraction.links.push(FollowLink {
                url: normalized.clone(),
                priority: LinkPriority::Thumbnail,
                thumbnail: Some(image_src.unwrap_or(normalized)),
            });
        }
    }

    // Direct file links.
    for element in document.select(&anchor_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(normalized) = normalize_url(page_url, href) else {
            continue;
        };
        let Ok(parsed) = Url::parse(&normalized) else {
            continue;
        };

        if matches_extension(parsed.path(), extensions) {
            let file_name = file_name_from_path(parsed.path()).unwrap_or_default();
            let file_type = extension_from_path(parsed.path()).unwrap_or_default();
            debug!("Found file link: {} ({})", normalized, file_type);
            extraction.files.push(
                FileEntry::new(
                    normalized.clone(),
                    file_name,
                    file_type,
                    page_url.to_string(),
                )
                .with_thumbnail(provenance.map(str::to_string)),
            );
        }

        // Follow-link candidates only below the depth bound.
        if depth >= crawl_depth {
            continue;
        }
        if !same_host(&parsed, &page) || !is_http_scheme(&parsed) {
            continue;
        }
        if !seen_links.insert(normalized.clone()) {
            continue;
        }

        let link = if crawl_depth >= 2 {
            let leads_with_thumbnail = element
                .select(&img_selector)
                .next()
                .map(is_thumbnail)
                .unwrap_or(false);
            let href_lower = href.to_lowercase();

            if leads_with_thumbnail {
                FollowLink {
                    url: normalized.clone(),
                    priority: LinkPriority::Thumbnail,
                    thumbnail: Some(normalized),
                }
            } else if MEDIA_PAGE_KEYWORDS.iter().any(|kw| href_lower.contains(kw)) {
                FollowLink {
                    url: normalized,
                    priority: LinkPriority::Keyword,
                    thumbnail: provenance.map(str::to_string),
                }
            } else {
                FollowLink {
                    url: normalized,
                    priority: LinkPriority::Generic,
                    thumbnail: None,
                }
            }
        } else {
            // Shallow crawls follow links without classification.
            FollowLink {
                url: normalized,
                priority: LinkPriority::Generic,
                thumbnail: None,
            }
        };
        extraction.links.push(link);
    }

    // Embedded players and iframes.
    for element in document.select(&media_selector) {
        let Some(src) = element.value().attr("src") else {
            continue;
        };
        let Some(normalized) = normalize_url(page_url, src) else {
            continue;
        };
        let Ok(parsed) = Url::parse(&normalized) else {
            continue;
        };

        let path = parsed.path();
        let extension_match = matches_extension(path, extensions);
        let embed_path = path.contains("/embed/") || path.contains("/player/");
        if !extension_match && !embed_path {
            continue;
        }

        let file_name = file_name_from_path(path).unwrap_or_else(timestamp_placeholder);
        let file_type = extension_from_path(path)
            .filter(|_| extension_match)
            .unwrap_or_else(|| "embedded".to_string());
        debug!("Found embedded media: {} ({})", normalized, file_type);
        extraction.files.push(
            FileEntry::new(normalized, file_name, file_type, page_url.to_string())
                .with_thumbnail(provenance.map(str::to_string))
                .embedded(),
        );
    }

    extraction
}
