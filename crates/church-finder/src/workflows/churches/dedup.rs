use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// One crawled page as returned by the crawl provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlPage {
    pub url: String,
    #[serde(alias = "rawContent", default)]
    pub raw_content: String,
    #[serde(default)]
    pub favicon: Option<String>,
}

impl CrawlPage {
    pub fn new(url: impl Into<String>, raw_content: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            raw_content: raw_content.into(),
            favicon: None,
        }
    }
}

/// Crawl output for a single website.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlResult {
    pub base_url: String,
    pub pages: Vec<CrawlPage>,
}

/// Collapse anchor/fragment pages into their canonical page and drop repeated content.
///
/// Clean pages (no `#` in the URL) are kept first, in crawl order, followed by the
/// fragment pages that still contribute content of their own.
pub fn drop_anchor_dupes(result: CrawlResult) -> CrawlResult {
    let CrawlResult { base_url, pages } = result;

    let mut clean = Vec::new();
    let mut fragments = Vec::new();
    for page in pages {
        let url = page.url.trim().to_string();
        let normalized = CrawlPage {
            raw_content: normalize_whitespace(&page.raw_content),
            url,
            favicon: page.favicon,
        };
        if normalized.url.contains('#') {
            fragments.push(normalized);
        } else {
            clean.push(normalized);
        }
    }

    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut clean_hashes: HashSet<i32> = HashSet::new();
    let mut kept: Vec<CrawlPage> = Vec::new();

    for page in clean {
        if seen_urls.contains(&page.url) {
            continue;
        }
        if !page.raw_content.is_empty() {
            let hash = content_hash(&page.raw_content);
            if !clean_hashes.insert(hash) {
                continue;
            }
        }
        seen_urls.insert(page.url.clone());
        kept.push(page);
    }

    let clean_count = kept.len();
    let mut fragment_hashes: HashSet<i32> = HashSet::new();

    for page in fragments {
        if seen_urls.contains(&page.url) {
            continue;
        }
        if !page.raw_content.is_empty() {
            let hash = content_hash(&page.raw_content);
            if clean_hashes.contains(&hash) || fragment_hashes.contains(&hash) {
                continue;
            }
            let covered = kept[..clean_count]
                .iter()
                .any(|parent| parent.raw_content.contains(&page.raw_content));
            if covered {
                continue;
            }
            fragment_hashes.insert(hash);
        }
        seen_urls.insert(page.url.clone());
        kept.push(page);
    }

    CrawlResult {
        base_url,
        pages: kept,
    }
}

/// Collapse every whitespace run to a single space and trim the ends.
pub fn normalize_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Order-sensitive rolling hash (`h = h * 31 + byte`, wrapping at 32 bits) over UTF-8 bytes.
pub fn content_hash(text: &str) -> i32 {
    text.bytes()
        .fold(0i32, |hash, byte| hash.wrapping_mul(31).wrapping_add(i32::from(byte)))
}
