//! Crawler module for fetching, extraction, and orchestration
//!
//! This module contains the core crawling logic, including:
//! - Rate-limited HTTP fetching with retry on transient statuses
//! - HTML reference extraction, metadata capture, and link rewriting
//! - Lexical scanning of JavaScript sources
//! - The breadth-first crawl loop tying everything together

mod coordinator;
mod fetcher;
mod parser;
mod scripts;

pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{build_http_client, FetchError, FetchedResponse, Fetcher, RateGate};
pub use parser::{extract_page, ExtractedPage, FormInput, FormRecord, PageSources};
pub use scripts::{scan_js, ScriptScan};

use serde::Serialize;

/// Whether a queued or processed item is an HTML page or an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Page,
    Asset,
}

/// Source-level metadata captured for one processed URL
///
/// Pages carry their inline/external script and form data; bodies
/// classified as JavaScript carry a bare lexical scan; everything else
/// (including failed fetches) carries an empty map.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SourceReport {
    Page(PageSources),
    Script(ScriptScan),
    Empty {},
}

impl Default for SourceReport {
    fn default() -> Self {
        Self::Empty {}
    }
}

/// One processed URL, exactly as it appears in `_meta/crawl.jsonl`
///
/// `local_path` is present iff the fetch succeeded and the body was written
/// to disk; `error` is present iff the fetch failed, returned a non-success
/// status, or the body exceeded the size ceiling.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlResult {
    pub url: String,
    pub status_code: Option<u16>,
    pub content_type: Option<String>,
    pub local_path: Option<String>,
    pub kind: ItemKind,
    pub discovered_links: Vec<String>,
    pub sources: SourceReport,
    pub error: Option<String>,
}

impl CrawlResult {
    /// A record for a fetch that never produced a response
    pub(crate) fn failed(url: &url::Url, kind: ItemKind, error: String) -> Self {
        Self {
            url: url.to_string(),
            status_code: None,
            content_type: None,
            local_path: None,
            kind,
            discovered_links: Vec::new(),
            sources: SourceReport::Empty {},
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ItemKind::Page).unwrap(), "\"page\"");
        assert_eq!(serde_json::to_string(&ItemKind::Asset).unwrap(), "\"asset\"");
    }

    #[test]
    fn test_empty_sources_serialize_as_empty_map() {
        let report = SourceReport::default();
        assert_eq!(serde_json::to_value(&report).unwrap(), serde_json::json!({}));
    }

    #[test]
    fn test_failed_result_shape() {
        let url = url::Url::parse("https://a.com/x").unwrap();
        let result = CrawlResult::failed(&url, ItemKind::Page, "request timed out".to_string());
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["url"], "https://a.com/x");
        assert_eq!(value["status_code"], serde_json::Value::Null);
        assert_eq!(value["local_path"], serde_json::Value::Null);
        assert_eq!(value["kind"], "page");
        assert_eq!(value["sources"], serde_json::json!({}));
        assert_eq!(value["error"], "request timed out");
    }
}
