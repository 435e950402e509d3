use crate::storage::AssetKind;
use crate::url::ScopeMode;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Crawl configuration, supplied by the CLI layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Seed URL the crawl starts from
    pub seed_url: String,

    /// Output root; the mirror lands under `<output_root>/mirror/<host>/`
    pub output_root: PathBuf,

    /// Maximum number of successfully saved pages
    pub max_pages: usize,

    /// Scope rule gating enqueue and link discovery
    pub scope: ScopeMode,

    /// Asset kinds that are allowed into the queue
    pub include_assets: HashSet<AssetKind>,

    /// Reserved: accepted but currently has no behavioral effect
    pub respect_robots: bool,

    /// Maximum link depth from the seed (seed is depth 0)
    pub max_depth: u32,

    /// Wave size: number of fetches issued concurrently per iteration
    pub concurrency: usize,

    /// Global request pacing, in requests per second
    pub rate_rps: f64,

    /// Rewrite intra-site links in saved pages to local paths
    pub rewrite_links: bool,

    /// Additionally store every raw response body under `raw/`
    pub store_raw: bool,
}

impl CrawlConfig {
    /// A config with the standard defaults and the given seed URL
    pub fn with_seed(seed_url: impl Into<String>) -> Self {
        Self {
            seed_url: seed_url.into(),
            ..Self::default()
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            seed_url: String::new(),
            output_root: PathBuf::from("./out"),
            max_pages: 200,
            scope: ScopeMode::SameOrigin,
            include_assets: HashSet::from([
                AssetKind::Js,
                AssetKind::Css,
                AssetKind::Img,
                AssetKind::Font,
            ]),
            respect_robots: false,
            max_depth: 3,
            concurrency: 10,
            rate_rps: 5.0,
            rewrite_links: true,
            store_raw: false,
        }
    }
}
