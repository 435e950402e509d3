use crate::config::CrawlConfig;
use crate::state::CrawlState;
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Final summary of a crawl run, persisted as `_meta/summary.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub base_url: String,
    pub scope: String,
    pub max_pages: usize,
    /// Number of URLs ever accepted into the crawl (fetched or in flight)
    pub visited: usize,
    pub saved_pages: usize,
    pub saved_assets: usize,
    pub duration_seconds: f64,
    pub output_root: String,
}

impl CrawlSummary {
    /// Builds the summary from the finished run's config and state
    pub fn from_run(
        config: &CrawlConfig,
        seed: &Url,
        state: &CrawlState,
        host_root: &Path,
    ) -> Self {
        Self {
            base_url: seed.to_string(),
            scope: config.scope.to_string(),
            max_pages: config.max_pages,
            visited: state.visited(),
            saved_pages: state.page_count(),
            saved_assets: state.asset_count(),
            duration_seconds: (state.elapsed_seconds() * 100.0).round() / 100.0,
            output_root: host_root.display().to_string(),
        }
    }
}
