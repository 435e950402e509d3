use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Instant;

/// Mutable crawl bookkeeping, owned exclusively by the coordinator
#[derive(Debug)]
pub struct CrawlState {
    /// Canonical URLs already enqueued or in flight. Grows monotonically
    /// for the crawl's lifetime; guarantees each URL is fetched at most
    /// once.
    seen: HashSet<String>,

    /// Canonical URL -> local path (relative to the host root). Populated
    /// only after a successful save; read by the link rewriter.
    local_map: HashMap<String, PathBuf>,

    /// Successfully saved pages. Drives the max-pages stopping condition.
    page_count: usize,

    /// Successfully saved assets. Assets never stop the crawl.
    asset_count: usize,

    started: Instant,
}

impl CrawlState {
    pub fn new() -> Self {
        Self {
            seen: HashSet::new(),
            local_map: HashMap::new(),
            page_count: 0,
            asset_count: 0,
            started: Instant::now(),
        }
    }

    /// Marks a canonical URL as seen. Returns false if it already was.
    pub fn mark_seen(&mut self, url: &str) -> bool {
        self.seen.insert(url.to_string())
    }

    pub fn is_seen(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    /// Number of URLs ever accepted into the crawl
    pub fn visited(&self) -> usize {
        self.seen.len()
    }

    /// Records a successful save and bumps the matching counter
    pub fn record_saved(&mut self, url: &str, local_path: PathBuf, is_page: bool) {
        self.local_map.insert(url.to_string(), local_path);
        if is_page {
            self.page_count += 1;
        } else {
            self.asset_count += 1;
        }
    }

    pub fn local_map(&self) -> &HashMap<String, PathBuf> {
        &self.local_map
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn asset_count(&self) -> usize {
        self.asset_count
    }

    /// Seconds elapsed since the state was created
    pub fn elapsed_seconds(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

impl Default for CrawlState {
    fn default() -> Self {
        Self::new()
    }
}
