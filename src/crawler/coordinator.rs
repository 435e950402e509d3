//! Crawl coordinator - breadth-first orchestration loop
//!
//! The coordinator owns all crawl state and drives the crawl in waves:
//! drain a bounded batch from the queue, fetch the batch concurrently,
//! then merge results back in batch order - logging, counting, link
//! expansion, and local-map updates all happen on the coordinating task
//! between waves. During a wave the only shared mutable state is the
//! fetcher's pacing gate.

use crate::config::{validate, CrawlConfig};
use crate::crawler::fetcher::{build_http_client, Fetcher};
use crate::crawler::parser::extract_page;
use crate::crawler::scripts::scan_js;
use crate::crawler::{CrawlResult, ItemKind, SourceReport};
use crate::output::CrawlSummary;
use crate::state::CrawlState;
use crate::storage::{
    asset_local_path, classify_asset, looks_like_page, page_local_path, write_json_pretty,
    JsonlLog, MirrorStore,
};
use crate::url::{canonicalize, ScopePolicy};
use crate::MirrorError;
use futures::future::join_all;
use std::collections::{BTreeSet, VecDeque};
use std::path::PathBuf;
use url::Url;

/// Responses larger than this are rejected before any save
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// A queue entry: URL, link depth from the seed, and expected kind
#[derive(Debug, Clone)]
struct QueueItem {
    url: Url,
    depth: u32,
    kind: ItemKind,
}

/// Main crawler coordinator
pub struct Coordinator {
    config: CrawlConfig,
    seed: Url,
    scope: ScopePolicy,
    fetcher: Fetcher,
    store: MirrorStore,
    state: CrawlState,
}

impl Coordinator {
    /// Creates a coordinator from a validated configuration
    ///
    /// # Arguments
    ///
    /// * `config` - The crawl configuration; pacing knobs are normalized
    ///   in place by validation
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(MirrorError)` - Invalid config, unparsable seed, or HTTP
    ///   client construction failure
    pub fn new(mut config: CrawlConfig) -> Result<Self, MirrorError> {
        validate(&mut config)?;

        let seed = canonicalize(&config.seed_url)?;
        let scope = ScopePolicy::new(config.scope, seed.clone());
        let fetcher = Fetcher::new(build_http_client()?, config.rate_rps);
        let store = MirrorStore::for_seed(&config.output_root, &seed, config.store_raw);

        if config.respect_robots {
            // Reserved flag: accepted for forward compatibility, no
            // enforcement is performed
            tracing::warn!("--respect-robots is reserved and currently has no effect");
        }

        Ok(Self {
            config,
            seed,
            scope,
            fetcher,
            store,
            state: CrawlState::new(),
        })
    }

    /// Runs the crawl to completion and returns the run summary
    ///
    /// Per-URL failures never abort the crawl; storage failures do, since
    /// they mean the output target itself is unusable.
    pub async fn run(&mut self) -> Result<CrawlSummary, MirrorError> {
        tracing::info!("Starting mirror of {} into {}", self.seed, self.store.host_root().display());

        self.store.ensure_dirs()?;
        let meta_dir = self.store.meta_dir();
        let mut crawl_log = JsonlLog::open(&meta_dir.join("crawl.jsonl"))?;
        let mut error_log = JsonlLog::open(&meta_dir.join("errors.jsonl"))?;

        let mut queue: VecDeque<QueueItem> = VecDeque::new();
        queue.push_back(QueueItem {
            url: self.seed.clone(),
            depth: 0,
            kind: ItemKind::Page,
        });
        let mut waves = 0usize;

        while !queue.is_empty() && self.state.page_count() < self.config.max_pages {
            let batch = self.drain_batch(&mut queue);
            if batch.is_empty() {
                // Every candidate was already seen or out of scope; the
                // queue shrank, so the loop still terminates
                continue;
            }

            tracing::debug!(
                "Fetching wave of {} ({} queued, {} pages saved)",
                batch.len(),
                queue.len(),
                self.state.page_count()
            );

            // Fetch the whole wave concurrently; results are merged in
            // batch order, not completion order
            let results = join_all(batch.iter().map(|item| self.process_one(item))).await;

            for (item, result) in batch.iter().zip(results) {
                let result = result?;

                crawl_log.append(&result)?;
                if result.error.is_some() {
                    error_log.append(&result)?;
                }

                if let Some(local_path) = &result.local_path {
                    self.state.record_saved(
                        &result.url,
                        PathBuf::from(local_path),
                        result.kind == ItemKind::Page,
                    );
                }

                self.expand_links(&result, item.depth, &mut queue);
            }

            waves += 1;
            if waves % 10 == 0 {
                let elapsed = self.state.elapsed_seconds();
                tracing::info!(
                    "Progress: {} pages, {} assets saved, {} queued, {:.2} pages/sec",
                    self.state.page_count(),
                    self.state.asset_count(),
                    queue.len(),
                    self.state.page_count() as f64 / elapsed.max(f64::EPSILON)
                );
            }
        }

        let summary = CrawlSummary::from_run(
            &self.config,
            &self.seed,
            &self.state,
            self.store.host_root(),
        );
        write_json_pretty(&meta_dir.join("summary.json"), &summary)?;

        tracing::info!(
            "Crawl complete: {} visited, {} pages and {} assets saved in {:.2}s",
            summary.visited,
            summary.saved_pages,
            summary.saved_assets,
            summary.duration_seconds
        );

        Ok(summary)
    }

    /// Drains up to one wave of crawlable items from the queue front
    ///
    /// Seen or out-of-scope candidates are dropped, not re-enqueued.
    /// Accepted items are marked seen immediately, before any fetch, so
    /// overlapping discoveries in later waves cannot enqueue them again.
    fn drain_batch(&mut self, queue: &mut VecDeque<QueueItem>) -> Vec<QueueItem> {
        let mut batch = Vec::new();
        while batch.len() < self.config.concurrency {
            let Some(item) = queue.pop_front() else {
                break;
            };
            if self.state.is_seen(item.url.as_str()) {
                continue;
            }
            if !self.scope.allows(&item.url) {
                continue;
            }
            self.state.mark_seen(item.url.as_str());
            batch.push(item);
        }
        batch
    }

    /// Enqueues a result's discovered links for the next waves
    fn expand_links(&self, result: &CrawlResult, depth: u32, queue: &mut VecDeque<QueueItem>) {
        if depth + 1 > self.config.max_depth {
            return;
        }

        for link in &result.discovered_links {
            if self.state.is_seen(link) {
                continue;
            }
            // Discovered links are canonical already; a parse failure here
            // would be a bug upstream, so just skip defensively-invalid ones
            let Ok(url) = Url::parse(link) else {
                continue;
            };

            let kind = if looks_like_page(&url) {
                ItemKind::Page
            } else {
                ItemKind::Asset
            };

            if kind == ItemKind::Asset {
                let asset_kind = classify_asset(None, url.path());
                if !self.config.include_assets.contains(&asset_kind) {
                    continue;
                }
            }

            queue.push_back(QueueItem {
                url,
                depth: depth + 1,
                kind,
            });
        }
    }

    /// Fetches and processes a single URL into its crawl record
    ///
    /// Takes `&self`: during a wave this runs concurrently with its batch
    /// siblings and must not touch any mutable crawl state. Fetch-level
    /// failures become the record's `error`; only storage failures return
    /// `Err`.
    async fn process_one(&self, item: &QueueItem) -> Result<CrawlResult, MirrorError> {
        let url = &item.url;

        let fetched = match self.fetcher.fetch(url).await {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::debug!("Fetch failed for {}: {}", url, e);
                return Ok(CrawlResult::failed(url, item.kind, e.to_string()));
            }
        };

        if fetched.body.len() > MAX_BODY_BYTES {
            return Ok(CrawlResult {
                url: url.to_string(),
                status_code: Some(fetched.status),
                content_type: fetched.content_type,
                local_path: None,
                kind: item.kind,
                discovered_links: Vec::new(),
                sources: SourceReport::Empty {},
                error: Some("response too large".to_string()),
            });
        }

        // HTML sniffing may upgrade an expected asset to a page; the saved
        // kind follows the response, not the queue's guess
        let is_html = fetched
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("text/html"))
            || looks_like_page(url);
        let kind = if is_html {
            ItemKind::Page
        } else {
            ItemKind::Asset
        };

        let (local_path, discovered_links, sources) = if is_html {
            let text = String::from_utf8_lossy(&fetched.body);
            let rewrite_map = self
                .config
                .rewrite_links
                .then(|| self.state.local_map());
            let extracted = extract_page(url, &text, &self.scope, rewrite_map);

            let local = page_local_path(url);
            self.store.write_text(&local, &extracted.html)?;

            (
                local,
                extracted.discovered_links,
                SourceReport::Page(extracted.sources),
            )
        } else {
            let asset_kind = classify_asset(fetched.content_type.as_deref(), url.path());
            let local = asset_local_path(url, asset_kind);
            self.store.write_bytes(&local, &fetched.body)?;

            let is_js = fetched
                .content_type
                .as_deref()
                .is_some_and(|ct| ct.contains("javascript"))
                || local.extension().is_some_and(|ext| ext == "js");

            if is_js {
                let text = String::from_utf8_lossy(&fetched.body);
                let scan = scan_js(&text);
                let discovered = resolve_script_hints(url, &scan.imports, &scan.source_maps, &self.scope);
                (local, discovered, SourceReport::Script(scan))
            } else {
                (local, Vec::new(), SourceReport::Empty {})
            }
        };

        self.store.write_raw(url, &fetched.body)?;

        let error = if fetched.success {
            None
        } else {
            Some(format!("HTTP {}", fetched.status))
        };

        Ok(CrawlResult {
            url: url.to_string(),
            status_code: Some(fetched.status),
            content_type: fetched.content_type,
            local_path: Some(local_path.display().to_string()),
            kind,
            discovered_links,
            sources,
            error,
        })
    }
}

/// Resolves a JS file's import and source-map hints into in-scope crawl
/// candidates
fn resolve_script_hints(
    base: &Url,
    imports: &[String],
    source_maps: &[String],
    scope: &ScopePolicy,
) -> Vec<String> {
    let mut found = BTreeSet::new();
    for hint in imports.iter().chain(source_maps.iter()) {
        let Ok(joined) = base.join(hint) else {
            continue;
        };
        let Ok(canon) = canonicalize(joined.as_str()) else {
            continue;
        };
        if scope.allows(&canon) {
            found.insert(canon.to_string());
        }
    }
    found.into_iter().collect()
}

/// Runs a complete mirror crawl
///
/// This is the main library entry point: validate the config, crawl to
/// completion, and return the persisted summary.
///
/// # Example
///
/// ```no_run
/// use wapper::config::CrawlConfig;
/// use wapper::crawler::run_crawl;
///
/// # async fn example() -> Result<(), wapper::MirrorError> {
/// let config = CrawlConfig::with_seed("https://example.com");
/// let summary = run_crawl(config).await?;
/// println!("saved {} pages", summary.saved_pages);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: CrawlConfig) -> Result<CrawlSummary, MirrorError> {
    let mut coordinator = Coordinator::new(config)?;
    coordinator.run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinator_for(seed: &str) -> Coordinator {
        let mut config = CrawlConfig::with_seed(seed);
        config.output_root = std::env::temp_dir().join("wapper-coordinator-tests");
        Coordinator::new(config).unwrap()
    }

    #[test]
    fn test_new_canonicalizes_seed() {
        let coordinator = coordinator_for("example.com/start/");
        assert_eq!(coordinator.seed.as_str(), "https://example.com/start");
    }

    #[test]
    fn test_drain_batch_skips_seen_and_out_of_scope() {
        let mut coordinator = coordinator_for("https://example.com/");
        let mut queue: VecDeque<QueueItem> = VecDeque::from([
            QueueItem {
                url: Url::parse("https://example.com/a").unwrap(),
                depth: 1,
                kind: ItemKind::Page,
            },
            QueueItem {
                url: Url::parse("https://other.com/b").unwrap(),
                depth: 1,
                kind: ItemKind::Page,
            },
            QueueItem {
                url: Url::parse("https://example.com/a").unwrap(),
                depth: 2,
                kind: ItemKind::Page,
            },
        ]);

        let batch = coordinator.drain_batch(&mut queue);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].url.as_str(), "https://example.com/a");
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain_batch_respects_wave_size() {
        let mut coordinator = coordinator_for("https://example.com/");
        coordinator.config.concurrency = 2;
        let mut queue: VecDeque<QueueItem> = (0..5)
            .map(|i| QueueItem {
                url: Url::parse(&format!("https://example.com/p{}", i)).unwrap(),
                depth: 1,
                kind: ItemKind::Page,
            })
            .collect();

        let batch = coordinator.drain_batch(&mut queue);
        assert_eq!(batch.len(), 2);
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn test_expand_links_respects_depth_limit() {
        let coordinator = coordinator_for("https://example.com/");
        let mut queue = VecDeque::new();
        let result = CrawlResult {
            url: "https://example.com/".to_string(),
            status_code: Some(200),
            content_type: Some("text/html".to_string()),
            local_path: Some("pages/index/index.html".to_string()),
            kind: ItemKind::Page,
            discovered_links: vec!["https://example.com/next".to_string()],
            sources: SourceReport::Empty {},
            error: None,
        };

        // depth == max_depth: children would exceed it
        coordinator.expand_links(&result, coordinator.config.max_depth, &mut queue);
        assert!(queue.is_empty());

        coordinator.expand_links(&result, 0, &mut queue);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].depth, 1);
    }

    #[test]
    fn test_expand_links_filters_excluded_asset_kinds() {
        let mut coordinator = coordinator_for("https://example.com/");
        coordinator.config.include_assets = [crate::storage::AssetKind::Css].into();

        let result = CrawlResult {
            url: "https://example.com/".to_string(),
            status_code: Some(200),
            content_type: Some("text/html".to_string()),
            local_path: None,
            kind: ItemKind::Page,
            discovered_links: vec![
                "https://example.com/app.js".to_string(),
                "https://example.com/site.css".to_string(),
                "https://example.com/about".to_string(),
            ],
            sources: SourceReport::Empty {},
            error: None,
        };

        let mut queue = VecDeque::new();
        coordinator.expand_links(&result, 0, &mut queue);

        let queued: Vec<_> = queue.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(
            queued,
            vec!["https://example.com/site.css", "https://example.com/about"]
        );
    }
}
