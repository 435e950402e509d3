//! Output module for the final run summary
//!
//! The summary is the run's one overwrite-on-finish artifact; everything
//! else the crawl produces is append-only.

mod summary;

pub use summary::CrawlSummary;
