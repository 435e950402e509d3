//! Configuration for the mirror crawler
//!
//! The config is a plain value supplied by the caller (in practice the CLI
//! binary); there is no on-disk loader. Validation normalizes the few knobs
//! the crawl loop depends on for termination and pacing.

mod types;
mod validation;

pub use types::CrawlConfig;
pub use validation::validate;
