//! URL handling for the mirror crawler
//!
//! This module provides:
//!
//! - `canonicalize`: URL canonicalization, producing the dedup key used for
//!   the entire crawl
//! - `ScopeMode` / `ScopePolicy`: the policy deciding which discovered URLs
//!   are eligible for crawling

mod canonical;
mod scope;

pub use canonical::canonicalize;
pub use scope::{ScopeMode, ScopePolicy};
