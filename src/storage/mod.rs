//! Storage module for the on-disk mirror tree
//!
//! This module owns everything that touches the filesystem:
//! - Content classification and local-path mapping (`layout`)
//! - The mirror directory tree and file writes (`store`)
//! - Append-only JSONL logs and the run summary file (`logs`)
//!
//! Layout, rooted at `<result>/mirror/<host>/`:
//!
//! ```text
//! pages/<path>[/index.html]
//! assets/{js,css,font,img,misc}/<path>[.<digest>]<ext>
//! raw/<sha1(url)>.bin          (only when raw storage is enabled)
//! _meta/crawl.jsonl
//! _meta/errors.jsonl
//! _meta/summary.json
//! ```

mod layout;
mod logs;
mod store;

pub use layout::{
    asset_local_path, classify_asset, looks_like_page, page_local_path, raw_object_name, AssetKind,
};
pub use logs::{write_json_pretty, JsonlLog};
pub use store::MirrorStore;

use thiserror::Error;

/// Errors raised by the storage layer
///
/// These indicate the output target itself is unusable and abort the run,
/// unlike per-URL fetch failures which stay local to one crawl record.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to open log {path}: {source}")]
    OpenLog {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to append to log {path}: {source}")]
    AppendLog {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}
