//! Filesystem backend for the mirror tree
//!
//! `MirrorStore` owns the host-scoped output root and performs every file
//! write of the crawl. Directories are created lazily and idempotently
//! before each write.

use super::{layout, StorageError};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// The on-disk mirror tree for one host, rooted at
/// `<output_root>/mirror/<host>/`
#[derive(Debug)]
pub struct MirrorStore {
    host_root: PathBuf,
    store_raw: bool,
}

impl MirrorStore {
    /// Creates a store rooted at `<output_root>/mirror/<host>` for the
    /// given seed URL. Nothing is created on disk until `ensure_dirs` or
    /// the first write.
    pub fn for_seed(output_root: &Path, seed: &Url, store_raw: bool) -> Self {
        let host_root = output_root.join("mirror").join(host_label(seed));
        Self {
            host_root,
            store_raw,
        }
    }

    pub fn host_root(&self) -> &Path {
        &self.host_root
    }

    pub fn meta_dir(&self) -> PathBuf {
        self.host_root.join("_meta")
    }

    /// Creates the fixed directory skeleton (create-if-absent)
    pub fn ensure_dirs(&self) -> Result<(), StorageError> {
        let mut dirs = vec![
            self.meta_dir(),
            self.host_root.join("pages"),
            self.host_root.join("assets"),
        ];
        if self.store_raw {
            dirs.push(self.host_root.join("raw"));
        }
        for dir in dirs {
            create_dir_all(&dir)?;
        }
        Ok(())
    }

    /// Writes page text at a path relative to the host root
    pub fn write_text(&self, rel: &Path, text: &str) -> Result<(), StorageError> {
        self.write_bytes(rel, text.as_bytes())
    }

    /// Writes asset bytes at a path relative to the host root
    pub fn write_bytes(&self, rel: &Path, bytes: &[u8]) -> Result<(), StorageError> {
        let target = self.host_root.join(rel);
        if let Some(parent) = target.parent() {
            create_dir_all(parent)?;
        }
        fs::write(&target, bytes).map_err(|source| StorageError::Write {
            path: target.display().to_string(),
            source,
        })
    }

    /// Stores the unmodified response body under `raw/<sha1(url)>.bin`,
    /// if raw storage is enabled
    pub fn write_raw(&self, url: &Url, bytes: &[u8]) -> Result<(), StorageError> {
        if !self.store_raw {
            return Ok(());
        }
        let rel = PathBuf::from("raw").join(layout::raw_object_name(url));
        self.write_bytes(&rel, bytes)
    }
}

/// Directory label for a host: `host` or `host:port`, matching the URL's
/// authority as written
pub fn host_label(url: &Url) -> String {
    let host = url.host_str().unwrap_or("unknown-host");
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

fn create_dir_all(dir: &Path) -> Result<(), StorageError> {
    fs::create_dir_all(dir).map_err(|source| StorageError::CreateDir {
        path: dir.display().to_string(),
        source,
    })
}
