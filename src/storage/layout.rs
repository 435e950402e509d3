//! Content classification and local-path mapping
//!
//! Decides what kind of thing a fetched item is (page or one of the asset
//! kinds) and where it lives inside the mirror tree. All returned paths are
//! relative to the host root so they can double as rewrite targets and log
//! fields.

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

/// Asset kind, used for directory placement and the include-filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Js,
    Css,
    Font,
    Img,
    Misc,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Js => "js",
            Self::Css => "css",
            Self::Font => "font",
            Self::Img => "img",
            Self::Misc => "misc",
        }
    }

    /// Extension used when an asset URL has none
    fn default_extension(&self) -> &'static str {
        match self {
            Self::Js => ".js",
            Self::Css => ".css",
            Self::Font | Self::Img | Self::Misc => ".bin",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "js" => Ok(Self::Js),
            "css" => Ok(Self::Css),
            "font" => Ok(Self::Font),
            "img" => Ok(Self::Img),
            "misc" => Ok(Self::Misc),
            other => Err(format!(
                "unknown asset kind '{}', expected js|css|font|img|misc",
                other
            )),
        }
    }
}

/// Classifies an asset from its Content-Type and URL path
///
/// Content-type substring matches take priority over the extension
/// fallback; anything unrecognized is `Misc`.
pub fn classify_asset(content_type: Option<&str>, path: &str) -> AssetKind {
    let ctype = content_type.unwrap_or("").to_lowercase();
    let path = path.to_lowercase();

    if ctype.contains("javascript") || ends_with_any(&path, &[".js", ".mjs", ".cjs"]) {
        AssetKind::Js
    } else if ctype.contains("css") || path.ends_with(".css") {
        AssetKind::Css
    } else if contains_any(&ctype, &["font", "woff", "ttf"])
        || ends_with_any(&path, &[".woff", ".woff2", ".ttf", ".otf"])
    {
        AssetKind::Font
    } else if contains_any(&ctype, &["image", "svg"])
        || ends_with_any(&path, &[".png", ".jpg", ".jpeg", ".gif", ".webp", ".svg", ".ico"])
    {
        AssetKind::Img
    } else {
        AssetKind::Misc
    }
}

/// Heuristic for whether a URL looks like an HTML page rather than an asset
///
/// Page-like: path ends in `/`, has no extension, or has an extension from
/// the common server-page set.
pub fn looks_like_page(url: &Url) -> bool {
    let path = url.path().to_lowercase();
    if path.ends_with('/') {
        return true;
    }
    let ext = file_extension(final_segment(&path));
    ext.is_empty() || matches!(ext, ".html" | ".htm" | ".php" | ".asp" | ".aspx" | ".jsp")
}

/// Maps a page URL to its local path, relative to the host root
///
/// The URL path becomes a file under `pages/`; an empty or directory-like
/// path (trailing slash, or a final segment without a dot) becomes
/// `.../index.html`.
pub fn page_local_path(url: &Url) -> PathBuf {
    let raw_path = url.path();
    let rel = raw_path.trim_start_matches('/');
    let rel = if rel.is_empty() { "index" } else { rel };

    if raw_path.ends_with('/') || !final_segment(rel).contains('.') {
        PathBuf::from("pages").join(format!("{}/index.html", rel.trim_end_matches('/')))
    } else {
        PathBuf::from("pages").join(rel)
    }
}

/// Maps an asset URL to its local path, relative to the host root
///
/// Assets land under `assets/<kind>/`; a missing extension is filled from
/// the per-kind default, and a query string inserts an 8-hex digest before
/// the extension so `style.css?v=2` and `style.css?v=3` do not collide.
/// Collisions beyond that (distinct URLs mapping to the same stripped path)
/// silently overwrite, last writer wins.
pub fn asset_local_path(url: &Url, kind: AssetKind) -> PathBuf {
    let mut rel = url.path().trim_start_matches('/').to_string();
    if rel.is_empty() {
        rel = "asset".to_string();
    }
    if rel.ends_with('/') {
        rel.push_str("index");
    }
    if !final_segment(&rel).contains('.') {
        rel.push_str(kind.default_extension());
    }

    if let Some(query) = url.query() {
        rel = insert_digest(&rel, &short_digest(query));
    }

    PathBuf::from("assets").join(kind.as_str()).join(rel)
}

/// File name for a raw response body: sha1 of the canonical URL
pub fn raw_object_name(url: &Url) -> String {
    let mut hasher = Sha1::new();
    hasher.update(url.as_str().as_bytes());
    format!("{}.bin", hex::encode(hasher.finalize()))
}

/// First 8 hex characters of the sha1 of the given query string
fn short_digest(query: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(query.as_bytes());
    hex::encode(hasher.finalize())[..8].to_string()
}

/// Inserts a digest between a relative path's stem and extension
fn insert_digest(rel: &str, digest: &str) -> String {
    let (dir, name) = match rel.rfind('/') {
        Some(idx) => (&rel[..=idx], &rel[idx + 1..]),
        None => ("", rel),
    };
    match name.rfind('.') {
        Some(dot) if dot > 0 => {
            format!("{}{}.{}{}", dir, &name[..dot], digest, &name[dot..])
        }
        _ => format!("{}{}.{}", dir, name, digest),
    }
}

/// Final `/`-separated segment of a path
fn final_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Extension of a file name, dot included; hidden files have none
fn file_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[idx..],
        _ => "",
    }
}

fn ends_with_any(s: &str, suffixes: &[&str]) -> bool {
    suffixes.iter().any(|suffix| s.ends_with(suffix))
}

fn contains_any(s: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| s.contains(needle))
}
