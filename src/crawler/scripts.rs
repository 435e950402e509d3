//! Lexical scanner for JavaScript source text
//!
//! This is a best-effort regex scan, not a parser: it surfaces source-map
//! references, module import specifiers, and string-literal network calls
//! from whatever text it is handed, minified or not. False positives and
//! negatives on obfuscated code are expected and acceptable.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;

static SOURCE_MAP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"sourceMappingURL\s*=\s*([^\s*]+)").expect("valid regex"));

static IMPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:import\s+(?:[^'"]+from\s+)?|import\()\s*['"]([^'"]+)['"]"#)
        .expect("valid regex")
});

static NETWORK_HINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:fetch|axios\.(?:get|post|put|delete|patch))\s*\(\s*['"]([^'"]+)['"]"#)
        .expect("valid regex")
});

/// Metadata extracted from one JavaScript source, deduplicated and sorted
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScriptScan {
    pub source_maps: Vec<String>,
    pub imports: Vec<String>,
    pub network_hints: Vec<String>,
}

impl ScriptScan {
    pub fn is_empty(&self) -> bool {
        self.source_maps.is_empty() && self.imports.is_empty() && self.network_hints.is_empty()
    }
}

/// Scans JavaScript text for source maps, imports, and network-call hints
pub fn scan_js(source: &str) -> ScriptScan {
    let source_maps: BTreeSet<String> = SOURCE_MAP_RE
        .captures_iter(source)
        .map(|c| c[1].trim().trim_end_matches(|c| c == '*' || c == '/').to_string())
        .collect();

    let imports: BTreeSet<String> = IMPORT_RE
        .captures_iter(source)
        .map(|c| c[1].to_string())
        .collect();

    let network_hints: BTreeSet<String> = NETWORK_HINT_RE
        .captures_iter(source)
        .map(|c| c[1].to_string())
        .collect();

    ScriptScan {
        source_maps: source_maps.into_iter().collect(),
        imports: imports.into_iter().collect(),
        network_hints: network_hints.into_iter().collect(),
    }
}
