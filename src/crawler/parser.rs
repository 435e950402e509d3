//! HTML extraction and link rewriting
//!
//! Given a fetched page, this module discovers outbound references, records
//! form and script metadata, and (when enabled) rewrites reference
//! attributes whose targets have already been mirrored so the saved page
//! browses offline.

use crate::crawler::scripts::{scan_js, ScriptScan};
use crate::url::{canonicalize, ScopePolicy};
use once_cell::sync::Lazy;
use scraper::{Html, Node, Selector};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use url::Url;

static ANCHORS: Lazy<Selector> = Lazy::new(|| selector("a[href]"));
static SCRIPTS: Lazy<Selector> = Lazy::new(|| selector("script"));
static SCRIPTS_WITH_SRC: Lazy<Selector> = Lazy::new(|| selector("script[src]"));
static LINKS_WITH_REL: Lazy<Selector> = Lazy::new(|| selector("link[rel]"));
static LINKS_WITH_HREF: Lazy<Selector> = Lazy::new(|| selector("link[href]"));
static IMAGES: Lazy<Selector> = Lazy::new(|| selector("img[src]"));
static SRCSET_SOURCES: Lazy<Selector> = Lazy::new(|| selector("img[srcset], source[srcset]"));
static FORMS: Lazy<Selector> = Lazy::new(|| selector("form"));
static FORM_FIELDS: Lazy<Selector> = Lazy::new(|| selector("input, textarea, select"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

/// One `<form>` found on a page
#[derive(Debug, Clone, Serialize)]
pub struct FormRecord {
    /// Resolved action URL; absent when the form has no action attribute
    pub action: Option<String>,
    /// Lower-cased method, defaulting to get
    pub method: String,
    pub inputs: Vec<FormInput>,
}

/// One input-like element inside a form
#[derive(Debug, Clone, Serialize)]
pub struct FormInput {
    pub name: Option<String>,
    /// The type attribute, falling back to the tag name (textarea, select)
    #[serde(rename = "type")]
    pub input_type: String,
}

/// Script and form metadata captured from one page
#[derive(Debug, Clone, Serialize)]
pub struct PageSources {
    /// Lexical scan of each non-empty inline script, in document order
    pub inline_scripts: Vec<ScriptScan>,
    /// Absolute URLs of external scripts; deliberately NOT scope-filtered
    pub external_script_urls: Vec<String>,
    pub forms: Vec<FormRecord>,
}

/// Everything extracted from one fetched page
#[derive(Debug)]
pub struct ExtractedPage {
    /// In-scope canonical URLs referenced by the page, deduplicated and
    /// sorted
    pub discovered_links: Vec<String>,
    pub sources: PageSources,
    /// The document to save: rewritten when a local map was supplied,
    /// otherwise the original text untouched
    pub html: String,
}

/// Parses a page, collects references and metadata, and optionally rewrites
/// links to mirrored local paths
///
/// `local_map` maps canonical URLs to paths relative to the host root;
/// passing `Some` enables rewriting. Rewritten values take the form
/// `../<local path>`: pages sit one directory below the host root, so a
/// single parent step reaches it.
pub fn extract_page(
    page_url: &Url,
    html: &str,
    scope: &ScopePolicy,
    local_map: Option<&HashMap<String, PathBuf>>,
) -> ExtractedPage {
    let mut document = Html::parse_document(html);

    let discovered_links = collect_references(&document, page_url, scope);
    let forms = collect_forms(&document, page_url);
    let (inline_scripts, external_script_urls) = collect_scripts(&document, page_url);

    let html = match local_map {
        Some(map) => {
            rewrite_references(&mut document, page_url, map);
            document.root_element().html()
        }
        None => html.to_string(),
    };

    ExtractedPage {
        discovered_links,
        sources: PageSources {
            inline_scripts,
            external_script_urls,
            forms,
        },
        html,
    }
}

/// Collects candidate outbound references and keeps the in-scope ones
fn collect_references(document: &Html, page_url: &Url, scope: &ScopePolicy) -> Vec<String> {
    let mut found = BTreeSet::new();
    let mut push = |raw: &str| {
        if let Some(canon) = resolve_reference(page_url, raw) {
            if scope.allows(&canon) {
                found.insert(canon.to_string());
            }
        }
    };

    for element in document.select(&ANCHORS) {
        if let Some(href) = element.value().attr("href") {
            push(href);
        }
    }
    for element in document.select(&SCRIPTS_WITH_SRC) {
        if let Some(src) = element.value().attr("src") {
            push(src);
        }
    }
    for element in document.select(&LINKS_WITH_REL) {
        let rel = element.value().attr("rel").unwrap_or("");
        if rel.contains("stylesheet") || rel.contains("preload") {
            if let Some(href) = element.value().attr("href") {
                push(href);
            }
        }
    }
    for element in document.select(&IMAGES) {
        if let Some(src) = element.value().attr("src") {
            push(src);
        }
    }
    for element in document.select(&SRCSET_SOURCES) {
        if let Some(srcset) = element.value().attr("srcset") {
            for entry in srcset.split(',') {
                if let Some(candidate) = entry.trim().split(' ').next() {
                    push(candidate);
                }
            }
        }
    }

    found.into_iter().collect()
}

/// Records every form with its resolved action, method, and fields
fn collect_forms(document: &Html, page_url: &Url) -> Vec<FormRecord> {
    let mut forms = Vec::new();
    for form in document.select(&FORMS) {
        let action = form
            .value()
            .attr("action")
            .filter(|a| !a.is_empty())
            .and_then(|a| page_url.join(a).ok())
            .map(|u| u.to_string());

        let method = form
            .value()
            .attr("method")
            .filter(|m| !m.is_empty())
            .unwrap_or("get")
            .to_lowercase();

        let inputs = form
            .select(&FORM_FIELDS)
            .map(|field| FormInput {
                name: field.value().attr("name").map(str::to_string),
                input_type: field
                    .value()
                    .attr("type")
                    .unwrap_or_else(|| field.value().name())
                    .to_string(),
            })
            .collect();

        forms.push(FormRecord {
            action,
            method,
            inputs,
        });
    }
    forms
}

/// Splits scripts into inline bodies (scanned lexically) and external URLs
fn collect_scripts(document: &Html, page_url: &Url) -> (Vec<ScriptScan>, Vec<String>) {
    let mut inline = Vec::new();
    let mut external = Vec::new();

    for element in document.select(&SCRIPTS) {
        match element.value().attr("src") {
            Some(src) => {
                if let Some(canon) = resolve_reference(page_url, src) {
                    external.push(canon.to_string());
                }
            }
            None => {
                let body: String = element.text().collect();
                if !body.trim().is_empty() {
                    inline.push(scan_js(&body));
                }
            }
        }
    }

    (inline, external)
}

/// Rewrites reference attributes whose canonical target is already mirrored
fn rewrite_references(document: &mut Html, page_url: &Url, map: &HashMap<String, PathBuf>) {
    let pairs: [(&Selector, &str); 4] = [
        (&ANCHORS, "href"),
        (&SCRIPTS_WITH_SRC, "src"),
        (&LINKS_WITH_HREF, "href"),
        (&IMAGES, "src"),
    ];

    let mut rewrites = Vec::new();
    for (sel, attr) in pairs {
        for element in document.select(sel) {
            let Some(raw) = element.value().attr(attr) else {
                continue;
            };
            let Some(canon) = resolve_reference(page_url, raw) else {
                continue;
            };
            if let Some(local) = map.get(canon.as_str()) {
                rewrites.push((element.id(), attr, format!("../{}", local.display())));
            }
        }
    }

    for (node_id, attr, replacement) in rewrites {
        if let Some(mut node) = document.tree.get_mut(node_id) {
            if let Node::Element(element) = node.value() {
                for (name, value) in element.attrs.iter_mut() {
                    if name.local.as_ref() == attr {
                        *value = replacement.as_str().into();
                    }
                }
            }
        }
    }
}

/// Resolves a raw reference against the page URL and canonicalizes it
///
/// Empty references are skipped rather than resolved to the page itself.
fn resolve_reference(page_url: &Url, raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let joined = page_url.join(raw).ok()?;
    canonicalize(joined.as_str()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::ScopeMode;

    fn page_url() -> Url {
        Url::parse("http://example.com/").unwrap()
    }

    fn same_origin() -> ScopePolicy {
        ScopePolicy::new(ScopeMode::SameOrigin, page_url())
    }

    fn extract(html: &str) -> ExtractedPage {
        extract_page(&page_url(), html, &same_origin(), None)
    }

    #[test]
    fn test_discovers_in_scope_links_sorted() {
        let html = r#"<html><body>
            <a href="/a">A</a>
            <a href="https://other.com/b">B</a>
            <script src="/app.js"></script>
        </body></html>"#;
        let extracted = extract(html);
        assert_eq!(
            extracted.discovered_links,
            vec!["http://example.com/a", "http://example.com/app.js"]
        );
    }

    #[test]
    fn test_discovers_stylesheet_and_preload_only() {
        let html = r#"<html><head>
            <link rel="stylesheet" href="/main.css">
            <link rel="preload" href="/hero.woff2" as="font">
            <link rel="icon" href="/favicon.ico">
        </head></html>"#;
        let extracted = extract(html);
        assert_eq!(
            extracted.discovered_links,
            vec![
                "http://example.com/hero.woff2",
                "http://example.com/main.css"
            ]
        );
    }

    #[test]
    fn test_discovers_first_srcset_candidate() {
        let html = r#"<img srcset="/img/small.png 480w, /img/big.png 1080w">"#;
        let extracted = extract(html);
        assert_eq!(
            extracted.discovered_links,
            vec![
                "http://example.com/img/big.png",
                "http://example.com/img/small.png"
            ]
        );
    }

    #[test]
    fn test_duplicate_references_deduplicated() {
        let html = r#"<a href="/x">1</a><a href="/x#frag">2</a><a href="/x?utm_source=a">3</a>"#;
        let extracted = extract(html);
        assert_eq!(extracted.discovered_links, vec!["http://example.com/x"]);
    }

    #[test]
    fn test_special_schemes_excluded() {
        let html = r#"
            <a href="mailto:hi@example.com">mail</a>
            <a href="javascript:void(0)">js</a>
            <a href="tel:+15551234">tel</a>
        "#;
        let extracted = extract(html);
        assert!(extracted.discovered_links.is_empty());
    }

    #[test]
    fn test_forms_recorded() {
        let html = r#"<form action="/search" method="POST">
            <input name="q" type="text">
            <input type="submit">
            <textarea name="notes"></textarea>
            <select name="lang"></select>
        </form>
        <form><input name="bare"></form>"#;
        let extracted = extract(html);
        let forms = &extracted.sources.forms;
        assert_eq!(forms.len(), 2);

        assert_eq!(forms[0].action.as_deref(), Some("http://example.com/search"));
        assert_eq!(forms[0].method, "post");
        assert_eq!(forms[0].inputs.len(), 4);
        assert_eq!(forms[0].inputs[0].name.as_deref(), Some("q"));
        assert_eq!(forms[0].inputs[0].input_type, "text");
        assert_eq!(forms[0].inputs[1].name, None);
        assert_eq!(forms[0].inputs[2].input_type, "textarea");
        assert_eq!(forms[0].inputs[3].input_type, "select");

        assert_eq!(forms[1].action, None);
        assert_eq!(forms[1].method, "get");
    }

    #[test]
    fn test_inline_scripts_scanned() {
        let html = r#"
            <script>fetch("/api/data");</script>
            <script>   </script>
            <script src="/app.js"></script>
        "#;
        let extracted = extract(html);
        assert_eq!(extracted.sources.inline_scripts.len(), 1);
        assert_eq!(
            extracted.sources.inline_scripts[0].network_hints,
            vec!["/api/data"]
        );
    }

    #[test]
    fn test_external_scripts_not_scope_filtered() {
        let html = r#"
            <script src="/local.js"></script>
            <script src="https://cdn.example.net/lib.js"></script>
        "#;
        let extracted = extract(html);
        assert_eq!(
            extracted.sources.external_script_urls,
            vec![
                "http://example.com/local.js",
                "https://cdn.example.net/lib.js"
            ]
        );
        // ...but discovery is
        assert_eq!(
            extracted.discovered_links,
            vec!["http://example.com/local.js"]
        );
    }

    #[test]
    fn test_rewrite_replaces_mapped_targets() {
        let mut map = HashMap::new();
        map.insert(
            "http://example.com/about".to_string(),
            PathBuf::from("pages/about/index.html"),
        );
        let html = r#"<a href="/about">About</a><a href="/missing">Missing</a>"#;
        let extracted = extract_page(&page_url(), html, &same_origin(), Some(&map));

        assert!(
            extracted.html.contains(r#"href="../pages/about/index.html""#),
            "rewritten html: {}",
            extracted.html
        );
        // Unmapped targets keep their original reference
        assert!(extracted.html.contains(r#"href="/missing""#));
    }

    #[test]
    fn test_rewrite_covers_scripts_and_images() {
        let mut map = HashMap::new();
        map.insert(
            "http://example.com/app.js".to_string(),
            PathBuf::from("assets/js/app.js"),
        );
        map.insert(
            "http://example.com/logo.png".to_string(),
            PathBuf::from("assets/img/logo.png"),
        );
        let html = r#"<script src="/app.js"></script><img src="/logo.png">"#;
        let extracted = extract_page(&page_url(), html, &same_origin(), Some(&map));

        assert!(extracted.html.contains(r#"src="../assets/js/app.js""#));
        assert!(extracted.html.contains(r#"src="../assets/img/logo.png""#));
    }

    #[test]
    fn test_no_rewrite_returns_original_text() {
        let html = "<html><body><a href=\"/a\">A</a></body></html>";
        let extracted = extract(html);
        assert_eq!(extracted.html, html);
    }
}
