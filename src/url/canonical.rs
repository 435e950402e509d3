use crate::UrlError;
use url::{form_urlencoded, Url};

/// Query parameters removed during canonicalization
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "gclid",
    "fbclid",
];

/// Canonicalizes a URL into the comparable form used as the crawl dedup key
///
/// # Canonicalization Steps
///
/// 1. Parse the URL; scheme-less input gets an `https://` prefix first
/// 2. Drop the fragment entirely
/// 3. Remove query parameters whose lower-cased key is a known tracking
///    parameter (utm_*, gclid, fbclid)
/// 4. Re-encode the remaining query, preserving parameter order and blank
///    values; an emptied query is removed outright
/// 5. Strip trailing slashes from the path, unless the path is exactly `/`
///
/// Canonicalization is idempotent: applying it twice yields the same result
/// as applying it once. Two URLs that differ only by fragment, tracking
/// parameters, or a trailing slash are the same crawl target.
///
/// # Arguments
///
/// * `url_str` - The URL string to canonicalize (must already be absolute,
///   or at least host-leading like `example.com/page`)
///
/// # Returns
///
/// * `Ok(Url)` - Canonical URL
/// * `Err(UrlError)` - The input could not be parsed as a URL
///
/// # Examples
///
/// ```
/// use wapper::url::canonicalize;
///
/// let url = canonicalize("https://example.com/page/?utm_source=x#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/page");
/// ```
pub fn canonicalize(url_str: &str) -> Result<Url, UrlError> {
    let mut url = match Url::parse(url_str) {
        Ok(parsed) => parsed,
        // No scheme present: default to https and try again
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(&format!("https://{}", url_str))
                .map_err(|e| UrlError::Parse(format!("{}: {}", url_str, e)))?
        }
        Err(e) => return Err(UrlError::Parse(format!("{}: {}", url_str, e))),
    };

    url.set_fragment(None);

    if url.query().is_some() {
        let kept = filter_query_params(&url);
        if kept.is_empty() {
            url.set_query(None);
        } else {
            let mut serializer = form_urlencoded::Serializer::new(String::new());
            for (key, value) in &kept {
                serializer.append_pair(key, value);
            }
            let query = serializer.finish();
            url.set_query(Some(&query));
        }
    }

    let path = url.path();
    if path != "/" && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() {
            "/".to_string()
        } else {
            trimmed.to_string()
        };
        url.set_path(&normalized);
    }

    Ok(url)
}

/// Filters out tracking parameters, keeping the original parameter order
fn filter_query_params(url: &Url) -> Vec<(String, String)> {
    url.query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Checks if a query parameter key is a known tracking parameter
fn is_tracking_param(key: &str) -> bool {
    let key = key.to_lowercase();
    TRACKING_PARAMS.contains(&key.as_str())
}
