use std::fmt;
use std::str::FromStr;
use url::Url;

/// Schemes that are never crawlable, regardless of scope mode
const EXCLUDED_SCHEMES: &[&str] = &["mailto", "tel", "javascript", "data"];

/// Scope rule for deciding which URLs are eligible for crawling
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScopeMode {
    /// Scheme and host must both match the seed's
    SameOrigin,
    /// Host must match the seed's; scheme may differ
    SameHost,
    /// Everything with a crawlable scheme is in scope
    All,
}

impl ScopeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SameOrigin => "same-origin",
            Self::SameHost => "same-host",
            Self::All => "all",
        }
    }
}

impl fmt::Display for ScopeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScopeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "same-origin" => Ok(Self::SameOrigin),
            "same-host" => Ok(Self::SameHost),
            "all" => Ok(Self::All),
            other => Err(format!(
                "unknown scope '{}', expected same-origin|same-host|all",
                other
            )),
        }
    }
}

/// Scope policy anchored at the canonical seed URL
///
/// The policy gates both the initial enqueue and every discovered link:
/// a URL that fails `allows` is dropped, never queued, and never logged.
#[derive(Debug, Clone)]
pub struct ScopePolicy {
    mode: ScopeMode,
    base: Url,
}

impl ScopePolicy {
    /// Creates a policy anchored at the given (already canonical) seed URL
    pub fn new(mode: ScopeMode, base: Url) -> Self {
        Self { mode, base }
    }

    pub fn mode(&self) -> ScopeMode {
        self.mode
    }

    /// Checks whether a canonical URL is in scope for this crawl
    pub fn allows(&self, url: &Url) -> bool {
        if EXCLUDED_SCHEMES.contains(&url.scheme()) {
            return false;
        }

        match self.mode {
            ScopeMode::SameOrigin => {
                url.scheme() == self.base.scheme() && same_host(url, &self.base)
            }
            ScopeMode::SameHost => same_host(url, &self.base),
            ScopeMode::All => true,
        }
    }
}

/// Compares host and port, the way `netloc` comparison behaves after the
/// URL parser has already stripped default ports
fn same_host(a: &Url, b: &Url) -> bool {
    a.host_str() == b.host_str() && a.port() == b.port()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(mode: ScopeMode) -> ScopePolicy {
        ScopePolicy::new(mode, Url::parse("http://example.com/").unwrap())
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_same_origin_accepts_same_scheme_and_host() {
        let p = policy(ScopeMode::SameOrigin);
        assert!(p.allows(&url("http://example.com/page")));
    }

    #[test]
    fn test_same_origin_rejects_other_host() {
        let p = policy(ScopeMode::SameOrigin);
        assert!(!p.allows(&url("http://other.com/page")));
    }

    #[test]
    fn test_same_origin_rejects_other_scheme() {
        let p = policy(ScopeMode::SameOrigin);
        assert!(!p.allows(&url("https://example.com/page")));
    }

    #[test]
    fn test_same_host_accepts_other_scheme() {
        let p = policy(ScopeMode::SameHost);
        assert!(p.allows(&url("https://example.com/page")));
    }

    #[test]
    fn test_same_host_rejects_other_host() {
        let p = policy(ScopeMode::SameHost);
        assert!(!p.allows(&url("https://sub.example.com/page")));
    }

    #[test]
    fn test_all_accepts_any_host() {
        let p = policy(ScopeMode::All);
        assert!(p.allows(&url("https://anywhere.org/")));
    }

    #[test]
    fn test_excluded_schemes_rejected_in_every_mode() {
        for mode in [ScopeMode::SameOrigin, ScopeMode::SameHost, ScopeMode::All] {
            let p = policy(mode);
            assert!(!p.allows(&url("mailto:a@example.com")));
            assert!(!p.allows(&url("tel:+123456789")));
            assert!(!p.allows(&url("javascript:void(0)")));
            assert!(!p.allows(&url("data:text/plain,hello")));
        }
    }

    #[test]
    fn test_port_is_part_of_the_host_identity() {
        let p = ScopePolicy::new(
            ScopeMode::SameOrigin,
            Url::parse("http://127.0.0.1:8080/").unwrap(),
        );
        assert!(p.allows(&url("http://127.0.0.1:8080/x")));
        assert!(!p.allows(&url("http://127.0.0.1:9090/x")));
    }

    #[test]
    fn test_scope_mode_round_trip() {
        for mode in [ScopeMode::SameOrigin, ScopeMode::SameHost, ScopeMode::All] {
            let parsed: ScopeMode = mode.as_str().parse().unwrap();
            assert_eq!(parsed, mode);
        }
        assert!("bogus".parse::<ScopeMode>().is_err());
    }
}
