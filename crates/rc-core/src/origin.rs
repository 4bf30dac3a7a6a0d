//! Origin resolution
//!
//! Turns a tab URL into the canonical origin key the allow-list and the
//! permission patterns are built from. Anything that is not an http(s) page
//! (browser-internal pages, `about:`, `file:`, malformed strings) has no
//! origin as far as the extension is concerned.

use std::fmt;

use serde::Serialize;
use ts_rs::TS;
use url::Url;

// =============================================================================
// Origin
// =============================================================================

/// Canonical `scheme://host[:port]` of a supported page.
///
/// Only [`resolve_origin`] constructs values, so every `Origin` is already in
/// canonical form and two origins are equal iff their strings are equal.
/// Serializes (and exports to TypeScript) as the bare string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, TS)]
pub struct Origin(String);

impl Origin {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Host permission pattern covering every path of this origin.
    pub fn match_pattern(&self) -> String {
        format!("{}/*", self.0)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Origin {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Resolve a page URL to its canonical origin.
///
/// Returns `None` for unsupported schemes and unparsable input. Default ports
/// are dropped, hosts are lower-cased (IDN hosts in punycode), and userinfo,
/// path, query and fragment never survive.
pub fn resolve_origin(url: &str) -> Option<Origin> {
    let parsed = Url::parse(url.trim()).ok()?;
    match parsed.scheme() {
        "http" | "https" => {}
        _ => return None,
    }
    parsed.host_str().filter(|host| !host.is_empty())?;

    let origin = parsed.origin();
    if !origin.is_tuple() {
        return None;
    }
    Some(Origin(origin.ascii_serialization()))
}

/// Resolve a tab URL that may be absent (tabs without host access report no URL).
#[inline]
pub fn resolve_tab_origin(url: Option<&str>) -> Option<Origin> {
    url.and_then(resolve_origin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_https() {
        let origin = resolve_origin("https://a.example/path/to?q=1#frag").unwrap();
        assert_eq!(origin.as_str(), "https://a.example");
        assert_eq!(origin.match_pattern(), "https://a.example/*");
    }

    #[test]
    fn test_resolve_ports() {
        assert_eq!(resolve_origin("https://a.example:443/").unwrap().as_str(), "https://a.example");
        assert_eq!(resolve_origin("http://a.example:80").unwrap().as_str(), "http://a.example");
        assert_eq!(
            resolve_origin("http://localhost:8080/app").unwrap().as_str(),
            "http://localhost:8080"
        );
    }

    #[test]
    fn test_resolve_normalizes_case_and_userinfo() {
        let origin = resolve_origin("HTTPS://user:pw@Sub.A.Example/X").unwrap();
        assert_eq!(origin.as_str(), "https://sub.a.example");
    }

    #[test]
    fn test_resolve_ip_hosts() {
        assert_eq!(resolve_origin("http://127.0.0.1:3000/").unwrap().as_str(), "http://127.0.0.1:3000");
        assert_eq!(resolve_origin("http://[::1]/").unwrap().as_str(), "http://[::1]");
    }

    #[test]
    fn test_unsupported() {
        for url in [
            "chrome://extensions",
            "chrome-extension://abcdef/popup.html",
            "about:blank",
            "file:///etc/hosts",
            "ftp://a.example/",
            "data:text/html,hi",
            "javascript:void(0)",
            "not a url",
            "",
            "https://",
        ] {
            assert!(resolve_origin(url).is_none(), "{url} should be unsupported");
        }
        assert!(resolve_tab_origin(None).is_none());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let origin = resolve_origin("https://a.example/x").unwrap();
        assert_eq!(serde_json::to_value(&origin).unwrap(), serde_json::json!("https://a.example"));
    }

    #[test]
    fn test_resolve_is_stable() {
        let first = resolve_origin("https://a.example/one").unwrap();
        let second = resolve_origin(first.as_str()).unwrap();
        assert_eq!(first, second);
        assert_eq!(resolve_tab_origin(Some("https://a.example/two")), Some(first));
    }
}
