//! Cookie domain selection.
//!
//! Analytics identifiers should be shared by all hosts of a site, so by
//! default cookies are scoped to the *highest available domain*: the
//! registrable domain (eTLD+1) according to the Public Suffix List. A cookie
//! is never scoped to a public suffix itself.

use psl::{List, Psl};
use url::{Host, Url};

/// Get the registrable domain (eTLD+1) for a host.
/// For "sub.example.com", returns "example.com".
/// For "com" (public suffix), returns None.
pub fn registrable_domain(host: &str) -> Option<String> {
    let host = host.to_lowercase();
    List.domain(host.as_bytes())
        .and_then(|d| std::str::from_utf8(d.as_bytes()).ok())
        .map(|s| s.to_string())
}

/// Domain a cookie set from `location` is scoped to.
///
/// IP addresses and hosts without a registrable domain (e.g. `localhost`)
/// always get the exact host.
pub fn cookie_domain(location: &Url, highest_available: bool) -> Option<String> {
    match location.host()? {
        Host::Domain(domain) => {
            let host = domain.to_ascii_lowercase();
            if highest_available {
                if let Some(registrable) = registrable_domain(&host) {
                    return Some(registrable);
                }
            }
            Some(host)
        }
        Host::Ipv4(_) | Host::Ipv6(_) => location.host_str().map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_registrable_domain() {
        assert_eq!(registrable_domain("example.com"), Some("example.com".to_string()));
        assert_eq!(registrable_domain("deep.sub.example.com"), Some("example.com".to_string()));
        assert_eq!(registrable_domain("sub.example.co.uk"), Some("example.co.uk".to_string()));
        assert_eq!(registrable_domain("com"), None);
        assert_eq!(registrable_domain("co.uk"), None);
    }

    #[test]
    fn highest_available_domain() {
        assert_eq!(cookie_domain(&url("https://www.example.com/"), true).as_deref(), Some("example.com"));
        assert_eq!(cookie_domain(&url("https://www.example.com/"), false).as_deref(), Some("www.example.com"));
        assert_eq!(cookie_domain(&url("https://user.github.io/"), true).as_deref(), Some("user.github.io"));
    }

    #[test]
    fn ip_hosts_and_hostless_urls() {
        assert_eq!(cookie_domain(&url("http://127.0.0.1:8000/"), true).as_deref(), Some("127.0.0.1"));
        assert_eq!(cookie_domain(&url("file:///tmp/index.html"), true), None);
    }
}
