//! Host extraction from a policy context.

use url::{Host, Url};

use crate::context::PolicyContext;

/// Derive the candidate destination host for `ctx`.
///
/// A non-empty `host` field wins and is returned verbatim. Otherwise the
/// hostname of `forward_url` is used, lowercased. An unparsable URL, or one
/// without a host component, yields `None`; this never fails.
pub fn extract_host(ctx: &PolicyContext) -> Option<String> {
    if let Some(host) = ctx.host().filter(|h| !h.is_empty()) {
        return Some(host.to_string());
    }
    ctx.forward_url()
        .filter(|u| !u.is_empty())
        .and_then(hostname_of)
}

fn hostname_of(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    match url.host()? {
        Host::Domain(d) if d.is_empty() => None,
        // special schemes are already lowercased by the parser; opaque ones are not
        Host::Domain(d) => Some(d.to_ascii_lowercase()),
        Host::Ipv4(ip) => Some(ip.to_string()),
        // bracket-free, same as the literal an allowlist would carry
        Host::Ipv6(ip) => Some(ip.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url_ctx(u: &str) -> PolicyContext {
        PolicyContext::new().with_forward_url(u)
    }

    #[test]
    fn host_field_wins_over_url() {
        let ctx = url_ctx("https://other.example/x").with_host("api.example.com");
        assert_eq!(extract_host(&ctx).as_deref(), Some("api.example.com"));
    }

    #[test]
    fn empty_host_falls_back_to_url() {
        let ctx = url_ctx("https://example.com/path").with_host("");
        assert_eq!(extract_host(&ctx).as_deref(), Some("example.com"));
    }

    #[test]
    fn url_port_and_userinfo_are_stripped() {
        let ctx = url_ctx("https://user:pw@api.example.com:8443/v1?q=1");
        assert_eq!(extract_host(&ctx).as_deref(), Some("api.example.com"));
    }

    #[test]
    fn url_host_is_lowercased_for_any_scheme() {
        for raw in ["foo://API.Example.com/x", "HTTPS://API.Example.COM/x"] {
            assert_eq!(extract_host(&url_ctx(raw)).as_deref(), Some("api.example.com"), "{raw}");
        }
    }

    #[test]
    fn ipv6_literal_has_no_brackets() {
        let ctx = url_ctx("http://[::1]:8080/");
        assert_eq!(extract_host(&ctx).as_deref(), Some("::1"));
    }

    #[test]
    fn malformed_urls_yield_none() {
        for raw in ["not-a-url", ":not-a-url", "http://", "mailto:a@b.c", "://x"] {
            assert_eq!(extract_host(&url_ctx(raw)), None, "{raw}");
        }
    }

    #[test]
    fn nothing_to_extract() {
        assert_eq!(extract_host(&PolicyContext::new()), None);
    }
}
