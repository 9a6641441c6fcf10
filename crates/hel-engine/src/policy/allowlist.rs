//! Allowlist compilation and host matching.
//!
//! Entries are either the universal wildcard `*` or a domain. A domain
//! matches itself and any dot-delimited subdomain; it never matches by bare
//! substring (`evilexample.com` is not under `example.com`).

use serde_json::Value;

use hel_core::decision::details;
use hel_core::error::{HelError, Result};
use hel_core::{Decision, Reason};

use super::profile::Profile;

/// Compiled allowlist entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostPattern {
    Wildcard,
    Domain(String),
}

impl HostPattern {
    pub fn as_str(&self) -> &str {
        match self {
            HostPattern::Wildcard => "*",
            HostPattern::Domain(d) => d,
        }
    }

    /// Exact match or proper subdomain on a label boundary.
    pub fn matches(&self, host: &str) -> bool {
        match self {
            HostPattern::Wildcard => true,
            HostPattern::Domain(d) => {
                host == d.as_str()
                    || host
                        .strip_suffix(d.as_str())
                        .is_some_and(|prefix| prefix.ends_with('.'))
            }
        }
    }
}

pub fn compile_host_patterns(raw: &[String]) -> Result<Vec<HostPattern>> {
    let mut out = Vec::with_capacity(raw.len());
    for s in raw {
        let s = s.trim();
        if s.is_empty() {
            return Err(HelError::InvalidConfig("empty allowlist entry".into()));
        }
        if s == "*" {
            out.push(HostPattern::Wildcard);
            continue;
        }
        // "*.example.com" would only ever match literally; subdomains of a
        // bare entry already match.
        if s.contains('*') {
            return Err(HelError::InvalidConfig(format!(
                "invalid allowlist entry: {s} (use \"*\" or a bare domain)"
            )));
        }
        out.push(HostPattern::Domain(s.to_string()));
    }
    Ok(out)
}

/// Baseline allowlist decision.
///
/// `canonical` is checked before `overrides`; the first matching entry wins
/// and is recorded under `match`.
pub fn match_host(
    profile: Profile,
    host: Option<&str>,
    canonical: &[HostPattern],
    overrides: &[HostPattern],
) -> Decision {
    let profile_name = Value::from(profile.as_str());

    if profile == Profile::Open {
        return Decision::allow(Reason::ProfileOpen, details([("profile", profile_name)]));
    }

    let Some(host) = host else {
        return Decision::deny(Reason::NoHost, details([("profile", profile_name)]));
    };

    for entry in canonical.iter().chain(overrides) {
        match entry {
            HostPattern::Wildcard => {
                return Decision::allow(
                    Reason::Wildcard,
                    details([("host", Value::from(host)), ("profile", profile_name)]),
                );
            }
            HostPattern::Domain(d) if entry.matches(host) => {
                return Decision::allow(
                    Reason::HostAllowed,
                    details([
                        ("host", Value::from(host)),
                        ("match", Value::from(d.as_str())),
                        ("profile", profile_name),
                    ]),
                );
            }
            HostPattern::Domain(_) => {}
        }
    }

    Decision::deny(
        Reason::HostDenied,
        details([("host", Value::from(host)), ("profile", profile_name)]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pats(raw: &[&str]) -> Vec<HostPattern> {
        let raw: Vec<String> = raw.iter().map(|s| s.to_string()).collect();
        compile_host_patterns(&raw).unwrap()
    }

    #[test]
    fn exact_and_subdomain_match() {
        let p = HostPattern::Domain("example.com".into());
        assert!(p.matches("example.com"));
        assert!(p.matches("x.example.com"));
        assert!(p.matches("a.b.example.com"));
    }

    #[test]
    fn no_substring_match() {
        let p = HostPattern::Domain("example.com".into());
        assert!(!p.matches("evilexample.com"));
        assert!(!p.matches("example.com.evil.net"));
        assert!(!p.matches("xample.com"));
    }

    #[test]
    fn compile_rejects_empty_and_embedded_wildcards() {
        assert!(compile_host_patterns(&["".to_string()]).is_err());
        assert!(compile_host_patterns(&["  ".to_string()]).is_err());
        assert!(compile_host_patterns(&["*.example.com".to_string()]).is_err());
        assert_eq!(
            pats(&["*", " example.com "]),
            vec![
                HostPattern::Wildcard,
                HostPattern::Domain("example.com".into())
            ]
        );
    }

    #[test]
    fn open_profile_ignores_host() {
        let d = match_host(Profile::Open, None, &[HostPattern::Wildcard], &[]);
        assert!(d.is_allowed());
        assert_eq!(d.reason(), Reason::ProfileOpen);
        assert_eq!(d.detail("profile"), Some(&json!("open")));
    }

    #[test]
    fn missing_host_denies() {
        let d = match_host(Profile::Strict, None, &[], &pats(&["*"]));
        assert!(!d.is_allowed());
        assert_eq!(d.reason(), Reason::NoHost);
    }

    #[test]
    fn wildcard_in_overrides_allows() {
        let d = match_host(Profile::Strict, Some("anything.com"), &[], &pats(&["*"]));
        assert!(d.is_allowed());
        assert_eq!(d.reason(), Reason::Wildcard);
    }

    #[test]
    fn canonical_entry_recorded_before_override() {
        let d = match_host(
            Profile::Medium,
            Some("api.example.com"),
            &pats(&["example.com"]),
            &pats(&["api.example.com"]),
        );
        assert_eq!(d.reason(), Reason::HostAllowed);
        assert_eq!(d.detail("match"), Some(&json!("example.com")));
    }

    #[test]
    fn overrides_are_additive() {
        let canonical = pats(&["api.openai.com"]);
        let overrides = pats(&["internal.example.com"]);
        assert!(
            match_host(Profile::Medium, Some("api.openai.com"), &canonical, &overrides).is_allowed()
        );
        assert!(match_host(
            Profile::Medium,
            Some("internal.example.com"),
            &canonical,
            &overrides
        )
        .is_allowed());
    }

    #[test]
    fn unmatched_host_denied() {
        let d = match_host(Profile::Strict, Some("bar.com"), &[], &pats(&["foo.com"]));
        assert!(!d.is_allowed());
        assert_eq!(d.reason(), Reason::HostDenied);
        assert_eq!(d.detail("host"), Some(&json!("bar.com")));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_domain() -> impl Strategy<Value = String> {
        "[a-z0-9]{1,10}(\\.[a-z0-9]{1,10}){0,3}"
    }

    fn arb_domains() -> impl Strategy<Value = Vec<HostPattern>> {
        prop::collection::vec(arb_domain().prop_map(HostPattern::Domain), 0..4)
    }

    proptest! {
        #[test]
        fn entry_allows_itself(e in arb_domain()) {
            let entry = [HostPattern::Domain(e.clone())];
            let d = match_host(Profile::Strict, Some(e.as_str()), &entry, &[]);
            prop_assert!(d.is_allowed());
            prop_assert_eq!(d.reason(), Reason::HostAllowed);
        }

        #[test]
        fn entry_allows_any_subdomain(e in arb_domain(), label in "[a-z0-9-]{1,10}") {
            let host = format!("{label}.{e}");
            prop_assert!(HostPattern::Domain(e).matches(&host));
        }

        #[test]
        fn entry_never_matches_a_glued_prefix(e in arb_domain(), glue in "[a-z0-9-]{1,10}") {
            let host = format!("{glue}{e}");
            prop_assert!(!HostPattern::Domain(e.clone()).matches(&host));
            let entry = [HostPattern::Domain(e)];
            let d = match_host(Profile::Strict, Some(host.as_str()), &entry, &[]);
            prop_assert_eq!(d.reason(), Reason::HostDenied);
        }

        #[test]
        fn overrides_only_add_hosts(
            canonical in arb_domains(),
            overrides in arb_domains(),
            host in arb_domain(),
        ) {
            let h = Some(host.as_str());
            let combined = match_host(Profile::Medium, h, &canonical, &overrides).is_allowed();
            let by_canonical = match_host(Profile::Medium, h, &canonical, &[]).is_allowed();
            let by_overrides = match_host(Profile::Medium, h, &[], &overrides).is_allowed();
            prop_assert_eq!(combined, by_canonical || by_overrides);
        }
    }
}
