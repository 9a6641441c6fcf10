//! Profiles and the curated per-profile host table.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::allowlist::HostPattern;

/// Vetted destinations for the `medium` profile.
///
/// Replaceable from config (`profiles.medium`); this is only the table that
/// ships with the crate.
pub const DEFAULT_MEDIUM_ALLOWLIST: &[&str] = &[
    "api.openai.com",
    "api.anthropic.com",
    "generativelanguage.googleapis.com",
    "api.mistral.ai",
    "api.cohere.com",
    "api.groq.com",
    "openrouter.ai",
    "huggingface.co",
    "api.github.com",
    "pypi.org",
    "files.pythonhosted.org",
    "registry.npmjs.org",
    "crates.io",
    "static.crates.io",
];

pub const DEFAULT_PROFILE_TABLE_VERSION: u32 = 1;

/// Named preset selecting a canonical allowlist.
///
/// Names other than `open`, `medium`, `strict` parse as [`Profile::Unknown`],
/// which resolves to an empty allowlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Profile {
    Open,
    #[default]
    Medium,
    Strict,
    Unknown,
}

impl Profile {
    pub fn from_name(name: &str) -> Self {
        match name {
            "open" => Profile::Open,
            "medium" => Profile::Medium,
            "strict" => Profile::Strict,
            _ => Profile::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Profile::Open => "open",
            Profile::Medium => "medium",
            Profile::Strict => "strict",
            Profile::Unknown => "unknown",
        }
    }
}

impl From<String> for Profile {
    fn from(s: String) -> Self {
        Profile::from_name(&s)
    }
}

impl From<Profile> for String {
    fn from(p: Profile) -> Self {
        p.as_str().to_string()
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Versioned table of curated host patterns per profile.
#[derive(Debug, Clone)]
pub struct ProfileTable {
    version: u32,
    medium: Vec<HostPattern>,
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self {
            version: DEFAULT_PROFILE_TABLE_VERSION,
            medium: DEFAULT_MEDIUM_ALLOWLIST
                .iter()
                .map(|h| HostPattern::Domain((*h).to_string()))
                .collect(),
        }
    }
}

impl ProfileTable {
    pub fn new(version: u32, medium: Vec<HostPattern>) -> Self {
        Self { version, medium }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Canonical allowlist for `profile`, in table order.
    pub fn resolve(&self, profile: Profile) -> Vec<HostPattern> {
        match profile {
            Profile::Open => vec![HostPattern::Wildcard],
            Profile::Medium => self.medium.clone(),
            Profile::Strict | Profile::Unknown => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_resolves_to_wildcard() {
        let t = ProfileTable::default();
        assert_eq!(t.resolve(Profile::Open), vec![HostPattern::Wildcard]);
    }

    #[test]
    fn strict_and_unknown_are_empty() {
        let t = ProfileTable::default();
        assert!(t.resolve(Profile::Strict).is_empty());
        assert!(t.resolve(Profile::from_name("paranoid")).is_empty());
    }

    #[test]
    fn medium_uses_table_order() {
        let t = ProfileTable::new(
            7,
            vec![
                HostPattern::Domain("b.example".into()),
                HostPattern::Domain("a.example".into()),
            ],
        );
        assert_eq!(t.version(), 7);
        assert_eq!(
            t.resolve(Profile::Medium),
            vec![HostPattern::Domain("b.example".into()), HostPattern::Domain("a.example".into())]
        );
    }

    #[test]
    fn default_medium_includes_openai() {
        let t = ProfileTable::default();
        assert!(t
            .resolve(Profile::Medium)
            .contains(&HostPattern::Domain("api.openai.com".into())));
    }

    #[test]
    fn profile_names_roundtrip() {
        for p in [Profile::Open, Profile::Medium, Profile::Strict] {
            assert_eq!(Profile::from_name(p.as_str()), p);
        }
        assert_eq!(Profile::from_name("OPEN"), Profile::Unknown);
    }
}
