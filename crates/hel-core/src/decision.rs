//! Decision value returned by every evaluation.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which tier produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Allowlist,
    Rego,
}

impl EngineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EngineKind::Allowlist => "allowlist",
            EngineKind::Rego => "rego",
        }
    }
}

/// Machine-readable reason (fixed vocabulary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    ProfileOpen,
    NoHost,
    Wildcard,
    HostAllowed,
    HostDenied,
    RegoError,
    RegoAllow,
    RegoDeny,
    RegoException,
    RegoTimeout,
}

impl Reason {
    pub fn as_str(self) -> &'static str {
        match self {
            Reason::ProfileOpen => "profile_open",
            Reason::NoHost => "no_host",
            Reason::Wildcard => "wildcard",
            Reason::HostAllowed => "host_allowed",
            Reason::HostDenied => "host_denied",
            Reason::RegoError => "rego_error",
            Reason::RegoAllow => "rego_allow",
            Reason::RegoDeny => "rego_deny",
            Reason::RegoException => "rego_exception",
            Reason::RegoTimeout => "rego_timeout",
        }
    }

    /// Tier that may emit this reason.
    pub fn engine(self) -> EngineKind {
        match self {
            Reason::ProfileOpen
            | Reason::NoHost
            | Reason::Wildcard
            | Reason::HostAllowed
            | Reason::HostDenied => EngineKind::Allowlist,
            _ => EngineKind::Rego,
        }
    }

    /// Evaluator infrastructure failed (as opposed to the policy denying).
    pub fn is_evaluator_failure(self) -> bool {
        matches!(self, Reason::RegoError | Reason::RegoException | Reason::RegoTimeout)
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable outcome of one evaluation.
///
/// The producing tier is derived from the reason, so `engine` can never
/// disagree with `reason`. That holds for deserialized decisions too: an
/// incoming `engine` field is ignored and recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "DecisionWire")]
pub struct Decision {
    allow: bool,
    engine: EngineKind,
    reason: Reason,
    details: Map<String, Value>,
}

impl Decision {
    pub fn allow(reason: Reason, details: Map<String, Value>) -> Self {
        Self::new(true, reason, details)
    }

    pub fn deny(reason: Reason, details: Map<String, Value>) -> Self {
        Self::new(false, reason, details)
    }

    fn new(allow: bool, reason: Reason, details: Map<String, Value>) -> Self {
        Self {
            allow,
            engine: reason.engine(),
            reason,
            details,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.allow
    }
    pub fn engine(&self) -> EngineKind {
        self.engine
    }
    pub fn reason(&self) -> Reason {
        self.reason
    }
    pub fn details(&self) -> &Map<String, Value> {
        &self.details
    }
    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }
}

#[derive(Deserialize)]
struct DecisionWire {
    allow: bool,
    reason: Reason,
    #[serde(default)]
    details: Map<String, Value>,
}

impl From<DecisionWire> for Decision {
    fn from(w: DecisionWire) -> Self {
        Decision::new(w.allow, w.reason, w.details)
    }
}

/// Build a details map from `(key, value)` pairs.
pub fn details<I, K, V>(pairs: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
