use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use hel_core::error::{HelError, Result};

use crate::evaluator::{OpaEvaluator, DEFAULT_OPA_BIN, DEFAULT_QUERY};
use crate::policy::allowlist::compile_host_patterns;
use crate::policy::profile::{DEFAULT_MEDIUM_ALLOWLIST, DEFAULT_PROFILE_TABLE_VERSION};
use crate::policy::{FailureMode, PolicyEngine, Profile, ProfileTable};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HelConfig {
    pub version: u32,

    #[serde(default)]
    pub engine: EngineSection,

    #[serde(default)]
    pub profiles: ProfilesSection,

    #[serde(default)]
    pub tenants: Vec<TenantConfig>,
}

impl HelConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(HelError::UnsupportedVersion);
        }

        self.engine.validate()?;
        self.profiles.validate()?;

        let mut seen = HashSet::new();
        for t in &self.tenants {
            if t.id.trim().is_empty() {
                return Err(HelError::InvalidConfig("tenants[].id must not be empty".into()));
            }
            if !seen.insert(t.id.as_str()) {
                return Err(HelError::InvalidConfig(format!("duplicate tenant id: {}", t.id)));
            }
            compile_host_patterns(&t.allowlist).map_err(|e| {
                HelError::InvalidConfig(format!("tenant {}: {e}", t.id))
            })?;
        }
        Ok(())
    }

    pub fn profile_table(&self) -> Result<ProfileTable> {
        self.profiles.to_table()
    }

    /// Engine for callers outside any configured tenant.
    pub fn build_engine(&self) -> Result<PolicyEngine> {
        self.build_engine_with(self.engine.profile, &self.engine.allowlist)
    }

    /// Engine for `tenant`: its allowlist is layered after the engine's.
    pub fn build_tenant_engine(&self, tenant: &TenantConfig) -> Result<PolicyEngine> {
        let mut allowlist = self.engine.allowlist.clone();
        allowlist.extend(tenant.allowlist.iter().cloned());
        self.build_engine_with(tenant.profile.unwrap_or(self.engine.profile), &allowlist)
    }

    fn build_engine_with(&self, profile: Profile, allowlist: &[String]) -> Result<PolicyEngine> {
        let table = self.profile_table()?;
        let mut engine = PolicyEngine::with_table(profile, allowlist, &table)?;
        if let Some(ev) = &self.engine.evaluator {
            engine = engine
                .with_evaluator(Arc::new(ev.to_evaluator()))
                .with_failure_mode(ev.on_failure);
        }
        Ok(engine)
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct EngineSection {
    #[serde(default)]
    pub profile: Profile,

    #[serde(default)]
    pub allowlist: Vec<String>,

    #[serde(default)]
    pub evaluator: Option<EvaluatorSection>,
}

impl EngineSection {
    pub fn validate(&self) -> Result<()> {
        if self.profile == Profile::Unknown {
            tracing::warn!("engine.profile is not open/medium/strict; failing closed to an empty allowlist");
        }
        compile_host_patterns(&self.allowlist)
            .map_err(|e| HelError::InvalidConfig(format!("engine.allowlist: {e}")))?;
        if let Some(ev) = &self.evaluator {
            ev.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluatorSection {
    #[serde(default = "default_bin")]
    pub bin: String,

    pub policy_path: PathBuf,

    #[serde(default = "default_query")]
    pub query: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub on_failure: FailureMode,
}

impl EvaluatorSection {
    pub fn validate(&self) -> Result<()> {
        if self.bin.trim().is_empty() {
            return Err(HelError::InvalidConfig("engine.evaluator.bin must not be empty".into()));
        }
        if self.query.trim().is_empty() {
            return Err(HelError::InvalidConfig("engine.evaluator.query must not be empty".into()));
        }
        if !(100..=60000).contains(&self.timeout_ms) {
            return Err(HelError::InvalidConfig(
                "engine.evaluator.timeout_ms must be between 100 and 60000".into(),
            ));
        }
        Ok(())
    }

    pub fn to_evaluator(&self) -> OpaEvaluator {
        OpaEvaluator::new(self.bin.clone(), self.policy_path.clone())
            .with_query(self.query.clone())
            .with_timeout(Duration::from_millis(self.timeout_ms))
    }
}

fn default_bin() -> String {
    DEFAULT_OPA_BIN.into()
}
fn default_query() -> String {
    DEFAULT_QUERY.into()
}
fn default_timeout_ms() -> u64 {
    5000
}

/// Curated profile table; replaces the built-in one when present.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfilesSection {
    #[serde(default = "default_table_version")]
    pub version: u32,

    #[serde(default = "default_medium")]
    pub medium: Vec<String>,
}

impl Default for ProfilesSection {
    fn default() -> Self {
        Self {
            version: default_table_version(),
            medium: default_medium(),
        }
    }
}

impl ProfilesSection {
    pub fn validate(&self) -> Result<()> {
        if self.version == 0 {
            return Err(HelError::InvalidConfig("profiles.version must be >= 1".into()));
        }
        self.to_table().map(|_| ())
    }

    pub fn to_table(&self) -> Result<ProfileTable> {
        let medium = compile_host_patterns(&self.medium)
            .map_err(|e| HelError::InvalidConfig(format!("profiles.medium: {e}")))?;
        Ok(ProfileTable::new(self.version, medium))
    }
}

fn default_table_version() -> u32 {
    DEFAULT_PROFILE_TABLE_VERSION
}
fn default_medium() -> Vec<String> {
    DEFAULT_MEDIUM_ALLOWLIST.iter().map(|h| (*h).to_string()).collect()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TenantConfig {
    pub id: String,

    #[serde(default)]
    pub profile: Option<Profile>,

    #[serde(default)]
    pub allowlist: Vec<String>,
}
