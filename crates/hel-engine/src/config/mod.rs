//! Engine config loader (strict parsing).

pub mod schema;

use std::fs;
use std::path::Path;

use hel_core::error::{HelError, Result};

pub use schema::{EngineSection, EvaluatorSection, HelConfig, ProfilesSection, TenantConfig};

pub fn load_from_file(path: impl AsRef<Path>) -> Result<HelConfig> {
    let path = path.as_ref();
    let s = fs::read_to_string(path).map_err(|e| {
        HelError::InvalidConfig(format!("read config {} failed: {e}", path.display()))
    })?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<HelConfig> {
    let cfg: HelConfig = serde_yaml::from_str(s)
        .map_err(|e| HelError::InvalidConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
