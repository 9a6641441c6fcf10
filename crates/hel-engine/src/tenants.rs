//! Tenant-aware engine routing.
//!
//! One engine is compiled per configured tenant at startup; contexts whose
//! `tenant_id` is absent or unknown go to the default engine.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use hel_core::error::{HelError, Result};
use hel_core::{Decision, PolicyContext};

use crate::config::HelConfig;
use crate::policy::PolicyEngine;

#[derive(Clone)]
pub struct TenantEngines {
    default: Arc<PolicyEngine>,
    by_tenant: HashMap<String, Arc<PolicyEngine>>,
}

impl TenantEngines {
    /// Build all engines. Returns Result so startup fails cleanly instead of panicking.
    pub fn from_config(cfg: &HelConfig) -> Result<Self> {
        let default = Arc::new(cfg.build_engine()?);

        let mut by_tenant = HashMap::new();
        for t in &cfg.tenants {
            let engine = cfg.build_tenant_engine(t).map_err(|e| {
                HelError::InvalidConfig(format!("tenant engine build failed (tenant={}): {e}", t.id))
            })?;
            tracing::info!(tenant = %t.id, profile = %engine.profile(), "tenant engine ready");
            by_tenant.insert(t.id.clone(), Arc::new(engine));
        }

        Ok(Self { default, by_tenant })
    }

    pub fn new(default: Arc<PolicyEngine>) -> Self {
        Self {
            default,
            by_tenant: HashMap::new(),
        }
    }

    pub fn insert(&mut self, tenant_id: impl Into<String>, engine: Arc<PolicyEngine>) {
        self.by_tenant.insert(tenant_id.into(), engine);
    }

    pub fn resolve(&self, tenant_id: Option<&str>) -> Arc<PolicyEngine> {
        tenant_id
            .and_then(|t| self.by_tenant.get(t))
            .unwrap_or(&self.default)
            .clone()
    }

    pub async fn evaluate(&self, ctx: &Value) -> Result<Decision> {
        let ctx = PolicyContext::from_value(ctx.clone())?;
        Ok(self.evaluate_context(&ctx).await)
    }

    pub async fn evaluate_context(&self, ctx: &PolicyContext) -> Decision {
        self.resolve(ctx.tenant_id()).evaluate_context(ctx).await
    }
}
