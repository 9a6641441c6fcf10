use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use hel_core::error::Result;
use hel_core::{extract_host, Decision, PolicyContext};

use crate::evaluator::PolicyEvaluator;

use super::allowlist::{compile_host_patterns, match_host, HostPattern};
use super::profile::{Profile, ProfileTable};

/// What to return when the evaluator is available but fails to produce a
/// policy answer (`rego_error`, `rego_exception`, `rego_timeout`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// The evaluator's deny stands.
    #[default]
    Authoritative,
    /// Fall back to the allowlist baseline.
    Allowlist,
}

/// Two-tier access decision engine.
/// Construct once at startup, then share via Arc.
pub struct PolicyEngine {
    profile: Profile,
    canonical: Vec<HostPattern>,
    overrides: Vec<HostPattern>,
    evaluator: Option<Arc<dyn PolicyEvaluator>>,
    on_failure: FailureMode,
}

impl PolicyEngine {
    /// Engine over the built-in profile table with tenant `allowlist` overrides.
    pub fn new(profile: Profile, allowlist: &[String]) -> Result<Self> {
        Self::with_table(profile, allowlist, &ProfileTable::default())
    }

    pub fn with_table(profile: Profile, allowlist: &[String], table: &ProfileTable) -> Result<Self> {
        if profile == Profile::Unknown {
            tracing::warn!("unrecognized profile; canonical allowlist is empty");
        }
        let overrides = compile_host_patterns(allowlist)?;
        Ok(Self {
            profile,
            canonical: table.resolve(profile),
            overrides,
            evaluator: None,
            on_failure: FailureMode::default(),
        })
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn PolicyEvaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn with_failure_mode(mut self, mode: FailureMode) -> Self {
        self.on_failure = mode;
        self
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    /// Evaluate a raw JSON context.
    ///
    /// Fails only with `InvalidPolicyContext` when `ctx` is not an object;
    /// every other outcome is a decision.
    pub async fn evaluate(&self, ctx: &Value) -> Result<Decision> {
        let ctx = PolicyContext::from_value(ctx.clone())?;
        Ok(self.evaluate_context(&ctx).await)
    }

    pub async fn evaluate_context(&self, ctx: &PolicyContext) -> Decision {
        let host = extract_host(ctx);
        let baseline = self.allowlist_decision(host.as_deref());

        let Some(evaluator) = self.evaluator.as_ref().filter(|e| e.is_available()) else {
            tracing::debug!(
                tenant = ctx.tenant_id().unwrap_or("-"),
                host = host.as_deref().unwrap_or("-"),
                allow = baseline.is_allowed(),
                reason = %baseline.reason(),
                "allowlist decision"
            );
            return baseline;
        };

        let decision = evaluator.evaluate(ctx).await;
        if decision.reason().is_evaluator_failure() {
            tracing::warn!(
                reason = %decision.reason(),
                baseline_allow = baseline.is_allowed(),
                mode = ?self.on_failure,
                "evaluator failed"
            );
            if self.on_failure == FailureMode::Allowlist {
                return fallback(baseline, &decision);
            }
        }

        tracing::debug!(
            tenant = ctx.tenant_id().unwrap_or("-"),
            host = host.as_deref().unwrap_or("-"),
            allow = decision.is_allowed(),
            reason = %decision.reason(),
            "evaluator decision"
        );
        decision
    }

    /// Allowlist tier only.
    pub fn allowlist_decision(&self, host: Option<&str>) -> Decision {
        match_host(self.profile, host, &self.canonical, &self.overrides)
    }
}

fn fallback(baseline: Decision, failed: &Decision) -> Decision {
    let mut details = baseline.details().clone();
    details.insert(
        "evaluator_failure".into(),
        Value::from(failed.reason().as_str()),
    );
    if baseline.is_allowed() {
        Decision::allow(baseline.reason(), details)
    } else {
        Decision::deny(baseline.reason(), details)
    }
}
