//! hel engine library entry.
//!
//! This crate wires profile resolution, allowlist matching, delegated
//! evaluation, and tenant routing into a single decision engine. It is
//! intended to be consumed by the binary (`main.rs`) and by integration tests.

pub mod config;
pub mod evaluator;
pub mod policy;
pub mod tenants;

pub use evaluator::{OpaEvaluator, PolicyEvaluator};
pub use policy::{FailureMode, PolicyEngine, Profile, ProfileTable};
pub use tenants::TenantEngines;
