//! Policy layer (profiles, allowlists, decision combining).
//!
//! Compiles profile and tenant allowlist configuration into matchable
//! patterns and combines the allowlist baseline with delegated evaluation.

pub mod allowlist;
pub mod engine;
pub mod profile;

pub use allowlist::HostPattern;
pub use engine::{FailureMode, PolicyEngine};
pub use profile::{Profile, ProfileTable};
