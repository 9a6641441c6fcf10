//! hel core: transport-agnostic primitives for egress access decisions.
//!
//! This crate defines the policy context, host extraction, the decision
//! value, and the error surface shared by the engine and its callers. It
//! carries no async runtime so it can be reused in multiple contexts.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `HelError`/`Result` so an access gate
//! never crashes on malformed input.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod context;
pub mod decision;
pub mod error;
pub mod host;

pub use context::PolicyContext;
pub use decision::{Decision, EngineKind, Reason};
/// Shared result type.
pub use error::{HelError, Result};
pub use host::extract_host;
