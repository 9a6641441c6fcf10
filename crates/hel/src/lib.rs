//! Top-level facade crate for hel.
//!
//! Re-exports core types and the engine library so users can depend on a single crate.

pub mod core {
    pub use hel_core::*;
}

pub mod engine {
    pub use hel_engine::*;
}
