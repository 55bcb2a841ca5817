//! Shared domain types for the vigil alert engine.

pub mod id;
pub mod types;
