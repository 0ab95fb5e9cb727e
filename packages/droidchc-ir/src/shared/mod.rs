//! Shared module - Common types and utilities
//!
//! Ids, the frame shape, the SMT expression AST, and well-known descriptors used
//! by every feature.

pub mod constants;
pub mod models;

// Re-exports for convenience
pub use models::*;
