//! Unified error types for xls-salvage.
//!
//! This module provides the single error type shared by the compound-container
//! reader and the BIFF record layer, so callers match on one taxonomy.

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{Error, Result};
