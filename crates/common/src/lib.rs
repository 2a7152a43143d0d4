//! Common utilities and types for the Member Portal
//!
//! This crate provides shared functionality used across the member portal system,
//! including error types, identifier and catalog types, and the domain models.

pub mod error;
pub mod models;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
pub use models::*;
pub use types::*;
