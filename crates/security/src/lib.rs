//! Authentication and authorization for the Member Portal
//!
//! This crate provides the access-control core: credential verification,
//! effective-permission aggregation, delegation rules, time-bounded director
//! terms, session token issuance/verification, and the request-time
//! authorization guard.

pub mod credentials;
pub mod delegation;
pub mod guard;
pub mod permissions;
pub mod terms;
pub mod tokens;

// Re-export commonly used types
pub use credentials::CredentialVerifier;
pub use delegation::DelegationEngine;
pub use guard::PermissionCheck;
pub use permissions::{EffectivePermissions, PermissionAggregator};
pub use terms::DirectorTermManager;
pub use tokens::{TokenIssuer, TokenKeys};
