//! Error types for the member portal
//!
//! This module defines the common error taxonomy used throughout the member
//! portal system. The credential and token variants deliberately carry
//! indistinct messages: callers must not be able to tell which sub-check
//! failed.

use thiserror::Error;

use crate::types::RoleId;

/// Result type for member portal operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for member portal operations
#[derive(Error, Debug)]
pub enum Error {
    /// Login was attempted with an empty username or secret
    #[error("Credentials incomplete")]
    IncompleteCredentials,

    /// Unknown user or wrong secret (indistinguishable by design)
    #[error("Username or password wrong")]
    InvalidCredentials,

    /// Session token is malformed or carries a bad signature
    #[error("Authentication failed: Please log in")]
    InvalidToken,

    /// A token (session or password reset) has expired
    #[error("Token already expired")]
    ExpiredToken,

    /// No valid session accompanied the request
    #[error("Authentication failed: Please log in")]
    Unauthenticated,

    /// Valid session, insufficient rights
    #[error("Authorization failed: You are not permitted to do this")]
    Unauthorized,

    /// A role assignment would overlap an existing term
    #[error("Role {0} is already held for the requested period")]
    RoleAlreadyHeld(RoleId),

    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),

    /// Wraps any underlying data-access failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Returns true for the variants that must never leak detail to a client
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            Error::IncompleteCredentials
                | Error::InvalidCredentials
                | Error::InvalidToken
                | Error::Unauthenticated
        )
    }
}
