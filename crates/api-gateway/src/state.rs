//! Shared application state
//!
//! One `AppState` is built at startup and shared by every request handler
//! behind an `Arc`. All components read storage through the same bounded
//! connection pool.

use std::sync::Arc;

use chrono::Utc;

use common::error::Result;
use common::models::{Member, SessionPayload};
use security::{
    CredentialVerifier, DelegationEngine, DirectorTermManager, PermissionAggregator, TokenIssuer,
};
use storage_adapter::store::{MemberStore, PasswordResetStore, PermissionStore, RoleStore};
use storage_adapter::transaction::TransactionCoordinator;

use crate::mailer::Mailer;

/// Everything the request handlers share
pub struct AppState {
    /// Member reads and writes
    pub members: Arc<dyn MemberStore>,

    /// Permission catalog and grants
    pub permissions: Arc<dyn PermissionStore>,

    /// Role catalog and assignment history
    pub roles: Arc<dyn RoleStore>,

    /// Pending password reset entries
    pub resets: Arc<dyn PasswordResetStore>,

    /// Credential verifier for login and password changes
    pub verifier: CredentialVerifier,

    /// Effective permission aggregator
    pub aggregator: PermissionAggregator,

    /// Grant/revoke authority rules
    pub delegation: DelegationEngine,

    /// Director term lifecycle
    pub terms: DirectorTermManager,

    /// Session token issuer and verifier
    pub tokens: TokenIssuer,

    /// Multi-step write coordinator
    pub coordinator: Arc<TransactionCoordinator>,

    /// Outbound mail collaborator for password resets
    pub mailer: Arc<dyn Mailer>,

    /// Hardens cookies and suppresses the token echo header when set
    pub is_production: bool,

    /// Path prefix the API is mounted under, also the cookie path
    pub api_path: String,

    /// Session token lifetime in seconds, reused as the cookie max-age
    pub token_ttl_secs: i64,
}

impl AppState {
    /// Builds the session payload for a member from current storage state
    pub async fn session_for(&self, member: &Member) -> Result<SessionPayload> {
        let effective = self
            .aggregator
            .effective_permissions(member.id, Utc::now())
            .await?;
        Ok(SessionPayload {
            member_id: member.id,
            username: member.username.clone(),
            permissions: effective.permissions,
            roles: effective.roles,
        })
    }
}
