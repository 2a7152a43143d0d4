//! Storage interfaces
//!
//! Callers depend on these interfaces rather than on a concrete adapter, so
//! the access-control core can be exercised against the in-memory adapter
//! and later against a relational one without changes.

use async_trait::async_trait;

use common::error::Result;
use common::models::{
    Member, PasswordResetEntry, Permission, PermissionGrant, Role, RoleAssignment, RolePermission,
};
use common::types::{MemberId, MemberStatus, PermissionId, RoleId};

/// Member reads and the simple single-entity member writes
#[async_trait]
pub trait MemberStore: Send + Sync {
    /// Looks up a member by ID
    async fn member_by_id(&self, id: MemberId) -> Result<Option<Member>>;

    /// Looks up a member by login name
    async fn member_by_username(&self, username: &str) -> Result<Option<Member>>;

    /// Looks up a member by email address
    async fn member_by_email(&self, email: &str) -> Result<Option<Member>>;

    /// Replaces the secret hash of a member
    async fn update_password_hash(&self, id: MemberId, hash: &str) -> Result<()>;

    /// Transitions the status of a member
    async fn update_status(&self, id: MemberId, status: MemberStatus) -> Result<()>;

    /// Direct permission grants of a member
    async fn direct_grants(&self, id: MemberId) -> Result<Vec<PermissionGrant>>;
}

/// Permission catalog reads and grant writes
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Looks up a catalog entry
    async fn permission_by_id(&self, id: PermissionId) -> Result<Option<Permission>>;

    /// The whole permission catalog, ordered by ID
    async fn all_permissions(&self) -> Result<Vec<Permission>>;

    /// Adds a direct grant; granting an already-held permission is a no-op
    async fn add_grant(
        &self,
        member_id: MemberId,
        permission_id: PermissionId,
        can_delegate: bool,
    ) -> Result<()>;

    /// Removes a direct grant; revoking an absent permission is a no-op
    async fn remove_grant(&self, member_id: MemberId, permission_id: PermissionId) -> Result<()>;

    /// All direct grants of all members
    async fn all_grants(&self) -> Result<Vec<PermissionGrant>>;
}

/// Role catalog and assignment reads
///
/// Assignment writes go through the transaction coordinator so the per-role
/// overlap invariant is checked and written atomically.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Looks up a role
    async fn role_by_id(&self, id: RoleId) -> Result<Option<Role>>;

    /// Permissions conferred by a role
    async fn role_permissions(&self, id: RoleId) -> Result<Vec<RolePermission>>;

    /// Assignment history of a role
    async fn assignments_for_role(&self, id: RoleId) -> Result<Vec<RoleAssignment>>;

    /// Assignment history of a member
    async fn assignments_for_member(&self, id: MemberId) -> Result<Vec<RoleAssignment>>;

    /// The complete assignment history
    async fn all_assignments(&self) -> Result<Vec<RoleAssignment>>;
}

/// Password reset entry access
#[async_trait]
pub trait PasswordResetStore: Send + Sync {
    /// Looks up a reset entry by email and token
    async fn entry_by_email_and_token(
        &self,
        email: &str,
        token: &str,
    ) -> Result<Option<PasswordResetEntry>>;

    /// Creates a reset entry
    async fn create_entry(&self, entry: PasswordResetEntry) -> Result<()>;

    /// Deletes all reset entries of an email, returning how many were removed
    async fn delete_entries_by_email(&self, email: &str) -> Result<usize>;
}
