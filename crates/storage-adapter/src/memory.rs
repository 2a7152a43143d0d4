//! In-memory storage adapter
//!
//! This module provides the in-memory table set backing the storage
//! interfaces. It stands in for the relational store behind the same
//! interfaces, which keeps every property of the access-control core
//! testable without a database.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use common::error::{Error, Result};
use common::models::{
    Member, PasswordResetEntry, Permission, PermissionGrant, Role, RoleAssignment, RolePermission,
};
use common::types::{MemberId, MemberStatus, PermissionId, RoleId};

/// The complete table set of the member portal
///
/// Cloneable so a transaction can work on a private copy and swap it in on
/// commit.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    /// Members by ID
    pub members: HashMap<MemberId, Member>,

    /// Permission catalog
    pub permissions: HashMap<PermissionId, Permission>,

    /// Direct permission grants
    pub permission_grants: Vec<PermissionGrant>,

    /// Role catalog
    pub roles: HashMap<RoleId, Role>,

    /// Permissions conferred by roles
    pub role_permissions: Vec<RolePermission>,

    /// Role assignment history
    pub role_assignments: Vec<RoleAssignment>,

    /// Pending password reset entries
    pub password_resets: Vec<PasswordResetEntry>,

    /// Next member ID to assign
    next_member_id: u32,
}

impl Tables {
    /// Inserts a new member, assigning the next free ID
    pub fn insert_member(
        &mut self,
        username: String,
        email: String,
        password_hash: String,
        status: MemberStatus,
    ) -> Result<MemberId> {
        if self.members.values().any(|m| m.username == username) {
            return Err(Error::Storage(format!(
                "Member with username {} already exists",
                username
            )));
        }

        self.next_member_id += 1;
        let id = MemberId(self.next_member_id);
        self.members.insert(
            id,
            Member {
                id,
                username,
                email,
                password_hash,
                status,
            },
        );
        Ok(id)
    }

    /// Replaces the secret hash of a member
    pub fn set_password_hash(&mut self, member_id: MemberId, hash: &str) -> Result<()> {
        let member = self
            .members
            .get_mut(&member_id)
            .ok_or_else(|| Error::NotFound(format!("Member with id {}", member_id)))?;
        member.password_hash = hash.to_string();
        Ok(())
    }

    /// Transitions the status of a member (members are never hard-deleted)
    pub fn set_member_status(&mut self, member_id: MemberId, status: MemberStatus) -> Result<()> {
        let member = self
            .members
            .get_mut(&member_id)
            .ok_or_else(|| Error::NotFound(format!("Member with id {}", member_id)))?;
        member.status = status;
        Ok(())
    }

    /// Adds a direct permission grant; a no-op if the member already holds it
    pub fn add_grant(
        &mut self,
        member_id: MemberId,
        permission_id: PermissionId,
        can_delegate: bool,
    ) {
        let held = self
            .permission_grants
            .iter()
            .any(|g| g.member_id == member_id && g.permission_id == permission_id);
        if !held {
            self.permission_grants.push(PermissionGrant {
                member_id,
                permission_id,
                can_delegate,
            });
        }
    }

    /// Removes a direct permission grant; a no-op if absent
    pub fn remove_grant(&mut self, member_id: MemberId, permission_id: PermissionId) {
        self.permission_grants
            .retain(|g| !(g.member_id == member_id && g.permission_id == permission_id));
    }

    /// Inserts a role assignment after re-checking the per-role overlap invariant
    pub fn insert_assignment(
        &mut self,
        member_id: MemberId,
        role_id: RoleId,
        from: DateTime<Utc>,
    ) -> Result<()> {
        let overlapping = self
            .role_assignments
            .iter()
            .any(|a| a.role_id == role_id && a.overlaps_open(from));
        if overlapping {
            return Err(Error::RoleAlreadyHeld(role_id));
        }

        self.role_assignments.push(RoleAssignment {
            member_id,
            role_id,
            from,
            until: None,
        });
        Ok(())
    }

    /// Closes the open assignment of a role by rewriting its `until`
    ///
    /// The row is kept, preserving the term history.
    pub fn close_assignment(&mut self, role_id: RoleId, until: DateTime<Utc>) -> Result<MemberId> {
        let assignment = self
            .role_assignments
            .iter_mut()
            .find(|a| a.role_id == role_id && a.is_open())
            .ok_or_else(|| Error::NotFound(format!("No open assignment for role {}", role_id)))?;
        assignment.until = Some(until);
        Ok(assignment.member_id)
    }

    /// Inserts a password reset entry
    pub fn insert_password_reset(&mut self, entry: PasswordResetEntry) {
        self.password_resets.push(entry);
    }

    /// Deletes all password reset entries for an email
    pub fn delete_password_resets(&mut self, email: &str) -> usize {
        let before = self.password_resets.len();
        self.password_resets.retain(|entry| entry.email != email);
        before - self.password_resets.len()
    }
}

/// The shared in-memory database
///
/// Created once at process start and handed to the connection pool; the
/// table set is the only shared mutable resource of the system.
#[derive(Debug, Default)]
pub struct Database {
    tables: RwLock<Tables>,
}

impl Database {
    /// Creates an empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs a closure with read access to the tables
    pub fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        f(&self.tables.read())
    }

    /// Runs a closure with write access to the tables
    pub fn write<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        f(&mut self.tables.write())
    }

    /// Runs a closure as a transaction over a private copy of the tables
    ///
    /// The copy replaces the live tables only if the closure succeeds, so a
    /// failing transaction leaves no observable effect. The write lock is
    /// held for the whole transaction, which serializes concurrent writers.
    pub fn transaction<R>(&self, f: impl FnOnce(&mut Tables) -> Result<R>) -> Result<R> {
        let mut live = self.tables.write();
        let mut working = live.clone();
        let value = f(&mut working)?;
        *live = working;
        Ok(value)
    }
}

/// Storage adapter implementing the store interfaces over the pooled database
///
/// Cheap to clone; every call checks a connection out of the pool for its
/// duration.
#[derive(Clone)]
pub struct MemoryStore {
    pool: Arc<crate::pool::ConnectionPool>,
}

impl MemoryStore {
    /// Creates a new storage adapter over the given pool
    pub fn new(pool: Arc<crate::pool::ConnectionPool>) -> Self {
        Self { pool }
    }

    /// The underlying connection pool
    pub fn pool(&self) -> Arc<crate::pool::ConnectionPool> {
        self.pool.clone()
    }
}

#[async_trait::async_trait]
impl crate::store::MemberStore for MemoryStore {
    async fn member_by_id(&self, id: MemberId) -> Result<Option<Member>> {
        let conn = self.pool.acquire().await?;
        Ok(conn.read(|tables| tables.members.get(&id).cloned()))
    }

    async fn member_by_username(&self, username: &str) -> Result<Option<Member>> {
        let conn = self.pool.acquire().await?;
        Ok(conn.read(|tables| {
            tables
                .members
                .values()
                .find(|m| m.username == username)
                .cloned()
        }))
    }

    async fn member_by_email(&self, email: &str) -> Result<Option<Member>> {
        let conn = self.pool.acquire().await?;
        Ok(conn.read(|tables| tables.members.values().find(|m| m.email == email).cloned()))
    }

    async fn update_password_hash(&self, id: MemberId, hash: &str) -> Result<()> {
        let conn = self.pool.acquire().await?;
        conn.write(|tables| tables.set_password_hash(id, hash))
    }

    async fn update_status(&self, id: MemberId, status: MemberStatus) -> Result<()> {
        let conn = self.pool.acquire().await?;
        conn.write(|tables| tables.set_member_status(id, status))
    }

    async fn direct_grants(&self, id: MemberId) -> Result<Vec<PermissionGrant>> {
        let conn = self.pool.acquire().await?;
        Ok(conn.read(|tables| {
            tables
                .permission_grants
                .iter()
                .filter(|g| g.member_id == id)
                .cloned()
                .collect()
        }))
    }
}

#[async_trait::async_trait]
impl crate::store::PermissionStore for MemoryStore {
    async fn permission_by_id(&self, id: PermissionId) -> Result<Option<Permission>> {
        let conn = self.pool.acquire().await?;
        Ok(conn.read(|tables| tables.permissions.get(&id).cloned()))
    }

    async fn all_permissions(&self) -> Result<Vec<Permission>> {
        let conn = self.pool.acquire().await?;
        let mut permissions: Vec<Permission> =
            conn.read(|tables| tables.permissions.values().cloned().collect());
        permissions.sort_by_key(|p| p.id);
        Ok(permissions)
    }

    async fn add_grant(
        &self,
        member_id: MemberId,
        permission_id: PermissionId,
        can_delegate: bool,
    ) -> Result<()> {
        let conn = self.pool.acquire().await?;
        conn.write(|tables| tables.add_grant(member_id, permission_id, can_delegate));
        Ok(())
    }

    async fn remove_grant(&self, member_id: MemberId, permission_id: PermissionId) -> Result<()> {
        let conn = self.pool.acquire().await?;
        conn.write(|tables| tables.remove_grant(member_id, permission_id));
        Ok(())
    }

    async fn all_grants(&self) -> Result<Vec<PermissionGrant>> {
        let conn = self.pool.acquire().await?;
        Ok(conn.read(|tables| tables.permission_grants.clone()))
    }
}

#[async_trait::async_trait]
impl crate::store::RoleStore for MemoryStore {
    async fn role_by_id(&self, id: RoleId) -> Result<Option<Role>> {
        let conn = self.pool.acquire().await?;
        Ok(conn.read(|tables| tables.roles.get(&id).cloned()))
    }

    async fn role_permissions(&self, id: RoleId) -> Result<Vec<RolePermission>> {
        let conn = self.pool.acquire().await?;
        Ok(conn.read(|tables| {
            tables
                .role_permissions
                .iter()
                .filter(|rp| rp.role_id == id)
                .cloned()
                .collect()
        }))
    }

    async fn assignments_for_role(&self, id: RoleId) -> Result<Vec<RoleAssignment>> {
        let conn = self.pool.acquire().await?;
        Ok(conn.read(|tables| {
            tables
                .role_assignments
                .iter()
                .filter(|a| a.role_id == id)
                .cloned()
                .collect()
        }))
    }

    async fn assignments_for_member(&self, id: MemberId) -> Result<Vec<RoleAssignment>> {
        let conn = self.pool.acquire().await?;
        Ok(conn.read(|tables| {
            tables
                .role_assignments
                .iter()
                .filter(|a| a.member_id == id)
                .cloned()
                .collect()
        }))
    }

    async fn all_assignments(&self) -> Result<Vec<RoleAssignment>> {
        let conn = self.pool.acquire().await?;
        Ok(conn.read(|tables| tables.role_assignments.clone()))
    }
}

#[async_trait::async_trait]
impl crate::store::PasswordResetStore for MemoryStore {
    async fn entry_by_email_and_token(
        &self,
        email: &str,
        token: &str,
    ) -> Result<Option<PasswordResetEntry>> {
        let conn = self.pool.acquire().await?;
        Ok(conn.read(|tables| {
            tables
                .password_resets
                .iter()
                .find(|entry| entry.email == email && entry.token == token)
                .cloned()
        }))
    }

    async fn create_entry(&self, entry: PasswordResetEntry) -> Result<()> {
        let conn = self.pool.acquire().await?;
        conn.write(|tables| tables.insert_password_reset(entry));
        Ok(())
    }

    async fn delete_entries_by_email(&self, email: &str) -> Result<usize> {
        let conn = self.pool.acquire().await?;
        Ok(conn.write(|tables| tables.delete_password_resets(email)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::ConnectionPool;
    use crate::store::{MemberStore, PermissionStore};
    use chrono::Duration;

    fn store() -> MemoryStore {
        let pool = Arc::new(ConnectionPool::new(Arc::new(Database::new()), 4));
        MemoryStore::new(pool)
    }

    #[tokio::test]
    async fn insert_member_assigns_sequential_ids() {
        let store = store();
        let pool = store.pool();
        let conn = pool.acquire().await.unwrap();
        let first = conn
            .write(|t| {
                t.insert_member(
                    "a.first".into(),
                    "a@example.org".into(),
                    "hash".into(),
                    MemberStatus::Active,
                )
            })
            .unwrap();
        let second = conn
            .write(|t| {
                t.insert_member(
                    "b.second".into(),
                    "b@example.org".into(),
                    "hash".into(),
                    MemberStatus::Active,
                )
            })
            .unwrap();
        assert!(second > first);
        assert!(store.member_by_username("a.first").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn duplicate_usernames_are_rejected() {
        let store = store();
        let pool = store.pool();
        let conn = pool.acquire().await.unwrap();
        conn.write(|t| {
            t.insert_member(
                "a.first".into(),
                "a@example.org".into(),
                "hash".into(),
                MemberStatus::Active,
            )
        })
        .unwrap();
        let result = conn.write(|t| {
            t.insert_member(
                "a.first".into(),
                "other@example.org".into(),
                "hash".into(),
                MemberStatus::Active,
            )
        });
        assert!(matches!(result, Err(Error::Storage(_))));
    }

    #[tokio::test]
    async fn add_grant_is_idempotent() {
        let store = store();
        store
            .add_grant(MemberId(1), PermissionId(8), false)
            .await
            .unwrap();
        store
            .add_grant(MemberId(1), PermissionId(8), true)
            .await
            .unwrap();

        let grants = store.direct_grants(MemberId(1)).await.unwrap();
        assert_eq!(grants.len(), 1);
        // The first write wins; re-granting does not escalate the delegate flag
        assert!(!grants[0].can_delegate);
    }

    #[tokio::test]
    async fn remove_grant_of_absent_permission_is_a_noop() {
        let store = store();
        store.remove_grant(MemberId(1), PermissionId(8)).await.unwrap();
        assert!(store.direct_grants(MemberId(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn overlapping_assignment_is_rejected_by_the_tables() {
        let store = store();
        let pool = store.pool();
        let conn = pool.acquire().await.unwrap();
        let now = Utc::now();

        conn.write(|t| t.insert_assignment(MemberId(1), RoleId(5), now - Duration::days(30)))
            .unwrap();
        let overlapping =
            conn.write(|t| t.insert_assignment(MemberId(2), RoleId(5), now));
        assert!(matches!(overlapping, Err(Error::RoleAlreadyHeld(RoleId(5)))));

        // A different role is unaffected
        conn.write(|t| t.insert_assignment(MemberId(2), RoleId(6), now))
            .unwrap();
    }

    #[tokio::test]
    async fn closing_an_assignment_keeps_the_row() {
        let store = store();
        let pool = store.pool();
        let conn = pool.acquire().await.unwrap();
        let now = Utc::now();

        conn.write(|t| t.insert_assignment(MemberId(1), RoleId(5), now - Duration::days(30)))
            .unwrap();
        let holder = conn
            .write(|t| t.close_assignment(RoleId(5), now - Duration::days(1)))
            .unwrap();
        assert_eq!(holder, MemberId(1));

        let history = conn.read(|t| t.role_assignments.clone());
        assert_eq!(history.len(), 1);
        assert!(!history[0].is_open());
    }
}
