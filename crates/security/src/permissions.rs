//! Permission aggregator
//!
//! Computes a member's effective permission set: the deduplicated union of
//! direct grants and the permissions conferred by currently active role
//! assignments. Every call re-reads current state; there is no cache, so
//! authorization decisions never act on stale data.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::trace;

use common::error::Result;
use common::models::PermissionClaim;
use common::types::{MemberId, PermissionId, RoleId};
use storage_adapter::{MemberStore, RoleStore};

/// A member's effective permission set and active roles
#[derive(Debug, Clone, Default)]
pub struct EffectivePermissions {
    /// Deduplicated permissions; `can_delegate` is OR-merged across sources
    pub permissions: Vec<PermissionClaim>,

    /// Roles with an assignment window containing the query instant
    pub roles: Vec<RoleId>,
}

impl EffectivePermissions {
    /// Checks whether the set contains the given permission
    pub fn holds(&self, permission_id: PermissionId) -> bool {
        self.permissions
            .iter()
            .any(|claim| claim.permission_id == permission_id)
    }

    /// Checks whether the set contains the permission with the right to delegate it
    pub fn can_delegate(&self, permission_id: PermissionId) -> bool {
        self.permissions
            .iter()
            .any(|claim| claim.permission_id == permission_id && claim.can_delegate)
    }
}

/// Computes effective permission sets from direct grants and active roles
pub struct PermissionAggregator {
    /// Member storage (direct grants)
    members: Arc<dyn MemberStore>,

    /// Role storage (assignments and conferred permissions)
    roles: Arc<dyn RoleStore>,
}

impl PermissionAggregator {
    /// Creates a new permission aggregator
    pub fn new(members: Arc<dyn MemberStore>, roles: Arc<dyn RoleStore>) -> Self {
        Self { members, roles }
    }

    /// Computes the effective permission set of a member as of the given instant
    ///
    /// The same permission arriving through multiple sources appears once;
    /// holding the right to delegate through any one source is sufficient.
    pub async fn effective_permissions(
        &self,
        member_id: MemberId,
        as_of: DateTime<Utc>,
    ) -> Result<EffectivePermissions> {
        // BTreeMap keeps the result ordered by permission ID
        let mut merged: BTreeMap<PermissionId, bool> = BTreeMap::new();

        for grant in self.members.direct_grants(member_id).await? {
            let can_delegate = merged.entry(grant.permission_id).or_insert(false);
            *can_delegate |= grant.can_delegate;
        }

        let mut roles = Vec::new();
        for assignment in self.roles.assignments_for_member(member_id).await? {
            if !assignment.contains(as_of) {
                continue;
            }
            roles.push(assignment.role_id);

            for conferred in self.roles.role_permissions(assignment.role_id).await? {
                let can_delegate = merged.entry(conferred.permission_id).or_insert(false);
                *can_delegate |= conferred.can_delegate;
            }
        }

        trace!(
            "Member {} holds {} effective permissions through {} active roles",
            member_id,
            merged.len(),
            roles.len()
        );

        Ok(EffectivePermissions {
            permissions: merged
                .into_iter()
                .map(|(permission_id, can_delegate)| PermissionClaim {
                    permission_id,
                    can_delegate,
                })
                .collect(),
            roles,
        })
    }
}
