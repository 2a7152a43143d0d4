//! Delegation engine
//!
//! Decides whether an actor may grant or revoke a permission on another
//! member's behalf, and performs the grant/revoke writes. A holder of the
//! distinguished admin permission bypasses the delegation rule; anyone else
//! must hold the target permission with its `can_delegate` flag set. Any
//! ambiguity denies the action.

use std::sync::Arc;

use tracing::info;

use common::error::{Error, Result};
use common::types::{catalog, MemberId, PermissionId};
use storage_adapter::{MemberStore, PermissionStore};

use crate::permissions::EffectivePermissions;

/// Grants and revokes permissions subject to the delegation rule
pub struct DelegationEngine {
    /// Member storage (target existence checks)
    members: Arc<dyn MemberStore>,

    /// Permission storage (catalog checks and grant writes)
    permissions: Arc<dyn PermissionStore>,
}

impl DelegationEngine {
    /// Creates a new delegation engine
    pub fn new(members: Arc<dyn MemberStore>, permissions: Arc<dyn PermissionStore>) -> Self {
        Self {
            members,
            permissions,
        }
    }

    /// Decides whether the actor may grant the target permission
    ///
    /// True iff the actor holds the admin permission, or holds the target
    /// permission with the right to delegate it. Fails closed.
    pub fn can_grant(actor: &EffectivePermissions, target: PermissionId) -> bool {
        actor.holds(catalog::ADMIN) || actor.can_delegate(target)
    }

    /// Decides whether the actor may revoke the target permission
    ///
    /// The rule is identical to [`Self::can_grant`].
    pub fn can_revoke(actor: &EffectivePermissions, target: PermissionId) -> bool {
        Self::can_grant(actor, target)
    }

    /// Grants a permission to a member on the actor's authority
    ///
    /// The stored grant carries `can_delegate = false`: a delegated
    /// permission cannot be delegated further. Granting an already-held
    /// permission is a no-op.
    pub async fn grant(
        &self,
        actor: &EffectivePermissions,
        member_id: MemberId,
        permission_id: PermissionId,
    ) -> Result<()> {
        if !Self::can_grant(actor, permission_id) {
            return Err(Error::Unauthorized);
        }

        if self.members.member_by_id(member_id).await?.is_none() {
            return Err(Error::NotFound(format!("Member with id {}", member_id)));
        }
        if self
            .permissions
            .permission_by_id(permission_id)
            .await?
            .is_none()
        {
            return Err(Error::NotFound(format!(
                "Permission with id {}",
                permission_id
            )));
        }

        self.permissions
            .add_grant(member_id, permission_id, false)
            .await?;
        info!(
            "Permission {} granted to member {}",
            permission_id, member_id
        );
        Ok(())
    }

    /// Revokes a permission from a member on the actor's authority
    ///
    /// Revoking an absent permission is a no-op.
    pub async fn revoke(
        &self,
        actor: &EffectivePermissions,
        member_id: MemberId,
        permission_id: PermissionId,
    ) -> Result<()> {
        if !Self::can_revoke(actor, permission_id) {
            return Err(Error::Unauthorized);
        }

        self.permissions
            .remove_grant(member_id, permission_id)
            .await?;
        info!(
            "Permission {} revoked from member {}",
            permission_id, member_id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::PermissionClaim;
    use common::types::MemberStatus;
    use storage_adapter::{ConnectionPool, Database, MemoryStore};

    fn actor(is_admin: bool, holds: bool, can_delegate: bool) -> EffectivePermissions {
        let mut permissions = Vec::new();
        if is_admin {
            permissions.push(PermissionClaim {
                permission_id: catalog::ADMIN,
                can_delegate: false,
            });
        }
        if holds {
            permissions.push(PermissionClaim {
                permission_id: PermissionId(8),
                can_delegate,
            });
        }
        EffectivePermissions {
            permissions,
            roles: Vec::new(),
        }
    }

    #[test]
    fn the_delegation_rule_is_exhaustive_over_its_three_inputs() {
        // (is_admin, holds, can_delegate) -> expected
        for is_admin in [false, true] {
            for holds in [false, true] {
                for can_delegate in [false, true] {
                    let expected = is_admin || (holds && can_delegate);
                    let actor = actor(is_admin, holds, can_delegate);
                    assert_eq!(
                        DelegationEngine::can_grant(&actor, PermissionId(8)),
                        expected,
                        "is_admin={} holds={} can_delegate={}",
                        is_admin,
                        holds,
                        can_delegate
                    );
                    assert_eq!(
                        DelegationEngine::can_revoke(&actor, PermissionId(8)),
                        expected
                    );
                }
            }
        }
    }

    #[test]
    fn an_empty_permission_set_denies() {
        let nobody = EffectivePermissions::default();
        assert!(!DelegationEngine::can_grant(&nobody, PermissionId(8)));
    }

    async fn engine_with_member() -> (DelegationEngine, Arc<MemoryStore>) {
        let pool = Arc::new(ConnectionPool::new(Arc::new(Database::new()), 4));
        let store = Arc::new(MemoryStore::new(pool.clone()));
        let conn = pool.acquire().await.unwrap();
        conn.write(|t| {
            t.insert_member(
                "t.target".into(),
                "t@example.org".into(),
                "hash".into(),
                MemberStatus::Active,
            )
            .unwrap();
            t.permissions.insert(
                PermissionId(8),
                common::models::Permission {
                    id: PermissionId(8),
                    name: "newsletter-dispatch".into(),
                    description: None,
                },
            );
        });
        (DelegationEngine::new(store.clone(), store.clone()), store)
    }

    #[tokio::test]
    async fn a_non_delegable_holding_cannot_be_passed_on() {
        let (engine, store) = engine_with_member().await;

        // Holds permission 8 but without the right to delegate it
        let outcome = engine
            .grant(&actor(false, true, false), MemberId(1), PermissionId(8))
            .await;

        assert!(matches!(outcome, Err(Error::Unauthorized)));
        assert!(store.direct_grants(MemberId(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn a_delegated_grant_is_stored_without_further_delegation_rights() {
        let (engine, store) = engine_with_member().await;

        engine
            .grant(&actor(false, true, true), MemberId(1), PermissionId(8))
            .await
            .unwrap();

        let grants = store.direct_grants(MemberId(1)).await.unwrap();
        assert_eq!(grants.len(), 1);
        assert!(!grants[0].can_delegate);
    }

    #[tokio::test]
    async fn granting_twice_is_idempotent() {
        let (engine, store) = engine_with_member().await;
        let admin = actor(true, false, false);

        engine
            .grant(&admin, MemberId(1), PermissionId(8))
            .await
            .unwrap();
        engine
            .grant(&admin, MemberId(1), PermissionId(8))
            .await
            .unwrap();

        assert_eq!(store.direct_grants(MemberId(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn revoking_an_absent_permission_is_a_noop() {
        let (engine, _) = engine_with_member().await;
        engine
            .revoke(&actor(true, false, false), MemberId(1), PermissionId(8))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn granting_to_an_unknown_member_is_not_found() {
        let (engine, _) = engine_with_member().await;
        let outcome = engine
            .grant(&actor(true, false, false), MemberId(99), PermissionId(8))
            .await;
        assert!(matches!(outcome, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn granting_an_uncataloged_permission_is_not_found() {
        let (engine, _) = engine_with_member().await;
        let outcome = engine
            .grant(&actor(true, false, false), MemberId(1), PermissionId(42))
            .await;
        assert!(matches!(outcome, Err(Error::NotFound(_))));
    }
}
