//! Authorization guard
//!
//! Pure checks over a verified session payload. The guard never touches the
//! store: it judges only what the session claims, which is what the member
//! held at login time. Every rejection is the same `Unauthorized` error so a
//! caller cannot probe which permission was missing.

use tracing::debug;

use common::error::{Error, Result};
use common::models::SessionPayload;
use common::types::{MemberId, PermissionId, RoleId};

/// How a set of required permissions combines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionCheck {
    /// Every listed permission must be held
    All,

    /// At least one listed permission must be held
    Any,
}

/// Requires the session to hold every listed permission
pub fn require_all(session: &SessionPayload, required: &[PermissionId]) -> Result<()> {
    if required.iter().all(|p| session.holds(*p)) {
        Ok(())
    } else {
        debug!(member_id = %session.member_id, "Authorization refused");
        Err(Error::Unauthorized)
    }
}

/// Requires the session to hold at least one of the listed permissions
pub fn require_any(session: &SessionPayload, required: &[PermissionId]) -> Result<()> {
    if required.iter().any(|p| session.holds(*p)) {
        Ok(())
    } else {
        debug!(member_id = %session.member_id, "Authorization refused");
        Err(Error::Unauthorized)
    }
}

/// Requires either self-access or the listed permissions
///
/// A member may always act on their own resources; acting on someone
/// else's requires the permissions, combined per `check`.
pub fn require_self_or_permission(
    session: &SessionPayload,
    resource_owner: MemberId,
    required: &[PermissionId],
    check: PermissionCheck,
) -> Result<()> {
    if session.member_id == resource_owner {
        return Ok(());
    }
    match check {
        PermissionCheck::All => require_all(session, required),
        PermissionCheck::Any => require_any(session, required),
    }
}

/// Requires the session to hold at least one of the allowed roles
pub fn require_role(session: &SessionPayload, allowed: &[RoleId]) -> Result<()> {
    if allowed.iter().any(|role| session.holds_role(*role)) {
        Ok(())
    } else {
        debug!(member_id = %session.member_id, "Authorization refused");
        Err(Error::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::PermissionClaim;
    use common::types::catalog;

    fn session(permissions: &[u32], roles: &[u32]) -> SessionPayload {
        SessionPayload {
            member_id: MemberId(3),
            username: "e.example".to_string(),
            permissions: permissions
                .iter()
                .map(|id| PermissionClaim {
                    permission_id: PermissionId(*id),
                    can_delegate: false,
                })
                .collect(),
            roles: roles.iter().map(|id| RoleId(*id)).collect(),
        }
    }

    #[test]
    fn require_all_needs_every_permission() {
        let s = session(&[1, 2], &[]);
        assert!(require_all(&s, &[PermissionId(1)]).is_ok());
        assert!(require_all(&s, &[PermissionId(1), PermissionId(2)]).is_ok());
        assert!(matches!(
            require_all(&s, &[PermissionId(1), PermissionId(3)]),
            Err(Error::Unauthorized)
        ));
    }

    #[test]
    fn require_any_needs_one_permission() {
        let s = session(&[2], &[]);
        assert!(require_any(&s, &[PermissionId(1), PermissionId(2)]).is_ok());
        assert!(matches!(
            require_any(&s, &[PermissionId(1), PermissionId(3)]),
            Err(Error::Unauthorized)
        ));
    }

    #[test]
    fn empty_requirement_lists() {
        let s = session(&[], &[]);
        // "all of nothing" holds vacuously; "any of nothing" never does
        assert!(require_all(&s, &[]).is_ok());
        assert!(matches!(require_any(&s, &[]), Err(Error::Unauthorized)));
    }

    #[test]
    fn self_access_bypasses_the_permission_check() {
        let s = session(&[], &[]);
        assert!(require_self_or_permission(
            &s,
            MemberId(3),
            &[catalog::MEMBER_ADMINISTRATION],
            PermissionCheck::All
        )
        .is_ok());
    }

    #[test]
    fn foreign_access_needs_the_permission() {
        let with = session(&[catalog::MEMBER_ADMINISTRATION.0], &[]);
        let without = session(&[], &[]);

        assert!(require_self_or_permission(
            &with,
            MemberId(99),
            &[catalog::MEMBER_ADMINISTRATION],
            PermissionCheck::All
        )
        .is_ok());
        assert!(matches!(
            require_self_or_permission(
                &without,
                MemberId(99),
                &[catalog::MEMBER_ADMINISTRATION],
                PermissionCheck::All
            ),
            Err(Error::Unauthorized)
        ));
    }

    #[test]
    fn role_checks() {
        let s = session(&[], &[5]);
        assert!(require_role(&s, &[RoleId(5)]).is_ok());
        assert!(require_role(&s, &[RoleId(4), RoleId(5)]).is_ok());
        assert!(matches!(
            require_role(&s, &[RoleId(6)]),
            Err(Error::Unauthorized)
        ));
        assert!(matches!(require_role(&s, &[]), Err(Error::Unauthorized)));
    }

    #[test]
    fn admin_is_not_implicit_in_the_guard() {
        // The guard matches only literal claims; routes that admit admins
        // list the admin permission among their requirements.
        let s = session(&[catalog::ADMIN.0], &[]);
        assert!(matches!(
            require_all(&s, &[catalog::MEMBER_ADMINISTRATION]),
            Err(Error::Unauthorized)
        ));
        assert!(require_all(&s, &[catalog::ADMIN]).is_ok());
    }
}
