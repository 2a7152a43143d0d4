//! Domain models for the member portal
//!
//! This module defines the persistent entities of the access-control core and
//! the derived session payload that stands in for server-side session state.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{MemberId, MemberStatus, PermissionId, RoleId};

/// A member of the organization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    /// Member ID
    pub id: MemberId,

    /// Unique login name
    pub username: String,

    /// Contact email
    pub email: String,

    /// PHC-format secret hash; never serialized to clients
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Membership status
    pub status: MemberStatus,
}

/// A permission catalog entry
///
/// Immutable reference data; read-heavy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    /// Permission ID
    pub id: PermissionId,

    /// Human-readable name
    pub name: String,

    /// Optional description
    pub description: Option<String>,
}

/// A direct permission grant of a member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    /// The member holding the permission
    pub member_id: MemberId,

    /// The granted permission
    pub permission_id: PermissionId,

    /// Whether the holder may pass this permission on.
    /// A grant with `can_delegate == false` can still be used by its holder
    /// but cannot be copied to anyone else.
    pub can_delegate: bool,
}

/// A role (director position) catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    /// Role ID
    pub id: RoleId,

    /// Human-readable name
    pub name: String,
}

/// A permission conferred by a role to whoever currently holds it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermission {
    /// The conferring role
    pub role_id: RoleId,

    /// The conferred permission
    pub permission_id: PermissionId,

    /// Whether the role holder may pass this permission on
    pub can_delegate: bool,
}

/// A time-bounded assignment of a role to a member
///
/// The window is half-open: `[from, until)`. `until == None` means the term
/// is open-ended. Assignments are never deleted; ending a term rewrites
/// `until`, preserving an auditable history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// The member holding the role
    pub member_id: MemberId,

    /// The held role
    pub role_id: RoleId,

    /// Start of the term (inclusive)
    pub from: DateTime<Utc>,

    /// End of the term (exclusive); None while open-ended
    pub until: Option<DateTime<Utc>>,
}

impl RoleAssignment {
    /// Checks whether the assignment window contains the given instant
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from <= at && self.until.map_or(true, |until| at < until)
    }

    /// Checks whether this window intersects an open-ended window starting at `from`
    pub fn overlaps_open(&self, from: DateTime<Utc>) -> bool {
        self.until.map_or(true, |until| until > from)
    }

    /// Checks whether the term is still open-ended
    pub fn is_open(&self) -> bool {
        self.until.is_none()
    }
}

/// A permission as carried in the session payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionClaim {
    /// Permission ID
    pub permission_id: PermissionId,

    /// Whether the holder may delegate this permission
    pub can_delegate: bool,
}

/// The self-contained session payload
///
/// Derived at login from the member's effective permission set; the signed
/// token carrying it is the only session state the server relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPayload {
    /// The authenticated member
    pub member_id: MemberId,

    /// Login name of the member
    pub username: String,

    /// Deduplicated union of direct and role-derived permissions
    pub permissions: Vec<PermissionClaim>,

    /// Roles with a currently active assignment
    pub roles: Vec<RoleId>,
}

impl SessionPayload {
    /// Checks whether the payload carries the given permission
    pub fn holds(&self, permission_id: PermissionId) -> bool {
        self.permissions
            .iter()
            .any(|claim| claim.permission_id == permission_id)
    }

    /// Checks whether the payload carries the given role
    pub fn holds_role(&self, role_id: RoleId) -> bool {
        self.roles.contains(&role_id)
    }
}

/// A pending password reset entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetEntry {
    /// Email the reset was requested for
    pub email: String,

    /// Opaque reset token (random bytes, base64url)
    pub token: String,

    /// When the entry was created
    pub created_at: DateTime<Utc>,
}

impl PasswordResetEntry {
    /// Reset entries are valid for five days
    pub const VALIDITY_DAYS: i64 = 5;

    /// Checks whether the entry has expired as of the given instant
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at > Duration::days(Self::VALIDITY_DAYS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(from_days_ago: i64, until_days_ago: Option<i64>) -> RoleAssignment {
        let now = Utc::now();
        RoleAssignment {
            member_id: MemberId(1),
            role_id: RoleId(5),
            from: now - Duration::days(from_days_ago),
            until: until_days_ago.map(|days| now - Duration::days(days)),
        }
    }

    #[test]
    fn open_assignment_contains_now() {
        assert!(assignment(10, None).contains(Utc::now()));
    }

    #[test]
    fn closed_assignment_excludes_its_upper_bound() {
        let closed = assignment(10, Some(0));
        assert!(!closed.contains(closed.until.unwrap()));
        assert!(closed.contains(closed.from));
    }

    #[test]
    fn ended_assignment_does_not_overlap_a_later_start() {
        let ended = assignment(10, Some(1));
        assert!(!ended.overlaps_open(Utc::now()));
    }

    #[test]
    fn open_assignment_overlaps_any_later_start() {
        assert!(assignment(10, None).overlaps_open(Utc::now()));
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let member = Member {
            id: MemberId(1),
            username: "m.mustermann".to_string(),
            email: "m.mustermann@example.org".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            status: MemberStatus::Active,
        };
        let json = serde_json::to_string(&member).unwrap();
        assert!(!json.contains("argon2id"));
    }

    #[test]
    fn reset_entry_expires_after_five_days() {
        let entry = PasswordResetEntry {
            email: "m@example.org".to_string(),
            token: "t".to_string(),
            created_at: Utc::now() - Duration::days(6),
        };
        assert!(entry.is_expired(Utc::now()));
    }
}
