//! Identifier and catalog types for the member portal
//!
//! This module defines the small-integer identifier types and the fixed
//! permission catalog shared by the permission aggregator, the delegation
//! engine, and the route policy declarations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(pub u32);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a permission catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionId(pub u32);

impl fmt::Display for PermissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a role (director position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(pub u32);

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Membership status of a member
///
/// Members are never hard-deleted; leaving the organization is a status
/// transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberStatus {
    /// Trainee member
    Trainee,
    /// Active member
    Active,
    /// Passive member
    Passive,
    /// Alumni member
    Alumni,
    /// Member has left the organization
    Left,
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberStatus::Trainee => write!(f, "Trainee"),
            MemberStatus::Active => write!(f, "Active"),
            MemberStatus::Passive => write!(f, "Passive"),
            MemberStatus::Alumni => write!(f, "Alumni"),
            MemberStatus::Left => write!(f, "Left"),
        }
    }
}

impl FromStr for MemberStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trainee" => Ok(MemberStatus::Trainee),
            "active" => Ok(MemberStatus::Active),
            "passive" => Ok(MemberStatus::Passive),
            "alumni" => Ok(MemberStatus::Alumni),
            "left" => Ok(MemberStatus::Left),
            _ => Err(format!("Unknown member status: {}", s)),
        }
    }
}

/// The fixed permission catalog
///
/// These IDs are stable reference data, mirrored by the seeded permission
/// table. They must be treated as a fixed enumeration and never re-derived
/// at runtime.
pub mod catalog {
    use super::PermissionId;

    /// Administer members (create, update critical fields, change status)
    pub const MEMBER_ADMINISTRATION: PermissionId = PermissionId(1);
    /// Manage the trainee intake
    pub const TRAINEE_ADMINISTRATION: PermissionId = PermissionId(2);
    /// Manage projects
    pub const PROJECT_ADMINISTRATION: PermissionId = PermissionId(3);
    /// Manage events
    pub const EVENT_ADMINISTRATION: PermissionId = PermissionId(4);
    /// Read financial data of members
    pub const FINANCE_DATA: PermissionId = PermissionId(6);
    /// Send the member newsletter
    pub const NEWSLETTER_DISPATCH: PermissionId = PermissionId(8);
    /// Manage the workshop catalog
    pub const WORKSHOP_ADMINISTRATION: PermissionId = PermissionId(10);
    /// Manage internal documents
    pub const DOCUMENT_ADMINISTRATION: PermissionId = PermissionId(12);

    /// The distinguished administrator permission: bypasses delegation rules
    pub const ADMIN: PermissionId = PermissionId(100);

    /// All catalog permission IDs
    ///
    /// Can be used when a route should be accessible with any permission at all.
    pub const ALL_PERMISSIONS: [PermissionId; 25] = [
        PermissionId(1),
        PermissionId(2),
        PermissionId(3),
        PermissionId(4),
        PermissionId(5),
        PermissionId(6),
        PermissionId(7),
        PermissionId(8),
        PermissionId(9),
        PermissionId(10),
        PermissionId(11),
        PermissionId(12),
        PermissionId(13),
        PermissionId(14),
        PermissionId(15),
        PermissionId(16),
        PermissionId(17),
        PermissionId(18),
        PermissionId(19),
        PermissionId(20),
        PermissionId(21),
        PermissionId(22),
        PermissionId(23),
        PermissionId(24),
        ADMIN,
    ];
}
