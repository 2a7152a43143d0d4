//! Director term manager
//!
//! Creates, ends, and queries time-bounded role assignments. For a given
//! role, at most one assignment window is open or overlapping at any
//! instant; the overlap check and the insert run inside one transaction so
//! two racing `start_term` calls cannot both commit. Ended terms stay in
//! storage as history.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use common::error::{Error, Result};
use common::types::{MemberId, RoleId};
use storage_adapter::{MemberStore, RoleStore, TaskValue, TransactionCoordinator, TransactionTask};

/// Manages director terms (time-bounded role assignments)
pub struct DirectorTermManager {
    /// Member storage (existence checks)
    members: Arc<dyn MemberStore>,

    /// Role storage (catalog and assignment reads)
    roles: Arc<dyn RoleStore>,

    /// Coordinator for the check-and-insert write
    coordinator: Arc<TransactionCoordinator>,
}

impl DirectorTermManager {
    /// Creates a new director term manager
    pub fn new(
        members: Arc<dyn MemberStore>,
        roles: Arc<dyn RoleStore>,
        coordinator: Arc<TransactionCoordinator>,
    ) -> Self {
        Self {
            members,
            roles,
            coordinator,
        }
    }

    /// Starts an open-ended term of a role for a member
    ///
    /// Fails with `RoleAlreadyHeld` if any existing assignment of the role
    /// overlaps `[from, open)`. The overlap check runs inside the
    /// transaction that inserts the assignment.
    pub async fn start_term(
        &self,
        member_id: MemberId,
        role_id: RoleId,
        from: DateTime<Utc>,
    ) -> Result<()> {
        if self.members.member_by_id(member_id).await?.is_none() {
            return Err(Error::NotFound(format!("Member with id {}", member_id)));
        }
        if self.roles.role_by_id(role_id).await?.is_none() {
            return Err(Error::NotFound(format!("Role with id {}", role_id)));
        }

        let insert: TransactionTask = Box::new(move |tables, _| {
            tables.insert_assignment(member_id, role_id, from)?;
            Ok(TaskValue::None)
        });
        self.coordinator.run_atomically(vec![insert]).await?;

        info!("Member {} starts term for role {}", member_id, role_id);
        Ok(())
    }

    /// Ends the current term of a role
    ///
    /// The open assignment's `until` is rewritten to one day before now, so
    /// the closed window ends just before the succession; the row itself is
    /// kept as history. Fails with `NotFound` if the role has no open term.
    pub async fn end_term_now(&self, role_id: RoleId) -> Result<()> {
        let until = Utc::now() - Duration::days(1);

        let close: TransactionTask = Box::new(move |tables, _| {
            let holder = tables.close_assignment(role_id, until)?;
            Ok(TaskValue::MemberId(holder))
        });
        let results = self.coordinator.run_atomically(vec![close]).await?;

        if let Some(TaskValue::MemberId(holder)) = results.first() {
            info!("Term of member {} for role {} ended", holder, role_id);
        }
        Ok(())
    }

    /// The member holding the role as of the given instant, if any
    pub async fn active_holder(
        &self,
        role_id: RoleId,
        as_of: DateTime<Utc>,
    ) -> Result<Option<MemberId>> {
        let assignments = self.roles.assignments_for_role(role_id).await?;
        Ok(assignments
            .iter()
            .find(|a| a.contains(as_of))
            .map(|a| a.member_id))
    }
}
