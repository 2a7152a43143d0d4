//! Transaction coordinator
//!
//! This module provides the coordinator that executes an ordered list of
//! storage tasks as one atomic unit. A task receives the transaction state
//! and the results of all earlier tasks, so a task may consume an identifier
//! generated by its predecessor. On the first failure the whole batch is
//! rolled back and the original error is returned; the pooled connection is
//! released in every exit path.

use std::sync::Arc;

use tracing::{debug, warn};

use common::error::Result;
use common::types::MemberId;

use crate::memory::Tables;
use crate::pool::ConnectionPool;

/// Value produced by a transaction task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValue {
    /// The task produced nothing
    None,
    /// The task produced a generated member ID
    MemberId(MemberId),
    /// The task produced a row count
    Count(usize),
}

impl TaskValue {
    /// The generated member ID, if this value carries one
    pub fn member_id(&self) -> Option<MemberId> {
        match self {
            TaskValue::MemberId(id) => Some(*id),
            _ => None,
        }
    }
}

/// A single task of an atomic batch
///
/// Receives the transaction's table state and the results of the tasks that
/// ran before it, strictly in submission order.
pub type TransactionTask = Box<dyn FnOnce(&mut Tables, &[TaskValue]) -> Result<TaskValue> + Send>;

/// Coordinator executing ordered task lists atomically
pub struct TransactionCoordinator {
    /// Connection pool
    pool: Arc<ConnectionPool>,
}

impl TransactionCoordinator {
    /// Creates a new transaction coordinator
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Executes the tasks in order as one atomic unit
    ///
    /// On success all results are returned in task order. On the first
    /// failure every prior task's effect is rolled back and the failing
    /// task's error is returned unchanged. Callers must not retry
    /// automatically: collaborators outside the store (such as outbound
    /// mail) are not covered by the rollback.
    pub async fn run_atomically(&self, tasks: Vec<TransactionTask>) -> Result<Vec<TaskValue>> {
        let task_count = tasks.len();
        let conn = self.pool.acquire().await?;

        let outcome = conn.transaction(|tables| {
            let mut results = Vec::with_capacity(task_count);
            for (index, task) in tasks.into_iter().enumerate() {
                match task(tables, &results) {
                    Ok(value) => results.push(value),
                    Err(e) => {
                        warn!(
                            "Transaction task {} of {} failed, rolling back: {}",
                            index + 1,
                            task_count,
                            e
                        );
                        return Err(e);
                    }
                }
            }
            Ok(results)
        });

        if outcome.is_ok() {
            debug!("Transaction with {} tasks committed", task_count);
        }
        outcome
    }
}
