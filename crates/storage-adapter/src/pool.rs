//! Bounded connection pool
//!
//! This module provides the bounded pool through which every storage access
//! goes. Connections are checked out per query or per transaction and are
//! returned when dropped.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use common::error::{Error, Result};

use crate::memory::{Database, Tables};

/// Default connection bound, matching the production database configuration
pub const DEFAULT_POOL_SIZE: usize = 50;

/// Bounded pool of database connections
pub struct ConnectionPool {
    /// The shared database
    database: Arc<Database>,

    /// Available connection permits
    permits: Arc<Semaphore>,

    /// Total pool capacity
    capacity: usize,
}

impl ConnectionPool {
    /// Creates a pool with the given capacity
    pub fn new(database: Arc<Database>, capacity: usize) -> Self {
        Self {
            database,
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Checks a connection out of the pool, waiting if the pool is exhausted
    pub async fn acquire(&self) -> Result<Connection> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| Error::Storage("Connection pool is closed".to_string()))?;

        debug!(
            "Connection acquired ({} of {} available)",
            self.permits.available_permits(),
            self.capacity
        );

        Ok(Connection {
            database: self.database.clone(),
            _permit: permit,
        })
    }

    /// Number of connections currently available
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Total pool capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// A checked-out connection
///
/// Dropping the connection returns it to the pool; the permit is released in
/// every exit path.
pub struct Connection {
    database: Arc<Database>,
    _permit: OwnedSemaphorePermit,
}

impl Connection {
    /// Runs a read-only closure over the tables
    pub fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        self.database.read(f)
    }

    /// Runs a single write over the tables
    pub fn write<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        self.database.write(f)
    }

    /// Runs a closure as an all-or-nothing transaction
    pub fn transaction<R>(&self, f: impl FnOnce(&mut Tables) -> Result<R>) -> Result<R> {
        self.database.transaction(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn pool_enforces_its_bound() {
        let pool = Arc::new(ConnectionPool::new(Arc::new(Database::new()), 1));

        let held = pool.acquire().await.unwrap();
        assert_eq!(pool.available(), 0);

        // A second acquire must block while the first connection is held
        let waiting = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.acquire().await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());

        drop(held);
        tokio::time::timeout(Duration::from_secs(1), waiting)
            .await
            .expect("acquire should complete once the connection is returned")
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn dropping_a_connection_returns_it() {
        let pool = ConnectionPool::new(Arc::new(Database::new()), 2);
        {
            let _a = pool.acquire().await.unwrap();
            let _b = pool.acquire().await.unwrap();
            assert_eq!(pool.available(), 0);
        }
        assert_eq!(pool.available(), 2);
    }
}
