//! Persistent storage management for the Member Portal
//!
//! This crate provides the storage interfaces used by the access-control
//! core, the in-memory adapter implementing them, the bounded connection
//! pool, and the transaction coordinator for atomic multi-entity writes.

pub mod memory;
pub mod pool;
pub mod store;
pub mod transaction;

// Re-export commonly used types
pub use memory::{Database, MemoryStore, Tables};
pub use pool::{Connection, ConnectionPool};
pub use store::{MemberStore, PasswordResetStore, PermissionStore, RoleStore};
pub use transaction::{TaskValue, TransactionCoordinator, TransactionTask};
