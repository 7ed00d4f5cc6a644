//! `restgate-db` — database transaction boundary.
//!
//! Handlers run inside a transaction opened by the chain's transaction
//! wrapper. The engine stays external: callers pick an implementation of
//! [`TransactionManager`] (Postgres via sqlx, or the in-memory recorder
//! for tests/dev).

pub mod in_memory;
pub mod manager;
pub mod postgres;

pub use in_memory::InMemoryTransactionManager;
pub use manager::{Transaction, TransactionManager, TxError};
pub use postgres::PostgresTransactionManager;
