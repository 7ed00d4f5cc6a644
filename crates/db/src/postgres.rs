//! Postgres-backed transaction manager (sqlx).
//!
//! ## Thread safety
//!
//! Uses the sqlx connection pool, which is `Send + Sync`; the manager can
//! be shared across the router via `Arc`. Each `begin()` checks a
//! connection out of the pool for the lifetime of the transaction.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres};

use crate::manager::{Transaction, TransactionManager, TxError};

#[derive(Debug, Clone)]
pub struct PostgresTransactionManager {
    pool: Arc<PgPool>,
}

impl PostgresTransactionManager {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Build from a connection URL without connecting eagerly; connections
    /// are established on first `begin()`.
    pub fn connect_lazy(url: &str) -> Result<Self, TxError> {
        let pool = PgPoolOptions::new()
            .connect_lazy(url)
            .map_err(|e| TxError::Connect(e.to_string()))?;

        Ok(Self::new(pool))
    }
}

struct PgTransaction(sqlx::Transaction<'static, Postgres>);

#[async_trait]
impl Transaction for PgTransaction {
    async fn commit(self: Box<Self>) -> Result<(), TxError> {
        self.0
            .commit()
            .await
            .map_err(|e| TxError::Commit(e.to_string()))
    }

    async fn rollback(self: Box<Self>) -> Result<(), TxError> {
        self.0
            .rollback()
            .await
            .map_err(|e| TxError::Rollback(e.to_string()))
    }
}

#[async_trait]
impl TransactionManager for PostgresTransactionManager {
    async fn begin(&self) -> Result<Box<dyn Transaction>, TxError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| TxError::Begin(e.to_string()))?;

        Ok(Box::new(PgTransaction(tx)))
    }
}
