//! Transaction traits.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TxError {
    #[error("failed to connect to database: {0}")]
    Connect(String),

    #[error("failed to begin transaction: {0}")]
    Begin(String),

    #[error("failed to commit transaction: {0}")]
    Commit(String),

    #[error("failed to roll back transaction: {0}")]
    Rollback(String),
}

/// A live transaction. Consumed by either outcome; dropping one without
/// committing must behave like a rollback in implementations.
#[async_trait]
pub trait Transaction: Send {
    async fn commit(self: Box<Self>) -> Result<(), TxError>;
    async fn rollback(self: Box<Self>) -> Result<(), TxError>;
}

/// Hands out transactions. One per handler invocation; no nesting, no
/// savepoints, no retries.
#[async_trait]
pub trait TransactionManager: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn Transaction>, TxError>;
}

#[async_trait]
impl<M> TransactionManager for Arc<M>
where
    M: TransactionManager + ?Sized,
{
    async fn begin(&self) -> Result<Box<dyn Transaction>, TxError> {
        (**self).begin().await
    }
}
