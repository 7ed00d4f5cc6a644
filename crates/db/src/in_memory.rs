//! In-memory transaction manager.
//!
//! Intended for tests/dev: records how often begin/commit/rollback ran and
//! can be told to fail the next begin or commit, so the chain's
//! rollback-on-error behavior is observable without a database.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::manager::{Transaction, TransactionManager, TxError};

#[derive(Debug, Default)]
struct Counters {
    begun: AtomicUsize,
    committed: AtomicUsize,
    rolled_back: AtomicUsize,
    fail_next_begin: AtomicBool,
    fail_next_commit: AtomicBool,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryTransactionManager {
    counters: Arc<Counters>,
}

impl InMemoryTransactionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begun(&self) -> usize {
        self.counters.begun.load(Ordering::SeqCst)
    }

    pub fn committed(&self) -> usize {
        self.counters.committed.load(Ordering::SeqCst)
    }

    pub fn rolled_back(&self) -> usize {
        self.counters.rolled_back.load(Ordering::SeqCst)
    }

    /// Make the next `begin()` fail.
    pub fn fail_next_begin(&self) {
        self.counters.fail_next_begin.store(true, Ordering::SeqCst);
    }

    /// Make the next `commit()` fail.
    pub fn fail_next_commit(&self) {
        self.counters.fail_next_commit.store(true, Ordering::SeqCst);
    }
}

struct RecordingTransaction {
    counters: Arc<Counters>,
}

#[async_trait]
impl Transaction for RecordingTransaction {
    async fn commit(self: Box<Self>) -> Result<(), TxError> {
        if self.counters.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(TxError::Commit("injected commit failure".to_string()));
        }
        self.counters.committed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), TxError> {
        self.counters.rolled_back.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl TransactionManager for InMemoryTransactionManager {
    async fn begin(&self) -> Result<Box<dyn Transaction>, TxError> {
        if self.counters.fail_next_begin.swap(false, Ordering::SeqCst) {
            return Err(TxError::Begin("injected begin failure".to_string()));
        }
        self.counters.begun.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(RecordingTransaction {
            counters: Arc::clone(&self.counters),
        }))
    }
}
