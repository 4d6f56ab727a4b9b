//! Explicit transaction handles used by the transaction aspect.
//!
//! A [`TransactionProvider`] opens a [`Transaction`] that is passed by
//! reference into the wrapped step. The step may enlist work on it; the aspect
//! calls [`Transaction::complete`] only when the step returns normally.
//! Dropping the handle releases it: completed transactions commit, all others
//! roll back.

use crate::cancellation::CancellationToken;
use crate::filters::{AsyncFilter, Step};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// An open transaction.
///
/// Implementations release their resources in `Drop`, committing only if
/// [`complete`](Transaction::complete) was called.
pub trait Transaction: Send {
    /// Unique id of this transaction.
    fn id(&self) -> Uuid;

    /// Records an operation performed under this transaction.
    fn enlist(&mut self, operation: &str);

    /// Marks the transaction for commit.
    fn complete(&mut self);

    /// Returns true once [`complete`](Transaction::complete) has been called.
    fn is_completed(&self) -> bool;
}

/// Opens transactions.
pub trait TransactionProvider: Send + Sync {
    /// Handle type produced by [`begin`](TransactionProvider::begin).
    type Transaction: Transaction;

    /// Opens a new transaction.
    fn begin(&self) -> Self::Transaction;
}

/// A synchronous step that runs inside a transaction.
pub trait TransactionalStep<M, E = anyhow::Error>: Send + Sync {
    /// Processes the message under `transaction`.
    ///
    /// # Errors
    ///
    /// Any failure is returned to the caller unchanged and the transaction
    /// rolls back.
    fn execute(
        &self,
        message: &mut M,
        transaction: &mut dyn Transaction,
        cancel: &CancellationToken,
    ) -> Result<(), E>;
}

/// An asynchronous step that runs inside a transaction.
#[async_trait]
pub trait AsyncTransactionalStep<M: Send, E: Send = anyhow::Error>: Send + Sync {
    /// Processes the message under `transaction`.
    ///
    /// # Errors
    ///
    /// Any failure is returned to the caller unchanged and the transaction
    /// rolls back.
    async fn execute_async(
        &self,
        message: &mut M,
        transaction: &mut dyn Transaction,
        cancel: &CancellationToken,
    ) -> Result<(), E>;
}

/// Adapts a step that does not use the transaction handle.
#[derive(Debug, Clone)]
pub struct IgnoreTransaction<S>(pub S);

impl<M, E, S> TransactionalStep<M, E> for IgnoreTransaction<S>
where
    S: Step<M, E>,
{
    fn execute(
        &self,
        message: &mut M,
        _transaction: &mut dyn Transaction,
        cancel: &CancellationToken,
    ) -> Result<(), E> {
        self.0.execute(message, cancel)
    }
}

#[async_trait]
impl<M, E, S> AsyncTransactionalStep<M, E> for IgnoreTransaction<S>
where
    M: Send,
    E: Send,
    S: AsyncFilter<M, E>,
{
    async fn execute_async(
        &self,
        message: &mut M,
        _transaction: &mut dyn Transaction,
        cancel: &CancellationToken,
    ) -> Result<(), E> {
        self.0.execute_async(message, cancel).await
    }
}

/// A closure-based transactional step.
pub struct FnTransactionalStep<F> {
    func: F,
}

impl<F> FnTransactionalStep<F> {
    /// Wraps `func` as a transactional step.
    pub fn new<M, E>(func: F) -> Self
    where
        F: Fn(&mut M, &mut dyn Transaction, &CancellationToken) -> Result<(), E> + Send + Sync,
    {
        Self { func }
    }
}

impl<F> Debug for FnTransactionalStep<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTransactionalStep").finish_non_exhaustive()
    }
}

impl<M, E, F> TransactionalStep<M, E> for FnTransactionalStep<F>
where
    F: Fn(&mut M, &mut dyn Transaction, &CancellationToken) -> Result<(), E> + Send + Sync,
{
    fn execute(
        &self,
        message: &mut M,
        transaction: &mut dyn Transaction,
        cancel: &CancellationToken,
    ) -> Result<(), E> {
        (self.func)(message, transaction, cancel)
    }
}

/// How a transaction ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionOutcome {
    /// Completed and committed.
    Committed,
    /// Released without completion.
    RolledBack,
}

/// Journal entry for a finished transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Transaction id.
    pub id: Uuid,
    /// How the transaction ended.
    pub outcome: TransactionOutcome,
    /// Operations enlisted, in order.
    pub operations: Vec<String>,
    /// When the handle was released.
    pub finished_at: DateTime<Utc>,
}

type Journal = Arc<Mutex<Vec<TransactionRecord>>>;

/// Provider keeping a journal of finished transactions in memory.
///
/// Useful for tests and for hosts without a real resource manager.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTransactionProvider {
    journal: Journal,
}

impl InMemoryTransactionProvider {
    /// Creates a provider with an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every finished transaction, oldest first.
    #[must_use]
    pub fn journal(&self) -> Vec<TransactionRecord> {
        self.journal.lock().clone()
    }

    /// Returns the most recently finished transaction.
    #[must_use]
    pub fn last(&self) -> Option<TransactionRecord> {
        self.journal.lock().last().cloned()
    }

    /// Counts finished transactions with the given outcome.
    #[must_use]
    pub fn count(&self, outcome: TransactionOutcome) -> usize {
        self.journal
            .lock()
            .iter()
            .filter(|record| record.outcome == outcome)
            .count()
    }
}

impl TransactionProvider for InMemoryTransactionProvider {
    type Transaction = InMemoryTransaction;

    fn begin(&self) -> InMemoryTransaction {
        let transaction = InMemoryTransaction {
            id: Uuid::new_v4(),
            operations: Vec::new(),
            completed: false,
            journal: Arc::clone(&self.journal),
        };
        debug!(transaction_id = %transaction.id, "Transaction started");
        transaction
    }
}

/// Handle produced by [`InMemoryTransactionProvider`].
#[derive(Debug)]
pub struct InMemoryTransaction {
    id: Uuid,
    operations: Vec<String>,
    completed: bool,
    journal: Journal,
}

impl Transaction for InMemoryTransaction {
    fn id(&self) -> Uuid {
        self.id
    }

    fn enlist(&mut self, operation: &str) {
        self.operations.push(operation.to_string());
    }

    fn complete(&mut self) {
        self.completed = true;
    }

    fn is_completed(&self) -> bool {
        self.completed
    }
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        let outcome = if self.completed {
            TransactionOutcome::Committed
        } else {
            TransactionOutcome::RolledBack
        };
        debug!(transaction_id = %self.id, ?outcome, "Transaction released");
        self.journal.lock().push(TransactionRecord {
            id: self.id,
            outcome,
            operations: std::mem::take(&mut self.operations),
            finished_at: Utc::now(),
        });
    }
}
