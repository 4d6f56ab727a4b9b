//! Aspect that runs the wrapped step inside a transaction.

use crate::cancellation::CancellationToken;
use crate::filters::{AsyncFilter, Step};
use crate::transaction::{
    AsyncTransactionalStep, Transaction, TransactionProvider, TransactionalStep,
};
use async_trait::async_trait;

/// Runs the wrapped step inside a transaction opened from `P`.
///
/// The handle is marked complete only when `next` returns `Ok`. It is dropped
/// on every exit path, which commits or rolls back.
#[derive(Debug)]
pub struct TransactionAspect<N, P> {
    next: N,
    provider: P,
}

impl<N, P> TransactionAspect<N, P>
where
    P: TransactionProvider,
{
    /// Wraps `next`, opening transactions from `provider`.
    pub fn new(next: N, provider: P) -> Self {
        Self { next, provider }
    }

    /// Returns the wrapped step.
    pub fn inner(&self) -> &N {
        &self.next
    }

    /// Returns the transaction provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<M, E, N, P> Step<M, E> for TransactionAspect<N, P>
where
    N: TransactionalStep<M, E>,
    P: TransactionProvider,
{
    fn execute(&self, message: &mut M, cancel: &CancellationToken) -> Result<(), E> {
        if cancel.is_cancelled() {
            return Ok(());
        }
        let mut transaction = self.provider.begin();
        self.next.execute(message, &mut transaction, cancel)?;
        transaction.complete();
        Ok(())
    }
}

#[async_trait]
impl<M, E, N, P> AsyncFilter<M, E> for TransactionAspect<N, P>
where
    M: Send,
    E: Send,
    N: AsyncTransactionalStep<M, E>,
    P: TransactionProvider,
{
    async fn execute_async(&self, message: &mut M, cancel: &CancellationToken) -> Result<(), E> {
        if cancel.is_cancelled() {
            return Ok(());
        }
        let mut transaction = self.provider.begin();
        self.next
            .execute_async(message, &mut transaction, cancel)
            .await?;
        transaction.complete();
        Ok(())
    }
}
