//! Change-record dispatcher.
//!
//! Handlers register in a fixed order; for each delivered record every
//! handler's filter runs in that order and the matching handlers apply in
//! that order. An apply failure is reported and counted but never blocks
//! the remaining handlers or the rest of the batch: the upstream delivery
//! mechanism redelivers at least once, so every apply is idempotent and
//! forward progress beats strict propagation.

use async_trait::async_trait;

use larder_core::storage::Result;

use super::record::ChangeRecord;

/// One registered reaction to committed mutations.
#[async_trait]
pub trait ChangeHandler: Send + Sync {
    /// Stable name used in failure logs.
    fn name(&self) -> &'static str;

    /// Synchronous match on the record; no side effects.
    fn filter(&self, record: &ChangeRecord) -> bool;

    /// Side effect for a matched record. Must tolerate being invoked twice
    /// on the same record.
    async fn apply(&self, record: &ChangeRecord) -> Result<()>;
}

/// Ordered handler registry processing one batch sequentially.
#[derive(Default)]
pub struct Dispatcher {
    handlers: Vec<Box<dyn ChangeHandler>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler; registration order is invocation order.
    pub fn register(mut self, handler: impl ChangeHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    /// Run every matching handler against one record, returning the number
    /// of failed applies.
    pub async fn dispatch(&self, record: &ChangeRecord) -> usize {
        let mut failures = 0;
        for handler in &self.handlers {
            if !handler.filter(record) {
                continue;
            }
            if let Err(err) = handler.apply(record).await {
                tracing::error!(
                    handler = handler.name(),
                    error = %err,
                    "change handler failed"
                );
                failures += 1;
            }
        }
        failures
    }

    /// Process one delivered batch sequentially, returning the total number
    /// of failed applies.
    pub async fn dispatch_batch(&self, records: &[ChangeRecord]) -> usize {
        let mut failures = 0;
        for record in records {
            failures += self.dispatch(record).await;
        }
        failures
    }
}
