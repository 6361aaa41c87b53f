//! Re-running operations that lost an optimistic-concurrency race.

use std::future::Future;

use crate::error::Result;

/// How often an operation is re-run after a concurrency conflict.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl RetryPolicy {
    /// Creates a policy allowing `max_attempts` runs in total (at least one).
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Runs `operation`, re-running it from scratch while it fails with a
    /// concurrency conflict and attempts remain.
    ///
    /// Each run must read its preconditions afresh. Storage failures,
    /// including a conflict on the last attempt, are surfaced as
    /// [`crate::CheckoutError::Transaction`] for `action`.
    pub async fn run<T, F, Fut>(&self, action: &'static str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Err(e) if e.is_conflict() && attempt < self.max_attempts => {
                    tracing::debug!(action, attempt, "concurrency conflict, retrying");
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_conflict() {
                        tracing::warn!(action, attempts = attempt, "retries exhausted");
                    }
                    return Err(e.surface(action));
                }
                Ok(value) => return Ok(value),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::error::CheckoutError;
    use domain::DomainError;
    use event_store::{AggregateId, EventStoreError, Version};

    fn conflict() -> CheckoutError {
        CheckoutError::from(DomainError::EventStore(
            EventStoreError::ConcurrencyConflict {
                aggregate_id: AggregateId::new(),
                expected: Version::new(0),
                actual: Version::new(1),
            },
        ))
    }

    #[tokio::test]
    async fn test_retries_conflicts_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = RetryPolicy::new(3)
            .run("test", || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(conflict())
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_surfaces_transaction_error() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<()> = RetryPolicy::new(2)
            .run("place order", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(conflict())
            })
            .await;

        assert!(matches!(
            result,
            Err(CheckoutError::Transaction {
                action: "place order"
            })
        ));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_business_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<()> = RetryPolicy::default()
            .run("test", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(CheckoutError::Validation("bad".into()))
            })
            .await;

        assert!(matches!(result, Err(CheckoutError::Validation(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_at_least_one_attempt() {
        assert_eq!(RetryPolicy::new(0).max_attempts(), 1);
    }
}
