// src/services/sequence.rs

use crate::{errors::AppResult, store::Store};
use std::{future::Future, sync::Arc};
use tracing::warn;

/// Entities numbered from an atomic counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceScope {
    Driver,
    User,
    DriverInvoice,
    EmployeeInvoice,
    ArchiveRun,
}

impl SequenceScope {
    pub fn key(&self) -> &'static str {
        match self {
            SequenceScope::Driver => "driver",
            SequenceScope::User => "user",
            SequenceScope::DriverInvoice => "driver_invoice",
            SequenceScope::EmployeeInvoice => "employee_invoice",
            SequenceScope::ArchiveRun => "archive_run",
        }
    }
}

pub struct SequenceAllocator {
    store: Arc<dyn Store>,
}

impl SequenceAllocator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn next(&self, scope: SequenceScope) -> AppResult<i64> {
        self.store.increment_counter(scope.key()).await
    }
}

/// Chain-derived sequence: one past the latest persisted value, or 1.
/// Used by ledgers, where the unique key on the sequence catches races.
pub fn following(previous: Option<i64>) -> i64 {
    previous.map_or(1, |p| p + 1)
}

/// Re-runs `op` while it fails with a retryable error, at most `attempts` times.
pub async fn retry_on_conflict<T, F, Fut>(attempts: u32, mut op: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Err(err) if err.is_retryable() && attempt < attempts => {
                warn!(attempt, error = %err, "write conflict, retrying");
                attempt += 1;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{errors::AppError, store::MemoryStore};
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn following_starts_at_one() {
        assert_eq!(following(None), 1);
        assert_eq!(following(Some(41)), 42);
    }

    #[tokio::test]
    async fn counters_are_independent_per_scope() {
        let allocator = SequenceAllocator::new(Arc::new(MemoryStore::new()));
        assert_eq!(allocator.next(SequenceScope::Driver).await.unwrap(), 1);
        assert_eq!(allocator.next(SequenceScope::Driver).await.unwrap(), 2);
        assert_eq!(allocator.next(SequenceScope::User).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn retry_gives_up_after_the_last_attempt() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: AppResult<()> = retry_on_conflict(3, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::Conflict("taken".to_string()))
        })
        .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_recovers_from_a_single_conflict() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = retry_on_conflict(3, move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(AppError::Conflict("taken".to_string()))
            } else {
                Ok(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn validation_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: AppResult<()> = retry_on_conflict(5, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::Validation("bad".to_string()))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
