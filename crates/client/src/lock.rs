//! Per-connection command serialization.

use crate::error::ClientError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;

/// Guarantees at most one outstanding command per connection.
///
/// `parse` and `execute` on a given connection are serialized by holding
/// the guard across the round-trip.
#[derive(Debug, Clone, Default)]
pub struct CommandLock {
    inner: Arc<Mutex<()>>,
}

#[derive(Debug)]
pub struct CommandGuard {
    _guard: OwnedMutexGuard<()>,
}

impl CommandLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for the lock, honoring the caller's deadline and cancellation
    /// token. Fails with [`ClientError::CancelledOrTimedOut`] when either
    /// is exceeded.
    pub async fn acquire(
        &self,
        deadline: Duration,
        token: &CancellationToken,
    ) -> Result<CommandGuard, ClientError> {
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(ClientError::CancelledOrTimedOut),
            acquired = tokio::time::timeout(deadline, Arc::clone(&self.inner).lock_owned()) => {
                match acquired {
                    Ok(guard) => Ok(CommandGuard { _guard: guard }),
                    Err(_) => Err(ClientError::CancelledOrTimedOut),
                }
            }
        }
    }
}
