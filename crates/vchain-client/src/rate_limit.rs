//! Minimum spacing between outbound calls.
//!
//! At most one permit is outstanding at a time. A new permit is granted no
//! earlier than `interval` after the previous grant, however long the
//! previous holder kept it. Waiters are served in arrival order.

use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{ClientError, ClientResult};

/// Process-wide gate enforcing a floor call rate.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last_grant: Mutex<Option<Instant>>,
}

/// An outstanding permit. Dropping it releases the gate.
#[derive(Debug)]
pub struct Permit<'a> {
    _guard: MutexGuard<'a, Option<Instant>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_grant: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait for a permit.
    ///
    /// Returns `Cancelled` without granting anything if `cancel` fires first.
    pub async fn acquire(&self, cancel: &CancellationToken) -> ClientResult<Permit<'_>> {
        // tokio's mutex queues lockers fairly, which gives FIFO grants.
        let mut guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            guard = self.last_grant.lock() => guard,
        };

        if let Some(last) = *guard {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                _ = tokio::time::sleep_until(last + self.interval) => {}
            }
        }

        *guard = Some(Instant::now());
        Ok(Permit { _guard: guard })
    }
}
