use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex, Semaphore};
use tokio::time::{sleep, sleep_until, Instant};

use crate::error::{NarratorError, Result};

/// How a batch paces its outbound synthesis calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchedulePolicy {
    /// One scene at a time, in order, with a fixed pause between
    /// consecutive outbound calls.
    Sequential {
        #[serde(default = "default_delay_ms")]
        delay_ms: u64,
    },
    /// Up to `max_concurrency` calls in flight, call starts spaced at least
    /// `min_interval_ms` apart.
    Bounded {
        max_concurrency: usize,
        #[serde(default)]
        min_interval_ms: u64,
    },
}

fn default_delay_ms() -> u64 {
    1_500
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        Self::Sequential {
            delay_ms: default_delay_ms(),
        }
    }
}

impl SchedulePolicy {
    pub fn sequential(delay: Duration) -> Self {
        Self::Sequential {
            delay_ms: delay.as_millis() as u64,
        }
    }

    pub fn bounded(max_concurrency: usize, min_interval: Duration) -> Self {
        Self::Bounded {
            max_concurrency,
            min_interval_ms: min_interval.as_millis() as u64,
        }
    }

    /// A bounded policy needs between 1 and `Semaphore::MAX_PERMITS` slots.
    pub fn validate(&self) -> Result<()> {
        if let Self::Bounded {
            max_concurrency, ..
        } = *self
        {
            if max_concurrency == 0 || max_concurrency > Semaphore::MAX_PERMITS {
                return Err(NarratorError::Validation(format!(
                    "max_concurrency must be between 1 and {}, got {max_concurrency}",
                    Semaphore::MAX_PERMITS
                )));
            }
        }
        Ok(())
    }
}

/// Spaces call starts at least `interval` apart across tasks.
pub(crate) struct Pacer {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Pacer {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    pub(crate) async fn wait(&self) {
        let mut next_slot = self.next_slot.lock().await;
        if let Some(at) = *next_slot {
            if at > Instant::now() {
                sleep_until(at).await;
            }
        }
        *next_slot = Some(Instant::now() + self.interval);
    }
}

pub(crate) fn is_cancelled(cancel: &watch::Receiver<bool>) -> bool {
    *cancel.borrow()
}

/// Sleep for `duration` unless cancellation is raised first. Returns false
/// when cancelled.
pub(crate) async fn pause(duration: Duration, cancel: &mut watch::Receiver<bool>) -> bool {
    if is_cancelled(cancel) {
        return false;
    }
    if duration.is_zero() {
        return true;
    }
    tokio::select! {
        biased;
        _ = cancelled(cancel) => false,
        _ = sleep(duration) => true,
    }
}

/// Resolves once cancellation is raised; never resolves if the sender is
/// gone.
pub(crate) async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    if cancel.wait_for(|c| *c).await.is_err() {
        std::future::pending::<()>().await;
    }
}
