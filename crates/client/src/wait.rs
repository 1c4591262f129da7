//! Schedulability wait: poll policy, cancellation, and correlation IDs.
//!
//! A freshly created volume is usually not schedulable until its CSI plugin
//! reports healthy. The façade re-reads the volume at a fixed interval until
//! the flag flips, the attempt budget runs out, or the caller cancels.

use std::time::Duration;

use tokio::sync::watch;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// How often and how many times to re-read a volume while waiting for it to
/// become schedulable.
///
/// Only constructible through [`WaitPolicy::new`] or [`Default`], so
/// `max_attempts` is always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    interval: Duration,
    max_attempts: u32,
}

impl WaitPolicy {
    /// Delay between status reads.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

    /// Status reads before giving up (five minutes at the default interval).
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 150;

    /// Creates a policy, returning `None` if `max_attempts` is zero.
    #[must_use]
    pub fn new(interval: Duration, max_attempts: u32) -> Option<Self> {
        if max_attempts == 0 {
            None
        } else {
            Some(Self {
                interval,
                max_attempts,
            })
        }
    }

    /// Returns the delay before each status read.
    pub fn interval(self) -> Duration {
        self.interval
    }

    /// Returns the maximum number of status reads.
    pub fn max_attempts(self) -> u32 {
        self.max_attempts
    }

    /// Upper bound on the time spent sleeping across a full wait.
    pub fn budget(self) -> Duration {
        self.interval.saturating_mul(self.max_attempts)
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
        }
    }
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Creates a connected cancel handle and signal.
///
/// Clones of the signal all observe the same handle. Dropping the handle
/// without calling [`CancelHandle::cancel`] leaves the signal pending forever.
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle(tx), CancelSignal(rx))
}

/// Fires a [`CancelSignal`].
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

/// Observed by the poll loop; resolves once the paired handle cancels.
#[derive(Debug, Clone)]
pub struct CancelSignal(watch::Receiver<bool>);

impl CancelSignal {
    /// Returns `true` if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Waits until cancellation is requested.
    pub async fn cancelled(&mut self) {
        let fired = self.0.wait_for(|cancelled| *cancelled).await.is_ok();
        if !fired {
            // Handle dropped without cancelling.
            std::future::pending::<()>().await;
        }
    }
}

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

/// Identifies one wait-until-schedulable loop.
///
/// Recorded on the loop's span so every status read of a single wait can be
/// correlated in logs and traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WaitId(Uuid);

impl WaitId {
    /// Generates a new random wait identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for WaitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
