// crates/contact-gate-core/src/poll.rs
// ============================================================================
// Module: Bounded Poll
// Description: Fixed-cap, fixed-delay polling for external readiness.
// Purpose: Wait for third-party widgets without ever hanging.
// Dependencies: tokio
// ============================================================================

//! ## Overview
//! [`BoundedPoll`] probes an async condition at most `max_attempts` times,
//! sleeping `delay` between attempts, and returns `None` once the cap is
//! reached. There is no backoff and no unbounded wait.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::time::Duration;

// ============================================================================
// SECTION: Bounded Poll
// ============================================================================

/// Default number of readiness probes.
pub const DEFAULT_POLL_ATTEMPTS: u32 = 20;
/// Default delay between readiness probes.
pub const DEFAULT_POLL_DELAY: Duration = Duration::from_millis(250);

/// Bounded retry policy for readiness checks.
///
/// # Invariants
/// - The probe runs at most `max_attempts` times.
/// - No sleep follows the final attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedPoll {
    /// Maximum number of probe calls.
    pub max_attempts: u32,
    /// Delay between consecutive probes.
    pub delay: Duration,
}

impl Default for BoundedPoll {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_POLL_ATTEMPTS,
            delay: DEFAULT_POLL_DELAY,
        }
    }
}

impl BoundedPoll {
    /// Creates a poll policy.
    #[must_use]
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Runs `probe` until it yields `Some` or the attempt cap is reached.
    pub async fn poll<T, F, Fut>(&self, mut probe: F) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        for attempt in 1..=self.max_attempts {
            if let Some(value) = probe().await {
                return Some(value);
            }
            if attempt < self.max_attempts {
                tokio::time::sleep(self.delay).await;
            }
        }
        None
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
