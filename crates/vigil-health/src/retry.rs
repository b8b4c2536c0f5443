//! Bounded retry loop.
//!
//! Attempts run back to back with no delay. The first success ends the
//! cycle; using up every attempt marks it failed.

use tracing::debug;

use crate::probe::Probe;

/// Outcome of one polling cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResult {
    /// Every attempt failed.
    pub failed: bool,
    /// Attempts made, including the successful one.
    pub attempts_used: u32,
}

/// Probe up to `max_attempts` times, stopping at the first success.
///
/// A `max_attempts` of zero is treated as one.
pub async fn probe_with_retries<P: Probe>(probe: &P, max_attempts: u32) -> ProbeResult {
    let max_attempts = max_attempts.max(1);

    for attempt in 1..=max_attempts {
        debug!(attempt, max_attempts, "probe attempt");
        if probe.probe().await {
            return ProbeResult {
                failed: false,
                attempts_used: attempt,
            };
        }
    }

    ProbeResult {
        failed: true,
        attempts_used: max_attempts,
    }
}
