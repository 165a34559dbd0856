//! Level-triggered polling with a fixed budget.
//!
//! Every wait in the launcher (shutdown settle, dying settle, address
//! discovery) is the same loop: probe the live state, stop as soon as the
//! probe yields something, otherwise sleep one interval until the limit is
//! spent. There is no cancellation; a loop runs to a result or its limit.

use std::future::Future;
use std::time::Duration;

/// Interval between probes in every wait loop.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Budget for a transitional VM state to settle.
pub const VM_SETTLE_LIMIT: Duration = Duration::from_secs(60);

/// Budget for finding the VM's address in the neighbor table.
pub const ADDRESS_LIMIT: Duration = Duration::from_secs(30);

/// `(interval, limit)` pair bounding a wait loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub limit: Duration,
}

impl PollPolicy {
    pub const fn new(interval: Duration, limit: Duration) -> Self {
        Self { interval, limit }
    }

    pub const fn vm_settle() -> Self {
        Self::new(POLL_INTERVAL, VM_SETTLE_LIMIT)
    }

    pub const fn address() -> Self {
        Self::new(POLL_INTERVAL, ADDRESS_LIMIT)
    }

    /// Number of probes a loop that never succeeds will make.
    pub fn max_attempts(&self) -> u32 {
        if self.interval.is_zero() {
            return 1;
        }
        self.limit.as_nanos().div_ceil(self.interval.as_nanos()) as u32
    }

    /// Run `probe` until it returns `Some`, an error, or the budget is spent.
    ///
    /// The probe receives the elapsed budget (`0, interval, 2·interval, …`).
    /// It is called only while elapsed < limit, so a never-satisfied loop
    /// sleeps exactly `max_attempts() · interval`.
    pub async fn run<T, E, F, Fut>(&self, mut probe: F) -> Result<Option<T>, E>
    where
        F: FnMut(Duration) -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        let mut elapsed = Duration::ZERO;
        loop {
            if let Some(value) = probe(elapsed).await? {
                return Ok(Some(value));
            }
            tokio::time::sleep(self.interval).await;
            elapsed += self.interval;
            if elapsed >= self.limit || self.interval.is_zero() {
                return Ok(None);
            }
        }
    }
}
