//! Time source abstraction for deterministic testing.
//!
//! Token issuance and expiry checks read the clock through `TimeSource`,
//! allowing the system to use real system time in production and simulated
//! time in tests (for example, to step past a token's 24-hour lifetime).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Abstraction over time operations.
///
/// Implementations must be `Send + Sync` because the authenticator is shared
/// across request tasks.
pub trait TimeSource: Send + Sync {
    /// Get the current time in milliseconds since Unix epoch.
    fn now_ms(&self) -> u64;

    /// Get the current time in whole seconds since Unix epoch.
    fn now_secs(&self) -> u64 {
        self.now_ms() / 1000
    }
}

/// Real time source using system clock.
///
/// This is the default implementation used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    #[allow(clippy::cast_possible_truncation)] // Milliseconds won't overflow u64 for billions of years
    fn now_ms(&self) -> u64 {
        // duration_since(UNIX_EPOCH) only fails if system time is before 1970.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| duration.as_millis() as u64)
    }
}

/// A simulated time source for deterministic testing.
///
/// Time only advances when explicitly told to. Backed by an atomic so a
/// single instance can be shared with an `Authenticator` behind an `Arc`
/// while the test keeps a handle to move the clock.
///
/// # Example
///
/// ```
/// use portal::time::{SimulatedTimeSource, TimeSource};
///
/// let time = SimulatedTimeSource::new(1000);
/// assert_eq!(time.now_ms(), 1000);
///
/// time.advance(100);
/// assert_eq!(time.now_ms(), 1100);
/// ```
#[derive(Debug)]
pub struct SimulatedTimeSource {
    /// Current simulated time in milliseconds since Unix epoch.
    current_time_ms: AtomicU64,
}

impl SimulatedTimeSource {
    /// Create a new simulated time source with the given initial time.
    #[must_use]
    pub const fn new(initial_time_ms: u64) -> Self {
        Self {
            current_time_ms: AtomicU64::new(initial_time_ms),
        }
    }

    /// Create a new simulated time source starting at `1_700_000_000_000`
    /// (approximately November 2023).
    #[must_use]
    pub const fn default_start() -> Self {
        Self::new(1_700_000_000_000)
    }

    /// Advance time by the given number of milliseconds.
    ///
    /// Time saturates at `u64::MAX` if overflow would occur.
    pub fn advance(&self, ms: u64) {
        let current = self.current_time_ms.load(Ordering::SeqCst);
        self.current_time_ms
            .store(current.saturating_add(ms), Ordering::SeqCst);
    }

    /// Advance time by the given number of seconds.
    pub fn advance_secs(&self, secs: u64) {
        self.advance(secs.saturating_mul(1000));
    }

    /// Set the current time to a specific value. May move time backwards.
    pub fn set(&self, time_ms: u64) {
        self.current_time_ms.store(time_ms, Ordering::SeqCst);
    }
}

impl TimeSource for SimulatedTimeSource {
    fn now_ms(&self) -> u64 {
        self.current_time_ms.load(Ordering::SeqCst)
    }
}

impl Default for SimulatedTimeSource {
    fn default() -> Self {
        Self::default_start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_time_source() {
        let source = SystemTimeSource;
        let t1 = source.now_ms();
        let t2 = source.now_ms();

        // Time should be reasonable (after 2020)
        assert!(t1 > 1_577_836_800_000);
        assert!(t2 >= t1);
    }

    #[test]
    fn test_simulated_time_advance() {
        let time = SimulatedTimeSource::new(1000);

        time.advance(100);
        assert_eq!(time.now_ms(), 1100);

        time.advance_secs(2);
        assert_eq!(time.now_ms(), 3100);
        assert_eq!(time.now_secs(), 3);
    }

    #[test]
    fn test_simulated_time_set() {
        let time = SimulatedTimeSource::new(1000);

        time.set(5000);
        assert_eq!(time.now_ms(), 5000);

        time.set(3000);
        assert_eq!(time.now_ms(), 3000);
    }

    #[test]
    fn test_simulated_time_saturates() {
        let time = SimulatedTimeSource::new(u64::MAX - 1);
        time.advance(10);
        assert_eq!(time.now_ms(), u64::MAX);
    }

    #[test]
    fn test_simulated_time_default() {
        let time = SimulatedTimeSource::default();
        assert_eq!(time.now_secs(), 1_700_000_000);
    }
}
