//! Back-off configuration for the accept loop.

use std::time::Duration;

/// Exponential back-off timing applied when `accept()` fails.
///
/// The delay starts at `initial_delay`, doubles on every consecutive
/// failure, and is capped at `max_delay`; a successful accept resets it.
///
/// # Invariants
///
/// - `initial_delay` must not exceed `max_delay`
/// - both delays must be at least one millisecond
///
/// [`BackoffConfig::normalized`] repairs configurations that violate these
/// before the accept loop uses them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffConfig {
    /// Delay before the first retry after an `accept()` failure.
    pub initial_delay: Duration,
    /// Ceiling for the exponentially growing delay.
    pub max_delay: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_secs(1),
        }
    }
}

impl BackoffConfig {
    /// Clamp the delays to sane bounds and restore the ordering invariant.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use framegate::BackoffConfig;
    ///
    /// let cfg = BackoffConfig {
    ///     initial_delay: Duration::from_millis(5),
    ///     max_delay: Duration::from_millis(1),
    /// };
    ///
    /// let normalized = cfg.normalized();
    /// assert_eq!(normalized.initial_delay, Duration::from_millis(1));
    /// assert_eq!(normalized.max_delay, Duration::from_millis(5));
    /// ```
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.initial_delay = self.initial_delay.max(Duration::from_millis(1));
        self.max_delay = self.max_delay.max(Duration::from_millis(1));
        if self.initial_delay > self.max_delay {
            std::mem::swap(&mut self.initial_delay, &mut self.max_delay);
        }
        self
    }
}
