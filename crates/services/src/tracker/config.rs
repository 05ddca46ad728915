use std::time::Duration;

use crate::error::TrackerConfigError;

/// Poll cadence of the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    coarse_period: Duration,
    fine_period: Duration,
}

impl TrackerConfig {
    pub const DEFAULT_COARSE_PERIOD: Duration = Duration::from_secs(10);
    pub const DEFAULT_FINE_PERIOD: Duration = Duration::from_secs(1);

    /// # Errors
    ///
    /// Returns `TrackerConfigError::ZeroPeriod` if either period is zero.
    pub fn new(coarse_period: Duration, fine_period: Duration) -> Result<Self, TrackerConfigError> {
        if coarse_period.is_zero() || fine_period.is_zero() {
            return Err(TrackerConfigError::ZeroPeriod);
        }
        Ok(Self {
            coarse_period,
            fine_period,
        })
    }

    /// Period of the persistence poll.
    #[must_use]
    pub fn coarse_period(&self) -> Duration {
        self.coarse_period
    }

    /// Period of the display poll.
    #[must_use]
    pub fn fine_period(&self) -> Duration {
        self.fine_period
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            coarse_period: Self::DEFAULT_COARSE_PERIOD,
            fine_period: Self::DEFAULT_FINE_PERIOD,
        }
    }
}
