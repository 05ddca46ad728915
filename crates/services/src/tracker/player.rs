use thiserror::Error;

/// Playback state reported by the embedded player.
///
/// Numeric codes follow the embedded-player convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

impl PlayerState {
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::Unstarted),
            0 => Some(Self::Ended),
            1 => Some(Self::Playing),
            2 => Some(Self::Paused),
            3 => Some(Self::Buffering),
            5 => Some(Self::Cued),
            _ => None,
        }
    }

    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Self::Unstarted => -1,
            Self::Ended => 0,
            Self::Playing => 1,
            Self::Paused => 2,
            Self::Buffering => 3,
            Self::Cued => 5,
        }
    }

    #[must_use]
    pub fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PlayerError {
    #[error("player is not ready")]
    NotReady,
    #[error("player rejected the command: {0}")]
    Rejected(String),
}

/// Handle to an embedded video player.
///
/// Queries return `None` while the player API is unavailable.
pub trait VideoPlayer: Send + Sync {
    fn state(&self) -> Option<PlayerState>;

    /// Current playback position in seconds.
    fn current_time(&self) -> Option<f64>;

    /// Media duration in seconds.
    fn duration(&self) -> Option<f64>;

    /// # Errors
    ///
    /// Returns `PlayerError` if the player cannot seek.
    fn seek_to(&self, seconds: f64) -> Result<(), PlayerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_both_ways() {
        for state in [
            PlayerState::Unstarted,
            PlayerState::Ended,
            PlayerState::Playing,
            PlayerState::Paused,
            PlayerState::Buffering,
            PlayerState::Cued,
        ] {
            assert_eq!(PlayerState::from_code(state.code()), Some(state));
        }
        assert_eq!(PlayerState::from_code(4), None);
    }
}
