use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use services::{PlayerError, PlayerState, VideoPlayer};

#[derive(Debug)]
struct Playback {
    state: PlayerState,
    time: f64,
    duration: f64,
}

/// Terminal stand-in for the embedded player. Clones share one playhead.
#[derive(Debug, Clone)]
pub struct SimulatedPlayer {
    inner: Arc<Mutex<Playback>>,
}

impl SimulatedPlayer {
    pub fn new(duration: f64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Playback {
                state: PlayerState::Cued,
                time: 0.0,
                duration,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Playback> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_state(&self, state: PlayerState) {
        self.lock().state = state;
    }

    pub fn position(&self) -> f64 {
        self.lock().time
    }

    /// Move the playhead while playing. Returns `true` once the end is reached.
    pub fn step(&self, seconds: f64) -> bool {
        let mut playback = self.lock();
        if playback.state != PlayerState::Playing {
            return false;
        }
        playback.time = (playback.time + seconds).min(playback.duration);
        if playback.time >= playback.duration {
            playback.state = PlayerState::Ended;
            return true;
        }
        false
    }
}

impl VideoPlayer for SimulatedPlayer {
    fn state(&self) -> Option<PlayerState> {
        Some(self.lock().state)
    }

    fn current_time(&self) -> Option<f64> {
        Some(self.lock().time)
    }

    fn duration(&self) -> Option<f64> {
        Some(self.lock().duration)
    }

    fn seek_to(&self, seconds: f64) -> Result<(), PlayerError> {
        let mut playback = self.lock();
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(PlayerError::Rejected(format!("invalid position {seconds}")));
        }
        playback.time = seconds.min(playback.duration);
        Ok(())
    }
}
