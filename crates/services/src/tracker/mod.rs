mod config;
mod machine;
mod player;
mod schedule;
mod state;

// Public API of the progress tracker.
pub use crate::error::TrackerConfigError;
pub use config::TrackerConfig;
pub use machine::{Completion, ProgressDisplay, ProgressTracker};
pub use player::{PlayerError, PlayerState, VideoPlayer};
pub use schedule::{Poll, PollSchedule};
pub use state::{SelectedLesson, TrackerState};
