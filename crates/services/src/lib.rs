#![forbid(unsafe_code)]

pub mod catalog_service;
pub mod error;
pub mod learner;
pub mod learning;
pub mod progress_service;
pub mod tracker;

pub use learn_core::Clock;

pub use catalog_service::{CatalogService, CourseInput, LessonInput, SectionInput};
pub use error::{
    CatalogServiceError, LearnerSessionError, LearningSessionError, ProgressServiceError,
    TrackerConfigError,
};
pub use learner::LearnerSession;
pub use learning::{CourseLearningSession, LearningView, initial_lesson};
pub use progress_service::{LessonWithProgress, ProgressService, SectionWithLessons};
pub use tracker::{
    Completion, PlayerError, PlayerState, ProgressDisplay, ProgressTracker, TrackerConfig,
    TrackerState, VideoPlayer,
};
