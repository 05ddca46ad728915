//! Shared error types for the services crate.

use std::path::PathBuf;

use thiserror::Error;

use learn_core::model::{CourseError, CourseId};
use storage::repository::StorageError;

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogServiceError {
    #[error("a course needs at least one section")]
    NoSections,
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors that end the course-learning flow before it starts.
///
/// Access denial is not an error; it is the `LearningView::AccessDenied` state.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LearningSessionError {
    #[error("course {0} not found")]
    CourseNotFound(CourseId),
    #[error(transparent)]
    Catalog(#[from] CatalogServiceError),
    #[error(transparent)]
    Progress(#[from] ProgressServiceError),
}

/// Errors emitted by `TrackerConfig`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TrackerConfigError {
    #[error("poll periods must be non-zero")]
    ZeroPeriod,
}

/// Errors emitted while loading or saving the learner session file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LearnerSessionError {
    #[error("failed to access session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
