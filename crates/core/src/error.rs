use thiserror::Error;

use crate::model::{CourseError, ParseIdError, ProgressError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Id(#[from] ParseIdError),
}
