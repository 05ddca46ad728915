use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{CourseId, LessonId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("completion percentage must be <= 100, got {0}")]
    InvalidPercentage(u8),

    #[error("completed_at is set but the lesson is not completed")]
    CompletedAtWithoutCompletion,
}

/// Completion derived from a playback position, as a whole percent in `0..=100`.
///
/// A zero, negative or non-finite duration yields `0`.
#[must_use]
pub fn completion_percentage(watch_time_seconds: f64, total_duration_seconds: f64) -> u8 {
    if !total_duration_seconds.is_finite() || total_duration_seconds <= 0.0 {
        return 0;
    }
    if !watch_time_seconds.is_finite() {
        return 0;
    }
    let pct = (watch_time_seconds / total_duration_seconds * 100.0).round();
    // clamped above, so the cast cannot truncate
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let pct = pct.clamp(0.0, 100.0) as u8;
    pct
}

/// Floors a player-reported position to whole seconds; garbage becomes `0`.
#[must_use]
pub fn whole_seconds(seconds: f64) -> u32 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let secs = seconds.floor().min(f64::from(u32::MAX)) as u32;
    secs
}

//
// ─── UPDATE ────────────────────────────────────────────────────────────────────
//

/// A single progress write for one `(user, lesson)` pair.
///
/// `completion_percentage: None` leaves the stored percentage untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub user_id: UserId,
    pub lesson_id: LessonId,
    pub course_id: CourseId,
    pub watch_time_seconds: f64,
    pub total_duration_seconds: f64,
    pub completion_percentage: Option<u8>,
}

impl ProgressUpdate {
    #[must_use]
    pub fn watch_time(&self) -> u32 {
        whole_seconds(self.watch_time_seconds)
    }

    #[must_use]
    pub fn total_duration(&self) -> u32 {
        whole_seconds(self.total_duration_seconds)
    }

    /// The percentage clamped into range.
    #[must_use]
    pub fn clamped_percentage(&self) -> Option<u8> {
        self.completion_percentage.map(|p| p.min(100))
    }
}

//
// ─── LESSON PROGRESS ───────────────────────────────────────────────────────────
//

/// Persisted watch-state for one `(user, lesson)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonProgress {
    user_id: UserId,
    lesson_id: LessonId,
    course_id: CourseId,
    watch_time_seconds: u32,
    total_duration_seconds: u32,
    completion_percentage: u8,
    is_completed: bool,
    last_accessed: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl LessonProgress {
    /// A fresh record, as created lazily by the first write.
    #[must_use]
    pub fn new(
        user_id: UserId,
        lesson_id: LessonId,
        course_id: CourseId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            lesson_id,
            course_id,
            watch_time_seconds: 0,
            total_duration_seconds: 0,
            completion_percentage: 0,
            is_completed: false,
            last_accessed: now,
            completed_at: None,
        }
    }

    /// Rehydrate a record from storage.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the percentage is out of range or the
    /// completion fields disagree.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        user_id: UserId,
        lesson_id: LessonId,
        course_id: CourseId,
        watch_time_seconds: u32,
        total_duration_seconds: u32,
        completion_percentage: u8,
        is_completed: bool,
        last_accessed: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Self, ProgressError> {
        if completion_percentage > 100 {
            return Err(ProgressError::InvalidPercentage(completion_percentage));
        }
        if completed_at.is_some() && !is_completed {
            return Err(ProgressError::CompletedAtWithoutCompletion);
        }
        Ok(Self {
            user_id,
            lesson_id,
            course_id,
            watch_time_seconds,
            total_duration_seconds,
            completion_percentage,
            is_completed,
            last_accessed,
            completed_at,
        })
    }

    /// Apply a progress write. Last write wins for position and duration.
    pub fn apply_update(&mut self, update: &ProgressUpdate, now: DateTime<Utc>) {
        self.watch_time_seconds = update.watch_time();
        self.total_duration_seconds = update.total_duration();
        if let Some(pct) = update.clamped_percentage() {
            self.completion_percentage = pct;
        }
        self.last_accessed = now;
    }

    /// Explicit completion. Calling it again keeps the first `completed_at`.
    pub fn mark_completed(&mut self, now: DateTime<Utc>) {
        self.is_completed = true;
        self.completion_percentage = 100;
        self.completed_at.get_or_insert(now);
        self.last_accessed = now;
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    #[must_use]
    pub fn watch_time_seconds(&self) -> u32 {
        self.watch_time_seconds
    }

    #[must_use]
    pub fn total_duration_seconds(&self) -> u32 {
        self.total_duration_seconds
    }

    #[must_use]
    pub fn completion_percentage(&self) -> u8 {
        self.completion_percentage
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    #[must_use]
    pub fn last_accessed(&self) -> DateTime<Utc> {
        self.last_accessed
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }
}

//
// ─── COURSE PROGRESS ───────────────────────────────────────────────────────────
//

/// Aggregate over the lesson progress rows of one course. Never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseProgress {
    pub course_id: CourseId,
    pub total_lessons: u32,
    pub completed_lessons: u32,
    pub completion_percentage: u8,
    pub last_accessed: Option<DateTime<Utc>>,
    pub total_watch_time_seconds: u64,
}

impl CourseProgress {
    /// Aggregate `rows` against the course's lesson count.
    #[must_use]
    pub fn from_rows(course_id: CourseId, total_lessons: u32, rows: &[LessonProgress]) -> Self {
        let completed = rows.iter().filter(|p| p.is_completed()).count();
        let completed_lessons = u32::try_from(completed).unwrap_or(u32::MAX);
        let completion_percentage =
            completion_percentage(f64::from(completed_lessons), f64::from(total_lessons));

        Self {
            course_id,
            total_lessons,
            completed_lessons,
            completion_percentage,
            last_accessed: rows.iter().map(LessonProgress::last_accessed).max(),
            total_watch_time_seconds: rows
                .iter()
                .map(|p| u64::from(p.watch_time_seconds()))
                .sum(),
        }
    }

    /// The all-zero summary for a course with nothing recorded.
    #[must_use]
    pub fn empty(course_id: CourseId) -> Self {
        Self::from_rows(course_id, 0, &[])
    }
}
