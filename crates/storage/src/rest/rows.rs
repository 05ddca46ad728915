use chrono::{DateTime, Utc};
use learn_core::model::{
    Course, CourseId, Lesson, LessonId, LessonProgress, SectionId, Section, UserId,
    whole_seconds,
};
use serde::{Deserialize, Serialize};

use super::RestGatewayError;

fn invalid<E: std::fmt::Display>(e: E) -> RestGatewayError {
    RestGatewayError::InvalidRow(e.to_string())
}

/// `courses` row. Prices are stored in currency units by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseRow {
    pub id: CourseId,
    pub instructor_id: UserId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub has_certificate: bool,
    #[serde(default = "default_true")]
    pub is_lifetime_access: bool,
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl CourseRow {
    #[must_use]
    pub fn from_course(course: &Course) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let price = course.price_cents() as f64 / 100.0;
        Self {
            id: course.id(),
            instructor_id: course.instructor_id(),
            title: course.title().to_string(),
            description: Some(course.description().to_string()),
            price,
            has_certificate: course.has_certificate(),
            is_lifetime_access: course.is_lifetime_access(),
            created_at: course.created_at(),
        }
    }

    /// # Errors
    ///
    /// Returns `RestGatewayError::InvalidRow` if the row fails domain validation.
    pub fn into_course(self) -> Result<Course, RestGatewayError> {
        let cents = (self.price.max(0.0) * 100.0).round();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let price_cents = cents as u64;
        Course::new(
            self.id,
            self.instructor_id,
            self.title,
            self.description.unwrap_or_default(),
            price_cents,
            self.created_at,
        )
        .map(|c| {
            c.with_certificate(self.has_certificate)
                .with_lifetime_access(self.is_lifetime_access)
        })
        .map_err(invalid)
    }
}

/// `course_sections` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionRow {
    pub id: SectionId,
    pub course_id: CourseId,
    pub title: String,
    pub position: u32,
}

impl SectionRow {
    #[must_use]
    pub fn from_section(section: &Section) -> Self {
        Self {
            id: section.id(),
            course_id: section.course_id(),
            title: section.title().to_string(),
            position: section.position(),
        }
    }

    /// # Errors
    ///
    /// Returns `RestGatewayError::InvalidRow` if the row fails domain validation.
    pub fn into_section(self) -> Result<Section, RestGatewayError> {
        Section::new(self.id, self.course_id, self.title, self.position).map_err(invalid)
    }
}

/// `course_lessons` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonRow {
    pub id: LessonId,
    pub section_id: SectionId,
    pub title: String,
    pub video_url: String,
    #[serde(default)]
    pub duration: Option<String>,
    pub position: u32,
}

impl LessonRow {
    #[must_use]
    pub fn from_lesson(lesson: &Lesson) -> Self {
        Self {
            id: lesson.id(),
            section_id: lesson.section_id(),
            title: lesson.title().to_string(),
            video_url: lesson.video_url().to_string(),
            duration: lesson.duration_label().map(ToString::to_string),
            position: lesson.position(),
        }
    }

    /// # Errors
    ///
    /// Returns `RestGatewayError::InvalidRow` if the row fails domain validation.
    pub fn into_lesson(self) -> Result<Lesson, RestGatewayError> {
        Lesson::new(
            self.id,
            self.section_id,
            self.title,
            &self.video_url,
            self.duration,
            self.position,
        )
        .map_err(invalid)
    }
}

/// `lesson_progress` row as returned by the backend.
///
/// Numeric columns may come back as floats; they are floored on read.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressRow {
    pub user_id: UserId,
    pub lesson_id: LessonId,
    pub course_id: CourseId,
    #[serde(default)]
    pub watch_time_seconds: f64,
    #[serde(default)]
    pub total_duration_seconds: f64,
    #[serde(default)]
    pub completion_percentage: f64,
    #[serde(default)]
    pub is_completed: bool,
    pub last_accessed: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ProgressRow {
    /// # Errors
    ///
    /// Returns `RestGatewayError::InvalidRow` if the row is inconsistent.
    pub fn into_progress(self) -> Result<LessonProgress, RestGatewayError> {
        let pct = self.completion_percentage.round().clamp(0.0, 100.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let pct = pct as u8;
        LessonProgress::from_persisted(
            self.user_id,
            self.lesson_id,
            self.course_id,
            whole_seconds(self.watch_time_seconds),
            whole_seconds(self.total_duration_seconds),
            pct,
            self.is_completed,
            self.last_accessed,
            // a completed_at on an incomplete row is dropped rather than rejected
            self.completed_at.filter(|_| self.is_completed),
        )
        .map_err(invalid)
    }
}

/// Partial `lesson_progress` payload; absent fields are left to the backend.
#[derive(Debug, Clone, Default, Serialize)]
pub(crate) struct ProgressWrite {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_id: Option<LessonId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<CourseId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch_time_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_duration_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_percentage: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    pub last_accessed: String,
}

/// `user_courses` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct EnrollmentRow {
    pub user_id: UserId,
    pub course_id: CourseId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use learn_core::time::fixed_now;

    #[test]
    fn progress_row_floors_float_columns() {
        let json = serde_json::json!({
            "user_id": "6f1c2a4e-3b7d-4c8e-9a0b-1d2e3f405162",
            "lesson_id": "00000000-0000-4000-8000-000000000001",
            "course_id": "00000000-0000-4000-8000-000000000002",
            "watch_time_seconds": 299.8,
            "total_duration_seconds": 600,
            "completion_percentage": 49.6,
            "is_completed": false,
            "last_accessed": "2023-11-14T22:13:20Z",
            "completed_at": null
        });
        let row: ProgressRow = serde_json::from_value(json).unwrap();
        let progress = row.into_progress().unwrap();

        assert_eq!(progress.watch_time_seconds(), 299);
        assert_eq!(progress.total_duration_seconds(), 600);
        assert_eq!(progress.completion_percentage(), 50);
        assert_eq!(progress.last_accessed(), fixed_now());
    }

    #[test]
    fn progress_write_omits_unset_fields() {
        let write = ProgressWrite {
            watch_time_seconds: Some(10),
            last_accessed: "2023-11-14T22:13:20+00:00".into(),
            ..ProgressWrite::default()
        };
        let json = serde_json::to_value(&write).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert!(!obj.contains_key("completion_percentage"));
    }

    #[test]
    fn course_row_converts_price_to_cents() {
        let course = Course::new(
            CourseId::random(),
            UserId::random(),
            "Rust",
            "Systems",
            1999,
            fixed_now(),
        )
        .unwrap();
        let row = CourseRow::from_course(&course);
        assert!((row.price - 19.99).abs() < f64::EPSILON);
        assert_eq!(row.into_course().unwrap().price_cents(), 1999);
    }
}
