use std::str::FromStr;

use learn_core::model::{Course, Lesson, LessonProgress, Section};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// Reads a TEXT uuid column into one of the id newtypes.
pub(crate) fn id_col<T>(row: &SqliteRow, column: &'static str) -> Result<T, StorageError>
where
    T: FromStr,
    T::Err: core::fmt::Display,
{
    let raw: String = row.try_get(column).map_err(ser)?;
    raw.parse::<T>()
        .map_err(|e| StorageError::Serialization(format!("{column}: {e}")))
}

pub(crate) fn u32_col(row: &SqliteRow, column: &'static str) -> Result<u32, StorageError> {
    let v: i64 = row.try_get(column).map_err(ser)?;
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {column}: {v}")))
}

fn bool_col(row: &SqliteRow, column: &'static str) -> Result<bool, StorageError> {
    Ok(row.try_get::<i64, _>(column).map_err(ser)? != 0)
}

pub(crate) fn map_course_row(row: &SqliteRow) -> Result<Course, StorageError> {
    let price: i64 = row.try_get("price_cents").map_err(ser)?;
    let price_cents = u64::try_from(price)
        .map_err(|_| StorageError::Serialization(format!("invalid price_cents: {price}")))?;
    let has_certificate = bool_col(row, "has_certificate")?;
    let is_lifetime_access = bool_col(row, "is_lifetime_access")?;

    Course::new(
        id_col(row, "id")?,
        id_col(row, "instructor_id")?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<String, _>("description").map_err(ser)?,
        price_cents,
        row.try_get("created_at").map_err(ser)?,
    )
    .map(|course| {
        course
            .with_certificate(has_certificate)
            .with_lifetime_access(is_lifetime_access)
    })
    .map_err(ser)
}

pub(crate) fn map_section_row(row: &SqliteRow) -> Result<Section, StorageError> {
    Section::new(
        id_col(row, "id")?,
        id_col(row, "course_id")?,
        row.try_get::<String, _>("title").map_err(ser)?,
        u32_col(row, "position")?,
    )
    .map_err(ser)
}

pub(crate) fn map_lesson_row(row: &SqliteRow) -> Result<Lesson, StorageError> {
    let video_url: String = row.try_get("video_url").map_err(ser)?;
    Lesson::new(
        id_col(row, "id")?,
        id_col(row, "section_id")?,
        row.try_get::<String, _>("title").map_err(ser)?,
        &video_url,
        row.try_get::<Option<String>, _>("duration").map_err(ser)?,
        u32_col(row, "position")?,
    )
    .map_err(ser)
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<LessonProgress, StorageError> {
    let pct = u32_col(row, "completion_percentage")?;
    let pct = u8::try_from(pct)
        .map_err(|_| StorageError::Serialization(format!("invalid completion_percentage: {pct}")))?;

    LessonProgress::from_persisted(
        id_col(row, "user_id")?,
        id_col(row, "lesson_id")?,
        id_col(row, "course_id")?,
        u32_col(row, "watch_time_seconds")?,
        u32_col(row, "total_duration_seconds")?,
        pct,
        bool_col(row, "is_completed")?,
        row.try_get("last_accessed").map_err(ser)?,
        row.try_get("completed_at").map_err(ser)?,
    )
    .map_err(ser)
}
