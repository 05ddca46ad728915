mod course;
mod ids;
mod progress;

pub use ids::{CourseId, LessonId, ParseIdError, SectionId, UserId};

pub use course::{Course, CourseError, Lesson, Section, youtube_video_id};
pub use progress::{
    CourseProgress, LessonProgress, ProgressError, ProgressUpdate, completion_percentage,
    whole_seconds,
};
