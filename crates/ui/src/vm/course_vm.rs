use learn_core::model::CourseProgress;

use crate::vm::time_fmt::format_datetime;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CourseSummaryVm {
    pub lessons_str: String,
    pub completion_percentage: u8,
    pub last_accessed_str: Option<String>,
}

impl From<&CourseProgress> for CourseSummaryVm {
    fn from(progress: &CourseProgress) -> Self {
        Self {
            lessons_str: format!(
                "{}/{} lessons",
                progress.completed_lessons, progress.total_lessons
            ),
            completion_percentage: progress.completion_percentage,
            last_accessed_str: progress.last_accessed.map(format_datetime),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use learn_core::model::CourseId;

    #[test]
    fn empty_course_has_no_last_access() {
        let vm = CourseSummaryVm::from(&CourseProgress::empty(CourseId::random()));
        assert_eq!(vm.lessons_str, "0/0 lessons");
        assert_eq!(vm.completion_percentage, 0);
        assert_eq!(vm.last_accessed_str, None);
    }
}
