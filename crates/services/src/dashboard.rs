use learn_core::model::{CompletedSet, LessonItemId, LessonItemKind};

use crate::course_service::CourseCatalog;

/// One row of the syllabus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyllabusItem {
    pub id: LessonItemId,
    pub title: String,
    pub kind: LessonItemKind,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyllabusLesson {
    pub number: u32,
    pub title: String,
    pub items: Vec<SyllabusItem>,
}

/// Presentation-agnostic summary of a learner's course progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    pub course_title: String,
    pub course_subtitle: String,
    pub completed: usize,
    pub total: usize,
    /// Whole percent, rounded half up; `0` for a course without items.
    pub percent: usize,
    pub lessons: Vec<SyllabusLesson>,
}

impl DashboardView {
    /// Ids in `completed` that are not items of the catalog are ignored.
    #[must_use]
    pub fn build(catalog: &CourseCatalog, completed: &CompletedSet) -> Self {
        let lessons: Vec<SyllabusLesson> = catalog
            .lessons()
            .iter()
            .map(|lesson| SyllabusLesson {
                number: lesson.number,
                title: lesson.title.clone(),
                items: catalog
                    .items_for_lesson(lesson.id)
                    .map(|item| SyllabusItem {
                        id: item.id,
                        title: item.title.clone(),
                        kind: item.kind,
                        completed: completed.contains(item.id),
                    })
                    .collect(),
            })
            .collect();

        let total = catalog.item_count();
        let done = completed
            .iter()
            .filter(|id| catalog.item(*id).is_some())
            .count();

        Self {
            course_title: catalog.course().title.clone(),
            course_subtitle: catalog.course().subtitle.clone(),
            completed: done,
            total,
            percent: percent(done, total),
            lessons,
        }
    }

    #[must_use]
    pub fn progress_label(&self) -> String {
        format!("{} of {} completed", self.completed, self.total)
    }
}

fn percent(done: usize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    (200 * done + total) / (2 * total)
}
