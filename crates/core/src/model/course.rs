use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::model::ids::{CourseId, LessonId, LessonItemId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown lesson item type: {0}")]
pub struct UnknownItemKind(pub String);

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub subtitle: String,
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

/// A numbered lesson. `number` is 1-based and drives ordering and tab labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    pub id: LessonId,
    pub course_id: CourseId,
    pub title: String,
    pub number: u32,
}

//
// ─── LESSON ITEM ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LessonItemKind {
    Theory,
    Example,
    Exercise,
}

impl LessonItemKind {
    /// Wire name used by the record store.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LessonItemKind::Theory => "theory",
            LessonItemKind::Example => "example",
            LessonItemKind::Exercise => "exercise",
        }
    }

    /// Human label shown next to an item.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            LessonItemKind::Theory => "Theory",
            LessonItemKind::Example => "Example",
            LessonItemKind::Exercise => "Exercise",
        }
    }
}

impl fmt::Display for LessonItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LessonItemKind {
    type Err = UnknownItemKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "theory" => Ok(Self::Theory),
            "example" => Ok(Self::Example),
            "exercise" => Ok(Self::Exercise),
            other => Err(UnknownItemKind(other.to_owned())),
        }
    }
}

/// One addressable unit of lesson content.
///
/// Exercise items keep their question in a separate `Exercise` record keyed by
/// `lesson_item_id`; `content_markdown` is then usually empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonItem {
    pub id: LessonItemId,
    pub lesson_id: LessonId,
    pub title: String,
    pub kind: LessonItemKind,
    pub content_markdown: String,
    pub order_index: i32,
}

impl LessonItem {
    #[must_use]
    pub fn is_exercise(&self) -> bool {
        self.kind == LessonItemKind::Exercise
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_kind_round_trips_wire_names() {
        for kind in [
            LessonItemKind::Theory,
            LessonItemKind::Example,
            LessonItemKind::Exercise,
        ] {
            assert_eq!(kind.as_str().parse::<LessonItemKind>().unwrap(), kind);
        }
    }

    #[test]
    fn item_kind_rejects_unknown() {
        let err = "quiz".parse::<LessonItemKind>().unwrap_err();
        assert_eq!(err, UnknownItemKind("quiz".into()));
    }
}
