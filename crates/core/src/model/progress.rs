use std::collections::BTreeSet;

use crate::model::ids::{CourseId, LessonItemId, UserId};

/// Direction of a completion toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleChange {
    Completed,
    Uncompleted,
}

/// Lesson items a user has marked done within one course.
///
/// Membership only; iteration order is stable (sorted by id) so persisted
/// payloads are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletedSet(BTreeSet<LessonItemId>);

impl CompletedSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, item: LessonItemId) -> bool {
        self.0.contains(&item)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = LessonItemId> + '_ {
        self.0.iter().copied()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<LessonItemId> {
        self.iter().collect()
    }

    /// Returns the set with `item` flipped, leaving `self` untouched.
    ///
    /// Present items are removed, absent ones added, so applying the same
    /// toggle twice yields the original set.
    #[must_use]
    pub fn toggled(&self, item: LessonItemId) -> (Self, ToggleChange) {
        let mut next = self.0.clone();
        let change = if next.remove(&item) {
            ToggleChange::Uncompleted
        } else {
            next.insert(item);
            ToggleChange::Completed
        };
        (Self(next), change)
    }
}

impl FromIterator<LessonItemId> for CompletedSet {
    fn from_iter<I: IntoIterator<Item = LessonItemId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Progress row keyed by `(user_id, course_id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProgress {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub completed_items: CompletedSet,
}

impl UserProgress {
    #[must_use]
    pub fn empty(user_id: UserId, course_id: CourseId) -> Self {
        Self {
            user_id,
            course_id,
            completed_items: CompletedSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_adds_missing_item() {
        let item = LessonItemId::random();
        let (next, change) = CompletedSet::new().toggled(item);
        assert!(next.contains(item));
        assert_eq!(change, ToggleChange::Completed);
    }

    #[test]
    fn toggle_removes_present_item() {
        let item = LessonItemId::random();
        let set: CompletedSet = [item].into_iter().collect();
        let (next, change) = set.toggled(item);
        assert!(next.is_empty());
        assert_eq!(change, ToggleChange::Uncompleted);
    }

    #[test]
    fn double_toggle_is_identity() {
        let keep = LessonItemId::random();
        let set: CompletedSet = [keep].into_iter().collect();
        for item in [keep, LessonItemId::random()] {
            let (once, _) = set.toggled(item);
            let (twice, _) = once.toggled(item);
            assert_eq!(twice, set);
        }
    }

    #[test]
    fn toggled_does_not_mutate_original() {
        let item = LessonItemId::random();
        let set = CompletedSet::new();
        let _ = set.toggled(item);
        assert!(set.is_empty());
    }
}
