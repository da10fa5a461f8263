//! Plain-text rendering for the terminal front-end.

use std::fmt::Write as _;

use learn_core::ExerciseState;
use learn_core::model::{Exercise, ExerciseKind, Lesson};
use services::{DashboardView, LearnerWorkspace, Notice, Notifier, Severity};

pub const NO_COURSE: &str =
    "No Course Available\nNo course content has been created yet. Please contact your instructor.";
pub const SIGN_OUT_HINT: &str = "Sign out: unset LEARN_USER_ID and LEARN_ACCESS_TOKEN.";
pub const SIGN_IN_HINT: &str = "Please sign in: set LEARN_USER_ID (and LEARN_ACCESS_TOKEN) or pass --user.";

const BAR_WIDTH: usize = 20;

/// Prints notices to stdout as they arrive.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        let marker = match notice.severity {
            Severity::Success => "+",
            Severity::Info => "*",
            Severity::Error => "!",
        };
        println!("[{marker}] {}: {}", notice.title, notice.description);
    }
}

fn progress_bar(percent: usize) -> String {
    let filled = (percent.min(100) * BAR_WIDTH) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

#[must_use]
pub fn dashboard(view: &DashboardView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", view.course_title);
    if !view.course_subtitle.is_empty() {
        let _ = writeln!(out, "{}", view.course_subtitle);
    }
    let _ = writeln!(
        out,
        "\n{} {}%  {}",
        progress_bar(view.percent),
        view.percent,
        view.progress_label()
    );

    for lesson in &view.lessons {
        let _ = writeln!(out, "\nLesson {}: {}", lesson.number, lesson.title);
        for item in &lesson.items {
            let check = if item.completed { "x" } else { " " };
            let _ = writeln!(
                out,
                "  [{check}] {} ({})  {}",
                item.title,
                item.kind.label(),
                item.id
            );
        }
    }
    out
}

fn exercise(out: &mut String, exercise: &Exercise, state: ExerciseState) {
    let _ = writeln!(out, "    Exercise ({})", exercise.kind().label());
    let _ = writeln!(out, "    {}", exercise.question());
    if exercise.kind() == ExerciseKind::MultipleChoice {
        for (idx, option) in exercise.options().iter().enumerate() {
            let _ = writeln!(out, "      {}. {option}", idx + 1);
        }
    }
    if let Some(tolerance) = exercise.tolerance().filter(|t| *t > 0.0) {
        let _ = writeln!(out, "    Tolerance: ±{tolerance}");
    }
    match state.outcome() {
        Some(true) => {
            let _ = writeln!(out, "    Answered: correct");
        }
        Some(false) => {
            let _ = writeln!(out, "    Answered: incorrect");
        }
        None => {}
    }
}

#[must_use]
pub fn lesson(workspace: &LearnerWorkspace, lesson: &Lesson) -> String {
    let catalog = workspace.catalog();
    let mut out = String::new();
    let _ = writeln!(out, "Lesson {}: {}", lesson.number, lesson.title);

    for item in catalog.items_for_lesson(lesson.id) {
        let done = if workspace.completed().contains(item.id) {
            " (completed)"
        } else {
            ""
        };
        let _ = writeln!(out, "\n  {} [{}]{done}", item.title, item.kind.label());
        let _ = writeln!(out, "  id: {}", item.id);

        match catalog.exercise_for_item(item.id) {
            Some(ex) if item.is_exercise() => {
                let state = workspace.exercise_state(item.id).unwrap_or_default();
                exercise(&mut out, ex, state);
            }
            _ => {
                for line in item.content_markdown.lines() {
                    let _ = writeln!(out, "    {line}");
                }
            }
        }
    }
    out
}
