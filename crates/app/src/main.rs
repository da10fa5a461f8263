use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use learn_core::model::{Exercise, ExerciseKind, LessonItemId, ToggleChange, UserId};
use learn_core::{AuthError, Evaluator};
use services::{AppServices, Clock, LearnerWorkspace};
use storage::seed::seed_sample_course;
use storage::sqlite::SqliteRepository;
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::{AppConfig, Backend, prepare_sqlite_file};
use render::ConsoleNotifier;

#[derive(Parser)]
#[command(name = "learn", version, about = "Work through a course from the terminal")]
struct Cli {
    /// Storage backend (env: LEARN_BACKEND)
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// SQLite database URL (env: LEARN_DB_URL)
    #[arg(long)]
    db: Option<String>,

    /// Signed-in user id (env: LEARN_USER_ID)
    #[arg(long)]
    user: Option<UserId>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show course progress and the syllabus
    Dashboard,

    /// Show one lesson with its items and exercises
    Lesson {
        /// Lesson number, starting at 1
        number: u32,
    },

    /// Mark a lesson item complete, or undo it
    Toggle {
        /// Lesson item id
        item: LessonItemId,
    },

    /// Submit an answer for an exercise item
    Submit {
        /// Lesson item id of the exercise
        item: LessonItemId,

        /// Answer text; for multiple choice, the option text or its number
        #[arg(allow_hyphen_values = true)]
        answer: String,
    },

    /// Write the sample course into the SQLite database
    Seed,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn build_services(config: &AppConfig) -> Result<AppServices, Box<dyn std::error::Error>> {
    let evaluator = Evaluator::new().with_zero_tolerance(config.zero_tolerance);
    let notifier = Arc::new(ConsoleNotifier);
    tracing::debug!(backend = ?config.backend, "building services");
    let services = match config.backend {
        Backend::Sqlite => {
            prepare_sqlite_file(&config.db_url)?;
            AppServices::new_sqlite(&config.db_url, Clock::system(), evaluator, notifier).await?
        }
        Backend::Remote => {
            let remote = config.remote_config(&config.session())?;
            AppServices::new_remote(&remote, Clock::system(), evaluator, notifier)?
        }
    };
    Ok(services)
}

// Multiple-choice answers may be given by 1-based option number.
fn resolve_choice(exercise: &Exercise, raw: String) -> String {
    if exercise.kind() != ExerciseKind::MultipleChoice
        || exercise.options().iter().any(|option| *option == raw)
    {
        return raw;
    }
    raw.trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|idx| exercise.options().get(idx).cloned())
        .unwrap_or(raw)
}

async fn seed(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.backend != Backend::Sqlite {
        return Err("seed only writes to the sqlite backend".into());
    }
    prepare_sqlite_file(&config.db_url)?;
    let repo = SqliteRepository::connect(&config.db_url).await?;
    repo.migrate().await?;
    let report = seed_sample_course(&repo).await?;
    println!(
        "Seeded course {} with {} lessons, {} items and {} exercises into {}",
        report.course_id, report.lessons, report.items, report.exercises, config.db_url
    );
    Ok(())
}

async fn execute(
    workspace: &mut LearnerWorkspace,
    command: Command,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Dashboard => {
            print!("{}", render::dashboard(&workspace.view()));
        }
        Command::Lesson { number } => {
            let lesson = workspace
                .catalog()
                .lesson_by_number(number)
                .cloned()
                .ok_or_else(|| format!("no lesson {number}"))?;
            print!("{}", render::lesson(workspace, &lesson));
        }
        Command::Toggle { item } => {
            let change = workspace.toggle_item(item).await?;
            let title = workspace
                .catalog()
                .item(item)
                .map(|i| i.title.clone())
                .unwrap_or_default();
            match change {
                ToggleChange::Completed => println!("Completed: {title}"),
                ToggleChange::Uncompleted => println!("Marked not completed: {title}"),
            }
            println!("{}", workspace.view().progress_label());
        }
        Command::Submit { item, answer } => {
            let answer = match workspace.catalog().exercise_for_item(item) {
                Some(exercise) => resolve_choice(exercise, answer),
                None => answer,
            };
            let submission = workspace.submit_exercise(item, &answer).await?;
            if submission.marked_complete {
                println!("Item marked complete.");
            }
            println!("{}", workspace.view().progress_label());
        }
        Command::Seed => return Err("seed runs without a workspace".into()),
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = AppConfig::from_env()?.with_overrides(cli.backend, cli.db, cli.user)?;

    if matches!(cli.command, Command::Seed) {
        return seed(&config).await;
    }

    let session = config.session();
    if !session.is_signed_in() {
        eprintln!("{}", render::SIGN_IN_HINT);
        return Err(AuthError::NotSignedIn.into());
    }

    let services = build_services(&config).await?;
    let Some(mut workspace) = services.open_workspace(session).await? else {
        println!("{}", render::NO_COURSE);
        println!("{}", render::SIGN_OUT_HINT);
        return Ok(());
    };

    execute(&mut workspace, cli.command).await
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        process::exit(2);
    }
}
