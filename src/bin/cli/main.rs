mod app;
mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use studydesk_lib::flashcards::ReviewOutcome;
use studydesk_lib::planner::{CreateTaskRequest, Priority, TaskType};
use studydesk_lib::preferences::PreferencesPatch;

#[derive(Parser)]
#[command(name = "studydesk-cli", about = "Flashcard reviews and study planner", version)]
struct Cli {
    /// Use a specific data directory (default: platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Flashcard reviews
    #[command(subcommand)]
    Cards(CardsCommand),

    /// Study planner tasks
    #[command(subcommand)]
    Plan(PlanCommand),

    /// Remembered defaults
    #[command(subcommand)]
    Prefs(PrefsCommand),
}

#[derive(Subcommand)]
enum CardsCommand {
    /// Import cards from a JSON file containing an array of cards
    Import {
        file: PathBuf,
    },

    /// List cards due for review, in review order
    Due {
        /// Maximum cards to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Record the outcome of reviewing a card
    Review {
        id: String,
        outcome: OutcomeArg,
    },

    /// Show box distribution and due counts
    Stats,

    /// Suggest topics to study next
    Suggest {
        #[arg(long, default_value = "3")]
        limit: usize,
    },
}

#[derive(Subcommand)]
enum PlanCommand {
    /// List planner tasks
    List {
        /// Only show one day (YYYY-MM-DD)
        #[arg(long)]
        day: Option<String>,
    },

    /// Add a task
    Add {
        topic: String,
        /// Day of the task (YYYY-MM-DD)
        #[arg(long)]
        day: String,
        /// Task type (default: review)
        #[arg(long = "type")]
        task_type: Option<TaskTypeArg>,
        /// Priority (default: medium)
        #[arg(long)]
        priority: Option<PriorityArg>,
        /// Start time (HH:MM)
        #[arg(long)]
        start: Option<String>,
        /// End time (HH:MM)
        #[arg(long)]
        end: Option<String>,
        /// Planned minutes
        #[arg(long)]
        duration: Option<u32>,
        #[arg(long)]
        course: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },

    /// Toggle a task's completion
    Toggle {
        id: String,
    },

    /// Delete a task
    Rm {
        id: String,
    },
}

#[derive(Subcommand)]
enum PrefsCommand {
    /// Show current preferences
    Show,

    /// Update preferences
    Set {
        #[arg(long)]
        last_course: Option<String>,
        #[arg(long)]
        note_method: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum OutcomeArg {
    Correct,
    Incorrect,
}

impl From<OutcomeArg> for ReviewOutcome {
    fn from(arg: OutcomeArg) -> Self {
        match arg {
            OutcomeArg::Correct => Self::Correct,
            OutcomeArg::Incorrect => Self::Incorrect,
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum TaskTypeArg {
    Review,
    Study,
    Practice,
    Reading,
    Exam,
}

impl From<TaskTypeArg> for TaskType {
    fn from(arg: TaskTypeArg) -> Self {
        match arg {
            TaskTypeArg::Review => Self::Review,
            TaskTypeArg::Study => Self::Study,
            TaskTypeArg::Practice => Self::Practice,
            TaskTypeArg::Reading => Self::Reading,
            TaskTypeArg::Exam => Self::Exam,
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum PriorityArg {
    Low,
    Medium,
    High,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Low => Self::Low,
            PriorityArg::Medium => Self::Medium,
            PriorityArg::High => Self::High,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let app = app::App::new(cli.data_dir.as_deref())?;

    match cli.command {
        Command::Cards(subcmd) => match subcmd {
            CardsCommand::Import { file } => {
                commands::cards::run_import(&app, &file, &cli.format).await?;
            }
            CardsCommand::Due { limit } => {
                commands::cards::run_due(&app, limit, &cli.format).await?;
            }
            CardsCommand::Review { id, outcome } => {
                commands::cards::run_review(&app, &id, outcome.into(), &cli.format).await?;
            }
            CardsCommand::Stats => {
                commands::cards::run_stats(&app, &cli.format).await?;
            }
            CardsCommand::Suggest { limit } => {
                commands::cards::run_suggest(&app, limit, &cli.format).await?;
            }
        },
        Command::Plan(subcmd) => match subcmd {
            PlanCommand::List { day } => {
                commands::plan::run_list(&app, day.as_deref(), &cli.format).await?;
            }
            PlanCommand::Add {
                topic,
                day,
                task_type,
                priority,
                start,
                end,
                duration,
                course,
                description,
            } => {
                let request = CreateTaskRequest {
                    topic,
                    day,
                    course_id: course,
                    description,
                    task_type: task_type.map(Into::into),
                    priority: priority.map(Into::into),
                    start_time: start,
                    end_time: end,
                    duration,
                };
                commands::plan::run_add(&app, request, &cli.format).await?;
            }
            PlanCommand::Toggle { id } => {
                commands::plan::run_toggle(&app, &id, &cli.format).await?;
            }
            PlanCommand::Rm { id } => {
                commands::plan::run_remove(&app, &id, &cli.format).await?;
            }
        },
        Command::Prefs(subcmd) => match subcmd {
            PrefsCommand::Show => {
                commands::prefs::run_show(&app, &cli.format)?;
            }
            PrefsCommand::Set {
                last_course,
                note_method,
            } => {
                let patch = PreferencesPatch {
                    last_course,
                    preferred_note_method: note_method,
                    recent_courses: None,
                };
                commands::prefs::run_set(&app, patch, &cli.format)?;
            }
        },
    }

    Ok(())
}
