use anyhow::{Context, Result};
use chrono::NaiveDate;

use studydesk_lib::planner::{CreateTaskRequest, PlannerTask};

use crate::app::App;
use crate::OutputFormat;

fn print_tasks(tasks: &[PlannerTask]) {
    let mut current_day = None;
    for task in tasks {
        if current_day != Some(task.day) {
            if current_day.is_some() {
                println!();
            }
            println!("{}", task.day.format("%A %Y-%m-%d"));
            current_day = Some(task.day);
        }

        let check = if task.completed { "[x]" } else { "[ ]" };
        let time = match (task.start_time, task.end_time) {
            (Some(start), Some(end)) => format!("{}-{}", start.format("%H:%M"), end.format("%H:%M")),
            (Some(start), None) => start.format("%H:%M").to_string(),
            _ => "--:--".to_string(),
        };
        println!("  {} {:<11} {} ({:?}, {:?})  {}",
            check, time, task.topic, task.task_type, task.priority, task.id);
    }
}

pub async fn run_list(app: &App, day: Option<&str>, format: &OutputFormat) -> Result<()> {
    let planner = app.planner();
    planner.fetch_all().await?;

    let tasks = match day {
        Some(d) => {
            let date = NaiveDate::parse_from_str(d, "%Y-%m-%d")
                .with_context(|| format!("Invalid day '{}', expected YYYY-MM-DD", d))?;
            planner.tasks_for_day(date)
        }
        None => planner.tasks(),
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&tasks)?);
        }
        OutputFormat::Plain => {
            if tasks.is_empty() {
                println!("No tasks planned.");
                return Ok(());
            }
            print_tasks(&tasks);
            let done = tasks.iter().filter(|t| t.completed).count();
            println!("\n{} of {} tasks done", done, tasks.len());
        }
    }
    Ok(())
}

pub async fn run_add(app: &App, request: CreateTaskRequest, format: &OutputFormat) -> Result<()> {
    let planner = app.planner();
    let task = planner.create(request).await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        OutputFormat::Plain => {
            println!("Planned \"{}\" on {}", task.topic, task.day);
            println!("  ID: {}", task.id);
        }
    }
    Ok(())
}

pub async fn run_toggle(app: &App, id: &str, format: &OutputFormat) -> Result<()> {
    let planner = app.planner();
    planner.fetch_all().await?;
    let task = planner.toggle_complete(id).await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        OutputFormat::Plain => {
            let state = if task.completed { "done" } else { "not done" };
            println!("\"{}\" marked {}", task.topic, state);
        }
    }
    Ok(())
}

pub async fn run_remove(app: &App, id: &str, format: &OutputFormat) -> Result<()> {
    let planner = app.planner();
    planner.fetch_all().await?;
    planner.delete(id).await?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({ "deleted": id });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => println!("Deleted task {}", id),
    }
    Ok(())
}
