use anyhow::{Context, Result};

use studydesk_lib::preferences::{Preferences, PreferencesPatch};

use crate::app::App;
use crate::OutputFormat;

fn print_preferences(prefs: &Preferences, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(prefs)?);
        }
        OutputFormat::Plain => {
            println!("Last course:    {}", prefs.last_course.as_deref().unwrap_or("-"));
            println!("Note method:    {}", prefs.preferred_note_method.as_deref().unwrap_or("-"));
            if prefs.recent_courses.is_empty() {
                println!("Recent courses: -");
            } else {
                println!("Recent courses: {}", prefs.recent_courses.join(", "));
            }
        }
    }
    Ok(())
}

pub fn run_show(app: &App, format: &OutputFormat) -> Result<()> {
    let ctx = app.preferences()?;
    print_preferences(&ctx.get(), format)
}

pub fn run_set(app: &App, patch: PreferencesPatch, format: &OutputFormat) -> Result<()> {
    let mut ctx = app.preferences()?;
    ctx.set(patch);
    ctx.save().context("Failed to save preferences")?;
    print_preferences(&ctx.get(), format)
}
