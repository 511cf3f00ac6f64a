use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;

use studydesk_lib::flashcards::algorithm::format_interval;
use studydesk_lib::flashcards::{suggest_topics, Flashcard, ReviewOutcome};

use crate::app::App;
use crate::OutputFormat;

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let cut: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

pub async fn run_import(app: &App, file: &Path, format: &OutputFormat) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {:?}", file))?;
    let cards: Vec<Flashcard> =
        serde_json::from_str(&content).context("Card file must be a JSON array of cards")?;

    let count = app.cards.import(cards).await?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({ "imported": count });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => println!("Imported {} cards", count),
    }
    Ok(())
}

pub async fn run_due(app: &App, limit: usize, format: &OutputFormat) -> Result<()> {
    let mut session = app.review_session();
    session.load().await?;
    let mut due = session.due(Utc::now());
    let total = due.len();
    due.truncate(limit);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&due)?);
        }
        OutputFormat::Plain => {
            if due.is_empty() {
                println!("Nothing due. Come back later.");
                return Ok(());
            }

            let id_width = due.iter().map(|c| c.id.len()).max().unwrap_or(2).clamp(2, 24);
            let topic_width = 16;

            println!("{:<iw$} {:<3} {:<tw$} {}",
                "ID", "Box", "Topic", "Question",
                iw = id_width, tw = topic_width);
            println!("{} {} {} {}",
                "\u{2500}".repeat(id_width),
                "\u{2500}".repeat(3),
                "\u{2500}".repeat(topic_width),
                "\u{2500}".repeat(30));

            for card in &due {
                println!("{:<iw$} {:<3} {:<tw$} {}",
                    truncate(&card.id, id_width),
                    card.current_box(),
                    truncate(&card.topic, topic_width),
                    truncate(&card.question, 60),
                    iw = id_width, tw = topic_width);
            }

            println!("\n{} of {} due cards shown", due.len(), total);
        }
    }
    Ok(())
}

pub async fn run_review(
    app: &App,
    id: &str,
    outcome: ReviewOutcome,
    format: &OutputFormat,
) -> Result<()> {
    let mut session = app.review_session();
    session.load().await?;

    let now = Utc::now();
    let card = session.apply_outcome(id, outcome, now).await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&card)?);
        }
        OutputFormat::Plain => {
            let days = card
                .next_review
                .map(|next| (next - now).num_days())
                .unwrap_or_default();
            println!("Card {} is now in box {}", card.id, card.leitner_box);
            println!("  Next review: {}", format_interval(days));
        }
    }
    Ok(())
}

pub async fn run_stats(app: &App, format: &OutputFormat) -> Result<()> {
    let mut session = app.review_session();
    session.load().await?;
    let stats = session.stats(Utc::now());

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        OutputFormat::Plain => {
            println!("Cards:          {}", stats.total_cards);
            println!("Due now:        {}", stats.due_cards);
            println!("Never reviewed: {}", stats.never_reviewed);
            for (index, count) in stats.per_box.iter().enumerate() {
                println!("  Box {}: {}", index + 1, count);
            }
        }
    }
    Ok(())
}

pub async fn run_suggest(app: &App, limit: usize, format: &OutputFormat) -> Result<()> {
    let mut session = app.review_session();
    let cards = session.load().await?;
    let suggestions = suggest_topics(cards, Utc::now(), limit);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&suggestions)?);
        }
        OutputFormat::Plain => {
            if suggestions.is_empty() {
                println!("No cards yet.");
                return Ok(());
            }
            for (rank, s) in suggestions.iter().enumerate() {
                let topic = if s.topic.is_empty() { "(no topic)" } else { s.topic.as_str() };
                let last = s
                    .oldest_review
                    .map(|t| t.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "never".to_string());
                println!("{}. {} - mean box {:.1}, {} of {} due, oldest review {}",
                    rank + 1, topic, s.mean_box, s.due_count, s.card_count, last);
            }
        }
    }
    Ok(())
}
