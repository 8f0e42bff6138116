use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use foodrebalanced_engine::{CommandReply, NutritionChange, SourceState};
use serde::Serialize;
use std::io::Write;

use crate::runs::{AdminSummary, EatSummary, LoadSummary};

/// Outcome of one CLI subcommand.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Report {
    Load(LoadSummary),
    Eat(EatSummary),
    Admin(AdminSummary),
}

impl Report {
    /// Whether the process should exit successfully.
    pub const fn succeeded(&self) -> bool {
        match self {
            Self::Load(_) | Self::Eat(_) => true,
            Self::Admin(summary) => summary.reply.is_success(),
        }
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    generated_at: String,
    #[serde(flatten)]
    report: &'a Report,
}

pub fn generate_json_report(out: &mut dyn Write, report: &Report) -> Result<()> {
    let envelope = Envelope {
        generated_at: Utc::now().to_rfc3339(),
        report,
    };
    serde_json::to_writer_pretty(&mut *out, &envelope)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_console_report(out: &mut dyn Write, report: &Report) -> Result<()> {
    match report {
        Report::Load(summary) => write_load(out, summary),
        Report::Eat(summary) => write_eat(out, summary),
        Report::Admin(summary) => write_admin(out, summary),
    }
}

fn write_load(out: &mut dyn Write, summary: &LoadSummary) -> Result<()> {
    writeln!(out, "{}", "📦 Override File".bright_yellow().bold())?;
    writeln!(out, "{}", "-".repeat(30).yellow())?;
    writeln!(out, "Location: {}", summary.location)?;
    let state = match summary.startup.source {
        SourceState::Missing => "created".green(),
        SourceState::Loaded => "loaded".green(),
        SourceState::Unreadable => "unreadable (kept on disk)".red(),
    };
    writeln!(out, "File: {state}")?;
    writeln!(out, "Entries from file: {}", summary.startup.from_file)?;
    writeln!(out, "Generated from defaults: {}", summary.startup.discovered)?;
    writeln!(out, "Total entries: {}", summary.entries.to_string().bold())?;
    writeln!(out)?;
    writeln!(out, "Patched definitions: {}", summary.patch.patched.to_string().green())?;
    writeln!(out, "Without a record: {}", summary.patch.unrecorded)?;
    if summary.patch.failed > 0 {
        writeln!(out, "Failed: {}", summary.patch.failed.to_string().red())?;
    }
    Ok(())
}

fn write_eat(out: &mut dyn Write, summary: &EatSummary) -> Result<()> {
    writeln!(
        out,
        "{} {}",
        "🍖 Consumption".bright_yellow().bold(),
        summary.item.to_string().bold()
    )?;
    writeln!(out, "{}", "-".repeat(30).yellow())?;
    writeln!(out, "Runs: {} (seed {})", summary.runs, summary.seed)?;
    if summary.discovered {
        writeln!(out, "{}", "New entry registered for this item".cyan())?;
    }
    match summary.nutrition {
        Some(NutritionChange::Applied { hunger, saturation }) => writeln!(
            out,
            "Override adjustment: {hunger:+} hunger, {saturation:+.2} saturation"
        )?,
        Some(NutritionChange::SkippedFull) => {
            writeln!(out, "{}", "Consumer above the food ceiling; nutrition unchanged".yellow())?;
        }
        Some(NutritionChange::Unavailable) => {
            writeln!(out, "{}", "Item nutrition unavailable".red())?;
        }
        None => writeln!(out, "No consumption was processed")?,
    }
    writeln!(
        out,
        "Food level: {} -> {} (saturation {:.2})",
        summary.starting_food_level, summary.final_food_level, summary.final_saturation
    )?;

    writeln!(out, "Effects:")?;
    if summary.effects.is_empty() {
        writeln!(out, "  none")?;
    }
    for (name, count) in &summary.effects {
        #[allow(clippy::cast_precision_loss)]
        let share = *count as f64 / summary.runs.max(1) as f64 * 100.0;
        writeln!(out, "  {name:20} {count:>6} ({share:.1}%)")?;
    }
    writeln!(out, "Enchantments:")?;
    if summary.enchantments.is_empty() {
        writeln!(out, "  none")?;
    }
    for (name, count) in &summary.enchantments {
        writeln!(out, "  {name:20} {count:>6}")?;
    }
    Ok(())
}

fn write_admin(out: &mut dyn Write, summary: &AdminSummary) -> Result<()> {
    let status = match summary.reply {
        CommandReply::Reloaded { .. } => "✅ reloaded".green(),
        CommandReply::Denied => "⛔ denied".red(),
        CommandReply::Usage => "ℹ️  usage".yellow(),
    };
    writeln!(out, "{} as {}: {status}", "🛠  /fb".bold(), summary.sender)?;
    for message in &summary.messages {
        writeln!(out, "  {message}")?;
    }
    if let CommandReply::Reloaded { report } = summary.reply {
        writeln!(out, "  {} entries after reload", report.total)?;
    }
    Ok(())
}
