//! `nutriplan generate | import | weeks | summary | reset` commands.

use anyhow::{Context, Result};

use nutriplan_core::plan::MonthBucket;
use nutriplan_core::session::{BatchReport, GenerateOutcome, SessionError};
use nutriplan_db::models::CumulativeSummary;

use crate::CliSession;

const NO_PLANS: &str = "No plans yet. Run `nutriplan generate` to create the first weeks.";

/// Attach a hint to session errors the user can act on.
fn explain(err: SessionError) -> anyhow::Error {
    if err.is_retryable() {
        anyhow::Error::new(err).context("nothing was saved; the command can be retried")
    } else {
        err.into()
    }
}

fn print_outcome(outcome: GenerateOutcome) {
    match outcome {
        GenerateOutcome::Generated(report) => print!("{}", format_batch(&report)),
        GenerateOutcome::AlreadyRunning => {
            println!("A plan batch is already being generated; nothing was done.");
        }
    }
}

pub async fn run_generate(session: &CliSession) -> Result<()> {
    let outcome = session.generate().await.map_err(explain)?;
    print_outcome(outcome);
    Ok(())
}

pub async fn run_import(session: &CliSession, file: &str) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read plan text from {file}"))?;
    let outcome = session.import_text(&raw).await.map_err(explain)?;
    print_outcome(outcome);
    Ok(())
}

pub async fn run_weeks(session: &CliSession) -> Result<()> {
    print!("{}", format_months(&session.months().await));
    Ok(())
}

pub async fn run_summary(session: &CliSession) -> Result<()> {
    print!("{}", format_summary(session.summary().await.as_ref()));
    Ok(())
}

pub async fn run_reset(session: &CliSession) -> Result<()> {
    if session.reset().await.map_err(explain)? {
        println!("Plan history discarded. The next batch starts at week 1 from the profile weight.");
    } else {
        println!("Nothing to reset.");
    }
    Ok(())
}

pub fn format_batch(report: &BatchReport) -> String {
    let first_month = MonthBucket::month_of(report.first_week);
    let last_month = MonthBucket::month_of(report.last_week);
    let months = if first_month == last_month {
        format!("month {first_month}")
    } else {
        format!("months {first_month}-{last_month}")
    };
    let mut out = format!(
        "Added weeks {}-{} ({} weeks, {months}). Projected weight: {:.1} kg.\n",
        report.first_week, report.last_week, report.weeks_added, report.end_weight_kg
    );
    if let Some(warning) = &report.warning {
        out.push_str(&format!("Warning: {warning}\n"));
    }
    out
}

/// Weeks listed under their month headings.
pub fn format_months(months: &[MonthBucket]) -> String {
    if months.is_empty() {
        return format!("{NO_PLANS}\n");
    }

    let mut out = String::new();
    for bucket in months {
        out.push_str(&format!("Month {}\n", bucket.month_number));
        for week in &bucket.weeks {
            out.push_str(&format!(
                "  {:<8} {:>9.1} kcal  {:.1} -> {:.1} kg\n",
                week.label(),
                week.totals.kcal,
                week.start_weight_kg,
                week.end_weight_kg
            ));
        }
    }
    out
}

pub fn format_summary(summary: Option<&CumulativeSummary>) -> String {
    let Some(summary) = summary.filter(|s| s.week_count > 0) else {
        return format!("{NO_PLANS}\n");
    };

    let mut out = format!(
        "Cumulative summary ({} weeks)\n\
         {:<14} {:.1}\n{:<14} {:.1} g\n{:<14} {:.1} g\n{:<14} {:.1} g\n\
         {:<14} {:.1} kg\n{:<14} {:.1} kg\n{:<14} {:+.1} kg\n",
        summary.week_count,
        "Calories",
        summary.total_kcal,
        "Protein",
        summary.total_protein_g,
        "Carbs",
        summary.total_carbs_g,
        "Fat",
        summary.total_fat_g,
        "Start weight",
        summary.start_weight_kg,
        "End weight",
        summary.end_weight_kg,
        "Change",
        summary.weight_change_kg(),
    );
    if let Some(analysis) = &summary.analysis_text {
        out.push_str(&format!("\n{analysis}\n"));
    }
    if let Some(warning) = &summary.warning_text {
        out.push_str(&format!("\nWarning: {warning}\n"));
    }
    out
}
