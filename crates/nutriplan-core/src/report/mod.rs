//! Weekly plan reports.
//!
//! [`compile`] builds a paginated [`Document`] from a profile, one week and
//! an optional cumulative summary. The document has a single text renderer
//! ([`Document::render`]); [`Document::preview`] and [`Document::write_to`]
//! both go through it, so the preview and the written file never differ.

mod layout;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use nutriplan_db::models::{CumulativeSummary, NutritionTotals, Profile, WeekPlan};

use crate::nutrition::WEEKLY_SUMMARY_MARKER;

pub use layout::{FOOTER_LINES, LINES_PER_PAGE, PAGE_SEPARATOR};

/// Starts each day in a plan text.
pub const DAY_SEPARATOR: &str = "📅";

/// Header of the day column.
pub const DAY_HEADER: &str = "Day";
/// Day cell shown for a day whose separator line carries no label.
pub const UNLABELLED_DAY: &str = "-";
/// Header of the meals column.
pub const MEALS_HEADER: &str = "Meals";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to create report directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write report {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One line of the day/meals table. `day` is empty on continuation lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLine {
    pub day: String,
    pub meal: String,
}

/// A run of table lines that fits on one page, rendered with its own header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSlice {
    /// Width of the day column, shared by every slice of the same table.
    pub day_width: usize,
    pub lines: Vec<TableLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading(String),
    Field { label: String, value: String },
    Table(TableSlice),
    Spacer,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub blocks: Vec<Block>,
}

/// A compiled report, ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub title: String,
    pub file_name: String,
    pub pages: Vec<Page>,
}

/// Rendered text of a document, held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    pub file_name: String,
    pub page_count: usize,
    pub text: String,
}

/// One day of a plan text: its label and meal lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayRow {
    pub label: String,
    pub meals: Vec<String>,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Render every page, each ending in a `Page i of n` footer, separated
    /// by form feeds.
    pub fn render(&self) -> String {
        layout::render(&self.pages)
    }

    pub fn preview(&self) -> RenderedReport {
        RenderedReport {
            file_name: self.file_name.clone(),
            page_count: self.page_count(),
            text: self.render(),
        }
    }

    /// Write the rendered document into `dir` under [`Document::file_name`].
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ReportError> {
        fs::create_dir_all(dir).map_err(|source| ReportError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = dir.join(&self.file_name);
        fs::write(&path, self.render()).map_err(|source| ReportError::Write {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), pages = self.page_count(), "report written");
        Ok(path)
    }
}

/// `"Week 3"` -> `"Week_3_plan.txt"`.
pub fn report_file_name(label: &str) -> String {
    let stem: String = label
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    format!("{stem}_plan.txt")
}

/// Split a plan text into day rows on [`DAY_SEPARATOR`].
///
/// The first line of each chunk is the label (trimmed, trailing `:`
/// removed, a bare [`UNLABELLED_DAY`] counting as no label); the following
/// non-blank lines are meals, up to the weekly summary section. Text before
/// the first separator is not a day, so a plan with no separator has no
/// rows.
pub fn split_days(plan_text: &str) -> Vec<DayRow> {
    plan_text
        .split(DAY_SEPARATOR)
        .skip(1)
        .map(|chunk| {
            let mut lines = chunk.lines();
            let label = lines
                .next()
                .unwrap_or_default()
                .trim()
                .trim_end_matches(':')
                .trim_end();
            DayRow {
                label: (if label == UNLABELLED_DAY { "" } else { label }).to_owned(),
                meals: meal_lines(lines),
            }
        })
        .collect()
}

fn meal_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<String> {
    lines
        .take_while(|l| !l.trim_start().starts_with(WEEKLY_SUMMARY_MARKER))
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
        .collect()
}

fn field(label: &str, value: impl Into<String>) -> Block {
    Block::Field {
        label: label.to_owned(),
        value: value.into(),
    }
}

fn or_not_set<T>(value: Option<T>, show: impl FnOnce(T) -> String) -> String {
    value.map(show).unwrap_or_else(|| "Not set".to_owned())
}

fn profile_blocks(profile: &Profile) -> Vec<Block> {
    vec![
        Block::Heading("Profile".to_owned()),
        field(
            "Name",
            or_not_set(profile.name.as_deref().filter(|n| !n.trim().is_empty()), str::to_owned),
        ),
        field("Goal", or_not_set(profile.goal, |g| g.to_string())),
        field("Diet type", or_not_set(profile.diet_type, |d| d.to_string())),
        field(
            "Dislikes",
            profile
                .dislikes
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .unwrap_or("None"),
        ),
        field("Height", or_not_set(profile.height_cm, |h| format!("{h:.1} cm"))),
        field("Weight", or_not_set(profile.weight_kg, |w| format!("{w:.1} kg"))),
        field(
            "Target weight",
            or_not_set(profile.target_weight, |w| format!("{w:.1} kg")),
        ),
        field(
            "Tenure",
            or_not_set(profile.tenure_months, |m| format!("{m} months")),
        ),
    ]
}

fn metric_blocks(
    heading: String,
    totals: &NutritionTotals,
    start_weight_kg: f64,
    end_weight_kg: f64,
) -> Vec<Block> {
    vec![
        Block::Heading(heading),
        field("Total kcal", format!("{:.1}", totals.kcal)),
        field("Protein", format!("{:.1} g", totals.protein_g)),
        field("Carbs", format!("{:.1} g", totals.carbs_g)),
        field("Fat", format!("{:.1} g", totals.fat_g)),
        field("Start weight", format!("{start_weight_kg:.1} kg")),
        field("End weight", format!("{end_weight_kg:.1} kg")),
    ]
}

fn day_cell(label: &str) -> &str {
    if label.is_empty() { UNLABELLED_DAY } else { label }
}

fn day_table(rows: &[DayRow]) -> TableSlice {
    let day_width = rows
        .iter()
        .map(|r| day_cell(&r.label).chars().count())
        .chain([DAY_HEADER.len()])
        .max()
        .unwrap_or(DAY_HEADER.len());

    let lines = rows
        .iter()
        .flat_map(|row| {
            let meals: Vec<&str> = if row.meals.is_empty() {
                vec![""]
            } else {
                row.meals.iter().map(String::as_str).collect()
            };
            meals
                .into_iter()
                .enumerate()
                .map(|(i, meal)| TableLine {
                    day: if i == 0 { day_cell(&row.label).to_owned() } else { String::new() },
                    meal: meal.to_owned(),
                })
                .collect::<Vec<_>>()
        })
        .collect();

    TableSlice { day_width, lines }
}

/// Table for a plan with no day separators: every meal line, no day cells.
fn undated_table(plan_text: &str) -> TableSlice {
    TableSlice {
        day_width: DAY_HEADER.len(),
        lines: meal_lines(plan_text.lines())
            .into_iter()
            .map(|meal| TableLine {
                day: String::new(),
                meal,
            })
            .collect(),
    }
}

/// Compile the report for one week.
///
/// The cumulative block is added only when `include_cumulative` is set and
/// a summary is supplied.
pub fn compile(
    profile: &Profile,
    week: &WeekPlan,
    cumulative: Option<&CumulativeSummary>,
    include_cumulative: bool,
) -> Document {
    let label = week.label();
    let rows = split_days(&week.plan_text);
    let table = if rows.is_empty() {
        undated_table(&week.plan_text)
    } else {
        day_table(&rows)
    };

    let mut blocks = profile_blocks(profile);
    blocks.push(Block::Spacer);
    blocks.push(Block::Heading(label.clone()));
    blocks.push(Block::Table(table));
    blocks.push(Block::Spacer);
    blocks.extend(metric_blocks(
        "Weekly Summary".to_owned(),
        &week.totals,
        week.start_weight_kg,
        week.end_weight_kg,
    ));

    if let Some(summary) = cumulative.filter(|_| include_cumulative) {
        blocks.push(Block::Spacer);
        blocks.extend(metric_blocks(
            format!("Cumulative Summary ({} weeks)", summary.week_count),
            &NutritionTotals {
                kcal: summary.total_kcal,
                protein_g: summary.total_protein_g,
                carbs_g: summary.total_carbs_g,
                fat_g: summary.total_fat_g,
            },
            summary.start_weight_kg,
            summary.end_weight_kg,
        ));
    }

    Document {
        title: format!("{label} Plan"),
        file_name: report_file_name(&label),
        pages: layout::paginate(blocks),
    }
}

/// Read the day column back out of rendered report text, in order.
///
/// Returns the labels [`split_days`] produced for the week, so a plan with
/// no day separators yields none and an unlabelled day yields `""`.
pub fn parse_day_labels(rendered: &str) -> Vec<String> {
    layout::table_day_cells(rendered)
        .into_iter()
        .filter(|cell| !cell.is_empty())
        .map(|cell| if cell == UNLABELLED_DAY { String::new() } else { cell })
        .collect()
}
