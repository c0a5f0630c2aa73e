//! `nutriplan report` command: print or write the report for one week.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::CliSession;

/// Run the report command.
///
/// Without `output` the rendered report goes to stdout; with it the report
/// is written to `<output>/Week_<n>_plan.txt`.
pub async fn run_report(
    session: &CliSession,
    week: i32,
    include_cumulative: bool,
    output: Option<&str>,
) -> Result<()> {
    let document = session.report(week, include_cumulative).await?;

    match output {
        Some(dir) => {
            let path = document.write_to(Path::new(dir))?;
            println!(
                "Wrote {} ({} pages)",
                path.display(),
                document.page_count()
            );
        }
        None => {
            let preview = document.preview();
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(preview.text.as_bytes())
                .context("failed to write report to stdout")?;
        }
    }

    Ok(())
}
