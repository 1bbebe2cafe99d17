use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::FormsArgs;
use crate::commands::{resolve_config, resolve_window};
use crate::model::{DateWindow, FormFilter};
use crate::report::{RecordSource, ReportSession, SqliteRecordFetcher};

pub fn run(args: FormsArgs) -> Result<()> {
    let config = resolve_config(&args.store)?;
    let window = resolve_window(&args.window)?;

    let fetcher = SqliteRecordFetcher::new(&config).context("invalid report configuration")?;
    let mut session = ReportSession::new(fetcher);
    let mut output = io::BufWriter::new(io::stdout().lock());
    list_form_types(&mut session, window, &mut output)?;
    output.flush()?;
    Ok(())
}

/// Writes the selectable form types with their record counts. A failed fetch
/// is reported in the listing and leaves it empty.
fn list_form_types<S: RecordSource, W: Write>(
    session: &mut ReportSession<S>,
    window: DateWindow,
    output: &mut W,
) -> Result<()> {
    if let Err(err) = session.get_or_fetch(window) {
        warn!(window = %window.label(), error = %err, "form listing has no records");
        writeln!(output, "! Error fetching data: {}", super::report::error_chain(&err))?;
    }

    writeln!(output, "Form types for {}:", window.label())?;
    let Some(selection) = session.select(&FormFilter::All) else {
        return Ok(());
    };
    for form_type in &selection.form_types {
        let count = selection
            .groups
            .iter()
            .find(|group| group.form_type() == form_type)
            .map(|group| group.len())
            .unwrap_or(0);
        writeln!(output, "  {form_type}\t{count} records")?;
    }
    info!(window = %window.label(), form_types = selection.form_types.len(), "listed form types");
    Ok(())
}
