use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::ReportArgs;
use crate::commands::{resolve_config, resolve_window};
use crate::model::{DateWindow, FormFilter};
use crate::report::{
    ChartSink, ColumnPolicy, FormSchemaSource, JsonSink, RecordSource, ReportRenderer,
    ReportSession, SqliteFormSchemaFetcher, SqliteRecordFetcher, TextSink,
};
use crate::util::write_json_pretty;

pub fn run(args: ReportArgs) -> Result<()> {
    let config = resolve_config(&args.store)?;
    let window = resolve_window(&args.window)?;
    let filters = resolve_filters(&args.forms);

    info!(
        db_path = %config.store.db_path.display(),
        window = %window.label(),
        selections = filters.len(),
        "report requested"
    );

    let fetcher = SqliteRecordFetcher::new(&config).context("invalid report configuration")?;
    let mut session = ReportSession::new(fetcher);
    let notice = fetch_notice(&mut session, window);

    let schema = SqliteFormSchemaFetcher::new(&config);
    let policy = ColumnPolicy::from_config(&config);
    let renderer = ReportRenderer::new(&schema, &policy, config.charts_per_page);

    if args.json || args.output.is_some() {
        let mut sink = JsonSink::new(window);
        render_selections(&session, &renderer, &filters, notice.as_deref(), &mut sink)?;
        let document = sink.into_document();

        match &args.output {
            Some(path) => {
                write_json_pretty(path, &document)?;
                info!(path = %path.display(), "wrote json report");
            }
            None => {
                let mut output = io::BufWriter::new(io::stdout().lock());
                serde_json::to_writer_pretty(&mut output, &document)
                    .context("failed to serialize report json output")?;
                writeln!(output)?;
                output.flush()?;
            }
        }
    } else {
        let mut sink = TextSink::new(io::BufWriter::new(io::stdout().lock()));
        render_selections(&session, &renderer, &filters, notice.as_deref(), &mut sink)?;
    }

    Ok(())
}

/// Fetches the window and describes anything the reader should know about
/// the result: an empty window or a failed fetch.
fn fetch_notice<S: RecordSource>(
    session: &mut ReportSession<S>,
    window: DateWindow,
) -> Option<String> {
    match session.fetch(window) {
        Ok(records) if records.is_empty() => {
            Some(format!("No records found for {}", window.label()))
        }
        Ok(_) => None,
        Err(err) => Some(format!("Error fetching data: {}", error_chain(&err))),
    }
}

fn render_selections<R: RecordSource, Q: FormSchemaSource + ?Sized, S: ChartSink>(
    session: &ReportSession<R>,
    renderer: &ReportRenderer<'_, Q>,
    filters: &[FormFilter],
    notice: Option<&str>,
    sink: &mut S,
) -> Result<()> {
    if let Some(message) = notice {
        warn!(notice = message, "report notice");
        sink.notice(message)?;
    }

    for filter in filters {
        let Some(selection) = session.select(filter) else {
            continue;
        };
        if selection.groups.is_empty() {
            sink.notice(&format!("No records for form selection `{}`", filter.label()))?;
        }
        renderer.render(&selection, sink)?;
    }

    sink.finish()
}

fn resolve_filters(raw: &[String]) -> Vec<FormFilter> {
    if raw.is_empty() {
        return vec![FormFilter::All];
    }
    raw.iter().map(|value| FormFilter::parse(value)).collect()
}

pub(super) fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = cause.source();
    }
    parts.join(": ")
}
