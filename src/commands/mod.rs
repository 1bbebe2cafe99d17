use anyhow::{Context, Result, bail};
use chrono::Local;

use crate::cli::{StoreArgs, WindowArgs};
use crate::config::ReportConfig;
use crate::model::DateWindow;

pub mod forms;
pub mod import;
pub mod questions;
pub mod report;
pub mod status;

fn resolve_config(args: &StoreArgs) -> Result<ReportConfig> {
    ReportConfig::resolve(args.config.as_deref(), args.db_path.as_deref())
        .context("failed to load report configuration")
}

fn resolve_window(args: &WindowArgs) -> Result<DateWindow> {
    let today = Local::now().date_naive();
    let start_date = args.start_date.unwrap_or(today);
    let end_date = args.end_date.unwrap_or(today);
    if start_date > end_date {
        bail!("start date {start_date} is after end date {end_date}");
    }
    Ok(DateWindow::new(start_date, end_date))
}
