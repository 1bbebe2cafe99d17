use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "callreport",
    version,
    about = "Date-filtered call report distributions per form and question"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Report(ReportArgs),
    Forms(FormsArgs),
    Questions(QuestionsArgs),
    Import(ImportArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// JSON file with collection names, skip list and display settings.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct WindowArgs {
    /// Defaults to today.
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Inclusive; defaults to today.
    #[arg(long)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub window: WindowArgs,

    /// Form type to render; repeat for several selections. Omit for "All Forms".
    #[arg(long = "form")]
    pub forms: Vec<String>,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Write the JSON report to this file instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct FormsArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub window: WindowArgs,
}

#[derive(Args, Debug, Clone)]
pub struct QuestionsArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long)]
    pub form: String,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long)]
    pub collection: String,

    /// A JSON array of documents, a single document, or one document per line.
    #[arg(long)]
    pub file: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[command(flatten)]
    pub store: StoreArgs,
}
