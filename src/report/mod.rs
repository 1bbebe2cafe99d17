use thiserror::Error;

use crate::store::StoreError;

mod columns;
mod fetch;
mod group;
mod render;
mod schema;
mod session;
mod sinks;
mod summarize;

pub use columns::{ColumnPolicy, chart_title, column_key};
pub use fetch::{RecordSource, SqliteRecordFetcher};
pub use group::{form_type_choices, group_by_form_type};
pub use render::{ChartSeries, ChartSink, FormHeader, ReportRenderer};
pub use schema::{FormSchemaSource, SqliteFormSchemaFetcher};
pub use session::{ReportSession, Selection};
pub use sinks::{JsonSink, TextSink};
pub use summarize::summarize;

/// The record store could not be read. Recovered at the session boundary.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("record store unavailable")]
    Store(#[from] StoreError),
}

/// A form definition could not be looked up. Only ever logged.
#[derive(Debug, Error)]
pub enum SchemaLookupError {
    #[error("form schema store unavailable")]
    Store(#[from] StoreError),
    #[error("no form definition named `{form_type}`")]
    NotFound { form_type: String },
}
