use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde_json::Value;
use tracing::{debug, info};

use super::FetchError;
use crate::config::{ConfigError, ReportConfig, StoreConfig};
use crate::model::{DateWindow, RawRecord};
use crate::store::DocumentStore;

pub const CALL_LOG_FIELD: &str = "callLog";
pub const RESPONSE_FIELD: &str = "candidate-response";
pub const QUESTION_FIELD: &str = "question";

const BOOKKEEPING_FIELDS: [&str; 5] = [CALL_LOG_FIELD, RESPONSE_FIELD, QUESTION_FIELD, "_id", "__v"];

pub trait RecordSource {
    fn fetch(&self, window: &DateWindow) -> Result<Vec<RawRecord>, FetchError>;
}

/// Reads call reports joined to their call logs from the SQLite document
/// store. Each fetch opens its own read-only connection.
#[derive(Debug, Clone)]
pub struct SqliteRecordFetcher {
    store: StoreConfig,
    display_offset: FixedOffset,
}

impl SqliteRecordFetcher {
    pub fn new(config: &ReportConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            store: config.store.clone(),
            display_offset: config.display_offset()?,
        })
    }
}

impl RecordSource for SqliteRecordFetcher {
    fn fetch(&self, window: &DateWindow) -> Result<Vec<RawRecord>, FetchError> {
        let pairs = {
            let store = DocumentStore::open_read_only(&self.store.db_path)?;
            store.joined_documents(
                &self.store.reports_collection,
                &self.store.logs_collection,
                CALL_LOG_FIELD,
            )?
        };
        let joined = pairs.len();

        let records = flatten_joined(pairs, window, self.display_offset);
        info!(
            db_path = %self.store.db_path.display(),
            window = %window.label(),
            joined,
            records = records.len(),
            "fetched call records"
        );
        Ok(records)
    }
}

/// Merges each joined pair, keeps those inside the window, strips bookkeeping
/// fields and adds display-zone date and time fields.
pub fn flatten_joined(
    pairs: Vec<(Value, Value)>,
    window: &DateWindow,
    display_offset: FixedOffset,
) -> Vec<RawRecord> {
    let mut records = Vec::with_capacity(pairs.len());
    let mut undated = 0usize;

    for (parent, child) in pairs {
        let mut record = merge_joined(parent, child);
        let Some(ts) = record.timestamp() else {
            undated += 1;
            continue;
        };
        if !window.contains(ts) {
            continue;
        }

        for field in BOOKKEEPING_FIELDS {
            record.remove(field);
        }
        add_display_fields(&mut record, ts, display_offset);
        records.push(record);
    }

    if undated > 0 {
        debug!(records = undated, "skipped joined records without a usable date");
    }
    records
}

/// Flattens a report and its call log into one record. Later sources win on
/// key collisions: report, call log, the log's response, the response's
/// question block.
pub fn merge_joined(parent: Value, child: Value) -> RawRecord {
    let response = child.get(RESPONSE_FIELD).cloned();
    let question = response
        .as_ref()
        .and_then(|response| response.get(QUESTION_FIELD))
        .cloned();

    let mut record = RawRecord::new();
    merge_object(&mut record, parent);
    record.insert(CALL_LOG_FIELD, child.clone());
    merge_object(&mut record, child);
    if let Some(response) = response {
        merge_object(&mut record, response);
    }
    if let Some(question) = question {
        merge_object(&mut record, question);
    }
    record
}

fn merge_object(record: &mut RawRecord, value: Value) {
    if let Value::Object(fields) = value {
        for (field, value) in fields {
            record.insert(field, value);
        }
    }
}

fn add_display_fields(record: &mut RawRecord, ts: DateTime<Utc>, offset: FixedOffset) {
    let local = ts.with_timezone(&offset);
    record.insert(
        "updatedDate",
        Value::String(local.to_rfc3339_opts(SecondsFormat::Secs, false)),
    );
    record.insert(
        "dateUpdate",
        Value::String(local.format("%Y-%m-%d").to_string()),
    );
    record.insert("time", Value::String(local.format("%H:%M:%S").to_string()));
}
