use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::util::parse_timestamp;

pub const DEFAULT_FORM_TYPE: &str = "default-form";
pub const FORM_TYPE_FIELD: &str = "formType";
pub const DATE_FIELD: &str = "date";

const LAST_SECOND_OF_DAY: i64 = 86_399;

/// A call log merged with its parent report and nested response fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields: IndexMap<String, Value>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn from_fields(fields: IndexMap<String, Value>) -> Self {
        Self { fields }
    }

    #[cfg(test)]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    /// Removes a field while keeping the order of the remaining ones.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.shift_remove(field)
    }

    /// The declared form type, or `default-form` when it is absent, null,
    /// not a string, or blank.
    pub fn form_type(&self) -> &str {
        self.fields
            .get(FORM_TYPE_FIELD)
            .and_then(Value::as_str)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(DEFAULT_FORM_TYPE)
    }

    /// True when `form_type` had to fall back to `default-form`.
    pub fn lacks_form_type(&self) -> bool {
        self.fields
            .get(FORM_TYPE_FIELD)
            .and_then(Value::as_str)
            .is_none_or(|value| value.trim().is_empty())
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.fields.get(DATE_FIELD).and_then(parse_timestamp)
    }

    /// The field rendered as an answer string. `None` for missing and null
    /// values.
    pub fn answer(&self, field: &str) -> Option<String> {
        self.fields.get(field).and_then(answer_text)
    }
}

pub fn answer_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => {
            Some(value.to_string())
        }
    }
}

/// Records that share one form type.
#[derive(Debug, Clone, PartialEq)]
pub struct FormGroup {
    form_type: String,
    records: Vec<RawRecord>,
}

impl FormGroup {
    pub fn new(form_type: impl Into<String>, records: Vec<RawRecord>) -> Self {
        Self {
            form_type: form_type.into(),
            records,
        }
    }

    pub fn form_type(&self) -> &str {
        &self.form_type
    }

    #[cfg(test)]
    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True when at least one record carries the column.
    pub fn has_column(&self, column: &str) -> bool {
        self.records.iter().any(|record| record.contains(column))
    }

    /// One entry per record, `None` where the record lacks the column.
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = Option<String>> + 'a {
        self.records.iter().map(move |record| record.answer(column))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerBucket {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerDistribution {
    pub buckets: Vec<AnswerBucket>,
    pub total: usize,
}

impl AnswerDistribution {
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.buckets.iter().map(|bucket| bucket.label.clone()).collect()
    }

    pub fn counts(&self) -> Vec<usize> {
        self.buckets.iter().map(|bucket| bucket.count).collect()
    }

    #[cfg(test)]
    pub fn pairs(&self) -> Vec<(String, usize)> {
        self.buckets
            .iter()
            .map(|bucket| (bucket.label.clone(), bucket.count))
            .collect()
    }
}

/// Inclusive calendar-date range. The end bound covers the whole day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateWindow {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start_date.and_time(NaiveTime::MIN).and_utc()
    }

    /// `end_date` at 23:59:59.
    pub fn end(&self) -> DateTime<Utc> {
        self.end_date.and_time(NaiveTime::MIN).and_utc() + TimeDelta::seconds(LAST_SECOND_OF_DAY)
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start() && ts <= self.end()
    }

    pub fn label(&self) -> String {
        format!(
            "{} to {}",
            self.start_date.format("%Y-%m-%d"),
            self.end_date.format("%Y-%m-%d")
        )
    }
}

/// Which form groups a report renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormFilter {
    All,
    Only(String),
}

impl FormFilter {
    pub const ALL_FORMS: &'static str = "All Forms";

    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == Self::ALL_FORMS {
            Self::All
        } else {
            Self::Only(trimmed.to_string())
        }
    }

    pub fn matches(&self, form_type: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(selected) => selected == form_type,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::All => Self::ALL_FORMS,
            Self::Only(selected) => selected,
        }
    }
}
