use serde_json::Value;
use tracing::{debug, warn};

use super::SchemaLookupError;
use crate::config::{ReportConfig, StoreConfig};
use crate::store::DocumentStore;

const FORM_NAME_FIELD: &str = "formName";
const FIELDS_FIELD: &str = "fields";
const LABEL_FIELD: &str = "label";

pub trait FormSchemaSource {
    /// Question labels of a form, in form order. Best effort: lookup failures
    /// yield an empty list.
    fn questions_for(&self, form_type: &str) -> Vec<String>;
}

#[derive(Debug, Clone)]
pub struct SqliteFormSchemaFetcher {
    store: StoreConfig,
}

impl SqliteFormSchemaFetcher {
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            store: config.store.clone(),
        }
    }

    pub fn lookup(&self, form_type: &str) -> Result<Vec<String>, SchemaLookupError> {
        let forms = {
            let store = DocumentStore::open_read_only(&self.store.db_path)?;
            store.find_by_field(&self.store.forms_collection, FORM_NAME_FIELD, form_type)?
        };
        if forms.is_empty() {
            return Err(SchemaLookupError::NotFound {
                form_type: form_type.to_string(),
            });
        }

        Ok(forms.iter().flat_map(field_labels).collect())
    }
}

impl FormSchemaSource for SqliteFormSchemaFetcher {
    fn questions_for(&self, form_type: &str) -> Vec<String> {
        match self.lookup(form_type) {
            Ok(questions) => {
                debug!(form_type, questions = questions.len(), "loaded form questions");
                questions
            }
            Err(err) => {
                warn!(form_type, error = %err, "form question lookup failed");
                Vec::new()
            }
        }
    }
}

/// Labels of a form definition's `fields`, in order. A single field object
/// counts as a one-element list; fields without a string label are skipped.
pub fn field_labels(form: &Value) -> Vec<String> {
    let fields = match form.get(FIELDS_FIELD) {
        Some(Value::Array(fields)) => fields.iter().collect::<Vec<&Value>>(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![other],
    };

    fields
        .into_iter()
        .filter_map(|field| field.get(LABEL_FIELD).and_then(Value::as_str))
        .map(ToOwned::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::field_labels;

    #[test]
    fn field_labels_follow_form_order() {
        let form = json!({
            "formName": "A",
            "fields": [
                {"label": "Employment status", "type": "select"},
                {"type": "divider"},
                {"label": "Sector"},
                {"label": 4}
            ]
        });
        assert_eq!(field_labels(&form), vec!["Employment status", "Sector"]);
    }

    #[test]
    fn single_field_object_is_unwound() {
        let form = json!({"fields": {"label": "Only question"}});
        assert_eq!(field_labels(&form), vec!["Only question"]);
    }

    #[test]
    fn missing_fields_yield_nothing() {
        assert!(field_labels(&json!({"formName": "A"})).is_empty());
        assert!(field_labels(&json!({"fields": null})).is_empty());
    }
}
