use indexmap::IndexMap;
use tracing::debug;

use crate::model::{FormGroup, RawRecord};

/// Buckets records by form type. Every record lands in exactly one bucket;
/// buckets keep the order their form type was first seen.
pub fn group_by_form_type<I>(records: I) -> IndexMap<String, FormGroup>
where
    I: IntoIterator<Item = RawRecord>,
{
    let mut buckets = IndexMap::<String, Vec<RawRecord>>::new();
    let mut defaulted = 0usize;

    for record in records {
        if record.lacks_form_type() {
            defaulted += 1;
        }
        buckets
            .entry(record.form_type().to_string())
            .or_default()
            .push(record);
    }

    if defaulted > 0 {
        // TODO: reject records without a formType once upstream forms always set it.
        debug!(records = defaulted, "records fell back to default-form");
    }

    buckets
        .into_iter()
        .map(|(form_type, records)| {
            let group = FormGroup::new(form_type.clone(), records);
            (form_type, group)
        })
        .collect()
}

/// Form types offered for selection, ordered case-insensitively.
pub fn form_type_choices(groups: &IndexMap<String, FormGroup>) -> Vec<String> {
    let mut choices = groups
        .values()
        .filter(|group| !group.is_empty())
        .map(|group| group.form_type().to_string())
        .collect::<Vec<String>>();
    choices.sort_by(|left, right| {
        left.to_lowercase()
            .cmp(&right.to_lowercase())
            .then_with(|| left.cmp(right))
    });
    choices
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use serde_json::{Value, json};

    use super::{form_type_choices, group_by_form_type};
    use crate::model::RawRecord;

    fn record(fields: Value) -> RawRecord {
        let map = fields
            .as_object()
            .expect("test record must be an object")
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect::<IndexMap<String, Value>>();
        RawRecord::from_fields(map)
    }

    #[test]
    fn every_record_lands_in_exactly_one_group() {
        let records = vec![
            record(json!({"formType": "A", "n": 1})),
            record(json!({"formType": "B", "n": 2})),
            record(json!({"n": 3})),
            record(json!({"formType": "A", "n": 4})),
            record(json!({"formType": null, "n": 5})),
            record(json!({"formType": "  ", "n": 6})),
        ];

        let groups = group_by_form_type(records);
        assert_eq!(
            groups.keys().cloned().collect::<Vec<String>>(),
            vec!["A", "B", "default-form"]
        );
        assert_eq!(groups["A"].len(), 2);
        assert_eq!(groups["B"].len(), 1);
        assert_eq!(groups["default-form"].len(), 3);
        assert_eq!(groups.values().map(|group| group.len()).sum::<usize>(), 6);
        assert_eq!(groups["A"].records()[1].get("n"), Some(&json!(4)));
    }

    #[test]
    fn choices_sort_case_insensitively() {
        let groups = group_by_form_type(vec![
            record(json!({"formType": "beta"})),
            record(json!({"formType": "Alpha"})),
            record(json!({"formType": "alpha"})),
            record(json!({})),
        ]);
        assert_eq!(
            form_type_choices(&groups),
            vec!["Alpha", "alpha", "beta", "default-form"]
        );
    }

    #[test]
    fn no_records_means_no_groups() {
        let groups = group_by_form_type(Vec::new());
        assert!(groups.is_empty());
        assert!(form_type_choices(&groups).is_empty());
    }
}
