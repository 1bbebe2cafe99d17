use indexmap::IndexSet;

use crate::config::ReportConfig;

/// Turns a question label into the field name responses are stored under.
pub fn column_key(label: &str) -> String {
    label
        .chars()
        .map(|ch| if ch.is_whitespace() { '-' } else { ch })
        .collect()
}

pub fn chart_title(column: &str) -> String {
    column.replace(['_', '-'], " ")
}

/// Which columns of a form get a distribution chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPolicy {
    leading_column: String,
    skip_columns: IndexSet<String>,
}

impl ColumnPolicy {
    pub fn new<I, S>(leading_column: &str, skip_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            leading_column: column_key(leading_column),
            skip_columns: skip_columns
                .into_iter()
                .map(|column| column_key(column.as_ref()))
                .collect(),
        }
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        Self::new(&config.leading_column, &config.skip_columns)
    }

    pub fn leading_column(&self) -> &str {
        &self.leading_column
    }

    pub fn is_skipped(&self, column: &str) -> bool {
        self.skip_columns.contains(column)
    }

    /// The leading column followed by the form's questions, minus the skip
    /// list. Repeated questions keep their first position.
    pub fn eligible_columns(&self, questions: &[String]) -> Vec<String> {
        let mut columns = IndexSet::<String>::new();
        columns.insert(self.leading_column.clone());
        for question in questions {
            columns.insert(column_key(question));
        }

        columns
            .into_iter()
            .filter(|column| !self.is_skipped(column))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnPolicy, chart_title, column_key};
    use crate::config::ReportConfig;

    fn questions(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|label| label.to_string()).collect()
    }

    #[test]
    fn column_key_replaces_whitespace_with_separator() {
        assert_eq!(column_key("Did you get a job"), "Did-you-get-a-job");
        assert_eq!(column_key("tab\tseparated"), "tab-separated");
        assert_eq!(column_key("call-answered"), "call-answered");
    }

    #[test]
    fn chart_title_spaces_out_separators() {
        assert_eq!(chart_title("monthly_income-value"), "monthly income value");
    }

    #[test]
    fn eligible_columns_lead_with_call_outcome() {
        let policy = ColumnPolicy::from_config(&ReportConfig::default());
        let columns = policy.eligible_columns(&questions(&["Employment status", "Sector"]));
        assert_eq!(columns, vec!["call-answered", "Employment-status", "Sector"]);
    }

    #[test]
    fn skip_list_is_matched_after_separator_normalization() {
        let policy = ColumnPolicy::from_config(&ReportConfig::default());
        let columns = policy.eligible_columns(&questions(&[
            "Amount of Finance Availed",
            "Employment status",
            "What additional Help needed from RSETI?",
            "monthly_income_value",
        ]));
        assert_eq!(columns, vec!["call-answered", "Employment-status"]);
        assert!(policy.is_skipped("Amount-of-Finance-Availed"));
    }

    #[test]
    fn repeated_questions_keep_first_position() {
        let policy = ColumnPolicy::new("call-answered", Vec::<String>::new());
        let columns = policy.eligible_columns(&questions(&["Sector", "call answered", "Sector"]));
        assert_eq!(columns, vec!["call-answered", "Sector"]);
    }
}
