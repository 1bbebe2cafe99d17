use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use super::{ColumnPolicy, FormSchemaSource, Selection, chart_title, summarize};
use crate::model::{AnswerDistribution, DateWindow, FormFilter, FormGroup};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormHeader {
    pub form_type: String,
    pub window: DateWindow,
    pub record_count: usize,
}

/// One pie chart: labels and counts line up index for index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSeries {
    pub column: String,
    pub title: String,
    pub labels: Vec<String>,
    pub counts: Vec<usize>,
    pub total: usize,
}

impl ChartSeries {
    pub fn from_distribution(column: &str, distribution: &AnswerDistribution) -> Self {
        Self {
            column: column.to_string(),
            title: chart_title(column),
            labels: distribution.labels(),
            counts: distribution.counts(),
            total: distribution.total,
        }
    }
}

/// Where rendered charts go. Never receives a chart without labels.
pub trait ChartSink {
    fn begin_selection(&mut self, _filter: &FormFilter, _form_types: &[String]) -> Result<()> {
        Ok(())
    }

    /// Starts a form on a fresh page.
    fn begin_form(&mut self, header: &FormHeader) -> Result<()>;

    fn chart(&mut self, chart: &ChartSeries) -> Result<()>;

    fn page_break(&mut self) -> Result<()>;

    /// A message for the reader, such as a failed fetch.
    fn notice(&mut self, message: &str) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub forms: usize,
    pub charts: usize,
    pub skipped_empty: usize,
}

pub struct ReportRenderer<'a, Q: ?Sized> {
    schema: &'a Q,
    policy: &'a ColumnPolicy,
    charts_per_page: usize,
}

impl<'a, Q: FormSchemaSource + ?Sized> ReportRenderer<'a, Q> {
    pub fn new(schema: &'a Q, policy: &'a ColumnPolicy, charts_per_page: usize) -> Self {
        Self {
            schema,
            policy,
            charts_per_page: charts_per_page.max(1),
        }
    }

    pub fn render<S: ChartSink + ?Sized>(
        &self,
        selection: &Selection,
        sink: &mut S,
    ) -> Result<RenderSummary> {
        sink.begin_selection(&selection.filter, &selection.form_types)?;

        let mut summary = RenderSummary::default();
        for group in &selection.groups {
            let header = FormHeader {
                form_type: group.form_type().to_string(),
                window: selection.window,
                record_count: group.len(),
            };
            sink.begin_form(&header)?;
            summary.forms += 1;

            let (charts, skipped) = self.render_group(group, sink)?;
            summary.charts += charts;
            summary.skipped_empty += skipped;
        }

        info!(
            filter = selection.filter.label(),
            forms = summary.forms,
            charts = summary.charts,
            skipped_empty = summary.skipped_empty,
            "report rendered"
        );
        Ok(summary)
    }

    fn render_group<S: ChartSink + ?Sized>(
        &self,
        group: &FormGroup,
        sink: &mut S,
    ) -> Result<(usize, usize)> {
        let questions = self.schema.questions_for(group.form_type());
        let columns = self.policy.eligible_columns(&questions);

        let mut charts = 0usize;
        let mut skipped = 0usize;
        for column in columns.iter().filter(|column| group.has_column(column)) {
            let distribution = summarize(group.column_values(column));
            if distribution.is_empty() {
                debug!(form_type = group.form_type(), column = %column, "skipping empty column");
                skipped += 1;
                continue;
            }

            if charts > 0 && charts % self.charts_per_page == 0 {
                sink.page_break()?;
            }
            sink.chart(&ChartSeries::from_distribution(column, &distribution))?;
            charts += 1;
        }

        Ok((charts, skipped))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use indexmap::IndexMap;
    use serde_json::{Value, json};

    use super::{ChartSeries, ChartSink, FormHeader, ReportRenderer};
    use crate::model::{DateWindow, FormFilter, FormGroup, RawRecord};
    use crate::report::{ColumnPolicy, FormSchemaSource, Selection};

    #[derive(Debug, PartialEq)]
    enum Event {
        Selection(String),
        Form(String),
        Chart(String, Vec<String>),
        Break,
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<Event>,
    }

    impl ChartSink for Recorder {
        fn begin_selection(&mut self, filter: &FormFilter, _form_types: &[String]) -> anyhow::Result<()> {
            self.events.push(Event::Selection(filter.label().to_string()));
            Ok(())
        }

        fn begin_form(&mut self, header: &FormHeader) -> anyhow::Result<()> {
            self.events.push(Event::Form(header.form_type.clone()));
            Ok(())
        }

        fn chart(&mut self, chart: &ChartSeries) -> anyhow::Result<()> {
            assert!(!chart.labels.is_empty(), "sink must never see an empty chart");
            assert_eq!(chart.labels.len(), chart.counts.len());
            self.events
                .push(Event::Chart(chart.column.clone(), chart.labels.clone()));
            Ok(())
        }

        fn page_break(&mut self) -> anyhow::Result<()> {
            self.events.push(Event::Break);
            Ok(())
        }

        fn notice(&mut self, _message: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct Questions(IndexMap<String, Vec<String>>);

    impl FormSchemaSource for Questions {
        fn questions_for(&self, form_type: &str) -> Vec<String> {
            self.0.get(form_type).cloned().unwrap_or_default()
        }
    }

    fn record(fields: Value) -> RawRecord {
        RawRecord::from_fields(
            fields
                .as_object()
                .unwrap()
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        )
    }

    fn selection(groups: Vec<FormGroup>) -> Selection {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Selection {
            window: DateWindow::new(date, date),
            filter: FormFilter::All,
            form_types: groups.iter().map(|group| group.form_type().to_string()).collect(),
            groups,
        }
    }

    #[test]
    fn skips_empty_absent_and_skip_listed_columns() {
        let group = FormGroup::new(
            "A",
            vec![
                record(json!({"call-answered": "Yes", "Blank": " ", "monthly_income_value": "5000"})),
                record(json!({"call-answered": "yes", "Blank": null, "monthly_income_value": "7000"})),
            ],
        );
        let questions = Questions(IndexMap::from([(
            "A".to_string(),
            vec![
                "Blank".to_string(),
                "Not stored".to_string(),
                "monthly_income_value".to_string(),
            ],
        )]));
        let policy = ColumnPolicy::new(
            "call-answered",
            ["monthly_income_value"],
        );

        let mut sink = Recorder::default();
        let summary = ReportRenderer::new(&questions, &policy, 3)
            .render(&selection(vec![group]), &mut sink)
            .unwrap();

        assert_eq!(summary.forms, 1);
        assert_eq!(summary.charts, 1);
        assert_eq!(summary.skipped_empty, 1);
        assert_eq!(
            sink.events,
            vec![
                Event::Selection("All Forms".to_string()),
                Event::Form("A".to_string()),
                Event::Chart("call-answered".to_string(), vec!["Yes (2)".to_string()]),
            ]
        );
    }

    #[test]
    fn page_breaks_separate_full_pages_within_a_form() {
        let questions_list = ["q1", "q2", "q3", "q4"];
        let mut fields = serde_json::Map::new();
        for question in questions_list {
            fields.insert(question.to_string(), json!("x"));
        }
        let group = FormGroup::new("A", vec![record(Value::Object(fields.clone()))]);
        let other = FormGroup::new("B", vec![record(Value::Object(fields))]);
        let questions = Questions(IndexMap::from([
            (
                "A".to_string(),
                questions_list.iter().map(|q| q.to_string()).collect(),
            ),
            ("B".to_string(), vec!["q1".to_string(), "q2".to_string(), "q3".to_string()]),
        ]));
        let policy = ColumnPolicy::new("call-answered", Vec::<String>::new());

        let mut sink = Recorder::default();
        let summary = ReportRenderer::new(&questions, &policy, 3)
            .render(&selection(vec![group, other]), &mut sink)
            .unwrap();

        assert_eq!(summary.charts, 7);
        let shape = sink
            .events
            .iter()
            .map(|event| match event {
                Event::Selection(_) => "S",
                Event::Form(_) => "F",
                Event::Chart(..) => "C",
                Event::Break => "|",
            })
            .collect::<String>();
        assert_eq!(shape, "SFCCC|CFCCC");
    }

    #[test]
    fn schema_lookup_miss_still_charts_leading_column() {
        let group = FormGroup::new("Z", vec![record(json!({"call-answered": "No"}))]);
        let questions = Questions(IndexMap::new());
        let policy = ColumnPolicy::new("call-answered", Vec::<String>::new());

        let mut sink = Recorder::default();
        let summary = ReportRenderer::new(&questions, &policy, 3)
            .render(&selection(vec![group]), &mut sink)
            .unwrap();
        assert_eq!(summary.charts, 1);
    }
}
