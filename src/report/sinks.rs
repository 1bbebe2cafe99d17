use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use super::{ChartSeries, ChartSink, FormHeader};
use crate::model::{DateWindow, FormFilter};
use crate::util::now_utc_string;

/// Plain-text report, one block per chart.
pub struct TextSink<W: Write> {
    output: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(output: W) -> Self {
        Self { output }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.output
    }
}

impl<W: Write> ChartSink for TextSink<W> {
    fn begin_selection(&mut self, filter: &FormFilter, form_types: &[String]) -> Result<()> {
        writeln!(self.output, "Selection: {}", filter.label())?;
        writeln!(self.output, "Form types: {}", form_types.join(", "))?;
        Ok(())
    }

    fn begin_form(&mut self, header: &FormHeader) -> Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "==== Calling Report: {} ====", header.window.label())?;
        writeln!(
            self.output,
            "Report - {} ({} records)",
            header.form_type, header.record_count
        )?;
        Ok(())
    }

    fn chart(&mut self, chart: &ChartSeries) -> Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "  {}", chart.title.to_uppercase())?;
        for (label, count) in chart.labels.iter().zip(&chart.counts) {
            let percent = if chart.total == 0 {
                0.0
            } else {
                *count as f64 * 100.0 / chart.total as f64
            };
            writeln!(self.output, "    {label:<40} {count:>6} {percent:>6.1}%")?;
        }
        writeln!(self.output, "    Total Count: {}", chart.total)?;
        Ok(())
    }

    fn page_break(&mut self) -> Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "---- page break ----")?;
        Ok(())
    }

    fn notice(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "! {message}")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.output.flush().context("failed to flush report output")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportDocument {
    pub generated_at: String,
    pub window: DateWindow,
    pub notices: Vec<String>,
    pub selections: Vec<SelectionSection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectionSection {
    pub form_filter: String,
    pub form_types: Vec<String>,
    pub forms: Vec<FormSection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormSection {
    pub form_type: String,
    pub record_count: usize,
    pub pages: Vec<Vec<ChartSeries>>,
}

/// Collects the report as a serializable document.
pub struct JsonSink {
    document: ReportDocument,
}

impl JsonSink {
    pub fn new(window: DateWindow) -> Self {
        Self {
            document: ReportDocument {
                generated_at: now_utc_string(),
                window,
                notices: Vec::new(),
                selections: Vec::new(),
            },
        }
    }

    pub fn into_document(self) -> ReportDocument {
        self.document
    }

    fn current_form(&mut self) -> Result<&mut FormSection> {
        self.document
            .selections
            .last_mut()
            .and_then(|selection| selection.forms.last_mut())
            .context("chart emitted before any form header")
    }
}

impl ChartSink for JsonSink {
    fn begin_selection(&mut self, filter: &FormFilter, form_types: &[String]) -> Result<()> {
        self.document.selections.push(SelectionSection {
            form_filter: filter.label().to_string(),
            form_types: form_types.to_vec(),
            forms: Vec::new(),
        });
        Ok(())
    }

    fn begin_form(&mut self, header: &FormHeader) -> Result<()> {
        let selection = self
            .document
            .selections
            .last_mut()
            .context("form header emitted before any selection")?;
        selection.forms.push(FormSection {
            form_type: header.form_type.clone(),
            record_count: header.record_count,
            pages: vec![Vec::new()],
        });
        Ok(())
    }

    fn chart(&mut self, chart: &ChartSeries) -> Result<()> {
        let form = self.current_form()?;
        if form.pages.is_empty() {
            form.pages.push(Vec::new());
        }
        if let Some(page) = form.pages.last_mut() {
            page.push(chart.clone());
        }
        Ok(())
    }

    fn page_break(&mut self) -> Result<()> {
        self.current_form()?.pages.push(Vec::new());
        Ok(())
    }

    fn notice(&mut self, message: &str) -> Result<()> {
        self.document.notices.push(message.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{JsonSink, TextSink};
    use crate::model::{DateWindow, FormFilter};
    use crate::report::{ChartSeries, ChartSink, FormHeader};

    fn window() -> DateWindow {
        DateWindow::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        )
    }

    fn chart() -> ChartSeries {
        ChartSeries {
            column: "call-answered".to_string(),
            title: "call answered".to_string(),
            labels: vec!["Good (2)".to_string(), "Bad (1)".to_string()],
            counts: vec![2, 1],
            total: 3,
        }
    }

    fn header() -> FormHeader {
        FormHeader {
            form_type: "A".to_string(),
            window: window(),
            record_count: 3,
        }
    }

    #[test]
    fn text_sink_prints_counts_and_percentages() {
        let mut sink = TextSink::new(Vec::<u8>::new());
        sink.begin_selection(&FormFilter::All, &["A".to_string()]).unwrap();
        sink.begin_form(&header()).unwrap();
        sink.chart(&chart()).unwrap();
        sink.finish().unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert!(text.contains("Selection: All Forms"));
        assert!(text.contains("2024-01-01 to 2024-01-02"));
        assert!(text.contains("Report - A (3 records)"));
        assert!(text.contains("CALL ANSWERED"));
        assert!(text.contains("66.7%"));
        assert!(text.contains("Total Count: 3"));
    }

    #[test]
    fn json_sink_groups_charts_into_pages() {
        let mut sink = JsonSink::new(window());
        sink.notice("heads up").unwrap();
        sink.begin_selection(&FormFilter::Only("A".to_string()), &["A".to_string()])
            .unwrap();
        sink.begin_form(&header()).unwrap();
        sink.chart(&chart()).unwrap();
        sink.page_break().unwrap();
        sink.chart(&chart()).unwrap();

        let document = sink.into_document();
        assert_eq!(document.notices, vec!["heads up"]);
        assert_eq!(document.selections.len(), 1);
        assert_eq!(document.selections[0].form_filter, "A");
        let form = &document.selections[0].forms[0];
        assert_eq!(form.pages.len(), 2);
        assert_eq!(form.pages[0].len(), 1);
        assert_eq!(form.pages[1][0].labels, vec!["Good (2)", "Bad (1)"]);

        let value = serde_json::to_value(&document).unwrap();
        assert_eq!(value["window"]["start_date"], "2024-01-01");
        assert_eq!(value["selections"][0]["forms"][0]["pages"][0][0]["total"], 3);
    }

    #[test]
    fn json_sink_rejects_chart_without_form() {
        let mut sink = JsonSink::new(window());
        assert!(sink.chart(&chart()).is_err());
    }
}
