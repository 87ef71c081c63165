use crate::analyzers::ChartFigure;
use crate::error::{ProcessingError, Result};
use crate::models::{Dataset, DateRange};
use crate::utils::constants::{DEFAULT_PARAMETER, SUMMARY_PRECISION};
use serde::Serialize;

/// Min/max/mean of one channel over a date range. `None` when no rows fall
/// inside the range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelSummary {
    pub channel: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryTable {
    pub range: DateRange,
    pub rows_in_range: usize,
    pub channels: Vec<ChannelSummary>,
}

/// Channel selector options with the initially selected entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterOptions {
    pub options: Vec<String>,
    pub default: String,
}

pub struct DashboardAnalyzer;

impl DashboardAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn parameter_options(&self, dataset: &Dataset) -> Result<ParameterOptions> {
        let options = dataset.channels().to_vec();
        let default = if dataset.has_channel(DEFAULT_PARAMETER) {
            DEFAULT_PARAMETER.to_string()
        } else {
            options
                .first()
                .cloned()
                .ok_or_else(|| ProcessingError::MissingData("channels".to_string()))?
        };

        Ok(ParameterOptions { options, default })
    }

    /// Rows whose timestamp falls on a day inside `range`
    pub fn filter_range(&self, dataset: &Dataset, range: &DateRange) -> Result<Dataset> {
        let rows = dataset
            .rows()
            .iter()
            .filter(|r| range.contains(&r.timestamp))
            .cloned()
            .collect();
        Dataset::new(dataset.channels().to_vec(), rows)
    }

    pub fn summarize(&self, dataset: &Dataset, range: &DateRange) -> Result<SummaryTable> {
        let filtered = self.filter_range(dataset, range)?;

        let channels = filtered
            .channels()
            .iter()
            .enumerate()
            .map(|(index, channel)| summarize_column(channel, filtered.column(index).flatten()))
            .collect();

        Ok(SummaryTable {
            range: *range,
            rows_in_range: filtered.len(),
            channels,
        })
    }

    pub fn chart_figure(
        &self,
        dataset: &Dataset,
        channel: &str,
        range: &DateRange,
    ) -> Result<ChartFigure> {
        ChartFigure::for_channel(dataset, channel, range)
    }
}

impl Default for DashboardAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn summarize_column(channel: &str, values: impl Iterator<Item = f64>) -> ChannelSummary {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    let mut count = 0usize;

    for value in values {
        min = min.min(value);
        max = max.max(value);
        sum += value;
        count += 1;
    }

    if count == 0 {
        return ChannelSummary {
            channel: channel.to_string(),
            min: None,
            max: None,
            mean: None,
        };
    }

    ChannelSummary {
        channel: channel.to_string(),
        min: Some(min),
        max: Some(max),
        mean: Some(sum / count as f64),
    }
}

fn format_stat(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.*}", SUMMARY_PRECISION, v),
        None => "-".to_string(),
    }
}

impl SummaryTable {
    pub fn get(&self, channel: &str) -> Option<&ChannelSummary> {
        self.channels.iter().find(|c| c.channel == channel)
    }

    pub fn render(&self) -> String {
        let name_width = self
            .channels
            .iter()
            .map(|c| c.channel.chars().count())
            .chain(std::iter::once("Parameter".len()))
            .max()
            .unwrap_or(0);

        let mut table = String::new();
        table.push_str(&format!(
            "=== Summary {} to {} ({} readings) ===\n",
            self.range.start, self.range.end, self.rows_in_range
        ));
        table.push_str(&format!(
            "{:<width$}  {:>10}  {:>10}  {:>10}\n",
            "Parameter",
            "Min",
            "Max",
            "Mean",
            width = name_width
        ));
        for summary in &self.channels {
            table.push_str(&format!(
                "{:<width$}  {:>10}  {:>10}  {:>10}\n",
                summary.channel,
                format_stat(summary.min),
                format_stat(summary.max),
                format_stat(summary.mean),
                width = name_width
            ));
        }
        table
    }
}
