use crate::error::{ProcessingError, Result};
use crate::models::{Dataset, DateRange};
use crate::utils::constants::{CHART_COLOR, TIMESTAMP_FORMAT};
use serde::Serialize;

/// Plotly-compatible figure for a single channel line chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartFigure {
    pub data: Vec<LineTrace>,
    pub layout: ChartLayout,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineTrace {
    pub x: Vec<String>,
    pub y: Vec<Option<f64>>,
    #[serde(rename = "type")]
    pub trace_type: String,
    pub mode: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartLayout {
    pub title: ChartTitle,
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub colorway: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartTitle {
    pub text: String,
    pub x: f64,
    pub xanchor: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub fixedrange: bool,
}

impl ChartFigure {
    /// Line chart of `channel` over the days in `range`
    pub fn for_channel(dataset: &Dataset, channel: &str, range: &DateRange) -> Result<Self> {
        let index = dataset
            .channel_index(channel)
            .ok_or_else(|| ProcessingError::UnknownChannel(channel.to_string()))?;

        let (x, y): (Vec<String>, Vec<Option<f64>>) = dataset
            .rows()
            .iter()
            .filter(|r| range.contains(&r.timestamp))
            .map(|r| (r.timestamp.format(TIMESTAMP_FORMAT).to_string(), r.value(index)))
            .unzip();

        Ok(Self {
            data: vec![LineTrace {
                x,
                y,
                trace_type: "scatter".to_string(),
                mode: "lines".to_string(),
                name: channel.to_string(),
            }],
            layout: ChartLayout {
                title: ChartTitle {
                    text: format!("{} Levels", channel),
                    x: 0.05,
                    xanchor: "left".to_string(),
                },
                xaxis: Axis { fixedrange: true },
                yaxis: Axis { fixedrange: true },
                colorway: vec![CHART_COLOR.to_string()],
            },
        })
    }

    pub fn point_count(&self) -> usize {
        self.data.iter().map(|t| t.x.len()).sum()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
