use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{ProcessingError, Result};
use crate::utils::constants::TIMESTAMP_FORMAT;

/// A row as it arrives from the API or a CSV file, timestamp not yet parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub timestamp: String,
    pub values: Vec<Option<f64>>,
}

/// Table of raw readings. `values` of every row are aligned with `channels`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDataset {
    pub channels: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawDataset {
    pub fn new(channels: Vec<String>) -> Self {
        Self {
            channels,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, timestamp: String, values: Vec<Option<f64>>) -> Result<()> {
        if values.len() != self.channels.len() {
            return Err(ProcessingError::InvalidFormat(format!(
                "Row at '{}' has {} values, expected {}",
                timestamp,
                values.len(),
                self.channels.len()
            )));
        }
        self.rows.push(RawRow { timestamp, values });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One timestamped observation with a value per channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingRow {
    pub timestamp: NaiveDateTime,
    pub values: Vec<Option<f64>>,
}

impl ReadingRow {
    pub fn new(timestamp: NaiveDateTime, values: Vec<Option<f64>>) -> Self {
        Self { timestamp, values }
    }

    pub fn value(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }
}

/// Table of readings with parsed timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    channels: Vec<String>,
    rows: Vec<ReadingRow>,
}

impl Dataset {
    pub fn new(channels: Vec<String>, rows: Vec<ReadingRow>) -> Result<Self> {
        if let Some(row) = rows.iter().find(|r| r.values.len() != channels.len()) {
            return Err(ProcessingError::InvalidFormat(format!(
                "Row at {} has {} values, expected {}",
                row.timestamp,
                row.values.len(),
                channels.len()
            )));
        }
        Ok(Self { channels, rows })
    }

    /// Parse the timestamp of every raw row. Row order is preserved.
    pub fn from_raw(raw: RawDataset) -> Result<Self> {
        let rows = raw
            .rows
            .into_iter()
            .map(|row| {
                let timestamp = parse_timestamp(&row.timestamp)?;
                Ok(ReadingRow::new(timestamp, row.values))
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(raw.channels, rows)
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    pub fn rows(&self) -> &[ReadingRow] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut Vec<ReadingRow> {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.channels.iter().position(|c| c == name)
    }

    pub fn has_channel(&self, name: &str) -> bool {
        self.channel_index(name).is_some()
    }

    /// Values of one channel in row order
    pub fn column(&self, index: usize) -> impl Iterator<Item = Option<f64>> + '_ {
        self.rows.iter().map(move |r| r.value(index))
    }

    pub fn column_by_name(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let index = self
            .channel_index(name)
            .ok_or_else(|| ProcessingError::UnknownChannel(name.to_string()))?;
        Ok(self.column(index).collect())
    }

    pub fn missing_count(&self, index: usize) -> usize {
        self.column(index).filter(Option::is_none).count()
    }

    /// Remove a channel and its values from every row
    pub fn drop_channel(&mut self, index: usize) -> String {
        for row in &mut self.rows {
            row.values.remove(index);
        }
        self.channels.remove(index)
    }

    pub fn sort_by_timestamp(&mut self) {
        self.rows.sort_by_key(|r| r.timestamp);
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.rows.iter().map(|r| r.timestamp).min()
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.rows.iter().map(|r| r.timestamp).max()
    }

    /// Earliest and latest calendar day present
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((
            self.first_timestamp()?.date(),
            self.last_timestamp()?.date(),
        ))
    }

    pub fn is_strictly_ordered(&self) -> bool {
        self.rows.windows(2).all(|w| w[0].timestamp < w[1].timestamp)
    }

    /// Convert back to the raw representation for writing
    pub fn to_raw(&self) -> RawDataset {
        RawDataset {
            channels: self.channels.clone(),
            rows: self
                .rows
                .iter()
                .map(|r| RawRow {
                    timestamp: r.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                    values: r.values.clone(),
                })
                .collect(),
        }
    }
}

pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT).map_err(|_| {
        ProcessingError::InvalidFormat(format!(
            "Invalid timestamp '{}', expected {}",
            s, TIMESTAMP_FORMAT
        ))
    })
}
