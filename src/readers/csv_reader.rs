use crate::error::{ProcessingError, Result};
use crate::models::RawDataset;
use crate::utils::constants::{MISSING_MARKERS, TIMESTAMP_COLUMN};
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Reads reading tables written by [`crate::writers::CsvWriter`] or by
/// dataframe tools that prepend an unnamed index column.
pub struct CsvReader {
    timestamp_column: String,
}

impl CsvReader {
    pub fn new() -> Self {
        Self {
            timestamp_column: TIMESTAMP_COLUMN.to_string(),
        }
    }

    pub fn read_path(&self, path: &Path) -> Result<RawDataset> {
        let file = File::open(path)?;
        let dataset = self.read_from(file)?;
        debug!(
            path = %path.display(),
            rows = dataset.len(),
            channels = dataset.channels.len(),
            "Read CSV table"
        );
        Ok(dataset)
    }

    pub fn read_from<R: Read>(&self, input: R) -> Result<RawDataset> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(input);

        let headers = reader.headers()?.clone();
        let timestamp_index = headers
            .iter()
            .position(|h| h == self.timestamp_column)
            .ok_or_else(|| ProcessingError::MissingData(self.timestamp_column.clone()))?;

        // Unnamed columns are row indices, not channels
        let channel_indices: Vec<usize> = headers
            .iter()
            .enumerate()
            .filter(|(i, h)| *i != timestamp_index && !h.is_empty())
            .map(|(i, _)| i)
            .collect();

        let channels = channel_indices
            .iter()
            .map(|&i| headers[i].to_string())
            .collect();
        let mut dataset = RawDataset::new(channels);

        for (line, record) in reader.records().enumerate() {
            let record = record?;
            let (timestamp, values) =
                self.parse_record(&record, timestamp_index, &channel_indices, line + 2)?;
            dataset.push_row(timestamp, values)?;
        }

        Ok(dataset)
    }

    fn parse_record(
        &self,
        record: &StringRecord,
        timestamp_index: usize,
        channel_indices: &[usize],
        line: usize,
    ) -> Result<(String, Vec<Option<f64>>)> {
        let timestamp = record
            .get(timestamp_index)
            .ok_or_else(|| {
                ProcessingError::InvalidFormat(format!("Line {}: missing timestamp", line))
            })?
            .to_string();

        let values = channel_indices
            .iter()
            .map(|&i| parse_value(record.get(i).unwrap_or(""), line))
            .collect::<Result<Vec<_>>>()?;

        Ok((timestamp, values))
    }
}

impl Default for CsvReader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_value(field: &str, line: usize) -> Result<Option<f64>> {
    if MISSING_MARKERS.contains(&field) {
        return Ok(None);
    }
    let value = field.parse::<f64>().map_err(|_| {
        ProcessingError::InvalidFormat(format!("Line {}: invalid reading '{}'", line, field))
    })?;
    // The float parser accepts "NAN" and "inf" in any case
    Ok(Some(value).filter(|v| v.is_finite()))
}
