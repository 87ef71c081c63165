use crate::error::{ProcessingError, Result};
use crate::models::{rename_code, Dataset, RawDataset, ReadingRow};
use crate::utils::constants::{DEFAULT_MISSING_THRESHOLD, ZERO_SENTINEL_CHANNELS};
use std::fmt;
use tracing::{debug, info, warn};

/// Turns a raw reading table into a display-ready dataset:
/// renamed channels, sorted unique timestamps, no sparse channels,
/// no missing values and no zero sentinels in the designated channels.
pub struct DataCleaner {
    missing_threshold: f64,
    zero_sentinel_channels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DropReason {
    /// Share of missing values above the threshold
    Sparse { missing_fraction: f64 },
    /// No reading left to compute a fill value from
    NoUsableReadings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DroppedChannel {
    pub channel: String,
    pub reason: DropReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelFill {
    pub channel: String,
    pub fill_value: f64,
    pub missing_filled: usize,
    pub zeros_replaced: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleaningReport {
    pub input_rows: usize,
    pub output_rows: usize,
    pub renamed_channels: Vec<(String, String)>,
    pub duplicate_timestamps: usize,
    pub dropped_channels: Vec<DroppedChannel>,
    pub channel_fills: Vec<ChannelFill>,
    pub incomplete_rows_dropped: usize,
    pub absent_sentinel_channels: Vec<String>,
}

impl DataCleaner {
    pub fn new() -> Self {
        Self {
            missing_threshold: DEFAULT_MISSING_THRESHOLD,
            zero_sentinel_channels: ZERO_SENTINEL_CHANNELS
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }

    pub fn with_missing_threshold(mut self, threshold: f64) -> Self {
        self.missing_threshold = threshold;
        self
    }

    pub fn with_zero_sentinel_channels(mut self, channels: Vec<String>) -> Self {
        self.zero_sentinel_channels = channels;
        self
    }

    pub fn missing_threshold(&self) -> f64 {
        self.missing_threshold
    }

    pub fn zero_sentinel_channels(&self) -> &[String] {
        &self.zero_sentinel_channels
    }

    /// Run the full cleaning pipeline
    pub fn clean(&self, mut raw: RawDataset) -> Result<(Dataset, CleaningReport)> {
        if raw.is_empty() {
            return Err(ProcessingError::EmptyDataset);
        }
        if !(0.0..=1.0).contains(&self.missing_threshold) {
            return Err(ProcessingError::InvalidFormat(format!(
                "Missing threshold {} is outside [0, 1]",
                self.missing_threshold
            )));
        }

        let mut report = CleaningReport {
            input_rows: raw.len(),
            ..Default::default()
        };

        info!(rows = raw.len(), channels = raw.channels.len(), "Cleaning dataset");

        self.rename_channels(&mut raw, &mut report);

        let mut dataset = Dataset::from_raw(raw)?;
        self.sort_unique(&mut dataset, &mut report);
        self.drop_sparse_channels(&mut dataset, &mut report);

        let fill_values = self.fill_values(&mut dataset, &mut report);
        self.fill_missing(&mut dataset, &fill_values, &mut report);
        let sentinel_indices = self.sentinel_indices(&dataset, &mut report);
        self.drop_incomplete_rows(&mut dataset, &sentinel_indices, &mut report);
        self.replace_zero_sentinels(&mut dataset, &sentinel_indices, &fill_values, &mut report);

        report.output_rows = dataset.len();
        info!(
            rows = report.output_rows,
            channels = dataset.channels().len(),
            dropped = report.dropped_channels.len(),
            "Cleaning complete"
        );

        Ok((dataset, report))
    }

    fn rename_channels(&self, raw: &mut RawDataset, report: &mut CleaningReport) {
        for channel in raw.channels.iter_mut() {
            if let Some(label) = rename_code(channel) {
                debug!(from = %channel, to = label, "Renaming channel");
                report
                    .renamed_channels
                    .push((channel.clone(), label.to_string()));
                *channel = label.to_string();
            }
        }
    }

    /// Sort ascending by timestamp. Of several rows sharing a timestamp the
    /// one that came last in the input wins.
    fn sort_unique(&self, dataset: &mut Dataset, report: &mut CleaningReport) {
        dataset.sort_by_timestamp();

        let rows = std::mem::take(dataset.rows_mut());
        let mut unique: Vec<ReadingRow> = Vec::with_capacity(rows.len());
        for row in rows {
            match unique.last_mut() {
                Some(last) if last.timestamp == row.timestamp => {
                    *last = row;
                    report.duplicate_timestamps += 1;
                }
                _ => unique.push(row),
            }
        }
        *dataset.rows_mut() = unique;

        if report.duplicate_timestamps > 0 {
            warn!(
                duplicates = report.duplicate_timestamps,
                "Removed rows with duplicate timestamps"
            );
        }
    }

    fn drop_sparse_channels(&self, dataset: &mut Dataset, report: &mut CleaningReport) {
        let total = dataset.len() as f64;
        let mut dropped = Vec::new();

        for index in (0..dataset.channels().len()).rev() {
            let missing_fraction = dataset.missing_count(index) as f64 / total;
            if missing_fraction > self.missing_threshold {
                let channel = dataset.drop_channel(index);
                warn!(
                    %channel,
                    missing = %format!("{:.1}%", missing_fraction * 100.0),
                    "Dropping sparse channel"
                );
                dropped.push(DroppedChannel {
                    channel,
                    reason: DropReason::Sparse { missing_fraction },
                });
            }
        }

        dropped.reverse();
        report.dropped_channels.extend(dropped);
    }

    fn is_sentinel_channel(&self, channel: &str) -> bool {
        self.zero_sentinel_channels.iter().any(|c| c == channel)
    }

    /// Per-channel arithmetic mean of the present readings. Zeros do not
    /// count as readings in the designated channels. Channels without any
    /// reading are dropped here.
    fn fill_values(&self, dataset: &mut Dataset, report: &mut CleaningReport) -> Vec<f64> {
        let mut values = Vec::with_capacity(dataset.channels().len());
        let mut index = 0;

        while index < dataset.channels().len() {
            let skip_zeros = self.is_sentinel_channel(&dataset.channels()[index]);
            let readings = dataset
                .column(index)
                .flatten()
                .filter(|v| !(skip_zeros && *v == 0.0));

            match mean(readings) {
                Some(value) => {
                    values.push(value);
                    index += 1;
                }
                None => {
                    let channel = dataset.drop_channel(index);
                    warn!(%channel, "Dropping channel without usable readings");
                    report.dropped_channels.push(DroppedChannel {
                        channel,
                        reason: DropReason::NoUsableReadings,
                    });
                }
            }
        }

        values
    }

    fn fill_missing(&self, dataset: &mut Dataset, fill_values: &[f64], report: &mut CleaningReport) {
        report.channel_fills = dataset
            .channels()
            .iter()
            .zip(fill_values)
            .map(|(channel, &fill_value)| ChannelFill {
                channel: channel.clone(),
                fill_value,
                missing_filled: 0,
                zeros_replaced: 0,
            })
            .collect();

        for row in dataset.rows_mut() {
            for (index, value) in row.values.iter_mut().enumerate() {
                if value.is_none() {
                    *value = Some(fill_values[index]);
                    report.channel_fills[index].missing_filled += 1;
                }
            }
        }

        for fill in &report.channel_fills {
            debug!(
                channel = %fill.channel,
                fill_value = fill.fill_value,
                filled = fill.missing_filled,
                "Filled missing values"
            );
        }
    }

    fn sentinel_indices(&self, dataset: &Dataset, report: &mut CleaningReport) -> Vec<usize> {
        let mut indices = Vec::new();
        for channel in &self.zero_sentinel_channels {
            match dataset.channel_index(channel) {
                Some(index) => indices.push(index),
                None => {
                    warn!(%channel, "Designated channel not present, skipping zero handling");
                    report.absent_sentinel_channels.push(channel.clone());
                }
            }
        }
        indices
    }

    fn drop_incomplete_rows(
        &self,
        dataset: &mut Dataset,
        sentinel_indices: &[usize],
        report: &mut CleaningReport,
    ) {
        let before = dataset.len();
        dataset
            .rows_mut()
            .retain(|row| sentinel_indices.iter().all(|&i| row.value(i).is_some()));
        report.incomplete_rows_dropped = before - dataset.len();
    }

    fn replace_zero_sentinels(
        &self,
        dataset: &mut Dataset,
        sentinel_indices: &[usize],
        fill_values: &[f64],
        report: &mut CleaningReport,
    ) {
        for row in dataset.rows_mut() {
            for &index in sentinel_indices {
                if row.values[index] == Some(0.0) {
                    row.values[index] = Some(fill_values[index]);
                    report.channel_fills[index].zeros_replaced += 1;
                }
            }
        }
    }
}

impl Default for DataCleaner {
    fn default() -> Self {
        Self::new()
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

impl CleaningReport {
    pub fn total_filled(&self) -> usize {
        self.channel_fills.iter().map(|f| f.missing_filled).sum()
    }

    pub fn total_zeros_replaced(&self) -> usize {
        self.channel_fills.iter().map(|f| f.zeros_replaced).sum()
    }

    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Cleaning Report ===\n");
        summary.push_str(&format!("Input Rows: {}\n", self.input_rows));
        summary.push_str(&format!("Output Rows: {}\n", self.output_rows));
        summary.push_str(&format!(
            "Duplicate Timestamps Removed: {}\n",
            self.duplicate_timestamps
        ));

        if !self.renamed_channels.is_empty() {
            let renamed: Vec<String> = self
                .renamed_channels
                .iter()
                .map(|(from, to)| format!("{} -> {}", from, to))
                .collect();
            summary.push_str(&format!("Renamed: {}\n", renamed.join(", ")));
        }

        summary.push_str(&format!(
            "\nDropped Channels: {}\n",
            self.dropped_channels.len()
        ));
        for dropped in &self.dropped_channels {
            summary.push_str(&format!("  - {}\n", dropped));
        }

        summary.push_str(&format!(
            "\nMissing Values Filled: {}\n",
            self.total_filled()
        ));
        summary.push_str(&format!(
            "Zero Readings Replaced: {}\n",
            self.total_zeros_replaced()
        ));
        for fill in self
            .channel_fills
            .iter()
            .filter(|f| f.missing_filled > 0 || f.zeros_replaced > 0)
        {
            summary.push_str(&format!(
                "  {}: {} filled, {} zeros replaced (mean {:.2})\n",
                fill.channel, fill.missing_filled, fill.zeros_replaced, fill.fill_value
            ));
        }

        if self.incomplete_rows_dropped > 0 {
            summary.push_str(&format!(
                "Incomplete Rows Dropped: {}\n",
                self.incomplete_rows_dropped
            ));
        }
        if !self.absent_sentinel_channels.is_empty() {
            summary.push_str(&format!(
                "Designated Channels Absent: {}\n",
                self.absent_sentinel_channels.join(", ")
            ));
        }

        summary
    }
}

impl fmt::Display for DroppedChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            DropReason::Sparse { missing_fraction } => write!(
                f,
                "{} ({:.1}% missing)",
                self.channel,
                missing_fraction * 100.0
            ),
            DropReason::NoUsableReadings => write!(f, "{} (no usable readings)", self.channel),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw<S: AsRef<str>>(channels: &[&str], rows: &[(S, Vec<Option<f64>>)]) -> RawDataset {
        let mut raw = RawDataset::new(channels.iter().map(|c| c.to_string()).collect());
        for (timestamp, values) in rows {
            raw.push_row(timestamp.as_ref().to_string(), values.clone())
                .unwrap();
        }
        raw
    }

    fn hours(n: usize) -> Vec<String> {
        (0..n)
            .map(|h| format!("2024-01-01 {:02}:00:00", h))
            .collect()
    }

    #[test]
    fn test_temperature_zero_and_missing_use_nonzero_mean() {
        let ts = hours(4);
        let input = raw(
            &["TEMP"],
            &[
                (&ts[0], vec![Some(0.0)]),
                (&ts[1], vec![Some(20.0)]),
                (&ts[2], vec![None]),
                (&ts[3], vec![Some(22.0)]),
            ],
        );

        let (dataset, report) = DataCleaner::new().clean(input).unwrap();

        assert_eq!(dataset.channels(), &["Temperature".to_string()]);
        assert_eq!(
            dataset.column_by_name("Temperature").unwrap(),
            vec![Some(21.0), Some(20.0), Some(21.0), Some(22.0)]
        );
        assert_eq!(report.total_filled(), 1);
        assert_eq!(report.total_zeros_replaced(), 1);
        assert_eq!(
            report.absent_sentinel_channels,
            vec![
                "Relative Humidity".to_string(),
                "Atmospheric Pressure".to_string(),
                "Wind Direction".to_string()
            ]
        );
    }

    #[test]
    fn test_zero_kept_outside_designated_channels() {
        let ts = hours(3);
        let input = raw(
            &["RAIN"],
            &[
                (&ts[0], vec![Some(0.0)]),
                (&ts[1], vec![None]),
                (&ts[2], vec![Some(3.0)]),
            ],
        );

        let (dataset, _) = DataCleaner::new().clean(input).unwrap();

        assert_eq!(
            dataset.column_by_name("RAIN").unwrap(),
            vec![Some(0.0), Some(1.5), Some(3.0)]
        );
    }

    #[test]
    fn test_rename_map() {
        let input = raw(
            &["PM25", "TEMP", "WD", "RH", "BP", "WS"],
            &[(
                "2024-01-01 00:00:00",
                vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0), Some(6.0)],
            )],
        );

        let (dataset, report) = DataCleaner::new().clean(input).unwrap();

        assert_eq!(
            dataset.channels(),
            &[
                "PM25".to_string(),
                "Temperature".to_string(),
                "Wind Direction".to_string(),
                "Relative Humidity".to_string(),
                "Atmospheric Pressure".to_string(),
                "WS".to_string(),
            ]
        );
        assert_eq!(report.renamed_channels.len(), 4);
        assert!(report.absent_sentinel_channels.is_empty());
    }

    #[test]
    fn test_sparse_channel_is_dropped() {
        let ts = hours(4);
        let input = raw(
            &["PM25", "SO2", "NO2"],
            &[
                (&ts[0], vec![Some(10.0), None, Some(1.0)]),
                (&ts[1], vec![Some(11.0), None, None]),
                (&ts[2], vec![Some(12.0), None, Some(3.0)]),
                (&ts[3], vec![Some(13.0), Some(4.0), None]),
            ],
        );

        let (dataset, report) = DataCleaner::new().clean(input).unwrap();

        // exactly half missing stays
        assert_eq!(dataset.channels(), &["PM25".to_string(), "NO2".to_string()]);
        assert_eq!(
            report.dropped_channels,
            vec![DroppedChannel {
                channel: "SO2".to_string(),
                reason: DropReason::Sparse {
                    missing_fraction: 0.75
                },
            }]
        );
        assert_eq!(
            dataset.column_by_name("NO2").unwrap(),
            vec![Some(1.0), Some(2.0), Some(3.0), Some(2.0)]
        );
    }

    #[test]
    fn test_rows_sorted_and_unique() {
        let input = raw(
            &["PM25"],
            &[
                ("2024-01-01 02:00:00", vec![Some(3.0)]),
                ("2024-01-01 00:00:00", vec![Some(1.0)]),
                ("2024-01-01 01:00:00", vec![Some(2.0)]),
                ("2024-01-01 00:00:00", vec![Some(9.0)]),
            ],
        );

        let (dataset, report) = DataCleaner::new().clean(input).unwrap();

        assert!(dataset.is_strictly_ordered());
        assert_eq!(dataset.len(), 3);
        assert_eq!(report.duplicate_timestamps, 1);
        assert_eq!(
            dataset.column_by_name("PM25").unwrap(),
            vec![Some(9.0), Some(2.0), Some(3.0)]
        );
    }

    #[test]
    fn test_all_zero_designated_channel_is_dropped() {
        let ts = hours(2);
        let input = raw(
            &["PM25", "BP"],
            &[
                (&ts[0], vec![Some(1.0), Some(0.0)]),
                (&ts[1], vec![Some(2.0), Some(0.0)]),
            ],
        );

        let (dataset, report) = DataCleaner::new().clean(input).unwrap();

        assert_eq!(dataset.channels(), &["PM25".to_string()]);
        assert_eq!(
            report.dropped_channels[0].reason,
            DropReason::NoUsableReadings
        );
        assert!(report
            .absent_sentinel_channels
            .contains(&"Atmospheric Pressure".to_string()));
    }

    #[test]
    fn test_no_missing_and_no_sentinel_zeros_remain() {
        let ts = hours(6);
        let input = raw(
            &["PM25", "TEMP", "RH", "WD", "BP", "RAIN"],
            &[
                (&ts[0], vec![Some(5.0), Some(0.0), Some(60.0), None, Some(760.0), Some(0.0)]),
                (&ts[1], vec![None, Some(28.0), Some(0.0), Some(90.0), Some(761.0), None]),
                (&ts[2], vec![Some(7.0), None, Some(65.0), Some(0.0), None, Some(0.2)]),
                (&ts[3], vec![Some(8.0), Some(30.0), None, Some(180.0), Some(0.0), Some(0.0)]),
                (&ts[4], vec![Some(9.0), Some(29.0), Some(70.0), Some(270.0), Some(759.0), None]),
                (&ts[5], vec![None, Some(27.0), Some(75.0), Some(0.0), Some(762.0), Some(1.0)]),
            ],
        );

        let cleaner = DataCleaner::new();
        let (dataset, report) = cleaner.clean(input).unwrap();

        assert_eq!(dataset.len(), 6);
        assert!(report.dropped_channels.is_empty());
        for index in 0..dataset.channels().len() {
            assert_eq!(dataset.missing_count(index), 0);
        }
        for channel in cleaner.zero_sentinel_channels() {
            let values = dataset.column_by_name(channel).unwrap();
            assert!(values.iter().all(|v| *v != Some(0.0)), "{} has zeros", channel);
        }
        assert_eq!(
            dataset.column_by_name("RAIN").unwrap()[0],
            Some(0.0)
        );
    }

    #[test]
    fn test_empty_input() {
        let input = RawDataset::new(vec!["PM25".to_string()]);
        assert!(matches!(
            DataCleaner::new().clean(input),
            Err(ProcessingError::EmptyDataset)
        ));
    }

    #[test]
    fn test_invalid_threshold() {
        let input = raw(&["PM25"], &[("2024-01-01 00:00:00", vec![Some(1.0)])]);
        assert!(DataCleaner::new()
            .with_missing_threshold(1.5)
            .clean(input)
            .is_err());
    }

    #[test]
    fn test_custom_threshold() {
        let ts = hours(4);
        let input = raw(
            &["PM25", "CO"],
            &[
                (&ts[0], vec![Some(1.0), Some(0.5)]),
                (&ts[1], vec![Some(2.0), None]),
                (&ts[2], vec![Some(3.0), Some(0.7)]),
                (&ts[3], vec![Some(4.0), Some(0.9)]),
            ],
        );

        let (dataset, _) = DataCleaner::new()
            .with_missing_threshold(0.2)
            .clean(input)
            .unwrap();

        assert_eq!(dataset.channels(), &["PM25".to_string()]);
    }

    #[test]
    fn test_report_summary() {
        let ts = hours(4);
        let input = raw(
            &["TEMP", "SO2"],
            &[
                (&ts[0], vec![Some(0.0), None]),
                (&ts[1], vec![Some(20.0), None]),
                (&ts[2], vec![None, None]),
                (&ts[3], vec![Some(22.0), Some(1.0)]),
            ],
        );

        let (_, report) = DataCleaner::new().clean(input).unwrap();
        let summary = report.summary();

        assert!(summary.contains("Input Rows: 4"));
        assert!(summary.contains("TEMP -> Temperature"));
        assert!(summary.contains("SO2 (75.0% missing)"));
        assert!(summary.contains("Temperature: 1 filled, 1 zeros replaced (mean 21.00)"));
    }
}
