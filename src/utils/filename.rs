use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Raw download name: air4thai_{station}_{sdate}_{edate}.csv
pub fn default_raw_csv_filename(
    directory: &Path,
    station_id: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> PathBuf {
    let filename = format!(
        "air4thai_{}_{}_{}.csv",
        station_id,
        start_date.format("%Y-%m-%d"),
        end_date.format("%Y-%m-%d")
    );
    directory.join(filename)
}

/// Cleaned name derived from the input: readings.csv -> readings_clean.csv
pub fn default_clean_csv_filename(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "readings".to_string());
    input.with_file_name(format!("{}_clean.csv", stem))
}

/// Chart figure name for a channel: readings_clean_PM25_chart.json
pub fn default_chart_filename(input: &Path, channel: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "readings".to_string());
    let channel = channel.replace(' ', "_");
    input.with_file_name(format!("{}_{}_chart.json", stem, channel))
}
