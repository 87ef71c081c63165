use crate::error::Result;
use crate::models::{Dataset, RawDataset};
use crate::utils::constants::TIMESTAMP_COLUMN;
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

pub struct CsvWriter;

impl CsvWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write a raw table; missing values become empty fields
    pub fn write_raw(&self, dataset: &RawDataset, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        self.write_raw_to(dataset, file)?;

        info!(path = %path.display(), rows = dataset.len(), "Wrote CSV file");
        Ok(())
    }

    /// Write a cleaned table with timestamps in the API format
    pub fn write_dataset(&self, dataset: &Dataset, path: &Path) -> Result<()> {
        self.write_raw(&dataset.to_raw(), path)
    }

    pub fn write_raw_to<W: Write>(&self, dataset: &RawDataset, output: W) -> Result<()> {
        let mut writer = WriterBuilder::new().from_writer(output);

        let mut header = Vec::with_capacity(dataset.channels.len() + 1);
        header.push(TIMESTAMP_COLUMN.to_string());
        header.extend(dataset.channels.iter().cloned());
        writer.write_record(&header)?;

        for row in &dataset.rows {
            let mut record = Vec::with_capacity(row.values.len() + 1);
            record.push(row.timestamp.clone());
            record.extend(
                row.values
                    .iter()
                    .map(|v| v.map(|v| v.to_string()).unwrap_or_default()),
            );
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }

    pub fn get_file_info(&self, path: &Path) -> Result<CsvFileInfo> {
        let file_size = std::fs::metadata(path)?.len();
        let mut reader = csv::Reader::from_path(path)?;
        let columns = reader.headers()?.len();
        let mut total_rows = 0;
        for record in reader.records() {
            record?;
            total_rows += 1;
        }

        Ok(CsvFileInfo {
            total_rows,
            columns,
            file_size,
        })
    }
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct CsvFileInfo {
    pub total_rows: usize,
    pub columns: usize,
    pub file_size: u64,
}

impl CsvFileInfo {
    pub fn summary(&self) -> String {
        format!(
            "CSV File Summary:\n\
            - Total rows: {}\n\
            - Columns: {}\n\
            - File size: {:.2} KB",
            self.total_rows,
            self.columns,
            self.file_size as f64 / 1024.0
        )
    }
}
