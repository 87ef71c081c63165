use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{ProcessingError, Result};
use crate::models::Dataset;

/// Inclusive range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(ProcessingError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Range spanning every day present in the dataset
    pub fn covering(dataset: &Dataset) -> Result<Self> {
        let (start, end) = dataset.date_bounds().ok_or(ProcessingError::EmptyDataset)?;
        Ok(Self { start, end })
    }

    /// Covering range narrowed by optional user bounds
    pub fn resolve(
        dataset: &Dataset,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Self> {
        let full = Self::covering(dataset)?;
        Self::new(start.unwrap_or(full.start), end.unwrap_or(full.end))
    }

    /// Every hour of the end day is inside the range, not only its midnight.
    pub fn contains(&self, timestamp: &NaiveDateTime) -> bool {
        let day = timestamp.date();
        day >= self.start && day <= self.end
    }

    pub fn num_days(&self) -> i64 {
        self.end.signed_duration_since(self.start).num_days() + 1
    }
}
