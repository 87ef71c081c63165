use chrono::NaiveDate;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{ProcessingError, Result};
use crate::models::Channel;
use crate::utils::constants::{
    DEFAULT_DATA_TYPE, DEFAULT_END_HOUR, DEFAULT_START_HOUR, DEFAULT_STATION_ID,
};

/// Parameters of a `getHistoryData` request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HistoryQuery {
    #[validate(length(min = 1))]
    pub station_id: String,

    #[validate(length(min = 1))]
    pub channels: Vec<Channel>,

    /// Aggregation granularity, e.g. "hr"
    #[validate(length(min = 1))]
    pub data_type: String,

    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    #[validate(range(max = 23))]
    pub start_hour: u8,

    #[validate(range(max = 23))]
    pub end_hour: u8,
}

impl HistoryQuery {
    /// Query for all channels of the default station, full days
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            station_id: DEFAULT_STATION_ID.to_string(),
            channels: Channel::ALL.to_vec(),
            data_type: DEFAULT_DATA_TYPE.to_string(),
            start_date,
            end_date,
            start_hour: DEFAULT_START_HOUR,
            end_hour: DEFAULT_END_HOUR,
        }
    }

    pub fn with_station(mut self, station_id: &str) -> Self {
        self.station_id = station_id.to_string();
        self
    }

    pub fn with_channels(mut self, channels: Vec<Channel>) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_data_type(mut self, data_type: &str) -> Self {
        self.data_type = data_type.to_string();
        self
    }

    pub fn with_hours(mut self, start_hour: u8, end_hour: u8) -> Self {
        self.start_hour = start_hour;
        self.end_hour = end_hour;
        self
    }

    /// Field checks plus the date ordering the derive cannot express
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        if self.start_date > self.end_date {
            return Err(ProcessingError::InvalidDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }

    /// Channel codes in request order
    pub fn channel_codes(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.code().to_string()).collect()
    }

    pub fn to_url(&self, base_url: &str) -> Result<Url> {
        let params = [
            ("stationID", self.station_id.clone()),
            ("param", Channel::join_codes(&self.channels)),
            ("type", self.data_type.clone()),
            ("sdate", self.start_date.format("%Y-%m-%d").to_string()),
            ("edate", self.end_date.format("%Y-%m-%d").to_string()),
            ("stime", format!("{:02}", self.start_hour)),
            ("etime", format!("{:02}", self.end_hour)),
        ];

        Url::parse_with_params(base_url, &params)
            .map_err(|e| ProcessingError::InvalidFormat(format!("Invalid API URL '{}': {}", base_url, e)))
    }
}
