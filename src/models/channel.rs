use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ProcessingError, Result};

/// A sensor channel reported by the Air4Thai history API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Pm25,
    Pm10,
    O3,
    Co,
    No2,
    So2,
    WindSpeed,
    Temperature,
    RelativeHumidity,
    WindDirection,
    AtmosphericPressure,
    Rain,
}

/// Static rename map applied by the cleaner: API code -> display label
pub const RENAMED_CHANNELS: [(&str, &str); 4] = [
    ("TEMP", "Temperature"),
    ("WD", "Wind Direction"),
    ("RH", "Relative Humidity"),
    ("BP", "Atmospheric Pressure"),
];

impl Channel {
    pub const ALL: [Channel; 12] = [
        Channel::Pm25,
        Channel::Pm10,
        Channel::O3,
        Channel::Co,
        Channel::No2,
        Channel::So2,
        Channel::WindSpeed,
        Channel::Temperature,
        Channel::RelativeHumidity,
        Channel::WindDirection,
        Channel::AtmosphericPressure,
        Channel::Rain,
    ];

    /// Identifier used in the `param` query and the response records
    pub fn code(&self) -> &'static str {
        match self {
            Channel::Pm25 => "PM25",
            Channel::Pm10 => "PM10",
            Channel::O3 => "O3",
            Channel::Co => "CO",
            Channel::No2 => "NO2",
            Channel::So2 => "SO2",
            Channel::WindSpeed => "WS",
            Channel::Temperature => "TEMP",
            Channel::RelativeHumidity => "RH",
            Channel::WindDirection => "WD",
            Channel::AtmosphericPressure => "BP",
            Channel::Rain => "RAIN",
        }
    }

    /// Column label after cleaning. Channels without a rename keep their code.
    pub fn label(&self) -> &'static str {
        rename_code(self.code()).unwrap_or_else(|| self.code())
    }

    /// Resolve either an API code or a cleaned label
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(name) || c.label() == name)
    }

    /// Parse a comma separated `param` list such as "PM25,TEMP,RH"
    pub fn parse_list(params: &str) -> Result<Vec<Channel>> {
        params
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| p.parse())
            .collect()
    }

    pub fn join_codes(channels: &[Channel]) -> String {
        channels
            .iter()
            .map(Channel::code)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Look up the display label for an API code, if it has one
pub fn rename_code(code: &str) -> Option<&'static str> {
    RENAMED_CHANNELS
        .iter()
        .find(|(from, _)| *from == code)
        .map(|(_, to)| *to)
}

impl FromStr for Channel {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        Channel::from_name(s).ok_or_else(|| ProcessingError::UnknownChannel(s.to_string()))
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
