/// Air4Thai history endpoint
pub const DEFAULT_API_URL: &str = "http://air4thai.com/forweb/getHistoryData.php";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Query defaults
pub const DEFAULT_STATION_ID: &str = "44t";
pub const DEFAULT_PARAMS: &str = "PM25,PM10,O3,CO,NO2,SO2,WS,TEMP,RH,WD,BP,RAIN";
pub const DEFAULT_DATA_TYPE: &str = "hr";
pub const DEFAULT_START_HOUR: u8 = 0;
pub const DEFAULT_END_HOUR: u8 = 23;

/// Column names
pub const TIMESTAMP_COLUMN: &str = "DATETIMEDATA";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Cleaning defaults
pub const DEFAULT_MISSING_THRESHOLD: f64 = 0.5;
pub const ZERO_SENTINEL_CHANNELS: [&str; 4] = [
    "Temperature",
    "Relative Humidity",
    "Atmospheric Pressure",
    "Wind Direction",
];

/// Dashboard defaults
pub const DEFAULT_PARAMETER: &str = "PM25";
pub const CHART_COLOR: &str = "#155d21";
pub const SUMMARY_PRECISION: usize = 2;

/// Output
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_CONFIG_FILE: &str = "air-quality.toml";
pub const ENV_PREFIX: &str = "AIRQ";

/// Field values treated as missing when reading CSV
pub const MISSING_MARKERS: [&str; 5] = ["", "nan", "NaN", "NULL", "null"];
