pub mod api_client;
pub mod csv_reader;

pub use api_client::{parse_history_response, AirQualityClient};
pub use csv_reader::CsvReader;
