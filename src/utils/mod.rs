pub mod constants;
pub mod filename;
pub mod logging;
pub mod progress;

pub use constants::*;
pub use filename::{default_chart_filename, default_clean_csv_filename, default_raw_csv_filename};
pub use logging::init_logging;
pub use progress::ProgressReporter;
