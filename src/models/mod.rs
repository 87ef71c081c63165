pub mod channel;
pub mod dataset;
pub mod date_range;
pub mod query;

pub use channel::{rename_code, Channel, RENAMED_CHANNELS};
pub use dataset::{parse_timestamp, Dataset, RawDataset, RawRow, ReadingRow};
pub use date_range::DateRange;
pub use query::HistoryQuery;
