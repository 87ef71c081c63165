pub mod data_cleaner;

pub use data_cleaner::{ChannelFill, CleaningReport, DataCleaner, DropReason, DroppedChannel};
