pub mod args;
pub mod commands;

pub use args::{Cli, Commands, FetchArgs};
pub use commands::run;
