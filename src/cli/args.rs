use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::utils::constants::{
    DEFAULT_DATA_TYPE, DEFAULT_END_HOUR, DEFAULT_PARAMS, DEFAULT_START_HOUR, DEFAULT_STATION_ID,
};

#[derive(Parser)]
#[command(name = "air-quality-processor")]
#[command(about = "Air4Thai air-quality history fetcher and cleaner")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        help = "Configuration file [default: air-quality.toml if present]"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    #[arg(long, default_value = DEFAULT_STATION_ID)]
    pub station_id: String,

    #[arg(long, default_value = DEFAULT_PARAMS, help = "Comma separated channel codes")]
    pub params: String,

    #[arg(long, default_value = DEFAULT_DATA_TYPE, help = "Aggregation granularity")]
    pub data_type: String,

    #[arg(long, help = "First day to fetch (YYYY-MM-DD)")]
    pub start_date: NaiveDate,

    #[arg(long, help = "Last day to fetch (YYYY-MM-DD)")]
    pub end_date: NaiveDate,

    #[arg(long, default_value_t = DEFAULT_START_HOUR)]
    pub start_hour: u8,

    #[arg(long, default_value_t = DEFAULT_END_HOUR)]
    pub end_hour: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download history data and store it as CSV
    Fetch {
        #[command(flatten)]
        query: FetchArgs,

        #[arg(
            short,
            long,
            help = "Output CSV path [default: {output_dir}/air4thai_{station}_{sdate}_{edate}.csv]"
        )]
        output_file: Option<PathBuf>,
    },

    /// Clean a downloaded CSV file
    Clean {
        #[arg(short, long, help = "Raw CSV file")]
        input_file: PathBuf,

        #[arg(
            short,
            long,
            help = "Cleaned CSV path [default: {input}_clean.csv]"
        )]
        output_file: Option<PathBuf>,

        #[arg(long, help = "Drop channels with a larger share of missing values")]
        missing_threshold: Option<f64>,
    },

    /// Print min/max/mean per channel for a date range
    Summary {
        #[arg(short, long, help = "Cleaned CSV file")]
        input_file: PathBuf,

        #[arg(long)]
        start_date: Option<NaiveDate>,

        #[arg(long)]
        end_date: Option<NaiveDate>,
    },

    /// Write a line chart figure (Plotly JSON) for one channel
    Chart {
        #[arg(short, long, help = "Cleaned CSV file")]
        input_file: PathBuf,

        #[arg(short, long, help = "Channel to plot [default: PM25]")]
        parameter: Option<String>,

        #[arg(long)]
        start_date: Option<NaiveDate>,

        #[arg(long)]
        end_date: Option<NaiveDate>,

        #[arg(short, long, help = "Figure path, '-' for stdout")]
        output_file: Option<PathBuf>,
    },

    /// Fetch, clean and summarize in one step
    Run {
        #[command(flatten)]
        query: FetchArgs,

        #[arg(long, help = "Drop channels with a larger share of missing values")]
        missing_threshold: Option<f64>,
    },
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Fetch { .. } => "fetch",
            Commands::Clean { .. } => "clean",
            Commands::Summary { .. } => "summary",
            Commands::Chart { .. } => "chart",
            Commands::Run { .. } => "run",
        }
    }
}
