use crate::analyzers::DashboardAnalyzer;
use crate::cli::args::{Cli, Commands, FetchArgs};
use crate::error::Result;
use crate::models::{Channel, Dataset, DateRange, HistoryQuery, RawDataset};
use crate::processors::{CleaningReport, DataCleaner};
use crate::readers::{AirQualityClient, CsvReader};
use crate::settings::Settings;
use crate::utils::filename::{
    default_chart_filename, default_clean_csv_filename, default_raw_csv_filename,
};
use crate::utils::logging::init_logging;
use crate::utils::progress::ProgressReporter;
use crate::writers::CsvWriter;
use chrono::NaiveDate;
use std::path::Path;
use tracing::info;

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Fetch { query, output_file } => {
            let query = build_query(&query)?;
            let raw = fetch(&settings, &query).await?;

            let output_file = output_file.unwrap_or_else(|| {
                default_raw_csv_filename(
                    &settings.output.directory,
                    &query.station_id,
                    query.start_date,
                    query.end_date,
                )
            });

            let writer = CsvWriter::new();
            writer.write_raw(&raw, &output_file)?;
            println!("\n{}", writer.get_file_info(&output_file)?.summary());
            println!("Saved raw readings to {}", output_file.display());
        }

        Commands::Clean {
            input_file,
            output_file,
            missing_threshold,
        } => {
            println!("Cleaning {}", input_file.display());
            let raw = CsvReader::new().read_path(&input_file)?;
            let cleaner = cleaner(&settings, missing_threshold);
            let output_file =
                output_file.unwrap_or_else(|| default_clean_csv_filename(&input_file));

            let (dataset, report) = clean_and_write(&cleaner, raw, &output_file)?;
            println!("\n{}", report.summary());
            println!(
                "Saved {} cleaned rows to {}",
                dataset.len(),
                output_file.display()
            );
        }

        Commands::Summary {
            input_file,
            start_date,
            end_date,
        } => {
            let dataset = read_dataset(&input_file)?;
            print_summary(&dataset, start_date, end_date)?;
        }

        Commands::Chart {
            input_file,
            parameter,
            start_date,
            end_date,
            output_file,
        } => {
            let dataset = read_dataset(&input_file)?;
            let analyzer = DashboardAnalyzer::new();
            let channel = match parameter {
                Some(p) => resolve_channel(&dataset, &p),
                None => analyzer.parameter_options(&dataset)?.default,
            };
            let range = DateRange::resolve(&dataset, start_date, end_date)?;

            let figure = analyzer.chart_figure(&dataset, &channel, &range)?;
            let json = figure.to_json()?;

            let output_file =
                output_file.unwrap_or_else(|| default_chart_filename(&input_file, &channel));
            if output_file == Path::new("-") {
                println!("{}", json);
            } else {
                std::fs::write(&output_file, json)?;
                println!(
                    "Wrote {} chart with {} points to {}",
                    channel,
                    figure.point_count(),
                    output_file.display()
                );
            }
        }

        Commands::Run {
            query,
            missing_threshold,
        } => {
            let query = build_query(&query)?;
            let raw = fetch(&settings, &query).await?;

            let raw_file = default_raw_csv_filename(
                &settings.output.directory,
                &query.station_id,
                query.start_date,
                query.end_date,
            );
            CsvWriter::new().write_raw(&raw, &raw_file)?;
            println!("Saved raw readings to {}", raw_file.display());

            let clean_file = default_clean_csv_filename(&raw_file);
            let cleaner = cleaner(&settings, missing_threshold);
            let (dataset, report) = clean_and_write(&cleaner, raw, &clean_file)?;
            println!("\n{}", report.summary());
            println!("Saved cleaned readings to {}", clean_file.display());

            print_summary(&dataset, None, None)?;
        }
    }

    Ok(())
}

fn build_query(args: &FetchArgs) -> Result<HistoryQuery> {
    let query = HistoryQuery::new(args.start_date, args.end_date)
        .with_station(&args.station_id)
        .with_channels(Channel::parse_list(&args.params)?)
        .with_data_type(&args.data_type)
        .with_hours(args.start_hour, args.end_hour);
    query.check()?;
    Ok(query)
}

async fn fetch(settings: &Settings, query: &HistoryQuery) -> Result<RawDataset> {
    println!(
        "Fetching {} from station {} ({} to {})",
        Channel::join_codes(&query.channels),
        query.station_id,
        query.start_date,
        query.end_date
    );

    let client = AirQualityClient::new(&settings.api.base_url, settings.api.timeout())?;
    let progress = ProgressReporter::new_spinner("Requesting history data...", false);
    let raw = client.fetch_history(query).await?;
    progress.finish_with_message(&format!("Received {} readings", raw.len()));

    Ok(raw)
}

fn cleaner(settings: &Settings, missing_threshold: Option<f64>) -> DataCleaner {
    let cleaner = settings.cleaning.cleaner();
    match missing_threshold {
        Some(threshold) => cleaner.with_missing_threshold(threshold),
        None => cleaner,
    }
}

fn clean_and_write(
    cleaner: &DataCleaner,
    raw: RawDataset,
    output_file: &Path,
) -> Result<(Dataset, CleaningReport)> {
    let (dataset, report) = cleaner.clean(raw)?;
    CsvWriter::new().write_dataset(&dataset, output_file)?;
    Ok((dataset, report))
}

fn read_dataset(path: &Path) -> Result<Dataset> {
    let mut dataset = Dataset::from_raw(CsvReader::new().read_path(path)?)?;
    dataset.sort_by_timestamp();
    info!(rows = dataset.len(), path = %path.display(), "Loaded dataset");
    Ok(dataset)
}

/// Accept either the column label or the API code of a renamed channel
fn resolve_channel(dataset: &Dataset, parameter: &str) -> String {
    if dataset.has_channel(parameter) {
        return parameter.to_string();
    }
    Channel::from_name(parameter)
        .map(|c| c.label().to_string())
        .filter(|label| dataset.has_channel(label))
        .unwrap_or_else(|| parameter.to_string())
}

fn print_summary(
    dataset: &Dataset,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<()> {
    let analyzer = DashboardAnalyzer::new();
    let range = DateRange::resolve(dataset, start_date, end_date)?;
    let options = analyzer.parameter_options(dataset)?;

    println!(
        "\nParameters: {} (default: {})",
        options.options.join(", "),
        options.default
    );
    println!("{}", analyzer.summarize(dataset, &range)?.render());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReadingRow;

    #[test]
    fn test_resolve_channel_accepts_codes() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let dataset = Dataset::new(
            vec!["PM25".to_string(), "Temperature".to_string()],
            vec![ReadingRow::new(ts, vec![Some(1.0), Some(2.0)])],
        )
        .unwrap();

        assert_eq!(resolve_channel(&dataset, "TEMP"), "Temperature");
        assert_eq!(resolve_channel(&dataset, "PM25"), "PM25");
        assert_eq!(resolve_channel(&dataset, "O3"), "O3");
    }

    #[test]
    fn test_cli_threshold_overrides_settings() {
        let settings = Settings::default();
        assert_eq!(cleaner(&settings, None).missing_threshold(), 0.5);
        assert_eq!(cleaner(&settings, Some(0.3)).missing_threshold(), 0.3);
    }

    #[test]
    fn test_build_query_rejects_unknown_channel() {
        let args = FetchArgs {
            station_id: "44t".to_string(),
            params: "PM25,BOGUS".to_string(),
            data_type: "hr".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            start_hour: 0,
            end_hour: 23,
        };
        assert!(build_query(&args).is_err());
    }
}
