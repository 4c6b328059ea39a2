use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use camplinks::{DuckDuckGo, Pipeline, Registry, Settings, Stage, Store, WebFetcher};
use chrono::Datelike;
use clap::{Parser, ValueEnum};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "camplinks")]
#[command(
    about = "Scrape US election results from Wikipedia and find candidates' campaign contacts",
    long_about = None
)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[arg(long, help = "Election year to process (defaults to the current year)")]
    year: Option<u16>,

    #[arg(
        long,
        default_value = "all",
        help = "Race family to process, or 'all' (house, senate, governor, attorney_general, \
                judicial, municipal, special_house, state_leg, state_leg_special)"
    )]
    race: String,

    #[arg(long, value_parser = parse_stage, help = "Run a single stage: scrape, enrich or search")]
    stage: Option<Stage>,

    #[arg(long, default_value = "camplinks.db", help = "SQLite database path")]
    db: PathBuf,

    #[arg(
        long,
        default_value = "campaign_search_cache.json",
        help = "Contact search cache path"
    )]
    cache: PathBuf,

    #[arg(long, value_name = "FILE", help = "JSON settings file")]
    config: Option<PathBuf>,

    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        default_value = "text",
        help = "Summary output format"
    )]
    format: OutputFormat,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_stage(s: &str) -> Result<Stage, String> {
    Stage::from_str(s).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    let settings = match &cli.config {
        Some(path) => Settings::from_json_file(path).unwrap_or_else(|e| {
            log::error!("Error loading settings from {}: {}", path.display(), e);
            process::exit(1);
        }),
        None => Settings::default(),
    };

    let year = cli
        .year
        .unwrap_or_else(|| chrono::Local::now().year() as u16);

    let store = Store::open(&cli.db).unwrap_or_else(|e| {
        log::error!("Error opening database {}: {}", cli.db.display(), e);
        process::exit(1);
    });

    let fetcher = WebFetcher::new(&settings).unwrap_or_else(|e| {
        log::error!("Error creating fetcher: {}", e);
        process::exit(1);
    });

    let search = DuckDuckGo::new(&settings).unwrap_or_else(|e| {
        log::error!("Error creating search client: {}", e);
        process::exit(1);
    });

    let pipeline = Pipeline::new(store, Registry::new(), fetcher, search, settings, cli.cache);

    let summary = pipeline
        .run(year, &cli.race, cli.stage)
        .await
        .unwrap_or_else(|e| {
            log::error!("Pipeline failed: {}", e);
            process::exit(1);
        });

    match cli.format {
        OutputFormat::Json => match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                log::error!("Error serializing to JSON: {}", e);
                process::exit(1);
            }
        },
        OutputFormat::Text => println!("{}", summary),
    }
}
