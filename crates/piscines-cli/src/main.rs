use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;
use std::time::Duration;

use chrono::{Datelike, NaiveTime};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use piscines::status::PoolStatus;
use piscines::{Day, FeatureCollection, Schedule, SiteConfig, UrlOrder, WebScraper};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "piscines")]
#[command(about = "A paris.fr swimming pool scraper", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
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

#[derive(Args, Debug, Clone)]
struct SiteArgs {
    #[arg(long, help = "Origin prepended to detail page links [default: https://www.paris.fr]")]
    base_url: Option<String>,

    #[arg(long, help = "URL of the listing page [default: <base-url>/lieux/piscines/tous-les-horaires]")]
    listing_url: Option<String>,

    #[arg(long, default_value_t = 30, help = "HTTP timeout in seconds")]
    timeout_secs: u64,

    #[arg(long, help = "Accept invalid TLS certificates")]
    insecure: bool,
}

impl SiteArgs {
    fn into_config(self) -> SiteConfig {
        let mut config = match &self.base_url {
            Some(base_url) => SiteConfig::with_base_url(base_url),
            None => SiteConfig::default(),
        };
        if let Some(listing_url) = self.listing_url {
            config.listing_url = listing_url;
        }
        config.timeout = Duration::from_secs(self.timeout_secs);
        config.accept_invalid_certs = self.insecure;
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every pool on the listing page and write them as GeoJSON
    Harvest {
        #[command(flatten)]
        site: SiteArgs,

        #[arg(
            long,
            default_value = "piscines_paris.geojson",
            help = "Where to write the GeoJSON feature collection"
        )]
        output: PathBuf,

        #[arg(long, default_value_t = 500, help = "Pause between requests in milliseconds")]
        delay_ms: u64,

        #[arg(
            long,
            value_parser = parse_order,
            default_value = "sorted",
            help = "Order in which pool pages are fetched: sorted or discovery"
        )]
        order: UrlOrder,
    },
    /// List the pool page URLs found on the listing page
    Links {
        #[command(flatten)]
        site: SiteArgs,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Fetch a single pool page and show what was extracted from it
    Detail {
        #[arg(help = "URL of the pool page to fetch")]
        url: String,

        #[command(flatten)]
        site: SiteArgs,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Show which pools of a harvested GeoJSON file are open
    Status {
        #[arg(help = "GeoJSON file written by `harvest`")]
        path: PathBuf,

        #[arg(
            long,
            value_parser = parse_day,
            help = "Day to check, e.g. Lundi [default: today]. Another day without --time shows its first opening"
        )]
        day: Option<Day>,

        #[arg(
            long,
            value_name = "HH:MM",
            help = "Time of day to check [default: now]",
            value_parser = |s: &str| NaiveTime::parse_from_str(s, "%H:%M").map_err(|e| e.to_string()),
        )]
        time: Option<NaiveTime>,

        #[arg(long, help = "Only show pools that are open")]
        open_only: bool,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Print the JSON Schema of the GeoJSON output
    Schema,
}

fn parse_day(s: &str) -> Result<Day, String> {
    Day::from_str(s).map_err(|e| e.to_string())
}

fn parse_order(s: &str) -> Result<UrlOrder, String> {
    UrlOrder::from_str(s).map_err(|e| e.to_string())
}

fn serialize_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

fn write_geojson(path: &Path, collection: &FeatureCollection) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, collection)?;
    writer.flush()
}

fn read_geojson(path: &Path) -> io::Result<FeatureCollection> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

fn build_scraper(config: SiteConfig) -> WebScraper {
    WebScraper::new(config).unwrap_or_else(|e| {
        log::error!("Error creating scraper: {}", e);
        process::exit(1);
    })
}

#[derive(Serialize)]
struct PoolStatusRow<'a> {
    nom: &'a str,
    url: &'a str,
    #[serde(flatten)]
    status: PoolStatus,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    match cli.command {
        Commands::Harvest {
            site,
            output,
            delay_ms,
            order,
        } => {
            let mut config = site.into_config();
            config.request_delay = Duration::from_millis(delay_ms);
            config.url_order = order;

            let scraper = build_scraper(config);
            let (collection, stats) = scraper.harvest().await.unwrap_or_else(|e| {
                log::error!("Error harvesting pools: {}", e);
                process::exit(1);
            });

            if let Err(e) = write_geojson(&output, &collection) {
                log::error!("Error writing {}: {}", output.display(), e);
                process::exit(1);
            }

            log::info!(
                "Done. Saved {} pools to {}",
                collection.len(),
                output.display()
            );
            print!("{}", stats);
        }

        Commands::Links { site, format } => {
            let scraper = build_scraper(site.into_config());
            let links = scraper.fetch_links().await.unwrap_or_else(|e| {
                log::error!("Error fetching listing page: {}", e);
                process::exit(1);
            });

            match format {
                OutputFormat::Json => serialize_json(&links),
                OutputFormat::Text => {
                    if links.is_empty() {
                        println!("No pool links found.");
                    }
                    for (i, link) in links.iter().enumerate() {
                        println!("{:>3}. {}", i + 1, link);
                    }
                }
            }
        }

        Commands::Detail { url, site, format } => {
            let scraper = build_scraper(site.into_config());
            log::info!("Fetching pool page {}...", url);

            let fields = scraper.fetch_pool(&url).await.unwrap_or_else(|e| {
                log::error!("Error fetching pool page: {}", e);
                process::exit(1);
            });

            if fields.coordinates.is_none() {
                log::warn!("No coordinates found for {}: it would be left out of a harvest", url);
            }

            match format {
                OutputFormat::Json => serialize_json(&fields),
                OutputFormat::Text => print!("{}", fields),
            }
        }

        Commands::Status {
            path,
            day,
            time,
            open_only,
            format,
        } => {
            let collection = read_geojson(&path).unwrap_or_else(|e| {
                log::error!("Error reading {}: {}", path.display(), e);
                process::exit(1);
            });

            let now = chrono::Local::now();
            let today = Day::from(now.weekday());
            let day = day.unwrap_or(today);
            let status_of = |schedule: &Schedule| match time {
                Some(time) => PoolStatus::at(schedule, day, time),
                None if day == today => PoolStatus::at(schedule, day, now.time()),
                None => PoolStatus::on(schedule, day),
            };
            match time {
                Some(time) => log::info!(
                    "Checking {} pools for {} at {}",
                    collection.len(),
                    day,
                    time.format("%H:%M")
                ),
                None => log::info!("Checking {} pools for {}", collection.len(), day),
            }

            let rows: Vec<PoolStatusRow> = collection
                .features()
                .iter()
                .map(|feature| PoolStatusRow {
                    nom: feature.name(),
                    url: feature.url(),
                    status: status_of(feature.schedule()),
                })
                .filter(|row| !open_only || row.status.is_open())
                .collect();

            match format {
                OutputFormat::Json => serialize_json(&rows),
                OutputFormat::Text => {
                    if rows.is_empty() {
                        println!("No pools to display.");
                    }
                    for row in &rows {
                        println!("{:<50} {}", row.nom, row.status);
                    }
                }
            }
        }

        Commands::Schema => serialize_json(&schemars::schema_for!(FeatureCollection)),
    }
}
