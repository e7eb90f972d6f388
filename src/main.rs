//! Command line front end: download raw products and convert them into training samples.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use satprep::core::{ConvertConfig, DatasetWalker, ErrorPolicy, DEFAULT_DATA_ROOT};
use satprep::io::{Downloader, HttpFetcher, RegionTable};
use satprep::RegimeSelector;

#[derive(Parser, Debug)]
#[command(name = "satprep")]
#[command(about = "Prepare satellite / precipitation training samples for nowcasting")]
struct Args {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// JSON file mapping region names to bounding boxes
    #[arg(long, global = true)]
    regions: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build composites and targets for every timestamp of a region
    Convert {
        /// One of "central_europe", "north_america", "mexico"
        region: String,

        /// One of "", "stratiform", "convective"
        #[arg(long, default_value = "")]
        mode: String,

        /// Dataset root directory
        #[arg(long, default_value = DEFAULT_DATA_ROOT)]
        data: PathBuf,

        /// Log and skip failing timestamps instead of aborting the run
        #[arg(long)]
        skip_failed: bool,

        /// Process timestamps in parallel
        #[arg(long)]
        parallel: bool,
    },

    /// Download the latest products for every region
    Download {
        /// API user name
        user: String,

        /// API password
        #[arg(env = "SATPREP_API_PASSWORD")]
        pwd: String,

        /// Dataset root directory
        #[arg(long, default_value = DEFAULT_DATA_ROOT)]
        data: PathBuf,

        /// Minutes to go back so the data exists on the server
        #[arg(long, default_value = "60")]
        lag_minutes: i64,

        /// API base URL
        #[arg(long, default_value = satprep::io::API_URL)]
        base_url: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    let regions = match &args.regions {
        Some(path) => RegionTable::from_json_file(path)
            .with_context(|| format!("loading region table {}", path.display()))?,
        None => RegionTable::default(),
    };

    match args.command {
        Command::Convert {
            region,
            mode,
            data,
            skip_failed,
            parallel,
        } => {
            let mode: RegimeSelector = mode.parse()?;
            regions.get(&region)?;

            let mut config = ConvertConfig::new(data, region);
            config.mode = mode;
            config.parallel = parallel;
            config.error_policy = if skip_failed {
                ErrorPolicy::Skip
            } else {
                ErrorPolicy::Abort
            };

            let summary = DatasetWalker::new(&config).run()?;
            for (key, reason) in &summary.skipped {
                log::warn!("Skipped {}: {}", key, reason);
            }
        }
        Command::Download {
            user,
            pwd,
            data,
            lag_minutes,
            base_url,
        } => {
            let timestamp = Utc::now() - Duration::minutes(lag_minutes);
            let fetcher = HttpFetcher::new(user, pwd)?.with_base_url(base_url);

            let summary = Downloader::new(data, regions).download_all(&fetcher, timestamp);
            log::info!(
                "Saved {} files, {} region(s) failed",
                summary.written.len(),
                summary.failed_regions.len()
            );
        }
    }

    Ok(())
}
