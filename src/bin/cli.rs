//! Chãozão Crawler CLI
//!
//! Local execution entry point.

use std::path::PathBuf;

use chaozao::{
    error::{AppError, Result},
    models::Config,
    pipeline,
    storage::LocalStorage,
};
use clap::{Parser, Subcommand};

/// chaozao - rural property listing crawler
#[derive(Parser, Debug)]
#[command(name = "chaozao", version, about = "Chãozão listing crawler")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk the sitemap and dump listing URLs to a text file
    Urls {
        /// Output file path
        #[arg(long, default_value = "chaozao_urls.txt")]
        output: PathBuf,
    },

    /// Build the dataset from sitemap URLs alone (no page fetches)
    Crawl {
        /// Limit the run to the first N listings
        #[arg(long)]
        sample: Option<usize>,
    },

    /// Mirror photos for an existing dataset
    Images {
        /// Limit the run to the first N listings
        #[arg(long)]
        sample: Option<usize>,

        /// Dataset JSON to load instead of the configured output location
        #[arg(long)]
        dataset: Option<PathBuf>,
    },

    /// Full pipeline: crawl, mirror photos, publish
    Pipeline {
        /// Limit the run to the first N listings
        #[arg(long)]
        sample: Option<usize>,
    },

    /// Validate the configuration file
    Validate,
}

/// Derive a storage location from an explicit dataset JSON path.
fn storage_for_dataset(path: &std::path::Path) -> Result<LocalStorage> {
    let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
    let prefix = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| AppError::validation(format!("invalid dataset path {path:?}")))?;
    Ok(LocalStorage::at(dir, prefix))
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("Chãozão crawler starting...");

    let config = Config::load_or_default(&cli.config);
    config.validate()?;

    let storage = LocalStorage::new(&config.output);

    match cli.command {
        Command::Urls { output } => {
            let count = pipeline::run_urls(&config, &output).await?;
            log::info!("Discovered {count} listing URLs");
        }

        Command::Crawl { sample } => {
            let dataset = pipeline::run_crawl(&config, &storage, sample).await?;
            log::info!("Crawl complete: {} listings", dataset.total_properties);
        }

        Command::Images { sample, dataset } => {
            let storage = match dataset {
                Some(path) => storage_for_dataset(&path)?,
                None => storage.clone(),
            };
            let dataset = pipeline::run_images(&config, &storage, sample).await?;
            if let Some(stats) = dataset.image_stats {
                log::info!(
                    "Images complete: {} downloaded, {} skipped, {} errors",
                    stats.images_downloaded,
                    stats.images_skipped,
                    stats.errors
                );
            }
        }

        Command::Pipeline { sample } => {
            let dataset = pipeline::run_pipeline(&config, &storage, sample).await?;
            log::info!("Pipeline complete: {} listings", dataset.total_properties);
        }

        Command::Validate => {
            log::info!("Configuration OK");
            log::info!("  base_url: {}", config.crawler.base_url);
            log::info!("  workers: {}", config.crawler.max_concurrent);
            log::info!("  images dir: {}", config.images.root_dir);
            log::info!("  output: {}/{}", config.output.dir, config.output.prefix);
        }
    }

    log::info!("Done!");

    Ok(())
}
