// Entry point for the image-converter CLI.
// The library crate holds everything else; this file only wires it up.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use image_converter_lib::commands::{
    ConvertArgs, PresetCommand, SettingsCommand, convert, run_preset, run_settings,
};
use image_converter_lib::core::AppState;
use image_converter_lib::presets::JsonFileStore;
use image_converter_lib::processing::BatchConfig;
use image_converter_lib::processing::batch::DEFAULT_CONCURRENCY;

#[derive(Parser)]
#[command(name = "image-converter")]
#[command(about = "Batch image converter with saved presets")]
#[command(version)]
struct Cli {
    /// Settings file holding presets and the current options
    /// [default: <config dir>/image-converter/settings.json]
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Conversions to run at once
    #[arg(short, long, global = true, default_value_t = DEFAULT_CONCURRENCY)]
    jobs: usize,

    /// Give up on a single image after this many seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert files or folders of images
    Convert(ConvertArgs),
    /// Manage saved presets
    #[command(subcommand)]
    Preset(PresetCommand),
    /// Show or change the persisted current settings
    #[command(subcommand)]
    Settings(SettingsCommand),
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)         // Remove file path
        .with_line_number(false)  // Remove line numbers
        .with_thread_ids(false)   // Remove thread IDs
        .with_target(false)       // Remove module path
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let store_path = cli
        .store
        .or_else(JsonFileStore::default_path)
        .context("No config directory on this system; pass --store")?;
    let store = JsonFileStore::open(&store_path)
        .with_context(|| format!("Cannot open settings store {}", store_path.display()))?;
    debug!("Using settings store {}", store_path.display());

    let config = BatchConfig::default()
        .with_concurrency(cli.jobs)
        .with_item_timeout(cli.timeout_secs.map(Duration::from_secs));
    let state = AppState::native(Arc::new(store), config)?;

    match cli.command {
        Command::Convert(args) => {
            convert(&state, args).await?;
        }
        Command::Preset(command) => run_preset(&state, command).await?,
        Command::Settings(command) => run_settings(&state, command).await?,
    }

    info!("Done");
    Ok(())
}
