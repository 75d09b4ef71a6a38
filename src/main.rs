use anyhow::{Context, Result};
use clap::Parser;
use codelib::app::App;
use codelib::config::Config;
use codelib::generate::HttpGenerator;
use codelib::store::{JsonFileStore, MemoryStore, SnippetStore, StoreHandle};
use codelib::upload::HttpImageHost;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// A terminal snippet library with live HTML preview
#[derive(Parser, Debug)]
#[command(name = "codelib")]
#[command(about = "Save, edit and live-preview HTML/CSS/JS snippets", long_about = None)]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Path to the snippet store (JSON file)
    #[arg(long, value_name = "PATH")]
    storage: Option<PathBuf>,

    /// Path to log file for diagnostics (default: system temp dir)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Override the shared confirmation secret
    #[arg(long, value_name = "SECRET")]
    secret: Option<String>,

    /// Override the interface locale ('ka', 'en', 'es')
    #[arg(long, value_name = "LOCALE")]
    locale: Option<String>,

    /// Override the preview debounce window in milliseconds
    #[arg(long, value_name = "MS")]
    debounce_ms: Option<u64>,

    /// Keep snippets in memory only (nothing touches disk)
    #[arg(long)]
    ephemeral: bool,
}

fn setup_tracing(log_file: Option<PathBuf>) -> Result<()> {
    // Stdout belongs to the terminal UI; diagnostics go to a file.
    let path = log_file.unwrap_or_else(|| std::env::temp_dir().join("codelib.log"));
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    tracing::info!("codelib starting, logging to {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_tracing(args.log_file.clone())?;

    let config_path = match args.config.clone() {
        Some(path) => path,
        None => Config::default_path().context("no config directory available")?,
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    if let Some(secret) = args.secret {
        config.secret = secret;
    }
    if let Some(locale) = args.locale {
        config.locale = locale;
    }
    if let Some(debounce_ms) = args.debounce_ms {
        config.debounce_ms = debounce_ms;
    }
    if let Some(storage) = args.storage {
        config.storage_path = Some(storage);
    }
    if config.secret.is_empty() {
        tracing::warn!(
            "No confirmation secret configured; saves will require an empty passphrase"
        );
    }

    let store: Box<dyn SnippetStore> = if args.ephemeral {
        Box::new(MemoryStore::new())
    } else {
        let path = match &config.storage_path {
            Some(path) => path.clone(),
            None => Config::default_storage_path().context("no data directory available")?,
        };
        tracing::info!("Using snippet store at {}", path.display());
        Box::new(JsonFileStore::new(path))
    };

    let generator = Arc::new(HttpGenerator::new(
        config.generator.endpoint.clone(),
        config.generator.model.clone(),
        config.generator.api_key.clone(),
    ));
    let image_host = Arc::new(HttpImageHost::new(
        config.images.endpoint.clone(),
        config.images.api_key.clone(),
    ));

    let mut app = App::new(config, StoreHandle::spawn(store), generator, image_host);

    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal);
    ratatui::restore();
    result
}
