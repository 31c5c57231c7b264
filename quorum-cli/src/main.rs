//! Quorum CLI — replay and config commands.
//!
//! Commands:
//! - `backtest` — replay CSV candle history through the decision engine
//!   against a paper exchange, print the run summary, save artifacts
//! - `check-config` — load and validate a TOML config file, print its
//!   resolved settings and fingerprint

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use quorum_core::config::BotConfig;
use quorum_core::engine::Engine;
use quorum_core::notify::LogNotifier;
use quorum_core::position::{FileStateStore, MemoryStateStore, StateStore};
use quorum_runner::{
    drive, load_candles, render_summary, save_artifacts, HistoryStream, PaperExchange,
};

#[derive(Parser)]
#[command(name = "quorum", about = "Quorum — vote-based trading decision engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay CSV candle history through the engine against a paper exchange.
    Backtest {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Path to a CSV candle history file.
        #[arg(long)]
        history: PathBuf,

        /// JSON state file to start from and persist through the run.
        /// Without it the replay starts flat and keeps state in memory.
        #[arg(long)]
        state: Option<PathBuf>,

        /// Directory run artifacts are written under.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Candles a paper limit order may stay open before it cancels.
        #[arg(long, default_value_t = 3)]
        max_open_candles: usize,
    },
    /// Load and validate a config file, print resolved settings.
    CheckConfig {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Backtest {
            config,
            history,
            state,
            output_dir,
            max_open_candles,
        } => run_backtest(&config, &history, state, &output_dir, max_open_candles),
        Commands::CheckConfig { config } => run_check_config(&config),
    }
}

fn run_backtest(
    config_path: &Path,
    history_path: &Path,
    state_path: Option<PathBuf>,
    output_dir: &Path,
    max_open_candles: usize,
) -> Result<()> {
    let config = BotConfig::from_file(config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    let candles = load_candles(history_path)
        .with_context(|| format!("failed to load history {}", history_path.display()))?;

    // A state file makes the replay resumable: the run starts from
    // whatever position the file holds and persists every transition.
    let mut store: Box<dyn StateStore> = match state_path {
        Some(path) => Box::new(FileStateStore::new(path)),
        None => Box::new(MemoryStateStore::default()),
    };
    let initial_state = store.load();

    let mut stream = HistoryStream::new(config.symbol.clone(), config.interval, candles);
    let mut engine = Engine::new(config, initial_state);
    let mut gateway = PaperExchange::new(max_open_candles);
    let mut notifier = LogNotifier::default();

    let summary = drive(
        &mut engine,
        &mut stream,
        &mut gateway,
        store.as_mut(),
        &mut notifier,
    )?;

    println!();
    print!("{}", render_summary(&summary));

    let run_dir = save_artifacts(&summary, output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());

    Ok(())
}

fn run_check_config(path: &Path) -> Result<()> {
    let config = BotConfig::from_file(path)
        .with_context(|| format!("failed to load config {}", path.display()))?;

    let votes: Vec<String> = config.scorer.votes.iter().map(|v| format!("{v:?}")).collect();
    let required = match config.scorer.required_votes {
        Some(n) => n.to_string(),
        None => format!("{} (unanimous)", config.scorer.votes.len()),
    };

    println!("Config OK: {}", path.display());
    println!("  symbol           {}", config.symbol);
    println!("  interval         {}", config.interval);
    println!("  window capacity  {}", config.window_capacity);
    println!("  warmup candles   {}", config.indicators.min_samples());
    println!("  votes            {}", votes.join(", "));
    println!("  required votes   {required}");
    println!("  order kind       {:?}", config.order.kind);
    println!("  profit margin    {}", config.order.profit_margin);
    println!("  state path       {}", config.state_path.display());
    println!("  fingerprint      {}", config.fingerprint());
    Ok(())
}
