use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use setdeal::{
    run_game, FeatureValidator, GameConfig, Result, SetDealError, ShutdownController,
    TracingDisplay,
};

#[derive(Parser)]
#[command(
    name = "setdeal",
    about = "Concurrent Set-style card game: automated players race to claim matching groups"
)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the number of automated players
    #[arg(long)]
    computers: Option<usize>,

    /// Override the round timeout in milliseconds
    #[arg(long)]
    turn_timeout_ms: Option<u64>,

    /// Log valid groups on the table after each deal
    #[arg(long)]
    hints: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = GameConfig::load(cli.config.as_deref())?;
    if let Some(computers) = cli.computers {
        cfg.computer_players = computers;
    }
    if let Some(timeout) = cli.turn_timeout_ms {
        cfg.turn_timeout_ms = timeout;
    }
    if cli.hints {
        cfg.hints = true;
    }

    init_logging(&cfg);

    if let Err(errors) = cfg.validate() {
        for e in &errors {
            error!("config: {e}");
        }
        return Err(SetDealError::InvalidConfig(errors.join("; ")));
    }

    let shutdown = ShutdownController::new();
    let token = shutdown.token();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            return;
        }
        info!("ctrl-c received, shutting down");
        shutdown.shutdown();
    });

    let validator = Arc::new(FeatureValidator::new(cfg.selection_size, 4, 3));
    let outcome = run_game(cfg, Arc::new(TracingDisplay), validator, token).await?;
    info!(winners = ?outcome.winners, scores = ?outcome.scores, "final standings");
    Ok(())
}

fn init_logging(cfg: &GameConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},setdeal=debug", cfg.logging.level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if cfg.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
