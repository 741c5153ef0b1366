use std::{io, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{debug, info};

use tax_wizard::{WizardConfig, WizardSession, logging, runner};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Step-by-step tax filing wizard.
///
/// Reads commands from stdin (or a script file) and prints the current
/// step after every change. Type `help` for the command list.
#[derive(Debug, Parser)]
struct Cli {
    /// TOML config file. Defaults to `tax-wizard.toml` when present.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Append log records to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `info,tax_wizard::tasks=trace`.
    #[arg(long)]
    log_level: Option<String>,

    /// Read commands from this file instead of stdin.
    #[arg(long)]
    script: Option<PathBuf>,
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = WizardConfig::load_or_default(cli.config.as_deref())?;
    if cli.log_level.is_some() {
        config.logging.level = cli.log_level;
    }
    if cli.log_file.is_some() {
        config.logging.file = cli.log_file;
    }
    logging::init_logging(&config.logging)?;
    debug!(?config, "configuration loaded");

    let (mut session, mut events) = WizardSession::new(&config)?;

    let input: Box<dyn AsyncBufRead + Unpin> = match &cli.script {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("cannot open script '{}'", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    info!(tax_year = config.tax_year, "wizard started");
    let mut out = io::stdout();
    runner::run(&mut session, &mut events, input, &mut out).await?;
    info!(step = %session.step(), "wizard finished");

    Ok(())
}
