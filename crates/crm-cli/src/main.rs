//! `crm`: administer a CRM database from the command line.
//!
//! # Usage
//!
//! ```text
//! crm init
//! crm permission add "contracts:write"
//! echo hunter2 | crm collaborator add --role sales --name Alice --email alice@acme.test
//! crm grant --role sales --id 1 --permission 1
//! crm contract add --customer 1 --sales-rep 1 --total 1000.00
//! crm contract transition --id 1 --to signed
//! ```
//!
//! Results are printed to stdout as JSON; logs go to stderr.

mod commands;
mod config;

use std::{path::PathBuf, process::ExitCode};

use anyhow::Context as _;
use clap::Parser;
use commands::Command;
use config::{CliConfig, Location};
use crm_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "crm", version, about = "Administer the CRM database")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "crm.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[tokio::main]
async fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  match run(cli).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      tracing::error!("{e:#}");
      ExitCode::FAILURE
    }
  }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
  dotenvy::dotenv().ok();
  let cfg = CliConfig::load(&cli.config)?;

  let store = match cfg.location() {
    Location::Memory => SqliteStore::open_in_memory()
      .await
      .context("failed to open in-memory store")?,
    Location::File(path) => SqliteStore::open(&path)
      .await
      .with_context(|| format!("failed to open store at {path:?}"))?,
  }
  .with_password_params(cfg.password);

  let output = cli.command.run(&store).await?;
  println!("{}", serde_json::to_string_pretty(&output)?);
  Ok(())
}
