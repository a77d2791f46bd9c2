//! `headersig` command-line driver
//!
//! Parses arguments, layers the optional TOML config file under the flags
//! and dispatches to one handler per subcommand. Standard output carries
//! only command results (signature lines, combined signatures, key
//! listings); logs go to standard error.

pub mod cli;
pub mod commands;
pub mod password;

use anyhow::{Context, Result};
use headersig_core::ConfigLayer;

use crate::cli::{Cli, Commands};

/// Execute a parsed command line
pub async fn run(cli: Cli) -> Result<()> {
    let file_layer = match &cli.config {
        Some(path) => ConfigLayer::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ConfigLayer::default(),
    };
    let base = cli.global_layer().over(file_layer);

    match cli.command {
        Commands::Sign(args) => commands::sign::run(args, base)
            .await
            .context("sign run failed")?,
        Commands::Combine(args) => commands::combine::run(args, base)
            .await
            .context("combine run failed")?,
        Commands::Aggregate(args) => {
            commands::aggregate::run(&args, base.strict.unwrap_or(false))
                .context("aggregate failed")?;
        }
        Commands::Wallet(command) => commands::wallet::run(command).context("wallet command failed")?,
    }
    Ok(())
}
