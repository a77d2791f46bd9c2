//! Command-line surface

use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};
use headersig_core::ConfigLayer;

/// Environment variable consulted when `--password` is absent
pub const PASSWORD_ENV: &str = "HEADERSIG_PASSWORD";

/// Top-level arguments
#[derive(Debug, Parser)]
#[command(name = "headersig")]
#[command(about = "Collect and combine validator signatures over cross-chain block headers", long_about = None)]
pub struct Cli {
    /// Operation to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Ledger JSON-RPC endpoint
    #[arg(long, global = true)]
    pub rpc: Option<String>,
}

/// Operations
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sign headers with the wallet's default account, one `height:sig` line each
    Sign(SignArgs),

    /// Attach collected signatures to headers and write the artifact
    Combine(CombineArgs),

    /// Merge per-signer files into combined `height:sig:sig...` lines
    Aggregate(AggregateArgs),

    /// Wallet maintenance
    #[command(subcommand)]
    Wallet(WalletCommand),
}

/// Arguments of `sign`
#[derive(Debug, Args)]
pub struct SignArgs {
    /// Comma-separated `height:root` pairs
    #[arg(long)]
    pub height_roots: String,

    /// Wallet file
    #[arg(long)]
    pub wallet: Option<PathBuf>,

    /// Wallet password; prompted on stdin when absent
    #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
    pub password: Option<String>,
}

/// Arguments of `combine`
#[derive(Debug, Args)]
#[command(group(
    ArgGroup::new("signatures")
        .required(true)
        .args(["sig_files", "combined"]),
))]
pub struct CombineArgs {
    /// Comma-separated `height:root` pairs
    #[arg(long)]
    pub height_roots: String,

    /// Per-signer signature files, in signer order
    #[arg(long, value_delimiter = ',')]
    pub sig_files: Vec<PathBuf>,

    /// Already combined signature file
    #[arg(long)]
    pub combined: Option<PathBuf>,

    /// Artifact destination
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Comma-separated signer public keys (hex), in signer order
    #[arg(long, value_delimiter = ',')]
    pub verify_keys: Vec<String>,

    /// Require identical height sets and reject duplicate heights
    #[arg(long)]
    pub strict: bool,
}

/// Arguments of `aggregate`
#[derive(Debug, Args)]
pub struct AggregateArgs {
    /// Per-signer signature files, in signer order
    #[arg(long, value_delimiter = ',', required = true)]
    pub sig_files: Vec<PathBuf>,

    /// Require identical height sets and reject duplicate heights
    #[arg(long)]
    pub strict: bool,
}

/// Wallet operations
#[derive(Debug, Subcommand)]
pub enum WalletCommand {
    /// Add a freshly generated account, creating the wallet if needed
    New {
        /// Wallet file
        #[arg(long)]
        wallet: PathBuf,

        /// Account label
        #[arg(long, default_value = "default")]
        label: String,

        /// Wallet password; prompted twice on stdin when absent
        #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
        password: Option<String>,
    },

    /// List the accounts in a wallet
    Show {
        /// Wallet file
        #[arg(long)]
        wallet: PathBuf,
    },
}

impl Cli {
    /// Settings given as global flags
    pub fn global_layer(&self) -> ConfigLayer {
        ConfigLayer {
            rpc_url: self.rpc.clone(),
            ..ConfigLayer::default()
        }
    }
}

impl SignArgs {
    /// Settings given as `sign` flags
    pub fn layer(&self) -> ConfigLayer {
        ConfigLayer {
            wallet_path: self.wallet.clone(),
            ..ConfigLayer::default()
        }
    }
}

impl CombineArgs {
    /// Settings given as `combine` flags
    pub fn layer(&self) -> ConfigLayer {
        ConfigLayer {
            output_path: self.output.clone(),
            strict: self.strict.then_some(true),
            ..ConfigLayer::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flag_layers() {
        let cli = Cli::try_parse_from([
            "headersig",
            "--rpc",
            "http://node:20336",
            "combine",
            "--height-roots",
            "1:aa",
            "--combined",
            "sigs.txt",
            "--strict",
        ])
        .unwrap();
        assert_eq!(cli.global_layer().rpc_url.as_deref(), Some("http://node:20336"));
        let Commands::Combine(args) = cli.command else {
            panic!("expected combine");
        };
        let layer = args.layer();
        assert_eq!(layer.strict, Some(true));
        assert_eq!(layer.output_path, None);
    }
}
