//! Run configuration
//!
//! Settings come from an optional TOML file and from command-line flags, with
//! flags winning. They are resolved once into a [`RunConfig`] at start-up and
//! passed by reference from then on.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::artifact::DEFAULT_ARTIFACT_MODE;
use crate::error::{HeaderSigError, Result};

/// Default artifact location, relative to the working directory
pub const DEFAULT_OUTPUT_PATH: &str = "headers.json";

/// Default ledger request timeout
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;

/// Raw settings; every field is optional so files and flags can be layered
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    /// Ledger JSON-RPC endpoint
    pub rpc_url: Option<String>,
    /// Wallet file used in sign mode
    pub wallet_path: Option<PathBuf>,
    /// Artifact destination in combine mode
    pub output_path: Option<PathBuf>,
    /// Artifact file mode as an octal string, e.g. `"0640"`
    pub artifact_mode: Option<String>,
    /// Ledger request timeout in seconds
    pub rpc_timeout_secs: Option<u64>,
    /// Require identical height sets across signer files and reject duplicates
    pub strict: Option<bool>,
}

impl ConfigLayer {
    /// Parse a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| HeaderSigError::malformed(format!("invalid config: {e}")))
    }

    /// Read and parse a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            HeaderSigError::malformed(format!("cannot read config {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Fill every unset field from `lower`
    pub fn over(self, lower: Self) -> Self {
        Self {
            rpc_url: self.rpc_url.or(lower.rpc_url),
            wallet_path: self.wallet_path.or(lower.wallet_path),
            output_path: self.output_path.or(lower.output_path),
            artifact_mode: self.artifact_mode.or(lower.artifact_mode),
            rpc_timeout_secs: self.rpc_timeout_secs.or(lower.rpc_timeout_secs),
            strict: self.strict.or(lower.strict),
        }
    }
}

/// Resolved, immutable settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Ledger JSON-RPC endpoint
    pub rpc_url: String,
    /// Wallet file used in sign mode
    pub wallet_path: Option<PathBuf>,
    /// Artifact destination
    pub output_path: PathBuf,
    /// Artifact file mode
    pub artifact_mode: u32,
    /// Ledger request timeout
    pub rpc_timeout: Duration,
    /// Strict height-set reconciliation
    pub strict: bool,
}

impl RunConfig {
    /// Apply defaults and validate a merged layer
    pub fn resolve(layer: ConfigLayer) -> Result<Self> {
        let rpc_url = layer
            .rpc_url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| HeaderSigError::malformed("no ledger RPC endpoint configured"))?;

        let artifact_mode = match layer.artifact_mode {
            Some(text) => parse_mode(&text)?,
            None => DEFAULT_ARTIFACT_MODE,
        };

        let timeout_secs = layer.rpc_timeout_secs.unwrap_or(DEFAULT_RPC_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(HeaderSigError::malformed("rpc_timeout_secs must be positive"));
        }

        Ok(Self {
            rpc_url,
            wallet_path: layer.wallet_path,
            output_path: layer
                .output_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH)),
            artifact_mode,
            rpc_timeout: Duration::from_secs(timeout_secs),
            strict: layer.strict.unwrap_or(false),
        })
    }
}

fn parse_mode(text: &str) -> Result<u32> {
    let digits = text.trim().trim_start_matches("0o");
    let mode = u32::from_str_radix(digits, 8)
        .map_err(|e| HeaderSigError::malformed(format!("invalid artifact_mode '{text}': {e}")))?;
    if mode > 0o7777 {
        return Err(HeaderSigError::malformed(format!(
            "invalid artifact_mode '{text}': out of range"
        )));
    }
    Ok(mode)
}
