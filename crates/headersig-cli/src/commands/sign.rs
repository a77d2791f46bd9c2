//! `sign`: one signature line per height on stdout

use std::io;
use std::path::Path;

use headersig_core::{
    parse_height_roots, ArtifactEmitter, ConfigLayer, EmitMode, HeaderSigError, HeaderSigner,
    Result, RunConfig, WalletAccessor,
};
use headersig_ledger::RpcLedger;
use headersig_wallet::Wallet;
use tracing::info;

use crate::cli::SignArgs;
use crate::password;

/// Run a sign batch
pub async fn run(args: SignArgs, base: ConfigLayer) -> Result<()> {
    let config = RunConfig::resolve(args.layer().over(base))?;
    let pairs = parse_height_roots(&args.height_roots)?;
    let wallet_path = config
        .wallet_path
        .as_deref()
        .ok_or_else(|| HeaderSigError::malformed("no wallet file configured"))?;

    let password = password::obtain(args.password)?;
    let signer = unlock::<Wallet>(wallet_path, password.expose())?;
    drop(password);
    info!(
        public_key = %hex::encode(signer.public_key()),
        heights = pairs.len(),
        "Wallet unlocked"
    );

    let ledger = RpcLedger::connect(config.rpc_url.as_str(), config.rpc_timeout).await?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    ArtifactEmitter::new(ledger)
        .emit(
            &pairs,
            EmitMode::Sign {
                signer: signer.as_ref(),
                out: &mut out,
            },
        )
        .await?;
    Ok(())
}

/// Open a wallet and unlock its default account
pub fn unlock<W: WalletAccessor>(path: &Path, password: &str) -> Result<Box<dyn HeaderSigner>> {
    W::open(path)?.default_account(password)
}
