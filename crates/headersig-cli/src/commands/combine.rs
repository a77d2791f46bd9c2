//! `combine`: build the signed-header artifact

use std::path::{Path, PathBuf};

use headersig_core::{
    parse_height_roots, verifying_key_from_hex, Aggregator, ArtifactEmitter,
    CombinedSignatureMap, ConfigLayer, EmitMode, JsonArtifactWriter, ParseMode, Result,
    RunConfig, SignatureSet, SignatureSetParser,
};
use headersig_ledger::RpcLedger;
use tracing::info;

use crate::cli::CombineArgs;

/// Run a combine batch
pub async fn run(args: CombineArgs, base: ConfigLayer) -> Result<()> {
    let config = RunConfig::resolve(args.layer().over(base))?;
    let pairs = parse_height_roots(&args.height_roots)?;
    let signatures = load_signatures(&args.sig_files, args.combined.as_deref(), config.strict)?;
    let verify_keys = args
        .verify_keys
        .iter()
        .map(|key| verifying_key_from_hex(key))
        .collect::<Result<Vec<_>>>()?;

    let ledger = RpcLedger::connect(config.rpc_url.as_str(), config.rpc_timeout).await?;
    let writer = JsonArtifactWriter::new(&config.output_path).with_mode(config.artifact_mode);
    ArtifactEmitter::new(ledger)
        .emit(
            &pairs,
            EmitMode::Combine {
                signatures: &signatures,
                verify_keys: &verify_keys,
                writer: &writer,
            },
        )
        .await?;
    info!(path = %config.output_path.display(), "Combine run complete");
    Ok(())
}

/// Read signatures either from one combined file or from per-signer files
pub fn load_signatures(
    sig_files: &[PathBuf],
    combined: Option<&Path>,
    strict: bool,
) -> Result<CombinedSignatureMap> {
    match combined {
        Some(path) => Ok(SignatureSetParser::new(ParseMode::Combined, strict)
            .parse_file(path)?
            .into()),
        None => Aggregator::new(strict).combine(&read_signer_files(sig_files, strict)?),
    }
}

/// Parse per-signer files, keeping their order
pub fn read_signer_files(paths: &[PathBuf], strict: bool) -> Result<Vec<SignatureSet>> {
    let parser = SignatureSetParser::new(ParseMode::SingleSigner, strict);
    paths.iter().map(|path| parser.parse_file(path)).collect()
}
