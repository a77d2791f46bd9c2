//! Batch execution and artifact emission
//!
//! A run is either a sign run or a combine run, fixed when the emitter is
//! invoked:
//!
//! - **Sign**: build each payload, sign its hash and write `height:hexsig`
//!   immediately. Lines already written stay written if a later height fails.
//! - **Combine**: build each payload, attach the combined signatures for the
//!   same position, and collect the headers. Nothing is persisted unless every
//!   height succeeds.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use ed25519_dalek::VerifyingKey;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aggregate::CombinedSignatureMap;
use crate::error::{HeaderSigError, Result};
use crate::header::Header;
use crate::payload::{LedgerAccessor, PayloadBuilder};
use crate::signer::{verify_signature, HeaderSigner};
use crate::types::HeightRootPair;

/// Default artifact file mode, world-writable as the ceremony tooling always produced
pub const DEFAULT_ARTIFACT_MODE: u32 = 0o777;

/// Final height to signed-header mapping, keyed by height in root-pair order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Artifact {
    headers: IndexMap<u64, ArtifactHeader>,
}

/// Header as persisted, with its identity hash alongside for inspection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactHeader {
    /// Identity hash of `header`
    pub hash: crate::types::Hash256,
    /// Header with root injected and signatures attached
    #[serde(flatten)]
    pub header: Header,
}

impl Artifact {
    /// Header stored for `height`
    pub fn get(&self, height: u64) -> Option<&Header> {
        self.headers.get(&height).map(|entry| &entry.header)
    }

    /// Headers in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (u64, &Header)> + '_ {
        self.headers.iter().map(|(h, entry)| (*h, &entry.header))
    }

    /// Number of headers
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Whether the artifact is empty
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    fn insert(&mut self, height: u64, header: Header) {
        let hash = header.hash();
        self.headers.insert(height, ArtifactHeader { hash, header });
    }
}

/// Durable sink for a finished artifact
pub trait ArtifactWriter {
    /// Persist `artifact`; must not leave a partial file behind on failure
    fn write(&self, artifact: &Artifact) -> Result<()>;
}

/// Writes the artifact as a JSON document, atomically
#[derive(Debug, Clone)]
pub struct JsonArtifactWriter {
    path: PathBuf,
    mode: u32,
}

impl JsonArtifactWriter {
    /// Writer targeting `path` with the default file mode
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mode: DEFAULT_ARTIFACT_MODE,
        }
    }

    /// Override the Unix file mode
    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    /// Destination path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ArtifactWriter for JsonArtifactWriter {
    fn write(&self, artifact: &Artifact) -> Result<()> {
        let json = serde_json::to_vec_pretty(artifact)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| write_error(&self.path, &e))?;
        tmp.write_all(&json)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| write_error(&self.path, &e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if self.mode & 0o002 != 0 {
                warn!(mode = %format!("{:o}", self.mode), "Artifact will be world-writable");
            }
            fs::set_permissions(tmp.path(), fs::Permissions::from_mode(self.mode))
                .map_err(|e| write_error(&self.path, &e))?;
        }

        tmp.persist(&self.path)
            .map_err(|e| write_error(&self.path, &e.error))?;
        info!(path = %self.path.display(), headers = artifact.len(), "Wrote artifact");
        Ok(())
    }
}

fn write_error(path: &Path, err: &std::io::Error) -> HeaderSigError {
    HeaderSigError::serialization(format!("cannot write {}: {err}", path.display()))
}

/// Load a previously written artifact
pub fn read_artifact(path: &Path) -> Result<Artifact> {
    let text = fs::read_to_string(path)
        .map_err(|e| HeaderSigError::serialization(format!("cannot read {}: {e}", path.display())))?;
    Ok(serde_json::from_str(&text)?)
}

/// What a run does with each payload
pub enum EmitMode<'a> {
    /// Sign every payload and stream `height:hexsig` lines to `out`
    Sign {
        /// Identity producing the signatures
        signer: &'a dyn HeaderSigner,
        /// Line sink, typically standard output
        out: &'a mut dyn Write,
    },
    /// Attach previously combined signatures and persist the artifact
    Combine {
        /// Combined signatures, positionally aligned with the root pairs
        signatures: &'a CombinedSignatureMap,
        /// Ordered signer keys to check every signature against; empty skips the check
        verify_keys: &'a [VerifyingKey],
        /// Destination for the finished artifact
        writer: &'a dyn ArtifactWriter,
    },
}

/// Drives a sign or combine batch over a list of height/root pairs
#[derive(Debug)]
pub struct ArtifactEmitter<L> {
    payloads: PayloadBuilder<L>,
}

impl<L: LedgerAccessor> ArtifactEmitter<L> {
    /// Create an emitter over a ledger accessor
    pub fn new(ledger: L) -> Self {
        Self {
            payloads: PayloadBuilder::new(ledger),
        }
    }

    /// Run the batch in the given mode
    ///
    /// Returns the artifact in combine mode, `None` in sign mode.
    pub async fn emit(&self, pairs: &[HeightRootPair], mode: EmitMode<'_>) -> Result<Option<Artifact>> {
        match mode {
            EmitMode::Sign { signer, out } => {
                self.sign(pairs, signer, out).await?;
                Ok(None)
            }
            EmitMode::Combine {
                signatures,
                verify_keys,
                writer,
            } => {
                let artifact = self.combine(pairs, signatures, verify_keys).await?;
                writer.write(&artifact)?;
                Ok(Some(artifact))
            }
        }
    }

    /// Sign each payload in order, writing one line per height as soon as it is signed
    pub async fn sign<S, W>(&self, pairs: &[HeightRootPair], signer: &S, out: &mut W) -> Result<usize>
    where
        S: HeaderSigner + ?Sized,
        W: Write + ?Sized,
    {
        info!(heights = pairs.len(), "Starting sign run");
        for pair in pairs {
            let payload = self.payloads.build_payload(pair.height, pair.root).await?;
            let signature = signer.sign(payload.signing_hash.as_bytes())?;
            writeln!(out, "{}:{}", pair.height, hex::encode(&signature))
                .and_then(|()| out.flush())
                .map_err(|e| HeaderSigError::serialization(format!("cannot write signature line: {e}")))?;
            debug!(height = pair.height, "Signed header");
        }
        info!(heights = pairs.len(), "Sign run complete");
        Ok(pairs.len())
    }

    /// Attach combined signatures to freshly built headers
    ///
    /// Entry `i` of `signatures` must carry the same height as `pairs[i]`.
    pub async fn combine(
        &self,
        pairs: &[HeightRootPair],
        signatures: &CombinedSignatureMap,
        verify_keys: &[VerifyingKey],
    ) -> Result<Artifact> {
        if pairs.len() != signatures.len() {
            return Err(HeaderSigError::LengthMismatch {
                roots: pairs.len(),
                signatures: signatures.len(),
            });
        }

        info!(heights = pairs.len(), "Starting combine run");
        let mut artifact = Artifact::default();
        for (index, pair) in pairs.iter().enumerate() {
            let payload = self.payloads.build_payload(pair.height, pair.root).await?;
            let (entry_height, sigs) = signatures
                .entry(index)
                .ok_or(HeaderSigError::LengthMismatch {
                    roots: pairs.len(),
                    signatures: signatures.len(),
                })?;
            if entry_height != pair.height {
                return Err(HeaderSigError::HeightMismatch {
                    expected: pair.height,
                    found: entry_height,
                });
            }

            if !verify_keys.is_empty() {
                check_signatures(pair.height, payload.signing_hash.as_bytes(), sigs, verify_keys)?;
            }

            let mut header = payload.header;
            header.set_sig_data(sigs.to_vec());
            artifact.insert(pair.height, header);
            debug!(height = pair.height, signatures = sigs.len(), "Attached signatures");
        }
        Ok(artifact)
    }
}

fn check_signatures(height: u64, hash: &[u8], sigs: &[Vec<u8>], keys: &[VerifyingKey]) -> Result<()> {
    if sigs.len() != keys.len() {
        return Err(HeaderSigError::malformed(format!(
            "height {height} has {} signatures but {} verification keys were given",
            sigs.len(),
            keys.len()
        )));
    }
    for (signer_index, (sig, key)) in sigs.iter().zip(keys).enumerate() {
        if !verify_signature(key, hash, sig) {
            return Err(HeaderSigError::InvalidSignature { height, signer_index });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Hash256;

    fn header(height: u32) -> Header {
        Header {
            height,
            chain_id: 3,
            ..Header::default()
        }
    }

    #[test]
    fn test_artifact_json_keyed_by_height() {
        let mut artifact = Artifact::default();
        let mut h = header(100);
        h.set_sig_data(vec![vec![0xaa], vec![0xbb]]);
        artifact.insert(100, h.clone());

        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["100"]["sig_data"], serde_json::json!(["aa", "bb"]));
        assert_eq!(json["100"]["hash"], h.hash().to_hex());
    }

    #[test]
    fn test_json_writer_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("headers.json");
        let mut artifact = Artifact::default();
        let mut h = header(7);
        h.set_cross_state_root(Hash256::new([0xaa; 32]));
        artifact.insert(7, h);

        JsonArtifactWriter::new(&path).write(&artifact).unwrap();
        assert_eq!(read_artifact(&path).unwrap(), artifact);
    }

    #[cfg(unix)]
    #[test]
    fn test_json_writer_applies_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("headers.json");
        JsonArtifactWriter::new(&path)
            .with_mode(0o640)
            .write(&Artifact::default())
            .unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }
}
