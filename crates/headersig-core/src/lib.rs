//! Signature collection and aggregation for cross-chain header signing
//!
//! Each signer signs the hash of a ledger header after an externally computed
//! cross-state root has been injected into it. A coordinator later merges the
//! per-signer outputs, height by height and in a fixed signer order, and
//! attaches them to the headers to produce an artifact for on-chain
//! submission.
//!
//! The ledger and the wallet are reached through [`LedgerAccessor`] and
//! [`HeaderSigner`]; concrete implementations live in sibling crates.

/// Signer-ordered merging of signature sets
pub mod aggregate;
/// Sign and combine batches, artifact persistence
pub mod artifact;
/// Layered run configuration
pub mod config;
/// Binary encoding primitives
pub mod encoding;
/// Unified error handling
pub mod error;
/// Ledger header model and identity hash
pub mod header;
/// Hex serde helpers
pub mod hex_serde;
/// Parsing of signer output
pub mod parser;
/// Signed payload construction
pub mod payload;
/// Signing identities and verification
pub mod signer;
/// Hashes, heights and height/root pairs
pub mod types;

pub use aggregate::{Aggregator, CombinedSignatureMap};
pub use artifact::{
    read_artifact, Artifact, ArtifactEmitter, ArtifactHeader, ArtifactWriter, EmitMode,
    JsonArtifactWriter, DEFAULT_ARTIFACT_MODE,
};
pub use config::{ConfigLayer, RunConfig};
pub use error::{HeaderSigError, Result};
pub use header::Header;
pub use parser::{ParseMode, SignatureSet, SignatureSetParser};
pub use payload::{LedgerAccessor, Payload, PayloadBuilder};
pub use signer::{
    verify_signature, verifying_key_from_bytes, verifying_key_from_hex, HeaderSigner, WalletAccessor,
};
pub use types::{parse_height_roots, Hash256, HeightRootPair};
