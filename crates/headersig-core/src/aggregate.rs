//! Signature aggregation across signers
//!
//! The first signer file is the reference: its heights, in its order, define
//! the combined map. Every other file must supply a signature for each of
//! those heights. Within a height, signatures are concatenated in signer-file
//! order because the verifier checks them against an ordered key list.

use std::fmt;

use indexmap::IndexMap;
use tracing::{info, warn};

use crate::error::{HeaderSigError, Result};
use crate::parser::SignatureSet;

/// Height to signer-ordered signatures, immutable once built
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombinedSignatureMap {
    entries: IndexMap<u64, Vec<Vec<u8>>>,
}

impl CombinedSignatureMap {
    /// Signatures for `height`
    pub fn get(&self, height: u64) -> Option<&[Vec<u8>]> {
        self.entries.get(&height).map(Vec::as_slice)
    }

    /// Entry at position `index` in reference order
    pub fn entry(&self, index: usize) -> Option<(u64, &[Vec<u8>])> {
        self.entries
            .get_index(index)
            .map(|(height, sigs)| (*height, sigs.as_slice()))
    }

    /// Entries in reference order
    pub fn iter(&self) -> impl Iterator<Item = (u64, &[Vec<u8>])> + '_ {
        self.entries.iter().map(|(h, sigs)| (*h, sigs.as_slice()))
    }

    /// Number of heights
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Split back into one set per signer
    ///
    /// Requires every height to hold exactly `signer_count` signatures.
    pub fn split(&self, signer_count: usize) -> Result<Vec<SignatureSet>> {
        let mut sets = vec![SignatureSet::new(); signer_count];
        for (height, sigs) in self.iter() {
            if sigs.len() != signer_count {
                return Err(HeaderSigError::malformed(format!(
                    "height {height} holds {} signatures, expected {signer_count}",
                    sigs.len()
                )));
            }
            for (set, sig) in sets.iter_mut().zip(sigs) {
                set.insert(height, vec![sig.clone()]);
            }
        }
        Ok(sets)
    }
}

impl From<SignatureSet> for CombinedSignatureMap {
    /// Adopt a pre-combined file as-is
    fn from(set: SignatureSet) -> Self {
        Self {
            entries: set
                .iter()
                .map(|(height, sigs)| (height, sigs.to_vec()))
                .collect(),
        }
    }
}

impl fmt::Display for CombinedSignatureMap {
    /// One `height:sig1:sig2...` line per height, readable by the combined-mode parser
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (height, sigs) in self.iter() {
            write!(f, "{height}")?;
            for sig in sigs {
                write!(f, ":{}", hex::encode(sig))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Merges per-signer signature sets
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    strict: bool,
}

impl Aggregator {
    /// Create an aggregator; with `strict` every file must cover exactly the reference heights
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    /// Combine signer sets, in signer order, into one map
    pub fn combine(&self, sets: &[SignatureSet]) -> Result<CombinedSignatureMap> {
        let Some(reference) = sets.first() else {
            return Err(HeaderSigError::malformed("no signature sets to combine"));
        };

        let mut entries = IndexMap::with_capacity(reference.len());
        for height in reference.heights() {
            let mut combined = Vec::with_capacity(sets.len());
            for (signer_index, set) in sets.iter().enumerate() {
                let sigs = set.get(height).ok_or(HeaderSigError::MissingSignature {
                    height,
                    signer_index,
                })?;
                combined.extend(sigs.iter().cloned());
            }
            entries.insert(height, combined);
        }

        for (signer_index, set) in sets.iter().enumerate().skip(1) {
            for height in set.heights().filter(|h| !reference.contains(*h)) {
                if self.strict {
                    return Err(HeaderSigError::malformed(format!(
                        "signer {signer_index} has height {height} absent from the reference signer"
                    )));
                }
                warn!(height, signer_index, "Ignoring height absent from the reference signer");
            }
        }

        info!(
            signers = sets.len(),
            heights = entries.len(),
            "Combined signature sets"
        );
        Ok(CombinedSignatureMap { entries })
    }
}
