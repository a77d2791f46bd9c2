//! Signed payload construction
//!
//! The signing target is never the raw height or root: it is the identity
//! hash of the ledger's header for that height after the operator's
//! cross-state root has been written into it.

use async_trait::async_trait;
use tracing::debug;

use crate::error::{HeaderSigError, Result};
use crate::header::Header;
use crate::types::{ledger_height, Hash256};

/// Read access to ledger headers
///
/// Implementations perform one lookup per call and never retry; a failed
/// lookup aborts the batch.
#[async_trait]
pub trait LedgerAccessor: Send + Sync {
    /// Fetch the canonical header at `height`
    ///
    /// Returns [`HeaderSigError::HeaderNotFound`] when the height is beyond
    /// the chain tip and [`HeaderSigError::TransportError`] for anything else.
    async fn header_by_height(&self, height: u32) -> Result<Header>;
}

#[async_trait]
impl<T: LedgerAccessor + ?Sized> LedgerAccessor for std::sync::Arc<T> {
    async fn header_by_height(&self, height: u32) -> Result<Header> {
        (**self).header_by_height(height).await
    }
}

/// A header with the root injected, paired with the hash to sign
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    /// Header with the cross-state root overwritten
    pub header: Header,
    /// Identity hash of `header`, recomputed after the root was injected
    pub signing_hash: Hash256,
}

/// Builds signing payloads from ledger headers
#[derive(Debug)]
pub struct PayloadBuilder<L> {
    ledger: L,
}

impl<L: LedgerAccessor> PayloadBuilder<L> {
    /// Create a builder over a ledger accessor
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    /// Access the underlying ledger
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Fetch the header at `height`, inject `root`, and hash the result
    pub async fn build_payload(&self, height: u64, root: Hash256) -> Result<Payload> {
        let ledger_height = ledger_height(height)?;
        let mut header = self.ledger.header_by_height(ledger_height).await?;
        if header.height != ledger_height {
            return Err(HeaderSigError::transport(format!(
                "ledger returned header for height {} when asked for {ledger_height}",
                header.height
            )));
        }

        header.set_cross_state_root(root);
        let signing_hash = header.hash();
        debug!(height, root = %root, hash = %signing_hash, "Built signing payload");

        Ok(Payload {
            header,
            signing_hash,
        })
    }
}
