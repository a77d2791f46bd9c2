//! Ledger block header, its binary codec and identity hash
//!
//! The identity hash covers the *unsigned* part of the header: every field up
//! to and including `next_bookkeeper`. Bookkeeper keys and signatures are
//! appended after it, so attaching signatures never changes the hash they
//! sign. Injecting a new cross-state root does.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::encoding::{Sink, Source};
use crate::error::Result;
use crate::hex_serde::{hex_array, hex_bytes, hex_bytes_list};
use crate::types::Hash256;

/// Length of a bookkeeper address
pub const ADDRESS_LEN: usize = 20;

/// Block header as served by the ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Header format version
    pub version: u32,
    /// Chain the block belongs to
    pub chain_id: u64,
    /// Hash of the previous block header
    pub prev_block_hash: Hash256,
    /// Merkle root of the block's transactions
    pub transactions_root: Hash256,
    /// Auxiliary cross-chain state root, overwritten before signing
    pub cross_state_root: Hash256,
    /// Merkle root of all previous block hashes
    pub block_root: Hash256,
    /// Block timestamp in seconds
    pub timestamp: u32,
    /// Block height
    pub height: u32,
    /// Consensus nonce
    pub consensus_data: u64,
    /// Opaque consensus payload
    #[serde(with = "hex_bytes")]
    pub consensus_payload: Vec<u8>,
    /// Address of the next bookkeeper set
    #[serde(with = "hex_array")]
    pub next_bookkeeper: [u8; ADDRESS_LEN],
    /// Public keys of the bookkeepers that signed the block
    #[serde(with = "hex_bytes_list")]
    pub bookkeepers: Vec<Vec<u8>>,
    /// Ordered signatures over the header hash
    #[serde(with = "hex_bytes_list")]
    pub sig_data: Vec<Vec<u8>>,
}

impl Header {
    /// Identity hash: double SHA-256 of the unsigned encoding
    ///
    /// Computed from the current field values on every call.
    pub fn hash(&self) -> Hash256 {
        let mut sink = Sink::new();
        self.encode_unsigned(&mut sink);
        let first = Sha256::digest(sink.into_bytes());
        Hash256::new(Sha256::digest(first).into())
    }

    /// Replace the cross-state root
    pub fn set_cross_state_root(&mut self, root: Hash256) {
        self.cross_state_root = root;
    }

    /// Replace the signature list, keeping the given order
    pub fn set_sig_data(&mut self, signatures: Vec<Vec<u8>>) {
        self.sig_data = signatures;
    }

    /// Encode the full header, signatures included
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut sink = Sink::new();
        self.encode_unsigned(&mut sink);
        write_list(&mut sink, &self.bookkeepers);
        write_list(&mut sink, &self.sig_data);
        sink.into_bytes()
    }

    /// Decode a full header; the whole buffer must be consumed
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut source = Source::new(bytes);
        let header = Self {
            version: source.read_u32()?,
            chain_id: source.read_u64()?,
            prev_block_hash: Hash256::new(source.read_array()?),
            transactions_root: Hash256::new(source.read_array()?),
            cross_state_root: Hash256::new(source.read_array()?),
            block_root: Hash256::new(source.read_array()?),
            timestamp: source.read_u32()?,
            height: source.read_u32()?,
            consensus_data: source.read_u64()?,
            consensus_payload: source.read_var_bytes()?.to_vec(),
            next_bookkeeper: source.read_array()?,
            bookkeepers: read_list(&mut source)?,
            sig_data: read_list(&mut source)?,
        };
        source.finish()?;
        Ok(header)
    }

    fn encode_unsigned(&self, sink: &mut Sink) {
        sink.write_u32(self.version);
        sink.write_u64(self.chain_id);
        sink.write_bytes(self.prev_block_hash.as_bytes());
        sink.write_bytes(self.transactions_root.as_bytes());
        sink.write_bytes(self.cross_state_root.as_bytes());
        sink.write_bytes(self.block_root.as_bytes());
        sink.write_u32(self.timestamp);
        sink.write_u32(self.height);
        sink.write_u64(self.consensus_data);
        sink.write_var_bytes(&self.consensus_payload);
        sink.write_bytes(&self.next_bookkeeper);
    }
}

fn write_list(sink: &mut Sink, items: &[Vec<u8>]) {
    sink.write_var_uint(items.len() as u64);
    for item in items {
        sink.write_var_bytes(item);
    }
}

fn read_list(source: &mut Source<'_>) -> Result<Vec<Vec<u8>>> {
    let count = source.read_var_uint()?;
    // Each item costs at least one length byte, so a count larger than what
    // is left cannot be valid.
    if count > source.remaining() as u64 {
        return Err(crate::HeaderSigError::transport(format!(
            "header decode failed: list of {count} items exceeds remaining input"
        )));
    }
    (0..count)
        .map(|_| source.read_var_bytes().map(<[u8]>::to_vec))
        .collect()
}
