//! Header and root factories

use headersig_core::header::ADDRESS_LEN;
use headersig_core::{Hash256, Header};
use sha2::{Digest, Sha256};

/// Chain id used by fixture ledgers
pub const CHAIN_ID: u64 = 2;

/// Deterministic header at `height`
///
/// Field values are derived from the height so distinct heights hash
/// differently. The cross-state root starts zeroed and `sig_data` empty.
pub fn test_header(chain_id: u64, height: u32) -> Header {
    Header {
        version: 0,
        chain_id,
        prev_block_hash: seeded_hash("prev", height),
        transactions_root: seeded_hash("txs", height),
        cross_state_root: Hash256::ZERO,
        block_root: seeded_hash("blocks", height),
        timestamp: 1_600_000_000 + height,
        height,
        consensus_data: u64::from(height) * 31,
        consensus_payload: format!("{{\"leader\":{}}}", height % 7).into_bytes(),
        next_bookkeeper: [height as u8; ADDRESS_LEN],
        bookkeepers: vec![vec![0x12; 33]],
        sig_data: Vec::new(),
    }
}

/// Root with every byte set to `byte`
pub fn test_root(byte: u8) -> Hash256 {
    Hash256::new([byte; 32])
}

/// `height:rootHex,...` list for the given heights, all sharing `root`
pub fn height_roots_arg(heights: &[u64], root: Hash256) -> String {
    heights
        .iter()
        .map(|h| format!("{h}:{}", root.to_hex()))
        .collect::<Vec<_>>()
        .join(",")
}

fn seeded_hash(label: &str, height: u32) -> Hash256 {
    let mut hasher = Sha256::new();
    hasher.update(label.as_bytes());
    hasher.update(height.to_le_bytes());
    Hash256::new(hasher.finalize().into())
}
