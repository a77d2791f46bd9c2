//! Shared value types: hashes, heights and height/root pairs

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{HeaderSigError, Result};

/// Type-safe 256-bit hash value
///
/// Used for header identity hashes and every 32-byte root a header carries.
/// Text form is 64 lowercase hex characters in the ledger's display order,
/// which is the byte order of the wire encoding reversed. Parsing also
/// accepts a `0x` prefix and upper-case digits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// All-zero hash
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create a new Hash256 from raw bytes
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string, in display order
    pub fn to_hex(&self) -> String {
        let mut display = self.0;
        display.reverse();
        hex::encode(display)
    }

    /// Parse from hex string given in display order
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.trim();
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(digits, &mut bytes).map_err(|e| {
            HeaderSigError::malformed(format!("invalid 256-bit hash '{s}': {e}"))
        })?;
        bytes.reverse();
        Ok(Self(bytes))
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Hash256 {
    type Err = HeaderSigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_hex(&text).map_err(serde::de::Error::custom)
    }
}

/// Narrow an operator-supplied height to the ledger's 32-bit height domain
pub fn ledger_height(height: u64) -> Result<u32> {
    u32::try_from(height).map_err(|_| {
        HeaderSigError::malformed(format!("height {height} exceeds the 32-bit ledger height range"))
    })
}

/// Parse a decimal height
pub fn parse_height(text: &str) -> Result<u64> {
    text.trim()
        .parse::<u64>()
        .map_err(|e| HeaderSigError::malformed(format!("invalid height '{text}': {e}")))
}

/// One height to process together with the cross-state root to inject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeightRootPair {
    /// Ledger height
    pub height: u64,
    /// Cross-state root supplied by the operator
    pub root: Hash256,
}

impl FromStr for HeightRootPair {
    type Err = HeaderSigError;

    /// Parse `height:rootHex`
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.len() != 2 {
            return Err(HeaderSigError::malformed(format!(
                "invalid height/root pair '{s}': expected HEIGHT:ROOT"
            )));
        }
        let height = parse_height(parts[0])?;
        ledger_height(height)?;
        let root = Hash256::from_hex(parts[1])?;
        Ok(Self { height, root })
    }
}

/// Parse a comma separated list of `height:rootHex` pairs
///
/// Order is kept as given. Empty lists and repeated heights are rejected.
pub fn parse_height_roots(list: &str) -> Result<Vec<HeightRootPair>> {
    let mut seen = HashSet::new();
    let mut pairs = Vec::new();
    for item in list.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        let pair: HeightRootPair = item.parse()?;
        if !seen.insert(pair.height) {
            return Err(HeaderSigError::malformed(format!(
                "height {} listed more than once",
                pair.height
            )));
        }
        pairs.push(pair);
    }
    if pairs.is_empty() {
        return Err(HeaderSigError::malformed("no height/root pairs supplied"));
    }
    Ok(pairs)
}
