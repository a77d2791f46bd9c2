//! Serde helpers that render byte fields as hex strings
//!
//! The artifact is read by operators and by an independent verifier, so raw
//! bytes are written as lowercase hex rather than JSON number arrays.
//!
//! ```ignore
//! #[derive(Serialize, Deserialize)]
//! struct Entry {
//!     #[serde(with = "hex_bytes")]
//!     payload: Vec<u8>,
//!     #[serde(with = "hex_bytes_list")]
//!     signatures: Vec<Vec<u8>>,
//! }
//! ```

use serde::{Deserialize, Deserializer, Serializer};

/// Serde module for `Vec<u8>` as a single hex string
pub mod hex_bytes {
    use super::*;

    /// Serialize bytes as hex
    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    /// Deserialize bytes from hex
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        hex::decode(text).map_err(serde::de::Error::custom)
    }
}

/// Serde module for fixed-size byte arrays as a hex string
pub mod hex_array {
    use super::*;

    /// Serialize a byte array as hex
    pub fn serialize<S, const N: usize>(bytes: &[u8; N], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    /// Deserialize a byte array from hex, requiring the exact length
    pub fn deserialize<'de, D, const N: usize>(deserializer: D) -> Result<[u8; N], D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        let mut out = [0u8; N];
        hex::decode_to_slice(text, &mut out).map_err(serde::de::Error::custom)?;
        Ok(out)
    }
}

/// Serde module for an ordered list of byte strings as a hex string array
pub mod hex_bytes_list {
    use super::*;
    use serde::ser::SerializeSeq;

    /// Serialize each entry as hex, keeping order
    pub fn serialize<S>(items: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(items.len()))?;
        for item in items {
            seq.serialize_element(&hex::encode(item))?;
        }
        seq.end()
    }

    /// Deserialize a hex string array, keeping order
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let texts: Vec<String> = Vec::deserialize(deserializer)?;
        texts
            .into_iter()
            .map(|text| hex::decode(text).map_err(serde::de::Error::custom))
            .collect()
    }
}
