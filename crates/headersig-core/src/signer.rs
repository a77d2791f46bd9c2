//! Signing identities and signature verification
//!
//! A signer holds exactly one key for the length of a batch. Every height
//! gets its own `sign` call; nothing is cached even when two payloads happen
//! to be identical.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use crate::error::{HeaderSigError, Result};

/// A party able to sign header hashes
pub trait HeaderSigner: Send + Sync {
    /// Public key matching the signing key, in the scheme's canonical encoding
    fn public_key(&self) -> Vec<u8>;

    /// Sign `payload`, returning the raw signature bytes
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>>;
}

impl<T: HeaderSigner + ?Sized> HeaderSigner for Box<T> {
    fn public_key(&self) -> Vec<u8> {
        (**self).public_key()
    }

    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>> {
        (**self).sign(payload)
    }
}

/// Custody of signing keys
///
/// Decryption happens once per run, before the first header is fetched. A
/// wrong password or a corrupt wallet is
/// [`HeaderSigError::AuthenticationError`].
pub trait WalletAccessor {
    /// Load the wallet stored at `path`
    fn open(path: &std::path::Path) -> Result<Self>
    where
        Self: Sized;

    /// Unlock the wallet's default account
    fn default_account(&self, password: &str) -> Result<Box<dyn HeaderSigner>>;
}

/// Parse an Ed25519 public key from its 32-byte encoding
pub fn verifying_key_from_bytes(bytes: &[u8]) -> Result<VerifyingKey> {
    let array: [u8; 32] = bytes.try_into().map_err(|_| {
        HeaderSigError::malformed(format!(
            "invalid public key length: expected 32 bytes, got {}",
            bytes.len()
        ))
    })?;
    VerifyingKey::from_bytes(&array)
        .map_err(|e| HeaderSigError::malformed(format!("invalid public key: {e}")))
}

/// Parse an Ed25519 public key from hex
pub fn verifying_key_from_hex(text: &str) -> Result<VerifyingKey> {
    let bytes = hex::decode(text.trim())
        .map_err(|e| HeaderSigError::malformed(format!("invalid public key hex '{text}': {e}")))?;
    verifying_key_from_bytes(&bytes)
}

/// Check an Ed25519 signature over `payload`
///
/// Returns `false` for malformed signatures instead of erroring, so callers
/// can attach their own height/signer context.
pub fn verify_signature(key: &VerifyingKey, payload: &[u8], signature: &[u8]) -> bool {
    match Signature::from_slice(signature) {
        Ok(sig) => key.verify(payload, &sig).is_ok(),
        Err(_) => false,
    }
}
