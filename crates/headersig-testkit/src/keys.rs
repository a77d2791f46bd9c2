//! Key test helpers
//!
//! Seeded Ed25519 identities that implement [`HeaderSigner`], so tests can
//! sign without a wallet file.

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use headersig_core::{HeaderSigner, Result};
use sha2::{Digest, Sha256};

/// Key test fixture for consistent test key generation
#[derive(Debug, Clone)]
pub struct KeyTestFixture {
    signing_key: SigningKey,
}

impl KeyTestFixture {
    /// Create a key fixture from a 32-byte seed
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Create a key fixture from a seed string
    pub fn from_seed_string(seed: &str) -> Self {
        let digest: [u8; 32] = Sha256::digest(seed.as_bytes()).into();
        Self::from_seed(&digest)
    }

    /// Seed bytes, for writing the key into a wallet
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Public key
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Public key as hex
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.verifying_key().as_bytes())
    }
}

impl HeaderSigner for KeyTestFixture {
    fn public_key(&self) -> Vec<u8> {
        self.verifying_key().to_bytes().to_vec()
    }

    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>> {
        Ok(self.signing_key.sign(payload).to_bytes().to_vec())
    }
}
