//! Password-based sealing of secret material
//!
//! The encryption key is scrypt over the password with a random per-account
//! salt; the cost parameters travel with the sealed secret so they can be
//! raised for new accounts without breaking old ones. The secret is
//! encrypted with AES-256-GCM under a random nonce, and the account's public
//! key is bound in as associated data so a sealed seed cannot be moved to
//! another account record.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Key, Nonce,
};
use headersig_core::hex_serde::{hex_array, hex_bytes};
use headersig_core::{HeaderSigError, Result};
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::password::Password;

/// Salt length in bytes
pub const SALT_LEN: usize = 16;

/// AES-GCM nonce length in bytes
pub const NONCE_LEN: usize = 12;

const KEY_LEN: usize = 32;

/// scrypt cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// log2 of the CPU/memory cost `N`
    pub log_n: u8,
    /// Block size
    pub r: u32,
    /// Parallelism
    pub p: u32,
}

impl KdfParams {
    /// N = 16384, r = 8, p = 8
    pub const STANDARD: Self = Self {
        log_n: 14,
        r: 8,
        p: 8,
    };

    /// Validated parameters
    pub fn new(log_n: u8, r: u32, p: u32) -> Result<Self> {
        let params = Self { log_n, r, p };
        params
            .to_scrypt()
            .map_err(|e| HeaderSigError::malformed(format!("invalid scrypt parameters: {e}")))?;
        Ok(params)
    }

    fn to_scrypt(self) -> std::result::Result<scrypt::Params, scrypt::errors::InvalidParams> {
        scrypt::Params::new(self.log_n, self.r, self.p, KEY_LEN)
    }

    fn derive_key(self, password: &Password, salt: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>> {
        let params = self
            .to_scrypt()
            .map_err(|e| HeaderSigError::authentication(format!("unusable scrypt parameters: {e}")))?;
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        scrypt::scrypt(password.as_bytes(), salt, &params, key.as_mut_slice())
            .map_err(|e| HeaderSigError::authentication(format!("key derivation failed: {e}")))?;
        Ok(key)
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Encrypted secret with the parameters needed to open it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedSecret {
    /// scrypt cost used to derive the encryption key
    pub kdf: KdfParams,
    /// scrypt salt
    #[serde(with = "hex_array")]
    pub salt: [u8; SALT_LEN],
    /// AES-GCM nonce
    #[serde(with = "hex_array")]
    pub nonce: [u8; NONCE_LEN],
    /// Ciphertext including the authentication tag
    #[serde(with = "hex_bytes")]
    pub ciphertext: Vec<u8>,
}

impl SealedSecret {
    /// Encrypt `secret` under `password`, authenticating `associated_data`
    pub fn seal<R>(
        secret: &[u8],
        password: &Password,
        associated_data: &[u8],
        kdf: KdfParams,
        rng: &mut R,
    ) -> Result<Self>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        let mut salt = [0u8; SALT_LEN];
        let mut nonce = [0u8; NONCE_LEN];
        rng.fill_bytes(&mut salt);
        rng.fill_bytes(&mut nonce);

        let key = kdf.derive_key(password, &salt)?;
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_slice()));
        let ciphertext = cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: secret,
                    aad: associated_data,
                },
            )
            .map_err(|e| HeaderSigError::serialization(format!("AES-GCM encryption failed: {e}")))?;

        Ok(Self {
            kdf,
            salt,
            nonce,
            ciphertext,
        })
    }

    /// Decrypt with `password`
    ///
    /// A wrong password, a tampered ciphertext and mismatched associated data
    /// are indistinguishable and all yield an authentication error.
    pub fn unseal(&self, password: &Password, associated_data: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let key = self.kdf.derive_key(password, &self.salt)?;
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_slice()));
        cipher
            .decrypt(
                Nonce::from_slice(&self.nonce),
                Payload {
                    msg: &self.ciphertext,
                    aad: associated_data,
                },
            )
            .map(Zeroizing::new)
            .map_err(|_| HeaderSigError::authentication("wrong password or corrupt wallet entry"))
    }
}
