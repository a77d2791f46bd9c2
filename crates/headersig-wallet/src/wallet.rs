//! Wallet file and account management
//!
//! ```json
//! {
//!   "version": 2,
//!   "accounts": [
//!     { "label": "validator-1", "public_key": "…", "default": true,
//!       "kdf": { "log_n": 14, "r": 8, "p": 8 },
//!       "salt": "…", "nonce": "…", "ciphertext": "…" }
//!   ]
//! }
//! ```

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use headersig_core::hex_serde::hex_array;
use headersig_core::{HeaderSigError, HeaderSigner, Result, WalletAccessor};
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::password::Password;
use crate::sealing::{KdfParams, SealedSecret};

/// Wallet file format version
pub const WALLET_VERSION: u32 = 2;

/// One sealed Ed25519 identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Operator-chosen name
    pub label: String,
    /// Ed25519 public key
    #[serde(with = "hex_array")]
    pub public_key: [u8; 32],
    /// Whether this is the account used for signing
    #[serde(default)]
    pub default: bool,
    /// Encrypted 32-byte seed
    #[serde(flatten)]
    pub sealed: SealedSecret,
}

impl AccountRecord {
    /// Public key as hex
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key)
    }
}

/// A set of sealed accounts, loaded from or destined for a JSON file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    version: u32,
    accounts: Vec<AccountRecord>,
    #[serde(skip)]
    kdf: KdfParams,
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}

impl Wallet {
    /// Empty wallet
    pub fn new() -> Self {
        Self {
            version: WALLET_VERSION,
            accounts: Vec::new(),
            kdf: KdfParams::default(),
        }
    }

    /// Use `kdf` when sealing accounts added from now on
    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    /// Load a wallet file
    ///
    /// An unreadable or unparseable file is an authentication failure: the
    /// run cannot obtain a signing key either way.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            HeaderSigError::authentication(format!("cannot open wallet {}: {e}", path.display()))
        })?;
        let wallet = Self::from_json(&text)?;
        debug!(path = %path.display(), accounts = wallet.accounts.len(), "Opened wallet");
        Ok(wallet)
    }

    /// Parse a wallet document
    pub fn from_json(text: &str) -> Result<Self> {
        let wallet: Self = serde_json::from_str(text)
            .map_err(|e| HeaderSigError::authentication(format!("corrupt wallet: {e}")))?;
        if wallet.version != WALLET_VERSION {
            return Err(HeaderSigError::authentication(format!(
                "unsupported wallet version {}",
                wallet.version
            )));
        }
        Ok(wallet)
    }

    /// Render the wallet document
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the wallet to `path`, replacing any existing file atomically
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let write_error = |e: std::io::Error| {
            HeaderSigError::serialization(format!("cannot write wallet {}: {e}", path.display()))
        };

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_error)?;
        tmp.write_all(json.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(write_error)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o600))
                .map_err(write_error)?;
        }

        tmp.persist(path).map_err(|e| write_error(e.error))?;
        info!(path = %path.display(), accounts = self.accounts.len(), "Saved wallet");
        Ok(())
    }

    /// All accounts, in file order
    pub fn accounts(&self) -> &[AccountRecord] {
        &self.accounts
    }

    /// The account used for signing: the first flagged default, else the first account
    pub fn default_record(&self) -> Result<&AccountRecord> {
        self.accounts
            .iter()
            .find(|a| a.default)
            .or_else(|| self.accounts.first())
            .ok_or_else(|| HeaderSigError::authentication("wallet has no accounts"))
    }

    /// Seal an existing 32-byte seed into a new account
    ///
    /// The first account added to a wallet becomes its default.
    pub fn import_account<R>(
        &mut self,
        label: &str,
        seed: &[u8; 32],
        password: &Password,
        rng: &mut R,
    ) -> Result<VerifyingKey>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        if password.is_empty() {
            return Err(HeaderSigError::malformed("wallet password must not be empty"));
        }
        let verifying_key = SigningKey::from_bytes(seed).verifying_key();
        let public_key = verifying_key.to_bytes();
        if self.accounts.iter().any(|a| a.public_key == public_key) {
            return Err(HeaderSigError::malformed(format!(
                "account {} already in wallet",
                hex::encode(public_key)
            )));
        }

        let sealed = SealedSecret::seal(seed, password, &public_key, self.kdf, rng)?;
        self.accounts.push(AccountRecord {
            label: label.to_string(),
            public_key,
            default: self.accounts.is_empty(),
            sealed,
        });
        info!(label, public_key = %hex::encode(public_key), "Added wallet account");
        Ok(verifying_key)
    }

    /// Generate a fresh key and seal it into a new account
    pub fn generate_account<R>(
        &mut self,
        label: &str,
        password: &Password,
        rng: &mut R,
    ) -> Result<VerifyingKey>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        let mut seed = Zeroizing::new([0u8; 32]);
        rng.fill_bytes(seed.as_mut_slice());
        self.import_account(label, &seed, password, rng)
    }

    /// Decrypt `record` into a signer
    pub fn unlock(record: &AccountRecord, password: &Password) -> Result<WalletSigner> {
        let seed = record.sealed.unseal(password, &record.public_key)?;
        let seed: Zeroizing<[u8; 32]> =
            Zeroizing::new(seed.as_slice().try_into().map_err(|_| {
                HeaderSigError::authentication(format!(
                    "account {} holds a {}-byte seed",
                    record.label,
                    seed.len()
                ))
            })?);
        let signing_key = SigningKey::from_bytes(&seed);
        if signing_key.verifying_key().to_bytes() != record.public_key {
            return Err(HeaderSigError::authentication(format!(
                "account {} public key does not match its sealed seed",
                record.label
            )));
        }
        debug!(label = %record.label, "Unlocked wallet account");
        Ok(WalletSigner {
            label: record.label.clone(),
            signing_key,
        })
    }

    /// Decrypt the default account
    pub fn unlock_default(&self, password: &Password) -> Result<WalletSigner> {
        Self::unlock(self.default_record()?, password)
    }
}

impl WalletAccessor for Wallet {
    fn open(path: &Path) -> Result<Self> {
        Self::load(path)
    }

    fn default_account(&self, password: &str) -> Result<Box<dyn HeaderSigner>> {
        Ok(Box::new(self.unlock_default(&Password::from(password))?))
    }
}

/// Unlocked wallet account
///
/// The seed is zeroized when the signer is dropped.
pub struct WalletSigner {
    label: String,
    signing_key: SigningKey,
}

impl WalletSigner {
    /// Account label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Ed25519 public key
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }
}

impl fmt::Debug for WalletSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletSigner")
            .field("label", &self.label)
            .field("public_key", &hex::encode(self.verifying_key().as_bytes()))
            .field("signing_key", &"[REDACTED]")
            .finish()
    }
}

impl HeaderSigner for WalletSigner {
    fn public_key(&self) -> Vec<u8> {
        self.verifying_key().to_bytes().to_vec()
    }

    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>> {
        Ok(self.signing_key.sign(payload).to_bytes().to_vec())
    }
}
