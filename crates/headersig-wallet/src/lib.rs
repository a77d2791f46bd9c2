//! Password-sealed Ed25519 wallet
//!
//! A wallet file is a JSON document holding one or more accounts. Each
//! account stores its public key in the clear and its secret seed encrypted
//! with a key derived from the operator's password. Unlocking the default
//! account yields a [`WalletSigner`] that implements
//! [`headersig_core::HeaderSigner`].

/// Operator password handling
pub mod password;
/// Password-based sealing of secret material
pub mod sealing;
/// Wallet file and account management
pub mod wallet;

pub use password::Password;
pub use sealing::{KdfParams, SealedSecret};
pub use wallet::{AccountRecord, Wallet, WalletSigner, WALLET_VERSION};
