//! headersig testing infrastructure
//!
//! Shared fixtures for the workspace's integration tests: an in-memory ledger,
//! deterministic header factories and seeded signing keys.
//!
//! ```rust,ignore
//! use headersig_testkit::*;
//!
//! let ledger = MemoryLedger::with_heights(CHAIN_ID, [100, 200]);
//! let signer = KeyTestFixture::from_seed_string("signer-0");
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod headers;
pub mod keys;
pub mod ledger;

pub use headers::*;
pub use keys::KeyTestFixture;
pub use ledger::MemoryLedger;
