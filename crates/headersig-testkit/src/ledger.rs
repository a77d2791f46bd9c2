//! In-memory ledger
//!
//! Serves fixture headers by height, records every lookup, and can be told to
//! fail a height with a transport error.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;
use headersig_core::{Header, HeaderSigError, LedgerAccessor, Result};

use crate::headers::test_header;

/// Ledger backed by a height-indexed map
#[derive(Debug, Default)]
pub struct MemoryLedger {
    headers: BTreeMap<u32, Header>,
    failing: BTreeSet<u32>,
    lookups: Mutex<Vec<u32>>,
}

impl MemoryLedger {
    /// Empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger holding [`test_header`] for each height
    pub fn with_heights(chain_id: u64, heights: impl IntoIterator<Item = u32>) -> Self {
        let mut ledger = Self::new();
        for height in heights {
            ledger.insert(test_header(chain_id, height));
        }
        ledger
    }

    /// Add or replace a header
    pub fn insert(&mut self, header: Header) {
        self.headers.insert(header.height, header);
    }

    /// Make lookups of `height` fail with a transport error
    pub fn fail_at(mut self, height: u32) -> Self {
        self.failing.insert(height);
        self
    }

    /// Heights requested so far, in request order
    pub fn lookups(&self) -> Vec<u32> {
        self.lookups.lock().expect("lookup log poisoned").clone()
    }
}

#[async_trait]
impl LedgerAccessor for MemoryLedger {
    async fn header_by_height(&self, height: u32) -> Result<Header> {
        self.lookups.lock().expect("lookup log poisoned").push(height);
        if self.failing.contains(&height) {
            return Err(HeaderSigError::transport(format!("injected failure at {height}")));
        }
        self.headers
            .get(&height)
            .cloned()
            .ok_or(HeaderSigError::HeaderNotFound {
                height: u64::from(height),
            })
    }
}
