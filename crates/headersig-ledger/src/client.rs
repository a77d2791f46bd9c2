//! HTTP JSON-RPC ledger client

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use headersig_core::{Header, HeaderSigError, LedgerAccessor, Result};
use tracing::{debug, info};

use crate::rpc::{decode_header_response, parse_response_body, RpcRequest, GET_HEADER_METHOD};

/// Ledger reached through a node's JSON-RPC endpoint
///
/// Bound to the chain whose genesis header the node served at connect time;
/// a header from any other chain is a transport error.
#[derive(Debug)]
pub struct RpcLedger {
    client: reqwest::Client,
    url: String,
    chain_id: u64,
    next_id: AtomicU64,
}

impl RpcLedger {
    /// Connect to `url` and learn the chain id from the genesis header
    pub async fn connect(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let url = url.into();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HeaderSigError::transport(format!("cannot build HTTP client: {e}")))?;

        let mut ledger = Self {
            client,
            url,
            chain_id: 0,
            next_id: AtomicU64::new(1),
        };
        let genesis = ledger.fetch_header(0).await?;
        ledger.chain_id = genesis.chain_id;
        info!(url = %ledger.url, chain_id = ledger.chain_id, "Connected to ledger");
        Ok(ledger)
    }

    /// Chain id learned at connect time
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch_header(&self, height: u32) -> Result<Header> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::header_by_height(id, height);

        let reply = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                HeaderSigError::transport(format!("{GET_HEADER_METHOD}({height}) request failed: {e}"))
            })?;
        let status = reply.status();
        let body = reply.text().await.map_err(|e| {
            HeaderSigError::transport(format!("{GET_HEADER_METHOD}({height}) body unreadable: {e}"))
        })?;
        debug!(height, id, %status, bytes = body.len(), "Ledger replied");

        let response = parse_response_body(GET_HEADER_METHOD, status, &body)?;
        decode_header_response(height, response)
    }
}

#[async_trait]
impl LedgerAccessor for RpcLedger {
    async fn header_by_height(&self, height: u32) -> Result<Header> {
        let header = self.fetch_header(height).await?;
        check_chain(self.chain_id, &header)?;
        Ok(header)
    }
}

fn check_chain(expected: u64, header: &Header) -> Result<()> {
    if header.chain_id != expected {
        return Err(HeaderSigError::transport(format!(
            "header {} belongs to chain {}, connected ledger is chain {expected}",
            header.height, header.chain_id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use headersig_testkit::test_header;

    #[test]
    fn test_check_chain() {
        assert!(check_chain(2, &test_header(2, 10)).is_ok());
        assert_matches!(
            check_chain(2, &test_header(3, 10)),
            Err(HeaderSigError::TransportError { .. })
        );
    }

    #[tokio::test]
    async fn test_unreachable_node_is_transport_error() {
        let err = RpcLedger::connect("http://127.0.0.1:1", Duration::from_secs(2))
            .await
            .unwrap_err();
        assert_matches!(err, HeaderSigError::TransportError { .. });
    }
}
