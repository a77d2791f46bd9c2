//! Ledger header lookup over JSON-RPC
//!
//! [`RpcLedger`] implements [`headersig_core::LedgerAccessor`] against a
//! node's HTTP JSON-RPC endpoint. The wire types and the mapping from RPC
//! responses to headers live in [`rpc`] and carry no I/O.

/// RPC client
pub mod client;
/// JSON-RPC message types and response interpretation
pub mod rpc;

pub use client::RpcLedger;
pub use rpc::{RpcError, RpcErrorField, RpcRequest, RpcResponse, GET_HEADER_METHOD};
