//! JSON-RPC 2.0 messages for header lookup
//!
//! A header request is
//! `{"jsonrpc":"2.0","id":N,"method":"getblockheaderbyheight","params":[height]}`
//! and a successful response carries the hex of the binary header encoding
//! in `result`. Nodes report failure either with a JSON-RPC 2.0 error object
//! or with a numeric `error` code (zero on success) and a `desc` string.

use headersig_core::{Header, HeaderSigError, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Method returning the header at a height
pub const GET_HEADER_METHOD: &str = "getblockheaderbyheight";

const JSONRPC_VERSION: &str = "2.0";

/// Outgoing JSON-RPC call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcRequest<'a> {
    /// Protocol version, always "2.0"
    pub jsonrpc: &'static str,
    /// Request id, echoed by the server
    pub id: u64,
    /// Method name
    pub method: &'a str,
    /// Positional parameters
    pub params: Value,
}

impl<'a> RpcRequest<'a> {
    /// Build a call
    pub fn new(id: u64, method: &'a str, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method,
            params,
        }
    }

    /// Header lookup call
    pub fn header_by_height(id: u64, height: u32) -> Self {
        Self::new(id, GET_HEADER_METHOD, Value::from(vec![height]))
    }
}

/// Incoming JSON-RPC response
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RpcResponse {
    /// Echoed request id
    #[serde(default)]
    pub id: Option<Value>,
    /// Result on success; `null` and absent are treated alike
    #[serde(default)]
    pub result: Option<Value>,
    /// Error object, or a numeric status code
    #[serde(default)]
    pub error: Option<RpcErrorField>,
    /// Status text accompanying a numeric code
    #[serde(default)]
    pub desc: Option<String>,
}

impl RpcResponse {
    /// The reported failure, if any; a numeric code of zero is success
    pub fn failure(&self) -> Option<RpcError> {
        match &self.error {
            None | Some(RpcErrorField::Code(0)) => None,
            Some(RpcErrorField::Code(code)) => Some(RpcError {
                code: *code,
                message: self
                    .desc
                    .clone()
                    .unwrap_or_else(|| format!("error code {code}")),
                data: None,
            }),
            Some(RpcErrorField::Object(error)) => Some(error.clone()),
        }
    }
}

/// The two shapes an `error` member takes on the wire
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RpcErrorField {
    /// Numeric status, `0` meaning success
    Code(i64),
    /// JSON-RPC 2.0 error object
    Object(RpcError),
}

/// JSON-RPC error object
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RpcError {
    /// Error code
    pub code: i64,
    /// Human-readable message
    pub message: String,
    /// Optional server detail
    #[serde(default)]
    pub data: Option<Value>,
}

impl RpcError {
    /// Whether the node is reporting a height it does not have
    pub fn is_not_found(&self) -> bool {
        let message = self.message.to_ascii_lowercase();
        message.contains("not found") || message.contains("unknown block")
    }
}

/// Interpret an HTTP reply as a JSON-RPC response
///
/// Servers may put a JSON-RPC error in a non-2xx reply, so the body is
/// parsed first and the status only matters when it is not JSON-RPC.
pub fn parse_response_body(method: &str, status: StatusCode, body: &str) -> Result<RpcResponse> {
    match serde_json::from_str::<RpcResponse>(body) {
        Ok(response) => Ok(response),
        Err(_) if !status.is_success() => Err(HeaderSigError::transport(format!(
            "{method} returned HTTP {status}"
        ))),
        Err(e) => Err(HeaderSigError::transport(format!(
            "invalid {method} response: {e}"
        ))),
    }
}

/// Extract the header at `height` from a lookup response
pub fn decode_header_response(height: u32, response: RpcResponse) -> Result<Header> {
    if let Some(error) = response.failure() {
        if error.is_not_found() {
            return Err(HeaderSigError::HeaderNotFound {
                height: u64::from(height),
            });
        }
        return Err(HeaderSigError::transport(format!(
            "{GET_HEADER_METHOD}({height}) failed with code {}: {}",
            error.code, error.message
        )));
    }

    match response.result {
        None | Some(Value::Null) => Err(HeaderSigError::HeaderNotFound {
            height: u64::from(height),
        }),
        Some(Value::String(text)) => {
            let text = text.strip_prefix("0x").unwrap_or(&text);
            let bytes = hex::decode(text).map_err(|e| {
                HeaderSigError::transport(format!("header {height} is not valid hex: {e}"))
            })?;
            Header::from_bytes(&bytes)
        }
        Some(other) => Err(HeaderSigError::transport(format!(
            "header {height}: expected a hex string result, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use headersig_testkit::test_header;
    use serde_json::json;

    fn response(value: Value) -> RpcResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_request_shape() {
        let request = RpcRequest::header_by_height(7, 120);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "jsonrpc": "2.0",
                "id": 7,
                "method": "getblockheaderbyheight",
                "params": [120],
            })
        );
    }

    #[test]
    fn test_decode_header() {
        let header = test_header(2, 120);
        let body = json!({"jsonrpc": "2.0", "id": 1, "result": hex::encode(header.to_bytes())});
        assert_eq!(decode_header_response(120, response(body)).unwrap(), header);

        let prefixed = json!({"result": format!("0x{}", hex::encode(header.to_bytes()))});
        assert_eq!(decode_header_response(120, response(prefixed)).unwrap(), header);
    }

    #[test]
    fn test_numeric_status_replies() {
        let header = test_header(2, 120);
        let body = format!(
            r#"{{"desc":"SUCCESS","error":0,"id":1,"jsonrpc":"2.0","result":"{}"}}"#,
            hex::encode(header.to_bytes())
        );
        let reply = parse_response_body(GET_HEADER_METHOD, StatusCode::OK, &body).unwrap();
        assert_eq!(reply.failure(), None);
        assert_eq!(decode_header_response(120, reply).unwrap(), header);

        let unknown = json!({"desc": "UNKNOWN BLOCK", "error": 44003, "id": 1, "result": ""});
        assert_matches!(
            decode_header_response(120, response(unknown)),
            Err(HeaderSigError::HeaderNotFound { height: 120 })
        );
        let invalid = json!({"desc": "INVALID PARAMS", "error": 42002, "id": 1, "result": ""});
        let err = decode_header_response(120, response(invalid)).unwrap_err();
        assert_matches!(err, HeaderSigError::TransportError { ref message } if message.contains("INVALID PARAMS"));
    }

    #[test]
    fn test_missing_header() {
        assert_matches!(
            decode_header_response(5, response(json!({"id": 1, "result": null}))),
            Err(HeaderSigError::HeaderNotFound { height: 5 })
        );
        assert_matches!(
            decode_header_response(5, response(json!({"id": 1}))),
            Err(HeaderSigError::HeaderNotFound { height: 5 })
        );
        let err = json!({"error": {"code": -32000, "message": "Unknown block height"}});
        assert_matches!(
            decode_header_response(5, response(err)),
            Err(HeaderSigError::HeaderNotFound { height: 5 })
        );
        let err = json!({"error": {"code": 42002, "message": "block not found"}});
        assert_matches!(
            decode_header_response(5, response(err)),
            Err(HeaderSigError::HeaderNotFound { height: 5 })
        );
    }

    #[test]
    fn test_other_failures_are_transport_errors() {
        let err = json!({"error": {"code": -32601, "message": "Method not allowed"}});
        assert_matches!(
            decode_header_response(5, response(err)),
            Err(HeaderSigError::TransportError { .. })
        );
        assert_matches!(
            decode_header_response(5, response(json!({"result": "zz"}))),
            Err(HeaderSigError::TransportError { .. })
        );
        assert_matches!(
            decode_header_response(5, response(json!({"result": "00"}))),
            Err(HeaderSigError::TransportError { .. })
        );
        assert_matches!(
            decode_header_response(5, response(json!({"result": 17}))),
            Err(HeaderSigError::TransportError { .. })
        );
    }

    #[test]
    fn test_parse_response_body() {
        let ok = parse_response_body(GET_HEADER_METHOD, StatusCode::OK, r#"{"id":1,"result":null}"#)
            .unwrap();
        assert_eq!(ok.result, None);

        let error_in_500 = parse_response_body(
            GET_HEADER_METHOD,
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"id":1,"error":{"code":-1,"message":"not found"}}"#,
        )
        .unwrap();
        assert!(error_in_500.failure().unwrap().is_not_found());

        assert_matches!(
            parse_response_body(GET_HEADER_METHOD, StatusCode::BAD_GATEWAY, "<html>"),
            Err(HeaderSigError::TransportError { .. })
        );
        assert_matches!(
            parse_response_body(GET_HEADER_METHOD, StatusCode::OK, "garbage"),
            Err(HeaderSigError::TransportError { .. })
        );
    }
}
