//! Unified error type for the signing ceremony
//!
//! Every failure in a run is fatal. Library code returns these values and the
//! binary reports the first one it sees, so variants carry enough context
//! (height, signer position, line number) to be actionable on their own.

use std::path::Path;

/// Error type for all header signing operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeaderSigError {
    /// Bad argument shape, root hex, signature line or configuration value
    #[error("Malformed input: {message}")]
    MalformedInput {
        /// Description of what could not be parsed
        message: String,
    },

    /// Combine mode was given a different number of root pairs and signature entries
    #[error("Length mismatch: {roots} height/root pairs but {signatures} signature entries")]
    LengthMismatch {
        /// Number of height/root pairs supplied
        roots: usize,
        /// Number of combined signature entries supplied
        signatures: usize,
    },

    /// Ledger RPC unreachable, erroring or returning unusable data
    #[error("Transport error: {message}")]
    TransportError {
        /// Error message describing the transport failure
        message: String,
    },

    /// The ledger has no header at the requested height
    #[error("Header not found at height {height}")]
    HeaderNotFound {
        /// Requested height
        height: u64,
    },

    /// Wallet could not be opened or decrypted
    #[error("Authentication error: {message}")]
    AuthenticationError {
        /// Error message describing the wallet failure
        message: String,
    },

    /// A combined signature entry does not line up with the root pair at the same position
    #[error("Height mismatch: root pair has height {expected}, signature entry has height {found}")]
    HeightMismatch {
        /// Height from the root pair list
        expected: u64,
        /// Height from the signature entry
        found: u64,
    },

    /// A signer file lacks a height present in the reference file
    #[error("Signature missing for height {height} from signer {signer_index}")]
    MissingSignature {
        /// Height without a signature
        height: u64,
        /// Zero-based position of the signer file
        signer_index: usize,
    },

    /// A signature failed verification against the expected signer key
    #[error("Invalid signature for height {height} from signer {signer_index}")]
    InvalidSignature {
        /// Height of the rejected signature
        height: u64,
        /// Zero-based position of the signer
        signer_index: usize,
    },

    /// Artifact could not be encoded or written
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Error message describing the serialization failure
        message: String,
    },
}

impl HeaderSigError {
    /// Create a malformed input error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput {
            message: message.into(),
        }
    }

    /// Create a malformed input error pointing at a line of a signature file
    pub fn malformed_line(source: Option<&Path>, line: usize, message: impl Into<String>) -> Self {
        let message = message.into();
        match source {
            Some(path) => Self::malformed(format!("{}:{line}: {message}", path.display())),
            None => Self::malformed(format!("line {line}: {message}")),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::TransportError {
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::AuthenticationError {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }
}

/// Standard Result type for header signing operations
pub type Result<T> = std::result::Result<T, HeaderSigError>;

impl From<serde_json::Error> for HeaderSigError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HeaderSigError::MissingSignature {
            height: 100,
            signer_index: 2,
        };
        assert_eq!(err.to_string(), "Signature missing for height 100 from signer 2");

        let err = HeaderSigError::malformed("bad root");
        assert_eq!(err.to_string(), "Malformed input: bad root");
    }

    #[test]
    fn test_malformed_line_with_path() {
        let err = HeaderSigError::malformed_line(Some(Path::new("sigs/a.txt")), 3, "bad height");
        assert_eq!(err.to_string(), "Malformed input: sigs/a.txt:3: bad height");

        let err = HeaderSigError::malformed_line(None, 1, "empty signature");
        assert_eq!(err.to_string(), "Malformed input: line 1: empty signature");
    }
}
