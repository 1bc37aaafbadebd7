/*!
Error handling for the QSP session protocol.

Codec failures, capability failures, audit failures and session-level
rejections are kept in separate taxonomies. Malformed wire bytes are
recoverable parsing noise; a well-formed frame that violates the protocol may
be an active attack, and the session treats the two differently.
*/

use std::io;
use thiserror::Error;

/// Result type for the QSP protocol
pub type Result<T> = std::result::Result<T, Error>;

/// Session-level error type
#[derive(Error, Debug)]
pub enum Error {
    /// Wire bytes could not be decoded
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// Application data arrived before the handshake completed
    #[error("handshake not complete")]
    HandshakeNotComplete,

    /// AEAD open failed (limited details for security)
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// The peer tried to move the session to a weaker mode
    #[error("Mode downgrade rejected: {reason}")]
    DowngradeRejected {
        reason: String,
    },

    /// A frame carried an epoch older than the current key epoch
    #[error("Stale epoch: current {current}, received {received}")]
    StaleEpoch {
        current: u32,
        received: u32,
    },

    /// The session is closed and accepts nothing further
    #[error("Session closed")]
    SessionClosed,

    /// Wrong frame type, payload or role at the API boundary
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Cryptographic capability failure (limited details for security)
    #[error("Cryptographic operation failed")]
    Crypto(#[source] CryptoError),

    /// The audit pipeline could not record an event
    #[error("Audit pipeline failure: {0}")]
    Audit(#[from] AuditError),
}

impl Error {
    /// Stable name of the error kind, as written to the audit log
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Format(_) => "FormatError",
            Error::HandshakeNotComplete => "HandshakeNotComplete",
            Error::AuthenticationFailed => "AuthenticationFailed",
            Error::DowngradeRejected { .. } => "DowngradeRejected",
            Error::StaleEpoch { .. } => "StaleEpoch",
            Error::SessionClosed => "SessionClosed",
            Error::InvalidInput(_) => "InvalidInput",
            Error::Crypto(_) => "CryptoError",
            Error::Audit(_) => "AuditError",
        }
    }

    /// Whether a fail-closed session must terminate after this error.
    ///
    /// Only protocol violations on otherwise well-formed input close the
    /// session. Parsing noise, API misuse and the handshake gate do not.
    pub fn closes_session(&self) -> bool {
        matches!(
            self,
            Error::AuthenticationFailed
                | Error::DowngradeRejected { .. }
                | Error::StaleEpoch { .. }
                | Error::Crypto(_)
        )
    }
}

impl From<CryptoError> for Error {
    fn from(error: CryptoError) -> Self {
        match error {
            CryptoError::OpenFailed => Error::AuthenticationFailed,
            other => Error::Crypto(other),
        }
    }
}

/// Wire codec errors. Never carry key material.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Fewer bytes than the fixed header length
    #[error("truncated frame: need {needed} bytes, got {actual}")]
    Truncated {
        needed: usize,
        actual: usize,
    },

    /// Leading tag does not match the protocol identifier
    #[error("bad magic {0:?}")]
    BadMagic([u8; 4]),

    /// Version byte is not the supported value
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// Declared ciphertext length differs from the bytes present
    #[error("length mismatch: header declares {declared} ciphertext bytes, {actual} present")]
    LengthMismatch {
        declared: usize,
        actual: usize,
    },

    /// Nonce is not exactly 12 bytes
    #[error("nonce must be 12 bytes, got {0}")]
    InvalidNonceLength(usize),

    /// Ciphertext does not fit the 32-bit length field
    #[error("ciphertext of {0} bytes exceeds the length field")]
    CiphertextTooLarge(usize),

    /// Handshake message could not be parsed
    #[error("malformed handshake message: {0}")]
    MalformedHandshake(String),
}

/// Cryptographic capability errors with limited details
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// AEAD seal failed
    #[error("Encryption failed")]
    SealFailed,

    /// AEAD open failed: tag mismatch or tampered input
    #[error("Decryption failed")]
    OpenFailed,

    /// KDF could not produce the requested output
    #[error("Key derivation failed")]
    KeyDerivationFailed,

    /// Key is not the size the cipher expects
    #[error("Invalid key length: {0}")]
    InvalidKeyLength(usize),

    /// The nonce counter for the current key ran out
    #[error("Nonce space exhausted for the current key")]
    NonceExhausted,
}

/// Audit pipeline errors
#[derive(Error, Debug)]
pub enum AuditError {
    /// Underlying storage failed
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// An event could not be encoded
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A complete record could not be decoded
    #[error("Malformed record on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A writer panicked while holding the sink
    #[error("Audit sink lock poisoned")]
    Poisoned,
}

/// Convert from Error to io::Error (for callers driving sessions over byte streams)
impl From<Error> for io::Error {
    fn from(error: Error) -> Self {
        let kind = match &error {
            Error::Format(_) => io::ErrorKind::InvalidData,
            Error::HandshakeNotComplete => io::ErrorKind::NotConnected,
            Error::AuthenticationFailed => io::ErrorKind::PermissionDenied,
            Error::DowngradeRejected { .. } => io::ErrorKind::PermissionDenied,
            Error::StaleEpoch { .. } => io::ErrorKind::InvalidData,
            Error::SessionClosed => io::ErrorKind::NotConnected,
            Error::InvalidInput(_) => io::ErrorKind::InvalidInput,
            Error::Crypto(_) => io::ErrorKind::Other,
            Error::Audit(_) => io::ErrorKind::Other,
        };
        match error {
            Error::Audit(AuditError::Io(io_error)) => io_error,
            other => io::Error::new(kind, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(Error::HandshakeNotComplete.to_string(), "handshake not complete");

        let err = Error::StaleEpoch { current: 3, received: 2 };
        assert_eq!(err.to_string(), "Stale epoch: current 3, received 2");

        let err = Error::from(FormatError::UnsupportedVersion(42));
        assert_eq!(err.to_string(), "Format error: unsupported protocol version: 42");
    }

    #[test]
    fn test_open_failure_maps_to_authentication() {
        assert!(matches!(Error::from(CryptoError::OpenFailed), Error::AuthenticationFailed));
        assert!(matches!(
            Error::from(CryptoError::NonceExhausted),
            Error::Crypto(CryptoError::NonceExhausted)
        ));
    }

    #[test]
    fn test_closing_kinds() {
        assert!(Error::AuthenticationFailed.closes_session());
        assert!(Error::StaleEpoch { current: 2, received: 1 }.closes_session());
        assert!(Error::DowngradeRejected { reason: "x".into() }.closes_session());

        assert!(!Error::HandshakeNotComplete.closes_session());
        assert!(!Error::InvalidInput("x".into()).closes_session());
        assert!(!Error::from(FormatError::BadMagic(*b"NOPE")).closes_session());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::from(Error::InvalidInput("Test error".into()));
        assert_eq!(io_err.kind(), io::ErrorKind::InvalidInput);
        assert!(io_err.to_string().contains("Test error"));

        let io_err = io::Error::from(Error::SessionClosed);
        assert_eq!(io_err.kind(), io::ErrorKind::NotConnected);
    }
}
