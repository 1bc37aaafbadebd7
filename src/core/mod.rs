//! Core components for the QSP protocol.
//!
//! This module contains the fundamental building blocks of the protocol:
//! the wire codec, cryptographic capabilities, key material handling, the
//! session policy and state machine, the audit pipeline and evidence
//! reconstruction over the audit log.

// Export cryptographic functionality
pub mod crypto;

// Export message handling
pub mod message;

// Export session management
pub mod session;

// Export memory handling for sensitive data
pub mod memory;

// Session policy
pub mod policy;

// Audit pipeline
pub mod audit;

// Evidence reconstruction
pub mod evidence;

// Protocol constants
pub mod constants;

// Error handling
pub mod error;

// Re-exports for convenience
pub use self::error::{Error, Result, FormatError, CryptoError, AuditError};
pub use self::message::{MessageType, FrameType, ParsedFrame};
pub use self::session::{SessionState, Role, Mode, ProtocolSession, SessionBuilder};
pub use self::policy::Policy;
pub use self::constants::VERSION;
