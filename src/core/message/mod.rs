/*!
Message handling for the QSP protocol.

This module provides the wire frame codec, the handshake message encoding
and the message/frame type enumerations.
*/

pub mod types;
pub mod format;
pub mod handshake;

// Re-export commonly used items
pub use types::{MessageType, FrameType};
pub use format::{ParsedFrame, HeaderBytes, encode_header, encode_frame, decode};
pub use handshake::HandshakeMessage;
