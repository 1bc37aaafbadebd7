/*!
Handshake message carried in the payload of an `HS` frame.

```text
"QSH1"(4) | flags(1) | context(32)
```

The context is the initiator's random contribution to key derivation. The
flags byte declares the sender's keying mode (bit 0 = PQC_ONLY).
*/

use crate::core::{
    constants::{HANDSHAKE_MAGIC, sizes},
    error::FormatError,
    message::{format::FormatResult, types::flags},
};

/// Handshake message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeMessage {
    /// Flag bits of the sender
    pub flags: u8,
    /// Key derivation context chosen by the initiator
    pub context: [u8; sizes::HANDSHAKE_CONTEXT_SIZE],
}

impl HandshakeMessage {
    /// Create a handshake message
    pub fn new(pqc_only: bool, context: [u8; sizes::HANDSHAKE_CONTEXT_SIZE]) -> Self {
        let flags = if pqc_only { flags::PQC_ONLY } else { 0 };
        Self { flags, context }
    }

    /// Whether the sender declared PQC_ONLY keying
    pub fn is_pqc_only(&self) -> bool {
        self.flags & flags::PQC_ONLY != 0
    }

    /// Encode to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(sizes::HANDSHAKE_MESSAGE_SIZE);
        bytes.extend_from_slice(&HANDSHAKE_MAGIC);
        bytes.push(self.flags);
        bytes.extend_from_slice(&self.context);
        bytes
    }

    /// Parse from bytes; the length must be exact
    pub fn from_bytes(bytes: &[u8]) -> FormatResult<Self> {
        if bytes.len() != sizes::HANDSHAKE_MESSAGE_SIZE {
            return Err(FormatError::MalformedHandshake(format!(
                "expected {} bytes, got {}",
                sizes::HANDSHAKE_MESSAGE_SIZE,
                bytes.len()
            )));
        }
        if bytes[..4] != HANDSHAKE_MAGIC {
            return Err(FormatError::MalformedHandshake("bad magic".into()));
        }

        let mut context = [0u8; sizes::HANDSHAKE_CONTEXT_SIZE];
        context.copy_from_slice(&bytes[5..]);
        Ok(Self { flags: bytes[4], context })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_encoding() {
        let msg = HandshakeMessage::new(true, [3u8; 32]);
        let bytes = msg.to_bytes();

        assert_eq!(bytes.len(), sizes::HANDSHAKE_MESSAGE_SIZE);
        assert_eq!(&bytes[..4], b"QSH1");
        assert_eq!(bytes[4], flags::PQC_ONLY);

        let parsed = HandshakeMessage::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, msg);
        assert!(parsed.is_pqc_only());
    }

    #[test]
    fn test_malformed_handshake() {
        let bytes = HandshakeMessage::new(false, [0u8; 32]).to_bytes();

        assert!(matches!(
            HandshakeMessage::from_bytes(&bytes[..10]),
            Err(FormatError::MalformedHandshake(_))
        ));

        let mut bad = bytes.clone();
        bad[0] = b'X';
        assert!(matches!(
            HandshakeMessage::from_bytes(&bad),
            Err(FormatError::MalformedHandshake(_))
        ));
    }
}
