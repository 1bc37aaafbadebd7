/*!
Constants for the QSP session protocol.

This module contains the wire constants (magic tag, version, header layout),
key and nonce sizes, key-derivation labels and the policy defaults.
*/

/// Protocol version carried in every frame header
pub const VERSION: u8 = 0x01;

/// Leading tag of every wire frame
pub const MAGIC: [u8; 4] = *b"QSP1";

/// Size constants for the protocol
pub mod sizes {
    /// Size of the fixed frame header in bytes
    ///
    /// magic(4) | version(1) | msg_type(1) | flags(1) | reserved(1) |
    /// epoch(4) | nonce(12) | ciphertext_length(4)
    pub const HEADER_SIZE: usize = 28;

    /// Size of an AEAD nonce in bytes
    pub const NONCE_SIZE: usize = 12;

    /// Size of a symmetric session key in bytes
    pub const KEY_SIZE: usize = 32;

    /// Size of the AEAD authentication tag in bytes
    pub const TAG_SIZE: usize = 16;

    /// Size of the handshake context in bytes
    pub const HANDSHAKE_CONTEXT_SIZE: usize = 32;

    /// Size of an encoded handshake message in bytes
    pub const HANDSHAKE_MESSAGE_SIZE: usize = 4 + 1 + HANDSHAKE_CONTEXT_SIZE;

    /// Byte offsets of the header fields
    pub mod offsets {
        pub const MAGIC: usize = 0;
        pub const VERSION: usize = 4;
        pub const MSG_TYPE: usize = 5;
        pub const FLAGS: usize = 6;
        pub const RESERVED: usize = 7;
        pub const EPOCH: usize = 8;
        pub const NONCE: usize = 12;
        pub const CIPHERTEXT_LEN: usize = 24;
    }
}

/// Leading tag of a handshake message
pub const HANDSHAKE_MAGIC: [u8; 4] = *b"QSH1";

/// Salt for HKDF key derivation
pub const HKDF_SALT: &[u8] = b"QSP-Protocol-v1-Key-Derivation";

/// Label prefixed to every session key derivation context
pub const KEY_LABEL: &[u8] = b"qsp/v1/keys";

/// Direction label for client-to-server traffic keys
pub const LABEL_CLIENT_TO_SERVER: &[u8] = b"c2s";

/// Direction label for server-to-client traffic keys
pub const LABEL_SERVER_TO_CLIENT: &[u8] = b"s2c";

/// First key epoch of every session
pub const INITIAL_EPOCH: u32 = 1;

/// Policy defaults
pub mod defaults {
    /// Default byte threshold (sent + received) before an automatic rekey
    pub const REKEY_BYTES: u64 = 1_000_000;

    /// Default key lifetime in seconds before an automatic rekey
    pub const REKEY_SECONDS: u64 = 3600;
}
