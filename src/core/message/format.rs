/*!
Wire frame format for the QSP protocol.

A frame is a fixed 28-byte header followed by exactly `ciphertext_length`
bytes of AEAD output. All integers are big-endian.

```text
magic(4) | version(1) | msg_type(1) | flags(1) | reserved(1) |
epoch(4) | nonce(12) | ciphertext_length(4) | ciphertext(ciphertext_length)
```

The header bytes are the associated data of the AEAD seal/open calls, so any
header tampering surfaces as an authentication failure downstream.

The codec carries no protocol semantics: unknown message types round-trip
unchanged and are left for the session to reject.
*/

use byteorder::{BigEndian, ByteOrder};
use bytes::{BufMut, BytesMut};

use crate::core::{
    constants::{MAGIC, VERSION, sizes::{self, offsets}},
    error::FormatError,
    message::types::{MessageType, flags},
};

/// Result type for codec operations
pub type FormatResult<T> = std::result::Result<T, FormatError>;

/// Encoded frame header
pub type HeaderBytes = [u8; sizes::HEADER_SIZE];

/// A decoded frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFrame {
    /// Raw message type code
    pub msg_type: u8,
    /// Flag bits
    pub flags: u8,
    /// Key epoch of the sender at send time
    pub epoch: u32,
    /// AEAD nonce
    pub nonce: [u8; sizes::NONCE_SIZE],
    /// AEAD output including the tag
    pub ciphertext: Vec<u8>,
}

impl ParsedFrame {
    /// Known message type, if the code is recognized
    pub fn message_type(&self) -> Option<MessageType> {
        MessageType::from_u8(self.msg_type)
    }

    /// Whether the sender declared PQC_ONLY keying
    pub fn is_pqc_only(&self) -> bool {
        self.flags & flags::PQC_ONLY != 0
    }
}

/// Encode a frame header.
///
/// The reserved byte is always written as zero.
pub fn encode_header(
    msg_type: u8,
    flags: u8,
    epoch: u32,
    nonce: &[u8],
    ciphertext_len: usize,
) -> FormatResult<HeaderBytes> {
    if nonce.len() != sizes::NONCE_SIZE {
        return Err(FormatError::InvalidNonceLength(nonce.len()));
    }
    let ct_len = u32::try_from(ciphertext_len)
        .map_err(|_| FormatError::CiphertextTooLarge(ciphertext_len))?;

    let mut header = [0u8; sizes::HEADER_SIZE];
    header[offsets::MAGIC..offsets::VERSION].copy_from_slice(&MAGIC);
    header[offsets::VERSION] = VERSION;
    header[offsets::MSG_TYPE] = msg_type;
    header[offsets::FLAGS] = flags;
    header[offsets::RESERVED] = 0;
    BigEndian::write_u32(&mut header[offsets::EPOCH..offsets::NONCE], epoch);
    header[offsets::NONCE..offsets::CIPHERTEXT_LEN].copy_from_slice(nonce);
    BigEndian::write_u32(&mut header[offsets::CIPHERTEXT_LEN..], ct_len);
    Ok(header)
}

/// Join an encoded header and its ciphertext into wire bytes
pub fn encode_frame(header: &HeaderBytes, ciphertext: &[u8]) -> Vec<u8> {
    let mut wire = BytesMut::with_capacity(header.len() + ciphertext.len());
    wire.put_slice(header);
    wire.put_slice(ciphertext);
    wire.to_vec()
}

/// Decode wire bytes into the header bytes and the parsed frame.
///
/// Validation order: length, magic, version, exact ciphertext length.
/// The reserved byte is ignored.
pub fn decode(wire: &[u8]) -> FormatResult<(&[u8], ParsedFrame)> {
    if wire.len() < sizes::HEADER_SIZE {
        return Err(FormatError::Truncated {
            needed: sizes::HEADER_SIZE,
            actual: wire.len(),
        });
    }
    let (header, ciphertext) = wire.split_at(sizes::HEADER_SIZE);

    let mut magic = [0u8; 4];
    magic.copy_from_slice(&header[offsets::MAGIC..offsets::VERSION]);
    if magic != MAGIC {
        return Err(FormatError::BadMagic(magic));
    }

    let version = header[offsets::VERSION];
    if version != VERSION {
        return Err(FormatError::UnsupportedVersion(version));
    }

    let declared = BigEndian::read_u32(&header[offsets::CIPHERTEXT_LEN..]) as usize;
    if declared != ciphertext.len() {
        return Err(FormatError::LengthMismatch {
            declared,
            actual: ciphertext.len(),
        });
    }

    let mut nonce = [0u8; sizes::NONCE_SIZE];
    nonce.copy_from_slice(&header[offsets::NONCE..offsets::CIPHERTEXT_LEN]);

    let frame = ParsedFrame {
        msg_type: header[offsets::MSG_TYPE],
        flags: header[offsets::FLAGS],
        epoch: BigEndian::read_u32(&header[offsets::EPOCH..offsets::NONCE]),
        nonce,
        ciphertext: ciphertext.to_vec(),
    };
    Ok((header, frame))
}
