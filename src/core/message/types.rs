/*!
Message types for the QSP protocol.

`MessageType` is the one-byte code carried on the wire. `FrameType` is the
name a caller passes to `accept_frame` and the name recorded in the audit log.
*/

use std::fmt;
use std::str::FromStr;

use crate::core::error::Error;

/// Wire message type codes
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Application data (the only payload-bearing type)
    AppData = 0x01,
    /// Reserved rekey tick, rejected by the session until defined
    RekeyTick = 0x02,
}

impl MessageType {
    /// Convert a u8 value to a MessageType
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(MessageType::AppData),
            0x02 => Some(MessageType::RekeyTick),
            _ => None,
        }
    }

    /// Get the u8 value of this MessageType
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageType::AppData => write!(f, "APP_DATA"),
            MessageType::RekeyTick => write!(f, "REKEY_TICK"),
        }
    }
}

/// Header flag bits
pub mod flags {
    /// Sender is keyed in PQC_ONLY mode
    pub const PQC_ONLY: u8 = 0b0000_0001;
}

/// Frame types accepted at the session API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameType {
    /// Handshake trigger or peer handshake message
    Handshake,
    /// Application data
    AppData,
    /// Explicit rekey request
    Rekey,
    /// Explicit close
    Close,
}

impl FrameType {
    /// Name used at the API and in the audit log
    pub fn as_str(self) -> &'static str {
        match self {
            FrameType::Handshake => "HS",
            FrameType::AppData => "APP_DATA",
            FrameType::Rekey => "REKEY",
            FrameType::Close => "CLOSE",
        }
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FrameType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HS" => Ok(FrameType::Handshake),
            "APP_DATA" => Ok(FrameType::AppData),
            "REKEY" => Ok(FrameType::Rekey),
            "CLOSE" => Ok(FrameType::Close),
            "REKEY_TICK" => Err(Error::InvalidInput(
                "frame type REKEY_TICK is reserved".into(),
            )),
            other => Err(Error::InvalidInput(format!("unknown frame type: {other:?}"))),
        }
    }
}
