/*!
Session state management for the QSP protocol.

This module defines the session lifecycle, endpoint roles and keying modes,
and the state machine that gates which frames a session accepts.
*/

use std::fmt;
use std::str::FromStr;

use crate::core::{error::Error, message::types::flags};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SessionState {
    /// No keys yet; only handshake frames are accepted
    Init,
    /// Keys derived; application data flows
    Established,
    /// Terminal; keys have been zeroized
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Init => write!(f, "INIT"),
            SessionState::Established => write!(f, "ESTABLISHED"),
            SessionState::Closed => write!(f, "CLOSED"),
        }
    }
}

/// Endpoint role in the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Client role (seals with the client-to-server key)
    Client,
    /// Server role (seals with the server-to-client key)
    Server,
}

impl Role {
    /// Name used at the API and in the audit log
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Server => "server",
        }
    }

    /// The other endpoint
    pub fn peer(self) -> Self {
        match self {
            Role::Client => Role::Server,
            Role::Server => Role::Client,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Role::Client),
            "server" => Ok(Role::Server),
            other => Err(Error::InvalidInput(format!(
                "role must be \"client\" or \"server\", got {other:?}"
            ))),
        }
    }
}

/// Keying mode of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Post-quantum keys mixed with QKD-provided material
    #[default]
    QkdMixed,
    /// Post-quantum keys only
    PqcOnly,
}

impl Mode {
    /// Name used in the audit log
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::QkdMixed => "QKD_MIXED",
            Mode::PqcOnly => "PQC_ONLY",
        }
    }

    /// Mode declared by a header or handshake flags byte
    pub fn from_flags(bits: u8) -> Self {
        if bits & flags::PQC_ONLY != 0 {
            Mode::PqcOnly
        } else {
            Mode::QkdMixed
        }
    }

    /// Flags byte declaring this mode
    pub fn flags(self) -> u8 {
        match self {
            Mode::QkdMixed => 0,
            Mode::PqcOnly => flags::PQC_ONLY,
        }
    }

    pub fn is_pqc_only(self) -> bool {
        self == Mode::PqcOnly
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session state manager
///
/// Handles state transitions and validation of operations
/// based on the current session state.
#[derive(Debug, Clone, Copy)]
pub struct StateManager {
    /// Current state of the session
    state: SessionState,
    /// Role of this endpoint
    role: Role,
}

impl StateManager {
    /// Create a new state manager in INIT
    pub fn new(role: Role) -> Self {
        Self {
            state: SessionState::Init,
            role,
        }
    }

    /// Get the current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Get the role
    pub fn role(&self) -> Role {
        self.role
    }

    /// Check if a handshake can derive keys
    pub fn can_handshake(&self) -> bool {
        self.state == SessionState::Init
    }

    /// Check if data transfer is allowed
    pub fn can_transfer_data(&self) -> bool {
        self.state == SessionState::Established
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    /// Transition to the established state
    pub fn transition_to_established(&mut self) {
        if self.state == SessionState::Init {
            self.state = SessionState::Established;
        }
    }

    /// Transition to the closed state
    pub fn transition_to_closed(&mut self) {
        self.state = SessionState::Closed;
    }
}
