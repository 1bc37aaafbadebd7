/*!
Session management for the QSP protocol.

This module provides the session state machine, rekey scheduling and session
construction.
*/

// State management
pub mod state;

// Rekey scheduling
pub mod rotation;

// Session construction
pub mod builder;

// Protocol session
#[allow(clippy::module_inception)]
pub mod session;

// Re-export main session types
pub use self::state::{SessionState, Role, Mode, StateManager};
pub use self::rotation::{RekeyReason, RekeyTracker};
pub use self::builder::SessionBuilder;
pub use self::session::ProtocolSession;
