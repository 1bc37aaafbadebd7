/*!
# QSP Protocol

A fail-closed session protocol core with an append-only audit trail.

## Overview

This library provides:

- A binary frame codec with a fixed 28-byte header that doubles as AEAD
  associated data
- A session state machine (`INIT` -> `ESTABLISHED` -> `CLOSED`) that rejects
  application data before the handshake, enforces mode-downgrade policy,
  rotates keys by traffic volume and age, and rejects stale epochs
- Traffic keys held in zeroizing buffers and wiped on every close path
- ChaCha20-Poly1305 (or AES-256-GCM with the `aes-gcm` feature) sealing and
  HKDF-SHA256 key derivation behind capability traits
- A newline-delimited JSON audit log recording every frame and lifecycle
  transition
- Evidence reconstruction: counts, per-session epoch/mode summaries, claim
  verification and per-role timelines over a persisted log

## Example

```
use std::sync::Arc;
use qsp_protocol::{MemoryAuditLog, Role, SessionBuilder, Error};

let log = Arc::new(MemoryAuditLog::new());
let secret = [7u8; 32];
let mut client = SessionBuilder::new(Role::Client).audit(log.clone()).handshake_secret(&secret).build()?;
let mut server = SessionBuilder::new(Role::Server).audit(log.clone()).handshake_secret(&secret).build()?;

assert!(matches!(client.accept_frame("APP_DATA", b"x"), Err(Error::HandshakeNotComplete)));

let hello = client.accept_frame("HS", b"")?;
server.accept_frame("HS", &hello)?;

let wire = client.accept_frame("APP_DATA", b"hello")?;
assert_eq!(server.accept_wire(&wire)?, b"hello");
# Ok::<(), Error>(())
```
*/

// Core protocol components
pub mod core;

// Convenience API
pub mod api;

// Re-export commonly used types for convenience
pub use crate::core::error::{Error, Result, FormatError, CryptoError, AuditError};
pub use crate::core::message::{MessageType, FrameType, ParsedFrame, HandshakeMessage, encode_header, encode_frame, decode};
pub use crate::core::session::{SessionState, Role, Mode, ProtocolSession, SessionBuilder, RekeyReason};
pub use crate::core::policy::Policy;
pub use crate::core::constants::{VERSION, MAGIC, sizes};
pub use crate::core::crypto::{Aead, Kdf, SymmetricAlgorithm, CryptoSuite, ChaCha20Poly1305Aead, HkdfSha256};
pub use crate::core::memory::SessionKeys;

// Re-export the audit pipeline
pub use crate::core::audit::{AuditEvent, EventKind, AuditSink, SharedAuditSink, JsonlAuditLog, MemoryAuditLog};

// Re-export evidence reconstruction
pub use crate::core::evidence::{AuditSummary, Claim, ClaimReport, Verdict, verify, verify_all, timeline_by_role, session_timelines};
