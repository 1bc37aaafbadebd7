/*!
High-level API for the QSP protocol.

Thin helpers for the common flow: open an audit log, create a session for a
role, and push frames through it.

```no_run
use qsp_protocol::api::{open_audit_log, send_frame, session_new};

let log = open_audit_log("out/audit.jsonl")?;
let mut node = session_new("server", false, log)?;

assert!(send_frame(&mut node, "APP_DATA", b"too early").is_err());
let hello = send_frame(&mut node, "HS", b"")?;
let sealed = send_frame(&mut node, "APP_DATA", b"hello")?;
# let _ = (hello, sealed);
# Ok::<(), qsp_protocol::Error>(())
```

Sessions created by `session_new` draw a random secret and can only talk to
themselves. Two endpoints that exchange data share provisioned key material
through `session_with_secret`:

```no_run
use qsp_protocol::Policy;
use qsp_protocol::api::{open_audit_log, receive_frame, send_frame, session_with_secret};

let log = open_audit_log("out/audit.jsonl")?;
let secret = [0x5au8; 32];
let mut client = session_with_secret("client", Policy::default(), &secret, log.clone())?;
let mut server = session_with_secret("server", Policy::default(), &secret, log)?;

let hello = send_frame(&mut client, "HS", b"")?;
send_frame(&mut server, "HS", &hello)?;
let wire = send_frame(&mut client, "APP_DATA", b"hello")?;
assert_eq!(receive_frame(&mut server, &wire)?, b"hello");
# Ok::<(), qsp_protocol::Error>(())
```
*/

use std::path::Path;
use std::sync::Arc;

use crate::core::{
    audit::{JsonlAuditLog, SharedAuditSink},
    error::Result,
    policy::Policy,
    session::{ProtocolSession, Role, SessionBuilder},
};

/// Open (or create) a JSONL audit log to share between sessions
pub fn open_audit_log(path: impl AsRef<Path>) -> Result<SharedAuditSink> {
    Ok(Arc::new(JsonlAuditLog::open(path)?))
}

/// Create a session for `role` ("client" or "server") with the default policy
pub fn session_new(role: &str, handshake_complete: bool, audit: SharedAuditSink) -> Result<ProtocolSession> {
    session_with_policy(role, Policy::default(), handshake_complete, audit)
}

/// Create a session for `role` under an explicit policy
pub fn session_with_policy(
    role: &str,
    policy: impl Into<Arc<Policy>>,
    handshake_complete: bool,
    audit: SharedAuditSink,
) -> Result<ProtocolSession> {
    let role: Role = role.parse()?;
    SessionBuilder::new(role)
        .policy(policy)
        .audit(audit)
        .handshake_complete(handshake_complete)
        .build()
}

/// Create a session for `role` keyed from provisioned secret material.
///
/// Both endpoints must pass the same secret; the handshake then binds the
/// traffic keys to a fresh context.
pub fn session_with_secret(
    role: &str,
    policy: impl Into<Arc<Policy>>,
    secret: &[u8],
    audit: SharedAuditSink,
) -> Result<ProtocolSession> {
    let role: Role = role.parse()?;
    SessionBuilder::new(role)
        .policy(policy)
        .audit(audit)
        .handshake_secret(secret)
        .build()
}

/// Submit a caller-side frame (`HS`, `APP_DATA`, `REKEY`, `CLOSE`)
pub fn send_frame(session: &mut ProtocolSession, frame_type: &str, payload: &[u8]) -> Result<Vec<u8>> {
    session.accept_frame(frame_type, payload)
}

/// Open a sealed frame received from the peer
pub fn receive_frame(session: &mut ProtocolSession, wire: &[u8]) -> Result<Vec<u8>> {
    session.accept_wire(wire)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{audit::{AuditSink, MemoryAuditLog}, error::Error};

    #[test]
    fn test_role_validation() {
        let log: SharedAuditSink = Arc::new(MemoryAuditLog::new());
        assert!(session_new("client", false, log.clone()).is_ok());
        assert!(session_new("server", true, log.clone()).is_ok());
        assert!(matches!(session_new("proxy", false, log.clone()), Err(Error::InvalidInput(_))));
        assert_eq!(log.read_all().unwrap().len(), 2);
    }

    #[test]
    fn test_send_and_receive() {
        let log: SharedAuditSink = Arc::new(MemoryAuditLog::new());
        let secret = [0x5au8; 32];
        let mut client = session_with_secret("client", Policy::default(), &secret, log.clone()).unwrap();
        let mut server = session_with_secret("server", Policy::default(), &secret, log.clone()).unwrap();

        let hello = send_frame(&mut client, "HS", b"").unwrap();
        let reply = send_frame(&mut server, "HS", &hello).unwrap();
        send_frame(&mut client, "HS", &reply).unwrap();

        let wire = send_frame(&mut client, "APP_DATA", b"hi").unwrap();
        assert_eq!(receive_frame(&mut server, &wire).unwrap(), b"hi");
        let wire = send_frame(&mut server, "APP_DATA", b"back").unwrap();
        assert_eq!(receive_frame(&mut client, &wire).unwrap(), b"back");
        assert!(!server.is_closed());
    }

    #[test]
    fn test_empty_secret_rejected() {
        let log: SharedAuditSink = Arc::new(MemoryAuditLog::new());
        assert!(matches!(
            session_with_secret("client", Policy::default(), b"", log),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_unrelated_secrets_fail_closed() {
        let log: SharedAuditSink = Arc::new(MemoryAuditLog::new());
        let mut client = session_new("client", false, log.clone()).unwrap();
        let mut server = session_new("server", false, log).unwrap();

        let hello = send_frame(&mut client, "HS", b"").unwrap();
        send_frame(&mut server, "HS", &hello).unwrap();
        let wire = send_frame(&mut client, "APP_DATA", b"hi").unwrap();
        assert!(matches!(receive_frame(&mut server, &wire), Err(Error::AuthenticationFailed)));
        assert!(server.is_closed());
    }
}
