/*!
Session construction.

`SessionBuilder` gathers the role, the shared policy, the audit sink and the
cryptographic capabilities, validates them together and produces a
`ProtocolSession` in INIT (or ESTABLISHED, when pre-seeded for tests).
*/

use std::fmt;
use std::sync::Arc;

use rand::RngCore;
use zeroize::Zeroizing;

use crate::core::{
    audit::{MemoryAuditLog, SharedAuditSink},
    constants::sizes,
    crypto::{CryptoSuite, SymmetricAlgorithm},
    error::{Error, Result},
    memory::SecretBytes,
    policy::Policy,
    session::{
        session::ProtocolSession,
        state::{Mode, Role},
    },
};

/// Builder for [`ProtocolSession`]
pub struct SessionBuilder {
    role: Role,
    policy: Arc<Policy>,
    audit: Option<SharedAuditSink>,
    mode: Mode,
    symmetric: SymmetricAlgorithm,
    crypto: Option<CryptoSuite>,
    secret: Option<SecretBytes>,
    handshake_complete: bool,
}

impl SessionBuilder {
    /// Builder with the default policy, an in-memory audit log and QKD_MIXED mode
    pub fn new(role: Role) -> Self {
        Self {
            role,
            policy: Arc::new(Policy::default()),
            audit: None,
            mode: Mode::default(),
            symmetric: SymmetricAlgorithm::default(),
            crypto: None,
            secret: None,
            handshake_complete: false,
        }
    }

    /// Policy shared with other sessions
    pub fn policy(mut self, policy: impl Into<Arc<Policy>>) -> Self {
        self.policy = policy.into();
        self
    }

    /// Sink every transition is recorded into
    pub fn audit(mut self, sink: SharedAuditSink) -> Self {
        self.audit = Some(sink);
        self
    }

    /// Initial keying mode
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// AEAD used for frames; ignored when a full suite is supplied
    pub fn symmetric(mut self, algorithm: SymmetricAlgorithm) -> Self {
        self.symmetric = algorithm;
        self
    }

    /// Caller-supplied AEAD and KDF capabilities
    pub fn crypto_suite(mut self, suite: CryptoSuite) -> Self {
        self.crypto = Some(suite);
        self
    }

    /// Key material both endpoints were provisioned with
    pub fn handshake_secret(mut self, secret: &[u8]) -> Self {
        self.secret = Some(Zeroizing::new(secret.to_vec()));
        self
    }

    /// Construct the session already ESTABLISHED (testing only)
    pub fn handshake_complete(mut self, complete: bool) -> Self {
        self.handshake_complete = complete;
        self
    }

    /// Validate and build
    pub fn build(self) -> Result<ProtocolSession> {
        self.policy.validate()?;
        if self.policy.require_qkd && self.mode == Mode::PqcOnly {
            return Err(Error::InvalidInput(
                "policy requires QKD keying; PQC_ONLY mode is forbidden".into(),
            ));
        }

        let secret = match self.secret {
            Some(secret) if secret.is_empty() => {
                return Err(Error::InvalidInput("handshake secret must not be empty".into()));
            }
            Some(secret) => secret,
            None => {
                let mut secret = Zeroizing::new(vec![0u8; sizes::KEY_SIZE]);
                rand::rng().fill_bytes(&mut secret);
                secret
            }
        };
        let crypto = match self.crypto {
            Some(suite) => suite,
            None => CryptoSuite::new(self.symmetric)?,
        };
        let audit = self
            .audit
            .unwrap_or_else(|| Arc::new(MemoryAuditLog::new()));

        ProtocolSession::start(
            self.role,
            self.policy,
            audit,
            crypto,
            secret,
            self.mode,
            self.handshake_complete,
        )
    }
}

impl fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("role", &self.role)
            .field("policy", &self.policy)
            .field("mode", &self.mode)
            .field("symmetric", &self.symmetric)
            .field("has_secret", &self.secret.is_some())
            .field("handshake_complete", &self.handshake_complete)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{audit::AuditSink, session::state::SessionState};

    #[test]
    fn test_defaults() {
        let session = SessionBuilder::new(Role::Server).build().unwrap();
        assert_eq!(session.role(), Role::Server);
        assert_eq!(session.state(), SessionState::Init);
        assert_eq!(session.mode(), Mode::QkdMixed);
        assert_eq!(session.epoch(), 1);
        assert_eq!(session.audit_sink().read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_require_qkd_forbids_pqc_only() {
        let result = SessionBuilder::new(Role::Client)
            .policy(Policy::strict())
            .mode(Mode::PqcOnly)
            .build();
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_invalid_policy_rejected() {
        let result = SessionBuilder::new(Role::Client)
            .policy(Policy::default().with_rekey_bytes(0))
            .build();
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_empty_secret_rejected() {
        let result = SessionBuilder::new(Role::Client).handshake_secret(&[]).build();
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_session_ids_unique() {
        let a = SessionBuilder::new(Role::Client).build().unwrap();
        let b = SessionBuilder::new(Role::Client).build().unwrap();
        assert_ne!(a.session_id(), b.session_id());
        assert_eq!(a.session_id().len(), 16);
    }
}
