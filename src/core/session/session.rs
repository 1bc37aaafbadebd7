/*!
Protocol session for the QSP protocol.

A `ProtocolSession` owns the handshake state, the current key epoch, the
negotiated mode and the per-direction traffic keys of one endpoint. Every
frame passes through [`ProtocolSession::accept_frame`] (caller-side frames)
or [`ProtocolSession::accept_wire`] (sealed frames from the peer), and every
call is mirrored into the audit sink before it returns:

```text
FRAME_IN -> [HANDSHAKE | REKEY | MODE_CHANGE | CLOSE]* -> FRAME_OUT | FRAME_ERR
```

A session is single-owner. Calls on one session must be serialized by the
caller; the audit sink may be shared between sessions.
*/

use std::sync::Arc;

use log::{debug, error, info, warn};
use rand::RngCore;
use zeroize::{Zeroize, Zeroizing};

use crate::core::{
    audit::{AuditEvent, EventKind, SharedAuditSink},
    constants::{
        INITIAL_EPOCH, KEY_LABEL, LABEL_CLIENT_TO_SERVER, LABEL_SERVER_TO_CLIENT,
        sizes::{self, offsets},
    },
    crypto::{CryptoSuite, NonceSequence},
    error::{CryptoError, Error, Result},
    memory::{SecretBytes, SessionKeys},
    message::{FrameType, HandshakeMessage, MessageType, decode, encode_frame, encode_header},
    policy::Policy,
    session::{
        builder::SessionBuilder,
        rotation::{RekeyReason, RekeyTracker},
        state::{Mode, Role, SessionState, StateManager},
    },
};

type HandshakeContext = [u8; sizes::HANDSHAKE_CONTEXT_SIZE];

/// One endpoint of a QSP session
pub struct ProtocolSession {
    /// Opaque random identifier, hex encoded
    session_id: String,

    /// Lifecycle state and role
    state: StateManager,

    /// Shared, read-only policy
    policy: Arc<Policy>,

    /// Where every transition is recorded
    audit: SharedAuditSink,

    /// AEAD and KDF capabilities
    crypto: CryptoSuite,

    /// Provisioned key material the traffic keys are derived from
    secret: SecretBytes,

    /// Handshake context the traffic keys are bound to
    context: HandshakeContext,

    /// Current key epoch, never decreases
    epoch: u32,

    /// Current keying mode
    mode: Mode,

    /// Traffic keys for the current epoch
    keys: SessionKeys,

    /// Nonces for the current tx key
    nonces: NonceSequence,

    /// Rekey triggers for the current epoch
    rekey: RekeyTracker,
}

impl ProtocolSession {
    /// Start building a session for the given role
    pub fn builder(role: Role) -> SessionBuilder {
        SessionBuilder::new(role)
    }

    /// Construct from a validated builder and record SESSION_NEW
    pub(super) fn start(
        role: Role,
        policy: Arc<Policy>,
        audit: SharedAuditSink,
        crypto: CryptoSuite,
        secret: SecretBytes,
        mode: Mode,
        handshake_complete: bool,
    ) -> Result<Self> {
        let mut id = [0u8; 8];
        rand::rng().fill_bytes(&mut id);

        let mut session = Self {
            session_id: hex::encode(id),
            state: StateManager::new(role),
            policy,
            audit,
            crypto,
            secret,
            context: random_context(),
            epoch: INITIAL_EPOCH,
            mode,
            keys: SessionKeys::empty(),
            nonces: NonceSequence::new(),
            rekey: RekeyTracker::new(),
        };

        if handshake_complete {
            let keys = session.derive_keys(&session.context, session.epoch)?;
            session.keys.replace(keys);
            session.state.transition_to_established();
        }

        info!(
            "session {} created: role={} mode={} handshake_complete={}",
            session.session_id, role, mode, handshake_complete
        );
        session.record(
            session
                .event(EventKind::SessionNew)
                .with_handshake_complete(handshake_complete)
                .with_detail(session.crypto.aead.algorithm().name()),
        )?;
        Ok(session)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn role(&self) -> Role {
        self.state.role()
    }

    pub fn state(&self) -> SessionState {
        self.state.state()
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// The sink this session records into
    pub fn audit_sink(&self) -> &SharedAuditSink {
        &self.audit
    }

    pub fn is_handshake_complete(&self) -> bool {
        self.state.can_transfer_data()
    }

    pub fn is_closed(&self) -> bool {
        self.state.is_closed()
    }

    /// Whether traffic keys are currently held
    pub fn has_keys(&self) -> bool {
        !self.keys.is_empty()
    }

    /// Wire bytes sealed under the current epoch
    pub fn bytes_sent(&self) -> u64 {
        self.rekey.bytes_sent()
    }

    /// Wire bytes opened under the current epoch
    pub fn bytes_recv(&self) -> u64 {
        self.rekey.bytes_recv()
    }

    /// Process one caller-side frame.
    ///
    /// * `HS` with an empty payload initiates the handshake; with a peer
    ///   handshake message it responds. Returns this endpoint's handshake
    ///   message. Once established, `HS` is acknowledged without rekeying.
    /// * `APP_DATA` seals the payload into a wire frame for the peer.
    /// * `REKEY` advances the epoch and returns it as 4 big-endian bytes.
    /// * `CLOSE` zeroizes the keys and returns nothing.
    pub fn accept_frame(&mut self, frame_type: &str, payload: &[u8]) -> Result<Vec<u8>> {
        // If FRAME_IN cannot be recorded the frame is not processed
        self.record(
            self.event(EventKind::FrameIn)
                .with_frame_type(frame_type)
                .with_payload_len(payload.len()),
        )?;

        let outcome = frame_type
            .parse::<FrameType>()
            .and_then(|frame| self.dispatch(frame, payload));
        self.finish(frame_type, outcome)
    }

    /// Open one sealed wire frame from the peer and return its plaintext
    pub fn accept_wire(&mut self, wire: &[u8]) -> Result<Vec<u8>> {
        let frame_type = inbound_frame_name(wire);
        self.record(
            self.event(EventKind::FrameIn)
                .with_frame_type(frame_type.as_str())
                .with_payload_len(wire.len())
                .with_detail("wire"),
        )?;

        let outcome = self.open_wire(wire);
        self.finish(&frame_type, outcome)
    }

    /// Close the session, zeroizing its keys. Closing twice is a no-op.
    pub fn close(&mut self, reason: &str) -> Result<()> {
        if self.state.is_closed() {
            return Ok(());
        }
        self.terminate(reason)
    }

    fn dispatch(&mut self, frame: FrameType, payload: &[u8]) -> Result<Vec<u8>> {
        if self.state.is_closed() {
            return Err(Error::SessionClosed);
        }

        match frame {
            FrameType::Handshake => self.handshake(payload),
            FrameType::AppData => self.seal_app_data(payload),
            FrameType::Rekey => {
                self.require_established()?;
                self.rekey(RekeyReason::Requested)?;
                Ok(self.epoch.to_be_bytes().to_vec())
            }
            FrameType::Close => {
                self.terminate("closed by caller")?;
                Ok(Vec::new())
            }
        }
    }

    /// Record the outcome of a frame, closing first if it was a protocol violation
    fn finish(&mut self, frame_type: &str, outcome: Result<Vec<u8>>) -> Result<Vec<u8>> {
        match outcome {
            Ok(out) => {
                self.record(
                    self.event(EventKind::FrameOut)
                        .with_frame_type(frame_type)
                        .with_out_len(out.len()),
                )?;
                Ok(out)
            }
            Err(err) => {
                if err.closes_session() && !self.state.is_closed() {
                    if self.policy.fail_closed {
                        warn!("session {}: {} on {}, closing", self.session_id, err, frame_type);
                        if let Err(audit_err) = self.terminate(&format!("fail-closed: {}", err.kind())) {
                            error!("session {}: close not recorded: {}", self.session_id, audit_err);
                        }
                    } else {
                        warn!("session {}: {} on {}, continuing", self.session_id, err, frame_type);
                    }
                }

                let event = self
                    .event(EventKind::FrameErr)
                    .with_frame_type(frame_type)
                    .with_error(err.kind(), err.to_string());
                if let Err(audit_err) = self.record(event) {
                    error!("session {}: FRAME_ERR not recorded: {}", self.session_id, audit_err);
                }
                Err(err)
            }
        }
    }

    fn handshake(&mut self, payload: &[u8]) -> Result<Vec<u8>> {
        let peer = if payload.is_empty() {
            None
        } else {
            Some(HandshakeMessage::from_bytes(payload)?)
        };
        let downgrade = match &peer {
            Some(msg) => self.admit_peer_mode(Mode::from_flags(msg.flags))?,
            None => false,
        };

        if !self.state.can_handshake() {
            if let Some(msg) = &peer {
                if msg.context != self.context {
                    return Err(Error::InvalidInput(
                        "handshake context does not match the established session".into(),
                    ));
                }
            }
            if downgrade {
                self.change_mode(Mode::PqcOnly)?;
            }
            debug!("session {}: handshake acknowledged at epoch {}", self.session_id, self.epoch);
            return Ok(self.handshake_message());
        }

        if downgrade {
            self.change_mode(Mode::PqcOnly)?;
        }
        let (context, reason) = match peer {
            Some(msg) => (msg.context, "responded"),
            None => (random_context(), "initiated"),
        };
        let keys = self.derive_keys(&context, self.epoch)?;

        // Nothing is committed unless HANDSHAKE is recorded
        self.record(
            self.event(EventKind::Handshake)
                .with_reason(reason)
                .with_handshake_complete(true),
        )?;
        self.context = context;
        self.keys.replace(keys);
        self.nonces.reset();
        self.rekey.reset();
        self.state.transition_to_established();

        info!(
            "session {}: handshake {} (role={}, peer={}, epoch={}, mode={})",
            self.session_id,
            reason,
            self.role(),
            self.role().peer(),
            self.epoch,
            self.mode
        );
        Ok(self.handshake_message())
    }

    fn seal_app_data(&mut self, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.require_established()?;
        if let Some(reason) = self.rekey.due(&self.policy) {
            self.rekey(reason)?;
        }

        let nonce = self.nonces.next_nonce()?;
        let ct_len = plaintext.len() + self.crypto.aead.tag_len();
        let header = encode_header(
            MessageType::AppData.as_u8(),
            self.mode.flags(),
            self.epoch,
            &nonce,
            ct_len,
        )?;
        let ciphertext = self.crypto.aead.seal(self.keys.tx(), &nonce, &header, plaintext)?;
        if ciphertext.len() != ct_len {
            return Err(Error::Crypto(CryptoError::SealFailed));
        }

        let wire = encode_frame(&header, &ciphertext);
        self.rekey.track_sent(wire.len());
        Ok(wire)
    }

    fn open_wire(&mut self, wire: &[u8]) -> Result<Vec<u8>> {
        if self.state.is_closed() {
            return Err(Error::SessionClosed);
        }

        let (header, frame) = decode(wire)?;
        let downgrade = self.admit_peer_mode(Mode::from_flags(frame.flags))?;
        self.require_established()?;

        if frame.message_type() != Some(MessageType::AppData) {
            return Err(Error::InvalidInput(format!(
                "message type 0x{:02x} is not accepted",
                frame.msg_type
            )));
        }
        if frame.epoch < self.epoch {
            return Err(Error::StaleEpoch {
                current: self.epoch,
                received: frame.epoch,
            });
        }

        let plaintext = if frame.epoch == self.epoch {
            self.crypto
                .aead
                .open(self.keys.rx(), &frame.nonce, header, &frame.ciphertext)?
        } else {
            // Peer rekeyed first; adopt its epoch only if the frame authenticates
            let candidate = self.derive_keys(&self.context, frame.epoch)?;
            let plaintext = self
                .crypto
                .aead
                .open(candidate.rx(), &frame.nonce, header, &frame.ciphertext)?;
            self.commit_rekey(frame.epoch, candidate, RekeyReason::PeerEpoch)?;
            plaintext
        };

        if downgrade {
            self.change_mode(Mode::PqcOnly)?;
        }
        self.rekey.track_received(wire.len());
        Ok(plaintext)
    }

    /// Apply the mode policy to a peer's declared mode.
    ///
    /// Returns true when the peer may move this session to PQC_ONLY.
    fn admit_peer_mode(&self, peer: Mode) -> Result<bool> {
        if peer == self.mode || peer == Mode::QkdMixed {
            return Ok(false);
        }
        if self.policy.require_qkd {
            return Err(Error::DowngradeRejected {
                reason: "policy requires QKD keying; peer declared PQC_ONLY".into(),
            });
        }
        if !self.policy.allow_downgrade {
            return Err(Error::DowngradeRejected {
                reason: format!("peer declared PQC_ONLY on a {} session", self.mode),
            });
        }
        Ok(true)
    }

    fn change_mode(&mut self, mode: Mode) -> Result<()> {
        let previous = self.mode;
        self.record(
            self.event(EventKind::ModeChange)
                .with_mode(mode.as_str())
                .with_reason("peer downgrade")
                .with_detail(format!("{previous} -> {mode}")),
        )?;
        self.mode = mode;
        warn!("session {}: mode changed {} -> {}", self.session_id, previous, mode);
        Ok(())
    }

    fn rekey(&mut self, reason: RekeyReason) -> Result<()> {
        let next = self
            .epoch
            .checked_add(1)
            .ok_or(Error::Crypto(CryptoError::KeyDerivationFailed))?;
        let keys = self.derive_keys(&self.context, next)?;
        self.commit_rekey(next, keys, reason)
    }

    fn commit_rekey(&mut self, epoch: u32, keys: SessionKeys, reason: RekeyReason) -> Result<()> {
        let previous = self.epoch;
        self.record(
            self.event(EventKind::Rekey)
                .with_epoch(epoch)
                .with_reason(reason.as_str())
                .with_detail(format!("epoch {previous} -> {epoch}")),
        )?;
        self.keys.replace(keys);
        self.epoch = epoch;
        self.nonces.reset();
        self.rekey.reset();

        info!("session {}: rekeyed epoch {} -> {} ({})", self.session_id, previous, epoch, reason);
        Ok(())
    }

    /// Zeroize keys, move to CLOSED, then record CLOSE.
    ///
    /// Unlike the other transitions, closing never waits on the audit sink.
    fn terminate(&mut self, reason: &str) -> Result<()> {
        self.keys.clear();
        self.secret.zeroize();
        self.state.transition_to_closed();

        info!("session {} closed: {}", self.session_id, reason);
        self.record(
            self.event(EventKind::Close)
                .with_reason(reason)
                .with_detail("keys zeroized"),
        )
    }

    fn require_established(&self) -> Result<()> {
        if self.state.can_transfer_data() {
            Ok(())
        } else {
            Err(Error::HandshakeNotComplete)
        }
    }

    /// Derive this endpoint's traffic keys for `context` and `epoch`
    fn derive_keys(&self, context: &HandshakeContext, epoch: u32) -> Result<SessionKeys> {
        let c2s = self.derive_direction(context, epoch, LABEL_CLIENT_TO_SERVER)?;
        let s2c = self.derive_direction(context, epoch, LABEL_SERVER_TO_CLIENT)?;
        Ok(match self.role() {
            Role::Client => SessionKeys::new(c2s, s2c),
            Role::Server => SessionKeys::new(s2c, c2s),
        })
    }

    fn derive_direction(&self, context: &HandshakeContext, epoch: u32, label: &[u8]) -> Result<SecretBytes> {
        let mut info = Vec::with_capacity(KEY_LABEL.len() + context.len() + 4 + label.len());
        info.extend_from_slice(KEY_LABEL);
        info.extend_from_slice(context);
        info.extend_from_slice(&epoch.to_be_bytes());
        info.extend_from_slice(label);

        let mut key = Zeroizing::new(vec![0u8; sizes::KEY_SIZE]);
        self.crypto.kdf.derive(&self.secret, &info, &mut key)?;
        Ok(key)
    }

    fn handshake_message(&self) -> Vec<u8> {
        HandshakeMessage::new(self.mode.is_pqc_only(), self.context).to_bytes()
    }

    /// An event stamped with this session's identity and current state
    fn event(&self, kind: EventKind) -> AuditEvent {
        AuditEvent::new(kind)
            .with_session_id(self.session_id.as_str())
            .with_role(self.role().as_str())
            .with_epoch(self.epoch)
            .with_mode(self.mode.as_str())
    }

    fn record(&self, event: AuditEvent) -> Result<()> {
        self.audit.append(event).map_err(Error::from)
    }
}

impl std::fmt::Debug for ProtocolSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolSession")
            .field("session_id", &self.session_id)
            .field("role", &self.role())
            .field("state", &self.state())
            .field("epoch", &self.epoch)
            .field("mode", &self.mode)
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

fn random_context() -> HandshakeContext {
    let mut context = [0u8; sizes::HANDSHAKE_CONTEXT_SIZE];
    rand::rng().fill_bytes(&mut context);
    context
}

/// Audit name of an inbound wire frame, read before any validation
fn inbound_frame_name(wire: &[u8]) -> String {
    match wire.get(offsets::MSG_TYPE) {
        Some(&code) => match MessageType::from_u8(code) {
            Some(kind) => kind.to_string(),
            None => format!("0x{code:02x}"),
        },
        None => "UNKNOWN".to_string(),
    }
}
