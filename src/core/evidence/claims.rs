/*!
Claim verification over an audit event stream.

A claim is a property the log must demonstrate. Verification is a pure
function of the ordered events: it reports whether the claim holds, fails, or
has no evidence either way, and points at the event that decided it.
*/

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::core::{
    audit::{AuditEvent, EventKind},
    evidence::summary::session_key,
};

const HANDSHAKE_NOT_COMPLETE: &str = "HandshakeNotComplete";
const HANDSHAKE_NOT_COMPLETE_MSG: &str = "handshake not complete";

/// A verifiable property of a session log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Claim {
    /// APP_DATA is rejected before the handshake, ahead of any accepted APP_DATA
    A1,
    /// Some handshake completed
    HandshakeSucceeded,
    /// APP_DATA was accepted after a completed handshake
    AppDataAfterHandshake,
    /// No frame is accepted after a session closes
    NoTrafficAfterClose,
    /// Epochs never decrease within a session
    EpochMonotonic,
}

impl Claim {
    pub const ALL: [Claim; 5] = [
        Claim::A1,
        Claim::HandshakeSucceeded,
        Claim::AppDataAfterHandshake,
        Claim::NoTrafficAfterClose,
        Claim::EpochMonotonic,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Claim::A1 => "A1",
            Claim::HandshakeSucceeded => "HandshakeSucceeded",
            Claim::AppDataAfterHandshake => "AppDataAfterHandshake",
            Claim::NoTrafficAfterClose => "NoTrafficAfterClose",
            Claim::EpochMonotonic => "EpochMonotonic",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Claim::A1 => "APP_DATA rejected before handshake (fail-closed)",
            Claim::HandshakeSucceeded => "handshake completed",
            Claim::AppDataAfterHandshake => "APP_DATA accepted after handshake",
            Claim::NoTrafficAfterClose => "no frame accepted after close",
            Claim::EpochMonotonic => "key epochs never decrease",
        }
    }
}

impl fmt::Display for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of verifying a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
    /// The log holds no evidence for or against the claim
    Missing,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => write!(f, "OK"),
            Verdict::Fail => write!(f, "FAIL"),
            Verdict::Missing => write!(f, "MISSING"),
        }
    }
}

/// Result of verifying one claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimReport {
    pub claim: Claim,
    pub verdict: Verdict,
    /// Index of the deciding event in the stream
    pub evidence: Option<usize>,
    pub detail: String,
}

impl ClaimReport {
    fn new(claim: Claim, verdict: Verdict, evidence: Option<usize>, detail: impl Into<String>) -> Self {
        Self {
            claim,
            verdict,
            evidence,
            detail: detail.into(),
        }
    }

    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }
}

impl fmt::Display for ClaimReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] Claim {}: {}", self.verdict, self.claim, self.claim.description())?;
        if let Some(index) = self.evidence {
            write!(f, " (event #{index})")?;
        }
        if !self.detail.is_empty() {
            write!(f, " - {}", self.detail)?;
        }
        Ok(())
    }
}

/// Whether an event records a rejection for an incomplete handshake
pub fn is_handshake_rejection(event: &AuditEvent) -> bool {
    event.err_type.as_deref() == Some(HANDSHAKE_NOT_COMPLETE)
        || event
            .err
            .as_deref()
            .is_some_and(|err| err.to_ascii_lowercase().contains(HANDSHAKE_NOT_COMPLETE_MSG))
}

/// Verify one claim against the ordered event stream
pub fn verify(claim: Claim, events: &[AuditEvent]) -> ClaimReport {
    match claim {
        Claim::A1 => verify_a1(events),
        Claim::HandshakeSucceeded => verify_handshake(events),
        Claim::AppDataAfterHandshake => verify_app_data_after_handshake(events),
        Claim::NoTrafficAfterClose => verify_no_traffic_after_close(events),
        Claim::EpochMonotonic => verify_epoch_monotonic(events),
    }
}

/// Verify every known claim
pub fn verify_all(events: &[AuditEvent]) -> Vec<ClaimReport> {
    Claim::ALL.iter().map(|&claim| verify(claim, events)).collect()
}

fn verify_a1(events: &[AuditEvent]) -> ClaimReport {
    let mut accepted: HashSet<&str> = HashSet::new();
    let mut late = None;

    for (index, event) in events.iter().enumerate() {
        let session = session_key(event);
        if event.is_frame(&EventKind::FrameOut, "APP_DATA") {
            accepted.insert(session);
        } else if event.is_frame(&EventKind::FrameErr, "APP_DATA") && is_handshake_rejection(event) {
            if !accepted.contains(session) {
                let detail = format!(
                    "{}: {}",
                    event.err_type.as_deref().unwrap_or("-"),
                    event.err.as_deref().unwrap_or("-")
                );
                return ClaimReport::new(Claim::A1, Verdict::Pass, Some(index), detail);
            }
            late.get_or_insert(index);
        }
    }

    match late {
        Some(index) => ClaimReport::new(
            Claim::A1,
            Verdict::Fail,
            Some(index),
            "rejection recorded only after APP_DATA was already accepted",
        ),
        None => ClaimReport::new(Claim::A1, Verdict::Missing, None, "no APP_DATA rejection found"),
    }
}

fn verify_handshake(events: &[AuditEvent]) -> ClaimReport {
    match events.iter().position(|e| e.is_frame(&EventKind::FrameOut, "HS")) {
        Some(index) => ClaimReport::new(Claim::HandshakeSucceeded, Verdict::Pass, Some(index), ""),
        None => ClaimReport::new(Claim::HandshakeSucceeded, Verdict::Missing, None, "no accepted HS frame"),
    }
}

fn verify_app_data_after_handshake(events: &[AuditEvent]) -> ClaimReport {
    let mut established: HashSet<&str> = HashSet::new();
    let mut orphan = None;

    for (index, event) in events.iter().enumerate() {
        let session = session_key(event);
        let seeded = event.event == EventKind::SessionNew && event.handshake_complete == Some(true);
        if seeded || event.is_frame(&EventKind::FrameOut, "HS") {
            established.insert(session);
        } else if event.is_frame(&EventKind::FrameOut, "APP_DATA") {
            if established.contains(session) {
                return ClaimReport::new(Claim::AppDataAfterHandshake, Verdict::Pass, Some(index), "");
            }
            orphan.get_or_insert(index);
        }
    }

    match orphan {
        Some(index) => ClaimReport::new(
            Claim::AppDataAfterHandshake,
            Verdict::Fail,
            Some(index),
            "APP_DATA accepted without a recorded handshake",
        ),
        None => ClaimReport::new(
            Claim::AppDataAfterHandshake,
            Verdict::Missing,
            None,
            "no accepted APP_DATA frame",
        ),
    }
}

fn verify_no_traffic_after_close(events: &[AuditEvent]) -> ClaimReport {
    let mut closed: HashSet<&str> = HashSet::new();
    let mut first_close = None;

    for (index, event) in events.iter().enumerate() {
        let session = session_key(event);
        match event.event {
            EventKind::Close => {
                closed.insert(session);
                first_close.get_or_insert(index);
            }
            EventKind::FrameOut if closed.contains(session) => {
                // The CLOSE frame itself is acknowledged after the close mark
                if event.frame_type.as_deref() != Some("CLOSE") {
                    return ClaimReport::new(
                        Claim::NoTrafficAfterClose,
                        Verdict::Fail,
                        Some(index),
                        format!("session {session} accepted a frame after close"),
                    );
                }
            }
            _ => {}
        }
    }

    match first_close {
        Some(index) => ClaimReport::new(Claim::NoTrafficAfterClose, Verdict::Pass, Some(index), ""),
        None => ClaimReport::new(Claim::NoTrafficAfterClose, Verdict::Missing, None, "no session closed"),
    }
}

fn verify_epoch_monotonic(events: &[AuditEvent]) -> ClaimReport {
    let mut last: HashMap<&str, u32> = HashMap::new();
    let mut observed = false;

    for (index, event) in events.iter().enumerate() {
        let Some(epoch) = event.epoch else { continue };
        observed = true;
        let session = session_key(event);
        if let Some(&previous) = last.get(session) {
            if epoch < previous {
                return ClaimReport::new(
                    Claim::EpochMonotonic,
                    Verdict::Fail,
                    Some(index),
                    format!("session {session} went from epoch {previous} to {epoch}"),
                );
            }
        }
        last.insert(session, epoch);
    }

    if observed {
        ClaimReport::new(Claim::EpochMonotonic, Verdict::Pass, None, format!("{} sessions", last.len()))
    } else {
        ClaimReport::new(Claim::EpochMonotonic, Verdict::Missing, None, "no epochs recorded")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(kind: EventKind, sid: &str, frame_type: &str) -> AuditEvent {
        AuditEvent::new(kind).with_session_id(sid).with_frame_type(frame_type)
    }

    fn rejection(sid: &str) -> AuditEvent {
        frame(EventKind::FrameErr, sid, "APP_DATA").with_error("HandshakeNotComplete", "handshake not complete")
    }

    #[test]
    fn test_a1_pass() {
        let events = vec![
            frame(EventKind::FrameIn, "s", "APP_DATA"),
            rejection("s"),
            frame(EventKind::FrameOut, "s", "HS"),
            frame(EventKind::FrameOut, "s", "APP_DATA"),
        ];
        let report = verify(Claim::A1, &events);
        assert_eq!(report.verdict, Verdict::Pass);
        assert_eq!(report.evidence, Some(1));
        assert!(report.to_string().starts_with("[OK] Claim A1"));
    }

    #[test]
    fn test_a1_matches_message_without_kind() {
        let mut event = frame(EventKind::FrameErr, "s", "APP_DATA");
        event.err = Some("Handshake not complete".into());
        assert!(verify(Claim::A1, &[event]).passed());
    }

    #[test]
    fn test_a1_fail_when_rejection_follows_acceptance() {
        let events = vec![frame(EventKind::FrameOut, "s", "APP_DATA"), rejection("s")];
        let report = verify(Claim::A1, &events);
        assert_eq!(report.verdict, Verdict::Fail);
        assert_eq!(report.evidence, Some(1));
    }

    #[test]
    fn test_a1_other_session_does_not_interfere() {
        let events = vec![frame(EventKind::FrameOut, "other", "APP_DATA"), rejection("s")];
        assert!(verify(Claim::A1, &events).passed());
    }

    #[test]
    fn test_a1_missing() {
        let events = vec![frame(EventKind::FrameErr, "s", "APP_DATA").with_error("AuthenticationFailed", "x")];
        assert_eq!(verify(Claim::A1, &events).verdict, Verdict::Missing);
        assert_eq!(verify(Claim::A1, &[]).verdict, Verdict::Missing);
    }

    #[test]
    fn test_app_data_after_handshake() {
        let good = vec![frame(EventKind::FrameOut, "s", "HS"), frame(EventKind::FrameOut, "s", "APP_DATA")];
        assert!(verify(Claim::AppDataAfterHandshake, &good).passed());

        let seeded = vec![
            AuditEvent::new(EventKind::SessionNew).with_session_id("s").with_handshake_complete(true),
            frame(EventKind::FrameOut, "s", "APP_DATA"),
        ];
        assert!(verify(Claim::AppDataAfterHandshake, &seeded).passed());

        let bad = vec![frame(EventKind::FrameOut, "s", "APP_DATA")];
        assert_eq!(verify(Claim::AppDataAfterHandshake, &bad).verdict, Verdict::Fail);
    }

    #[test]
    fn test_no_traffic_after_close() {
        let events = vec![
            AuditEvent::new(EventKind::Close).with_session_id("s"),
            frame(EventKind::FrameOut, "s", "CLOSE"),
            frame(EventKind::FrameErr, "s", "APP_DATA"),
        ];
        assert!(verify(Claim::NoTrafficAfterClose, &events).passed());

        let mut leaked = events.clone();
        leaked.push(frame(EventKind::FrameOut, "s", "APP_DATA"));
        let report = verify(Claim::NoTrafficAfterClose, &leaked);
        assert_eq!(report.verdict, Verdict::Fail);
        assert_eq!(report.evidence, Some(3));
    }

    #[test]
    fn test_epoch_monotonic() {
        let events = vec![
            AuditEvent::new(EventKind::FrameIn).with_session_id("a").with_epoch(1),
            AuditEvent::new(EventKind::FrameIn).with_session_id("b").with_epoch(5),
            AuditEvent::new(EventKind::Rekey).with_session_id("a").with_epoch(2),
        ];
        assert!(verify(Claim::EpochMonotonic, &events).passed());

        let mut regressed = events.clone();
        regressed.push(AuditEvent::new(EventKind::FrameIn).with_session_id("a").with_epoch(1));
        assert_eq!(verify(Claim::EpochMonotonic, &regressed).verdict, Verdict::Fail);
    }

    #[test]
    fn test_verify_all_covers_every_claim() {
        let reports = verify_all(&[]);
        assert_eq!(reports.len(), Claim::ALL.len());
        assert!(reports.iter().all(|r| r.verdict == Verdict::Missing));
    }
}
