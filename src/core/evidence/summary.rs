/*!
Aggregate views over an audit event stream.
*/

use std::collections::BTreeMap;
use std::fmt;

use crate::core::audit::{AuditEvent, EventKind};

/// Counts of frame events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameCounts {
    pub frame_in: usize,
    pub frame_out: usize,
    pub frame_err: usize,
}

/// Number of events of each kind, keyed by kind name
pub fn count_by_kind(events: &[AuditEvent]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for event in events {
        *counts.entry(event.event.as_str().to_string()).or_insert(0) += 1;
    }
    counts
}

/// FRAME_IN / FRAME_OUT / FRAME_ERR totals
pub fn frame_counts(events: &[AuditEvent]) -> FrameCounts {
    events.iter().fold(FrameCounts::default(), |mut counts, event| {
        match event.event {
            EventKind::FrameIn => counts.frame_in += 1,
            EventKind::FrameOut => counts.frame_out += 1,
            EventKind::FrameErr => counts.frame_err += 1,
            _ => {}
        }
        counts
    })
}

/// Grouping key of an event: its session id, else its role, else "?"
pub fn session_key(event: &AuditEvent) -> &str {
    event
        .session_id
        .as_deref()
        .or(event.role.as_deref())
        .unwrap_or("?")
}

/// What one session's events show about its epochs and modes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    /// Session id (or fallback key)
    pub key: String,
    /// Number of events recorded for the session
    pub events: usize,
    /// Lowest and highest epoch observed
    pub epoch_range: Option<(u32, u32)>,
    /// Observed modes with consecutive repeats collapsed
    pub modes: Vec<String>,
}

impl SessionSummary {
    fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            events: 0,
            epoch_range: None,
            modes: Vec::new(),
        }
    }

    fn observe(&mut self, event: &AuditEvent) {
        self.events += 1;
        if let Some(epoch) = event.epoch {
            self.epoch_range = Some(match self.epoch_range {
                Some((lo, hi)) => (lo.min(epoch), hi.max(epoch)),
                None => (epoch, epoch),
            });
        }
        if let Some(mode) = event.mode.as_deref() {
            if self.modes.last().map(String::as_str) != Some(mode) {
                self.modes.push(mode.to_string());
            }
        }
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "- session_id={} ({} events)", self.key, self.events)?;
        match self.epoch_range {
            Some((lo, hi)) => writeln!(f, "  epoch range: {lo} -> {hi}")?,
            None => writeln!(f, "  epoch range: -")?,
        }
        if !self.modes.is_empty() {
            writeln!(f, "  mode transitions: {}", self.modes.join(" -> "))?;
        }
        Ok(())
    }
}

/// Per-session epoch ranges and mode transitions, ordered by session key
pub fn session_timelines(events: &[AuditEvent]) -> Vec<SessionSummary> {
    let mut sessions: BTreeMap<&str, SessionSummary> = BTreeMap::new();
    for event in events {
        let key = session_key(event);
        sessions
            .entry(key)
            .or_insert_with(|| SessionSummary::new(key))
            .observe(event);
    }
    sessions.into_values().collect()
}

/// Full report over an event stream
#[derive(Debug, Clone)]
pub struct AuditSummary {
    pub total: usize,
    pub by_kind: BTreeMap<String, usize>,
    pub frames: FrameCounts,
    pub sessions: Vec<SessionSummary>,
}

impl AuditSummary {
    pub fn from_events(events: &[AuditEvent]) -> Self {
        Self {
            total: events.len(),
            by_kind: count_by_kind(events),
            frames: frame_counts(events),
            sessions: session_timelines(events),
        }
    }
}

impl fmt::Display for AuditSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Audit Summary ===")?;
        writeln!(f, "events: {}", self.total)?;
        writeln!(f, "frame_in: {}", self.frames.frame_in)?;
        writeln!(f, "frame_out: {}", self.frames.frame_out)?;
        writeln!(f, "frame_err: {}", self.frames.frame_err)?;
        for (kind, count) in &self.by_kind {
            writeln!(f, "{kind}: {count}")?;
        }
        writeln!(f)?;
        writeln!(f, "=== Per Session ===")?;
        for session in &self.sessions {
            write!(f, "{session}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(kind: EventKind, sid: Option<&str>, epoch: Option<u32>, mode: Option<&str>) -> AuditEvent {
        let mut event = AuditEvent::new(kind);
        event.session_id = sid.map(str::to_string);
        event.epoch = epoch;
        event.mode = mode.map(str::to_string);
        event
    }

    #[test]
    fn test_counts() {
        let events = vec![
            ev(EventKind::SessionNew, None, None, None),
            ev(EventKind::FrameIn, None, None, None),
            ev(EventKind::FrameErr, None, None, None),
            ev(EventKind::FrameIn, None, None, None),
            ev(EventKind::FrameOut, None, None, None),
        ];

        let frames = frame_counts(&events);
        assert_eq!(frames, FrameCounts { frame_in: 2, frame_out: 1, frame_err: 1 });

        let by_kind = count_by_kind(&events);
        assert_eq!(by_kind["FRAME_IN"], 2);
        assert_eq!(by_kind["SESSION_NEW"], 1);
        assert!(!by_kind.contains_key("CLOSE"));
    }

    #[test]
    fn test_session_timelines_collapse_modes() {
        let events = vec![
            ev(EventKind::FrameIn, Some("a"), Some(1), Some("QKD_MIXED")),
            ev(EventKind::FrameOut, Some("a"), Some(1), Some("QKD_MIXED")),
            ev(EventKind::ModeChange, Some("a"), Some(1), Some("PQC_ONLY")),
            ev(EventKind::Rekey, Some("a"), Some(3), Some("PQC_ONLY")),
            ev(EventKind::FrameIn, Some("b"), None, None),
        ];

        let sessions = session_timelines(&events);
        assert_eq!(sessions.len(), 2);

        let a = &sessions[0];
        assert_eq!(a.key, "a");
        assert_eq!(a.events, 4);
        assert_eq!(a.epoch_range, Some((1, 3)));
        assert_eq!(a.modes, vec!["QKD_MIXED", "PQC_ONLY"]);

        let b = &sessions[1];
        assert_eq!(b.epoch_range, None);
        assert!(b.modes.is_empty());
    }

    #[test]
    fn test_session_key_fallbacks() {
        let mut event = AuditEvent::new(EventKind::FrameIn);
        assert_eq!(session_key(&event), "?");
        event.role = Some("client".into());
        assert_eq!(session_key(&event), "client");
        event.session_id = Some("abc".into());
        assert_eq!(session_key(&event), "abc");
    }

    #[test]
    fn test_summary_display() {
        let events = vec![ev(EventKind::FrameIn, Some("s1"), Some(1), Some("QKD_MIXED"))];
        let report = AuditSummary::from_events(&events).to_string();
        assert!(report.contains("frame_in: 1"));
        assert!(report.contains("session_id=s1"));
        assert!(report.contains("epoch range: 1 -> 1"));
    }
}
