/*!
Audit event records.

One `AuditEvent` is one line of the newline-delimited JSON log. Only `ts_ms`
and `event` are always present; the remaining fields depend on the kind of
event. Unknown fields are kept in `extra` so a record read back and written
again loses nothing.
*/

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::AuditError;

/// Kind of an audit event
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    /// A session was constructed
    SessionNew,
    /// A frame entered the session
    FrameIn,
    /// A frame was accepted and produced output
    FrameOut,
    /// A frame was rejected
    FrameErr,
    /// The handshake completed
    Handshake,
    /// The key epoch advanced
    Rekey,
    /// The keying mode changed
    ModeChange,
    /// The session closed
    Close,
    /// Any kind this crate does not produce
    Other(String),
}

impl EventKind {
    /// Name written to the log
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::SessionNew => "SESSION_NEW",
            EventKind::FrameIn => "FRAME_IN",
            EventKind::FrameOut => "FRAME_OUT",
            EventKind::FrameErr => "FRAME_ERR",
            EventKind::Handshake => "HANDSHAKE",
            EventKind::Rekey => "REKEY",
            EventKind::ModeChange => "MODE_CHANGE",
            EventKind::Close => "CLOSE",
            EventKind::Other(name) => name,
        }
    }

    /// Whether this kind describes a frame transition
    pub fn is_frame_event(&self) -> bool {
        matches!(self, EventKind::FrameIn | EventKind::FrameOut | EventKind::FrameErr)
    }
}

impl Default for EventKind {
    fn default() -> Self {
        EventKind::Other("UNKNOWN".into())
    }
}

impl From<String> for EventKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "SESSION_NEW" => EventKind::SessionNew,
            "FRAME_IN" => EventKind::FrameIn,
            "FRAME_OUT" => EventKind::FrameOut,
            "FRAME_ERR" => EventKind::FrameErr,
            "HANDSHAKE" => EventKind::Handshake,
            "REKEY" => EventKind::Rekey,
            "MODE_CHANGE" => EventKind::ModeChange,
            "CLOSE" => EventKind::Close,
            _ => EventKind::Other(name),
        }
    }
}

impl From<&str> for EventKind {
    fn from(name: &str) -> Self {
        EventKind::from(name.to_string())
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One append-only audit record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Milliseconds since the Unix epoch; stamped on append when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts_ms: Option<u64>,

    /// Event kind
    #[serde(default)]
    pub event: EventKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_len: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_len: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epoch: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handshake_complete: Option<bool>,

    /// Fields this crate does not model
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Older writers name the kind `event_type` instead of `event`
const LEGACY_KIND_FIELD: &str = "event_type";

impl AuditEvent {
    /// Create an event of the given kind
    pub fn new(kind: impl Into<EventKind>) -> Self {
        Self {
            event: kind.into(),
            ..Self::default()
        }
    }

    /// Set an explicit timestamp
    pub fn at(mut self, ts_ms: u64) -> Self {
        self.ts_ms = Some(ts_ms);
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_frame_type(mut self, frame_type: impl Into<String>) -> Self {
        self.frame_type = Some(frame_type.into());
        self
    }

    pub fn with_payload_len(mut self, len: usize) -> Self {
        self.payload_len = Some(len as u64);
        self
    }

    pub fn with_out_len(mut self, len: usize) -> Self {
        self.out_len = Some(len as u64);
        self
    }

    /// Attach an error kind and its human-readable message
    pub fn with_error(mut self, err_type: impl Into<String>, err: impl Into<String>) -> Self {
        self.err_type = Some(err_type.into());
        self.err = Some(err.into());
        self
    }

    pub fn with_epoch(mut self, epoch: u32) -> Self {
        self.epoch = Some(epoch);
        self
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_handshake_complete(mut self, complete: bool) -> Self {
        self.handshake_complete = Some(complete);
        self
    }

    /// Timestamp for ordering; absent timestamps sort first
    pub fn timestamp(&self) -> u64 {
        self.ts_ms.unwrap_or(0)
    }

    /// Whether this is a frame event for the given frame type
    pub fn is_frame(&self, kind: &EventKind, frame_type: &str) -> bool {
        &self.event == kind && self.frame_type.as_deref() == Some(frame_type)
    }

    /// Encode as one log line (without the trailing newline)
    pub fn to_json_line(&self) -> Result<String, AuditError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode one log line, accepting the legacy `event_type` key
    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        let mut event: AuditEvent = serde_json::from_str(line)?;
        let missing_kind = matches!(&event.event, EventKind::Other(name) if name == "UNKNOWN");
        if missing_kind {
            if let Some(kind) = event.extra.get(LEGACY_KIND_FIELD).and_then(Value::as_str) {
                event.event = EventKind::from(kind);
                event.extra.remove(LEGACY_KIND_FIELD);
            }
        }
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in [
            EventKind::SessionNew,
            EventKind::FrameIn,
            EventKind::FrameOut,
            EventKind::FrameErr,
            EventKind::Handshake,
            EventKind::Rekey,
            EventKind::ModeChange,
            EventKind::Close,
        ] {
            assert_eq!(EventKind::from(kind.as_str()), kind);
        }
        assert_eq!(EventKind::from("CUSTOM_MARK"), EventKind::Other("CUSTOM_MARK".into()));
    }

    #[test]
    fn test_serialization_skips_absent_fields() {
        let event = AuditEvent::new(EventKind::FrameIn)
            .at(1000)
            .with_role("server")
            .with_frame_type("APP_DATA")
            .with_payload_len(1);

        let line = event.to_json_line().unwrap();
        assert_eq!(
            line,
            r#"{"ts_ms":1000,"event":"FRAME_IN","role":"server","frame_type":"APP_DATA","payload_len":1}"#
        );
    }

    #[test]
    fn test_unknown_and_missing_fields_tolerated() {
        let event = AuditEvent::from_json_line(r#"{"event":"FRAME_OUT","color":"blue"}"#).unwrap();
        assert_eq!(event.event, EventKind::FrameOut);
        assert_eq!(event.ts_ms, None);
        assert_eq!(event.timestamp(), 0);
        assert_eq!(event.extra.get("color"), Some(&Value::String("blue".into())));

        let line = event.to_json_line().unwrap();
        assert!(line.contains(r#""color":"blue""#));
    }

    #[test]
    fn test_legacy_event_type_key() {
        let event = AuditEvent::from_json_line(
            r#"{"ts_ms":5,"event_type":"CLOSE","session_id":"ab","epoch":2,"mode":"QKD_MIXED"}"#,
        )
        .unwrap();
        assert_eq!(event.event, EventKind::Close);
        assert_eq!(event.epoch, Some(2));
        assert!(event.extra.is_empty());
    }

    #[test]
    fn test_missing_kind_defaults_to_unknown() {
        let event = AuditEvent::from_json_line(r#"{"ts_ms":5}"#).unwrap();
        assert_eq!(event.event.as_str(), "UNKNOWN");
    }
}
