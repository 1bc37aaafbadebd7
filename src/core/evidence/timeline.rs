/*!
Per-role frame timelines for human inspection.
*/

use std::collections::BTreeMap;
use std::fmt;

use crate::core::audit::{AuditEvent, EventKind};

/// One frame event on a timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntry {
    /// Position in the original event stream
    pub index: usize,
    pub ts_ms: u64,
    /// Milliseconds since the first entry of the timeline
    pub offset_ms: u64,
    pub event: EventKind,
    pub frame_type: String,
    /// Sizes or error summary
    pub detail: String,
}

impl fmt::Display for TimelineEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "+{:>6}ms  {:<10} ft={:<10} {}",
            self.offset_ms,
            self.event.as_str(),
            self.frame_type,
            self.detail
        )
    }
}

/// Frame events of one role in timestamp order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleTimeline {
    pub role: String,
    pub entries: Vec<TimelineEntry>,
}

impl fmt::Display for RoleTimeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== role={} ==", self.role)?;
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        Ok(())
    }
}

fn describe(event: &AuditEvent) -> String {
    match event.event {
        EventKind::FrameErr => format!(
            "{} {}",
            event.err_type.as_deref().unwrap_or("-"),
            event.err.as_deref().unwrap_or("-")
        ),
        EventKind::FrameIn => match event.payload_len {
            Some(len) => format!("payload_len={len}"),
            None => String::new(),
        },
        EventKind::FrameOut => match event.out_len {
            Some(len) => format!("out_len={len}"),
            None => String::new(),
        },
        _ => String::new(),
    }
}

/// Group frame events by role and order each group by `ts_ms`.
///
/// The sort is stable, so events with equal timestamps keep their append
/// order. Events without a role are grouped under "-".
pub fn timeline_by_role(events: &[AuditEvent]) -> Vec<RoleTimeline> {
    let mut groups: BTreeMap<&str, Vec<(usize, &AuditEvent)>> = BTreeMap::new();
    for (index, event) in events.iter().enumerate() {
        if event.event.is_frame_event() {
            groups
                .entry(event.role.as_deref().unwrap_or("-"))
                .or_default()
                .push((index, event));
        }
    }

    groups
        .into_iter()
        .map(|(role, mut group)| {
            group.sort_by_key(|(_, event)| event.timestamp());
            let start = group.first().map(|(_, event)| event.timestamp()).unwrap_or(0);

            let entries = group
                .into_iter()
                .map(|(index, event)| TimelineEntry {
                    index,
                    ts_ms: event.timestamp(),
                    offset_ms: event.timestamp().saturating_sub(start),
                    event: event.event.clone(),
                    frame_type: event.frame_type.clone().unwrap_or_else(|| "-".into()),
                    detail: describe(event),
                })
                .collect();

            RoleTimeline {
                role: role.to_string(),
                entries,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(kind: EventKind, role: &str, ts: u64, frame_type: &str) -> AuditEvent {
        AuditEvent::new(kind).at(ts).with_role(role).with_frame_type(frame_type)
    }

    #[test]
    fn test_grouped_and_sorted() {
        let events = vec![
            AuditEvent::new(EventKind::SessionNew).at(0).with_role("client"),
            frame(EventKind::FrameIn, "client", 120, "APP_DATA"),
            frame(EventKind::FrameIn, "server", 50, "HS"),
            frame(EventKind::FrameIn, "client", 100, "HS"),
            frame(EventKind::FrameOut, "client", 100, "HS").with_out_len(37),
        ];

        let timelines = timeline_by_role(&events);
        assert_eq!(timelines.len(), 2);

        let client = &timelines[0];
        assert_eq!(client.role, "client");
        let order: Vec<usize> = client.entries.iter().map(|e| e.index).collect();
        assert_eq!(order, vec![3, 4, 1]);
        assert_eq!(client.entries[0].offset_ms, 0);
        assert_eq!(client.entries[2].offset_ms, 20);
        assert_eq!(client.entries[1].detail, "out_len=37");

        assert_eq!(timelines[1].role, "server");
        assert_eq!(timelines[1].entries.len(), 1);
    }

    #[test]
    fn test_error_rendering() {
        let events = vec![
            frame(EventKind::FrameErr, "client", 5, "APP_DATA")
                .with_error("HandshakeNotComplete", "handshake not complete"),
        ];
        let rendered = timeline_by_role(&events)[0].to_string();
        assert!(rendered.contains("== role=client =="));
        assert!(rendered.contains("FRAME_ERR"));
        assert!(rendered.contains("HandshakeNotComplete handshake not complete"));
    }

    #[test]
    fn test_missing_role() {
        let events = vec![AuditEvent::new(EventKind::FrameIn)];
        let timelines = timeline_by_role(&events);
        assert_eq!(timelines[0].role, "-");
        assert_eq!(timelines[0].entries[0].frame_type, "-");
    }
}
