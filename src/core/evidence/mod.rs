/*!
Evidence reconstruction over persisted audit events.

Everything here is read-only: functions take the ordered event list and
never modify or filter the log they were read from.
*/

pub mod summary;
pub mod claims;
pub mod timeline;

pub use summary::{AuditSummary, FrameCounts, SessionSummary, count_by_kind, frame_counts, session_key, session_timelines};
pub use claims::{Claim, ClaimReport, Verdict, is_handshake_rejection, verify, verify_all};
pub use timeline::{RoleTimeline, TimelineEntry, timeline_by_role};
