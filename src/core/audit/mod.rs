/*!
Append-only audit pipeline.

Every session transition is recorded as an `AuditEvent` in a shared
`AuditSink` before the transition's result is released to the caller.
*/

pub mod event;
pub mod sink;

pub use event::{AuditEvent, EventKind};
pub use sink::{AuditResult, AuditSink, JsonlAuditLog, MemoryAuditLog, SharedAuditSink, now_ms, parse_jsonl};
