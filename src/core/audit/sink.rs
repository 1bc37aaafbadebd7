/*!
Audit sinks.

A sink is an append-only destination for audit events, shared by every
session that records into it. `JsonlAuditLog` writes one JSON object per line
to a file; `MemoryAuditLog` keeps events in memory for tests and embedding.

Each record is written with a single `write_all` of the complete line while
the sink's lock is held, so records from concurrent sessions never
interleave. A write that fails partway is truncated away before the error is
returned. A crash mid-write can leave at most one unterminated trailing line:
the reader ignores it and `JsonlAuditLog::open` cuts it off before appending.
*/

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, error, warn};

use crate::core::{audit::event::AuditEvent, error::AuditError};

/// Result type for audit operations
pub type AuditResult<T> = std::result::Result<T, AuditError>;

/// Append-only audit destination
pub trait AuditSink: Send + Sync {
    /// Durably append one event, stamping `ts_ms` if it is absent
    fn append(&self, event: AuditEvent) -> AuditResult<()>;

    /// Every event recorded so far, in append order
    fn read_all(&self) -> AuditResult<Vec<AuditEvent>>;
}

/// Shared handle to a sink
pub type SharedAuditSink = Arc<dyn AuditSink>;

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn stamp(mut event: AuditEvent) -> AuditEvent {
    if event.ts_ms.is_none() {
        event.ts_ms = Some(now_ms());
    }
    event
}

/// Parse newline-delimited JSON audit records.
///
/// Blank lines are skipped. A malformed complete line is an error; a
/// malformed final line without a terminating newline is a torn write and is
/// dropped.
pub fn parse_jsonl(text: &str) -> AuditResult<Vec<AuditEvent>> {
    let terminated = text.ends_with('\n');
    let lines: Vec<&str> = text.split('\n').collect();
    let last = lines.len().saturating_sub(1);

    let mut events = Vec::new();
    for (index, line) in lines.iter().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match AuditEvent::from_json_line(line) {
            Ok(event) => events.push(event),
            Err(_) if index == last && !terminated => {
                debug!("ignoring unterminated trailing audit record");
            }
            Err(source) => {
                return Err(AuditError::Parse {
                    line: index + 1,
                    source,
                });
            }
        }
    }
    Ok(events)
}

/// File-backed newline-delimited JSON audit log
#[derive(Debug)]
pub struct JsonlAuditLog {
    path: PathBuf,
    file: Mutex<File>,
    sync: bool,
}

impl JsonlAuditLog {
    /// Open (or create) the log for appending, creating parent directories
    pub fn open(path: impl AsRef<Path>) -> AuditResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;
        discard_torn_tail(&mut file)?;
        debug!("audit log opened at {}", path.display());

        Ok(Self {
            path,
            file: Mutex::new(file),
            sync: false,
        })
    }

    /// Also fsync after every record
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Location of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record in a log file. A missing file holds no records.
    pub fn read_path(path: impl AsRef<Path>) -> AuditResult<Vec<AuditEvent>> {
        match fs::read_to_string(path.as_ref()) {
            Ok(text) => parse_jsonl(&text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl AuditSink for JsonlAuditLog {
    fn append(&self, event: AuditEvent) -> AuditResult<()> {
        let mut line = serde_json::to_vec(&stamp(event))?;
        line.push(b'\n');

        let mut file = self.file.lock().map_err(|_| AuditError::Poisoned)?;
        let committed = file.metadata()?.len();
        if let Err(e) = write_record(&mut file, &line, self.sync) {
            if let Err(truncate_err) = file.set_len(committed) {
                error!(
                    "audit log {}: partial record not removed: {}",
                    self.path.display(),
                    truncate_err
                );
            }
            return Err(e.into());
        }
        Ok(())
    }

    fn read_all(&self) -> AuditResult<Vec<AuditEvent>> {
        // Hold the writer lock so no record is half-written while reading
        let _guard = self.file.lock().map_err(|_| AuditError::Poisoned)?;
        Self::read_path(&self.path)
    }
}

fn write_record(file: &mut File, line: &[u8], sync: bool) -> io::Result<()> {
    file.write_all(line)?;
    file.flush()?;
    if sync {
        file.sync_data()?;
    }
    Ok(())
}

/// Truncate an unterminated final line left by an interrupted writer
fn discard_torn_tail(file: &mut File) -> io::Result<()> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(());
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    if last[0] == b'\n' {
        return Ok(());
    }

    let mut contents = Vec::with_capacity(len as usize);
    file.seek(SeekFrom::Start(0))?;
    file.read_to_end(&mut contents)?;
    let keep = contents
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |i| i + 1) as u64;
    warn!("discarding {} bytes of unterminated audit record", len - keep);
    file.set_len(keep)
}

/// In-memory audit sink
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events
    pub fn events(&self) -> AuditResult<Vec<AuditEvent>> {
        self.read_all()
    }

    /// Number of recorded events
    pub fn len(&self) -> AuditResult<usize> {
        let events = self.events.lock().map_err(|_| AuditError::Poisoned)?;
        Ok(events.len())
    }

    pub fn is_empty(&self) -> AuditResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl AuditSink for MemoryAuditLog {
    fn append(&self, event: AuditEvent) -> AuditResult<()> {
        let mut events = self.events.lock().map_err(|_| AuditError::Poisoned)?;
        events.push(stamp(event));
        Ok(())
    }

    fn read_all(&self) -> AuditResult<Vec<AuditEvent>> {
        let events = self.events.lock().map_err(|_| AuditError::Poisoned)?;
        Ok(events.clone())
    }
}
