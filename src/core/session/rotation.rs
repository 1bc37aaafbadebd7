/*!
Rekey scheduling for QSP sessions.

Traffic keys are rotated when the bytes sent plus received under the current
epoch exceed the policy's byte threshold, or when the keys have been in use
longer than the policy's lifetime. The tracker only decides; the session
performs the rotation.
*/

use std::fmt;
use std::time::{Duration, Instant};

use crate::core::policy::Policy;

/// Why the key epoch advanced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RekeyReason {
    /// Traffic volume crossed `rekey_bytes`
    ByteThreshold,
    /// Keys outlived `rekey_seconds`
    KeyLifetime,
    /// The caller submitted a REKEY frame
    Requested,
    /// An authenticated frame arrived from a newer peer epoch
    PeerEpoch,
}

impl RekeyReason {
    /// Name used in the audit log
    pub fn as_str(self) -> &'static str {
        match self {
            RekeyReason::ByteThreshold => "byte threshold",
            RekeyReason::KeyLifetime => "key lifetime",
            RekeyReason::Requested => "requested",
            RekeyReason::PeerEpoch => "peer epoch",
        }
    }
}

impl fmt::Display for RekeyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Traffic counters for the current key epoch
#[derive(Debug, Clone)]
pub struct RekeyTracker {
    /// When the current keys were installed
    last_rekey: Instant,
    /// Wire bytes sealed under the current keys
    bytes_sent: u64,
    /// Wire bytes opened under the current keys
    bytes_recv: u64,
}

impl RekeyTracker {
    /// Create a tracker starting now
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Create a tracker whose keys were installed at `at`
    pub fn starting_at(at: Instant) -> Self {
        Self {
            last_rekey: at,
            bytes_sent: 0,
            bytes_recv: 0,
        }
    }

    /// Reset counters for new keys
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Track a sent frame
    pub fn track_sent(&mut self, bytes: usize) {
        self.bytes_sent = self.bytes_sent.saturating_add(bytes as u64);
    }

    /// Track a received frame
    pub fn track_received(&mut self, bytes: usize) {
        self.bytes_recv = self.bytes_recv.saturating_add(bytes as u64);
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    pub fn bytes_recv(&self) -> u64 {
        self.bytes_recv
    }

    /// Time the current keys have been in use as of `now`
    pub fn key_age_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_rekey)
    }

    /// Check if rotation is needed now
    pub fn due(&self, policy: &Policy) -> Option<RekeyReason> {
        self.due_at(policy, Instant::now())
    }

    /// Check if rotation is needed as of `now`
    pub fn due_at(&self, policy: &Policy, now: Instant) -> Option<RekeyReason> {
        if self.bytes_sent.saturating_add(self.bytes_recv) > policy.rekey_bytes {
            return Some(RekeyReason::ByteThreshold);
        }
        if self.key_age_at(now) > policy.rekey_interval() {
            return Some(RekeyReason::KeyLifetime);
        }
        None
    }
}

impl Default for RekeyTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_threshold_is_exclusive() {
        let policy = Policy::default().with_rekey_bytes(100);
        let start = Instant::now();
        let mut tracker = RekeyTracker::starting_at(start);

        tracker.track_sent(60);
        tracker.track_received(40);
        assert_eq!(tracker.due_at(&policy, start), None);

        tracker.track_received(1);
        assert_eq!(tracker.due_at(&policy, start), Some(RekeyReason::ByteThreshold));
    }

    #[test]
    fn test_key_lifetime() {
        let policy = Policy::default().with_rekey_seconds(10);
        let start = Instant::now();
        let tracker = RekeyTracker::starting_at(start);

        assert_eq!(tracker.due_at(&policy, start + Duration::from_secs(10)), None);
        assert_eq!(
            tracker.due_at(&policy, start + Duration::from_secs(11)),
            Some(RekeyReason::KeyLifetime)
        );
    }

    #[test]
    fn test_reset() {
        let mut tracker = RekeyTracker::new();
        tracker.track_sent(5);
        tracker.track_received(7);
        assert_eq!(tracker.bytes_sent(), 5);
        assert_eq!(tracker.bytes_recv(), 7);

        tracker.reset();
        assert_eq!(tracker.bytes_sent(), 0);
        assert_eq!(tracker.bytes_recv(), 0);
    }
}
