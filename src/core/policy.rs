/*!
Session policy for the QSP protocol.

A `Policy` is constructed once, validated, and then shared read-only by the
session through an `Arc`. Nothing mutates it after construction.

Policies load from JSON; missing fields take the defaults below.

```json
{ "fail_closed": true, "require_qkd": false, "allow_downgrade": false,
  "rekey_bytes": 1000000, "rekey_seconds": 3600 }
```
*/

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{
    constants::defaults,
    error::{Error, Result},
};

/// Immutable session policy
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Policy {
    /// Protocol violations terminate the session instead of continuing
    pub fail_closed: bool,
    /// PQC_ONLY keying is forbidden; negotiation fails rather than falling back
    pub require_qkd: bool,
    /// A peer may move a QKD_MIXED session to PQC_ONLY
    pub allow_downgrade: bool,
    /// Traffic volume (sent + received) that triggers a rekey
    pub rekey_bytes: u64,
    /// Key lifetime in seconds that triggers a rekey
    pub rekey_seconds: u64,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            fail_closed: true,
            require_qkd: false,
            allow_downgrade: false,
            rekey_bytes: defaults::REKEY_BYTES,
            rekey_seconds: defaults::REKEY_SECONDS,
        }
    }
}

impl Policy {
    /// Create a policy with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail-closed policy that also forbids PQC_ONLY keying
    pub fn strict() -> Self {
        Self {
            require_qkd: true,
            ..Self::default()
        }
    }

    /// Policy for lab runs: errors never close, downgrades are accepted
    pub fn permissive() -> Self {
        Self {
            fail_closed: false,
            allow_downgrade: true,
            ..Self::default()
        }
    }

    /// Load a policy from JSON and validate it
    pub fn from_json(json: &str) -> Result<Self> {
        let policy: Policy = serde_json::from_str(json)
            .map_err(|e| Error::InvalidInput(format!("invalid policy: {e}")))?;
        policy.validate()?;
        Ok(policy)
    }

    /// Set the fail-closed flag
    pub fn with_fail_closed(mut self, fail_closed: bool) -> Self {
        self.fail_closed = fail_closed;
        self
    }

    /// Set whether QKD keying is mandatory
    pub fn with_require_qkd(mut self, require_qkd: bool) -> Self {
        self.require_qkd = require_qkd;
        self
    }

    /// Set whether a peer may downgrade the mode
    pub fn with_allow_downgrade(mut self, allow_downgrade: bool) -> Self {
        self.allow_downgrade = allow_downgrade;
        self
    }

    /// Set the traffic-volume rekey threshold
    pub fn with_rekey_bytes(mut self, rekey_bytes: u64) -> Self {
        self.rekey_bytes = rekey_bytes;
        self
    }

    /// Set the key-lifetime rekey threshold
    pub fn with_rekey_seconds(mut self, rekey_seconds: u64) -> Self {
        self.rekey_seconds = rekey_seconds;
        self
    }

    /// Key lifetime as a duration
    pub fn rekey_interval(&self) -> Duration {
        Duration::from_secs(self.rekey_seconds)
    }

    /// Validate the policy
    pub fn validate(&self) -> Result<()> {
        if self.rekey_bytes == 0 {
            return Err(Error::InvalidInput("rekey_bytes must be greater than zero".into()));
        }
        if self.rekey_seconds == 0 {
            return Err(Error::InvalidInput("rekey_seconds must be greater than zero".into()));
        }
        if self.require_qkd && self.allow_downgrade {
            return Err(Error::InvalidInput(
                "allow_downgrade contradicts require_qkd".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = Policy::default();
        assert!(policy.fail_closed);
        assert!(!policy.require_qkd);
        assert!(!policy.allow_downgrade);
        assert_eq!(policy.rekey_bytes, 1_000_000);
        assert_eq!(policy.rekey_seconds, 3600);
        assert_eq!(policy.rekey_interval(), Duration::from_secs(3600));
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        assert!(Policy::strict().require_qkd);
        assert!(Policy::strict().fail_closed);

        let permissive = Policy::permissive();
        assert!(!permissive.fail_closed);
        assert!(permissive.allow_downgrade);
    }

    #[test]
    fn test_equality_by_value() {
        assert_eq!(Policy::new(), Policy::default());
        assert_ne!(Policy::new(), Policy::new().with_rekey_bytes(10));
    }

    #[test]
    fn test_from_json_partial() {
        let policy = Policy::from_json(r#"{"rekey_bytes": 4096, "allow_downgrade": true}"#).unwrap();
        assert_eq!(policy.rekey_bytes, 4096);
        assert!(policy.allow_downgrade);
        assert!(policy.fail_closed);
        assert_eq!(policy.rekey_seconds, 3600);
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        assert!(matches!(Policy::from_json(r#"{"rekey_seconds": 0}"#), Err(Error::InvalidInput(_))));
        assert!(matches!(Policy::from_json(r#"{"unknown": 1}"#), Err(Error::InvalidInput(_))));
        assert!(matches!(Policy::from_json("not json"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_contradictory_policy() {
        let policy = Policy::strict().with_allow_downgrade(true);
        assert!(matches!(policy.validate(), Err(Error::InvalidInput(_))));
    }
}
