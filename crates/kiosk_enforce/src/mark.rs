//! Policy epochs and per-node enforcement marks.
//!
//! A mark records "this node has already been corrected for the current
//! policy state". Marks are attached to the host node itself so they
//! survive until the node is destroyed, and they carry the epoch they were
//! set under - bumping the epoch invalidates every prior mark without a
//! sweep. A node bearing a current mark is never re-processed, which is
//! what keeps the engine's own mutations from feeding it fresh work.

use crate::action::CorrectiveAction;
use serde::{Deserialize, Serialize};

/// Identity of one (role set, ruleset) configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyEpoch {
    /// Monotonic sequence, bumped on every role or policy change.
    pub seq: u64,

    /// Policy fingerprint the epoch was derived from.
    pub fingerprint: u64,
}

impl PolicyEpoch {
    /// First epoch for a session.
    pub fn initial(fingerprint: u64) -> Self {
        Self { seq: 1, fingerprint }
    }

    /// Successor epoch after a role or policy change.
    pub fn next(&self, fingerprint: u64) -> Self {
        Self {
            seq: self.seq + 1,
            fingerprint,
        }
    }
}

/// Per-node idempotency marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnforcementMark {
    /// Epoch the correction was applied under.
    pub epoch: PolicyEpoch,

    /// The action that was applied.
    pub action: CorrectiveAction,
}

impl EnforcementMark {
    pub fn new(epoch: PolicyEpoch, action: CorrectiveAction) -> Self {
        Self { epoch, action }
    }

    /// Check whether the mark is valid for the given epoch.
    pub fn is_current(&self, epoch: PolicyEpoch) -> bool {
        self.epoch == epoch
    }
}
