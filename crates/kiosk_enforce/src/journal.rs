//! Enforcement journal - tick-stamped pass outcomes.
//!
//! The journal records what each non-trivial pass did, enabling:
//! - Audit trail of corrections applied to a session
//! - Debugging hosts whose chrome keeps re-triggering corrections
//! - Deterministic assertions in tests

use crate::action::EffectSet;
use crate::trigger::Trigger;
use serde::{Deserialize, Serialize};

/// One journal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassRecord {
    /// Event-loop tick when the pass ran.
    pub tick: u64,

    /// What requested the pass.
    pub trigger: Trigger,

    /// Effects the pass produced.
    pub effects: EffectSet,

    /// Nodes corrected.
    pub corrected: u64,
}

/// Append-only record of enforcement activity.
///
/// Quiescent passes (no effects, no corrections) are skipped so the
/// fallback poll does not flood the journal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnforcementJournal {
    records: Vec<PassRecord>,
}

impl EnforcementJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pass outcome. No-op passes are skipped.
    pub fn record(&mut self, tick: u64, trigger: Trigger, effects: EffectSet, corrected: u64) {
        if effects.is_empty() && corrected == 0 {
            return;
        }
        self.records.push(PassRecord {
            tick,
            trigger,
            effects,
            corrected,
        });
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recent entry.
    pub fn last(&self) -> Option<&PassRecord> {
        self.records.last()
    }

    /// Iterate entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &PassRecord> {
        self.records.iter()
    }

    /// Clear all entries.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Export as JSON for bug reports.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.records)
    }
}
