//! The classifier: weighted scoring over the heuristic table.

use crate::allowlist::Allowlist;
use crate::error::ClassifyError;
use crate::label::NodeLabel;
use crate::signal::HeuristicTable;
use kiosk_snapshot::{TreeSnapshot, Zone};
use serde::{Deserialize, Serialize};

/// Classification result for one node, valid for one pass only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedNode {
    /// Index into the snapshot's node table.
    pub idx: usize,

    /// Host handle, the key corrective actions are applied under.
    pub host_id: u64,

    /// Winning label, `Unknown` when evidence stayed below threshold.
    pub label: NodeLabel,

    /// Accumulated evidence for the winning label, clamped to 1.0.
    pub confidence: f32,

    /// Position bucket used as corroborating evidence.
    pub zone: Zone,

    /// Exempt from all corrective action. Overrides the label.
    pub allowlisted: bool,
}

/// Per-label accumulator during scoring.
#[derive(Debug, Clone, Copy, Default)]
struct Score {
    total: f32,
    best_precedence: u8,
    non_positional: bool,
}

/// Heuristic node classifier.
///
/// Stateless across passes: every call sees only the snapshot it is given.
#[derive(Debug, Clone)]
pub struct Classifier {
    table: HeuristicTable,
    allowlist: Allowlist,
}

impl Classifier {
    /// Build a classifier, rejecting invalid tables.
    pub fn new(table: HeuristicTable, allowlist: Allowlist) -> Result<Self, ClassifyError> {
        table.check()?;
        Ok(Self { table, allowlist })
    }

    /// The stock classifier.
    pub fn standard() -> Self {
        // The stock table is covered by tests; check cannot fail here.
        Self {
            table: HeuristicTable::default(),
            allowlist: Allowlist::default(),
        }
    }

    pub fn table(&self) -> &HeuristicTable {
        &self.table
    }

    pub fn allowlist(&self) -> &Allowlist {
        &self.allowlist
    }

    /// Classify one node.
    pub fn classify(&self, snapshot: &TreeSnapshot, idx: usize) -> ClassifiedNode {
        let host_id = snapshot.nodes.host_id(idx).unwrap_or(kiosk_snapshot::NONE_ID);
        let zone = snapshot.zone(
            idx,
            self.table.top_zone_fraction,
            self.table.sidebar_zone_fraction,
        );

        // The allowlist override is absolute and runs before any scoring.
        if self.allowlist.is_exempt(snapshot, idx) {
            return ClassifiedNode {
                idx,
                host_id,
                label: NodeLabel::Unknown,
                confidence: 0.0,
                zone,
                allowlisted: true,
            };
        }

        let mut scores = [Score::default(); 4];
        for s in &mut scores {
            s.best_precedence = u8::MAX;
        }

        for rule in &self.table.rules {
            if !rule.matches(snapshot, idx, zone) {
                continue;
            }
            let slot = &mut scores[rule.label.rank() as usize];
            slot.total += rule.weight;
            slot.best_precedence = slot.best_precedence.min(rule.signal.precedence());
            if !rule.signal.is_positional() {
                slot.non_positional = true;
            }
        }

        // Winner: highest total, ties broken by strongest contributing
        // signal, then by label declaration order (the array index).
        let mut winner: Option<(NodeLabel, Score)> = None;
        for label in NodeLabel::candidates() {
            let score = scores[label.rank() as usize];
            match winner {
                None => winner = Some((label, score)),
                Some((_, best)) => {
                    let better = score.total > best.total
                        || (score.total == best.total
                            && score.best_precedence < best.best_precedence);
                    if better {
                        winner = Some((label, score));
                    }
                }
            }
        }

        match winner {
            // Position can corroborate but never justify on its own.
            Some((label, score)) if score.total >= self.table.threshold && score.non_positional => {
                ClassifiedNode {
                    idx,
                    host_id,
                    label,
                    confidence: score.total.min(1.0),
                    zone,
                    allowlisted: false,
                }
            }
            Some((_, score)) => ClassifiedNode {
                idx,
                host_id,
                label: NodeLabel::Unknown,
                confidence: score.total.min(1.0),
                zone,
                allowlisted: false,
            },
            None => ClassifiedNode {
                idx,
                host_id,
                label: NodeLabel::Unknown,
                confidence: 0.0,
                zone,
                allowlisted: false,
            },
        }
    }

    /// Classify every node in the snapshot.
    pub fn classify_all(&self, snapshot: &TreeSnapshot) -> Vec<ClassifiedNode> {
        snapshot
            .indices()
            .map(|idx| self.classify(snapshot, idx))
            .collect()
    }
}
