//! The heuristic signal battery.
//!
//! Classification is driven by a declarative, ordered, weighted rule table.
//! Each rule contributes its weight to one label when its signal matches;
//! ties between labels break on the fixed signal precedence below, then on
//! label declaration order. The table is serde data so the weight set is a
//! tunable, test-covered policy.

use crate::error::ClassifyError;
use crate::label::NodeLabel;
use kiosk_snapshot::{NodeFlags, TreeSnapshot, Zone};
use serde::{Deserialize, Serialize};

/// Kind of evidence a rule inspects, strongest first.
///
/// The declaration order is the tie-break precedence: attribute signals
/// outrank class/id substrings, which outrank text content, which outranks
/// structural position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    /// ARIA role attribute, exact match.
    RoleAttr,

    /// ARIA label attribute, substring match.
    AriaLabel,

    /// Element id attribute, substring match.
    IdSubstring,

    /// Class attribute, substring match.
    ClassSubstring,

    /// Element tag name, exact match.
    Tag,

    /// Structural node flag ("link", "interactive", "focusable",
    /// "menu-open").
    Flag,

    /// Visible text content, substring match.
    TextSubstring,

    /// Position bucket ("top-bar", "sidebar", "body"). Corroborating
    /// evidence only - a rule table where position alone could reach the
    /// confidence threshold is rejected at check time.
    PositionBucket,
}

impl SignalKind {
    /// Tie-break precedence (lower is stronger).
    pub fn precedence(&self) -> u8 {
        match self {
            SignalKind::RoleAttr => 0,
            SignalKind::AriaLabel => 1,
            SignalKind::IdSubstring => 2,
            SignalKind::ClassSubstring => 3,
            SignalKind::Tag => 4,
            SignalKind::Flag => 5,
            SignalKind::TextSubstring => 6,
            SignalKind::PositionBucket => 7,
        }
    }

    pub fn is_positional(&self) -> bool {
        matches!(self, SignalKind::PositionBucket)
    }
}

/// One weighted heuristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicRule {
    pub label: NodeLabel,
    pub signal: SignalKind,
    pub pattern: String,
    pub weight: f32,
}

impl HeuristicRule {
    pub fn new(
        label: NodeLabel,
        signal: SignalKind,
        pattern: impl Into<String>,
        weight: f32,
    ) -> Self {
        Self {
            label,
            signal,
            pattern: pattern.into(),
            weight,
        }
    }

    /// Evaluate this rule against one node.
    pub fn matches(&self, snapshot: &TreeSnapshot, idx: usize, zone: Zone) -> bool {
        match self.signal {
            SignalKind::RoleAttr => snapshot
                .aria_role(idx)
                .is_some_and(|role| role.eq_ignore_ascii_case(&self.pattern)),
            SignalKind::AriaLabel => contains_ci(snapshot.aria_label(idx), &self.pattern),
            SignalKind::IdSubstring => contains_ci(snapshot.elem_id(idx), &self.pattern),
            SignalKind::ClassSubstring => contains_ci(snapshot.classes(idx), &self.pattern),
            SignalKind::Tag => snapshot
                .tag(idx)
                .is_some_and(|tag| tag.eq_ignore_ascii_case(&self.pattern)),
            SignalKind::Flag => {
                let flags = snapshot.nodes.node_flags(idx);
                match self.pattern.as_str() {
                    "link" => flags.contains(NodeFlags::LINK),
                    "interactive" => flags.contains(NodeFlags::INTERACTIVE),
                    "focusable" => flags.contains(NodeFlags::FOCUSABLE),
                    "menu-open" => flags.contains(NodeFlags::MENU_OPEN),
                    _ => false,
                }
            }
            SignalKind::TextSubstring => contains_ci(snapshot.text(idx), &self.pattern),
            SignalKind::PositionBucket => zone.as_str() == self.pattern,
        }
    }
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
}

/// The full classification policy: rules, confidence threshold, and the
/// position-bucket band fractions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeuristicTable {
    pub rules: Vec<HeuristicRule>,
    pub threshold: f32,
    pub top_zone_fraction: f32,
    pub sidebar_zone_fraction: f32,
}

impl HeuristicTable {
    /// An empty table (classifies everything as Unknown).
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            threshold: crate::DEFAULT_CONFIDENCE_THRESHOLD,
            top_zone_fraction: kiosk_snapshot::DEFAULT_TOP_ZONE_FRACTION,
            sidebar_zone_fraction: kiosk_snapshot::DEFAULT_SIDEBAR_ZONE_FRACTION,
        }
    }

    /// Append a rule.
    pub fn rule(
        mut self,
        label: NodeLabel,
        signal: SignalKind,
        pattern: impl Into<String>,
        weight: f32,
    ) -> Self {
        self.rules.push(HeuristicRule::new(label, signal, pattern, weight));
        self
    }

    /// Rules contributing to one label.
    pub fn rules_for(&self, label: NodeLabel) -> impl Iterator<Item = &HeuristicRule> {
        self.rules.iter().filter(move |r| r.label == label)
    }

    /// Check table invariants.
    ///
    /// - threshold and weights in (0, 1]
    /// - no rules for `Unknown`
    /// - every label with rules has non-positional evidence available
    /// - no single positional rule can reach the threshold on its own
    pub fn check(&self) -> Result<(), ClassifyError> {
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(ClassifyError::InvalidThreshold {
                threshold: self.threshold,
            });
        }

        for rule in &self.rules {
            if rule.label == NodeLabel::Unknown {
                return Err(ClassifyError::UnknownLabelRule);
            }
            if !(rule.weight > 0.0 && rule.weight <= 1.0) || !rule.weight.is_finite() {
                return Err(ClassifyError::InvalidWeight {
                    label: rule.label.as_str(),
                    weight: rule.weight,
                });
            }
            if rule.signal.is_positional() && rule.weight >= self.threshold {
                return Err(ClassifyError::PositionWeightTooHigh {
                    label: rule.label.as_str(),
                    weight: rule.weight,
                });
            }
        }

        for label in NodeLabel::candidates() {
            let mut any = false;
            let mut any_non_positional = false;
            for rule in self.rules_for(label) {
                any = true;
                if !rule.signal.is_positional() {
                    any_non_positional = true;
                }
            }
            if any && !any_non_positional {
                return Err(ClassifyError::PositionOnlyLabel {
                    label: label.as_str(),
                });
            }
        }

        Ok(())
    }
}

impl Default for HeuristicTable {
    /// The stock table, tuned for the shell chrome the original deployment
    /// runs against. Text vocabulary comes from
    /// [`crate::Vocabulary::standard`].
    fn default() -> Self {
        use NodeLabel::*;
        use SignalKind::*;

        let mut table = Self::empty()
            // Workspace switcher: strong attribute/class evidence, with the
            // top band corroborating.
            .rule(WorkspaceSwitcher, ClassSubstring, "workspace-switcher", 0.9)
            .rule(WorkspaceSwitcher, IdSubstring, "workspace-switcher", 0.8)
            .rule(WorkspaceSwitcher, AriaLabel, "workspace", 0.8)
            .rule(WorkspaceSwitcher, PositionBucket, "top-bar", 0.15)
            // Open dropdown shells; text vocabulary decides which ones
            // actually list workspace destinations.
            .rule(WorkspaceDropdown, ClassSubstring, "dropdown-menu", 0.25)
            .rule(WorkspaceDropdown, Flag, "menu-open", 0.2)
            // Navigation links.
            .rule(NavigationLink, RoleAttr, "link", 0.35)
            .rule(NavigationLink, Tag, "a", 0.25)
            .rule(NavigationLink, Flag, "link", 0.3)
            .rule(NavigationLink, ClassSubstring, "nav-link", 0.4)
            .rule(NavigationLink, ClassSubstring, "sidebar-link", 0.4)
            // User/toolbar menu items.
            .rule(UserMenuItem, RoleAttr, "menuitem", 0.5)
            .rule(UserMenuItem, ClassSubstring, "user-menu", 0.45)
            .rule(UserMenuItem, ClassSubstring, "dropdown-item", 0.3);

        for (label, terms) in crate::Vocabulary::standard().entries() {
            for term in terms {
                table = table.rule(label, TextSubstring, term.as_str(), 0.55);
            }
        }

        table
    }
}
