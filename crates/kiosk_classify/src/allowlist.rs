//! The exempt-subtree matcher.
//!
//! Nodes carrying the session's identity affordances (logout, avatar,
//! theme toggle, reload) must never be corrected. A node matching the
//! allowlist, or sitting anywhere under a matching ancestor, short-circuits
//! classification to "no action" - this overrides every other signal.

use kiosk_snapshot::TreeSnapshot;
use serde::{Deserialize, Serialize};

/// Matcher for the exempt subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allowlist {
    /// Terms matched against text and ARIA labels (case-insensitive
    /// substring).
    terms: Vec<String>,

    /// Markers matched against class and element id attributes.
    markers: Vec<String>,
}

impl Allowlist {
    /// An allowlist that exempts nothing.
    pub fn empty() -> Self {
        Self {
            terms: Vec::new(),
            markers: Vec::new(),
        }
    }

    /// Add a text/ARIA term.
    pub fn term(mut self, term: impl Into<String>) -> Self {
        self.terms.push(term.into().to_lowercase());
        self
    }

    /// Add a class/id marker.
    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.markers.push(marker.into().to_lowercase());
        self
    }

    /// Check the node itself against the allowlist.
    pub fn matches_node(&self, snapshot: &TreeSnapshot, idx: usize) -> bool {
        let text_hit = |value: Option<&str>| {
            value.is_some_and(|v| {
                let v = v.to_lowercase();
                self.terms.iter().any(|t| v.contains(t))
            })
        };
        let marker_hit = |value: Option<&str>| {
            value.is_some_and(|v| {
                let v = v.to_lowercase();
                self.markers.iter().any(|m| v.contains(m))
            })
        };

        text_hit(snapshot.text(idx))
            || text_hit(snapshot.aria_label(idx))
            || marker_hit(snapshot.classes(idx))
            || marker_hit(snapshot.elem_id(idx))
    }

    /// Check the node and every ancestor.
    pub fn is_exempt(&self, snapshot: &TreeSnapshot, idx: usize) -> bool {
        if self.matches_node(snapshot, idx) {
            return true;
        }
        snapshot
            .nodes
            .ancestors(idx)
            .any(|anc| self.matches_node(snapshot, anc))
    }
}

impl Default for Allowlist {
    /// Exempts the identity affordances from `kiosk_policy`, plus the
    /// class/id markers the original chrome hangs them on.
    fn default() -> Self {
        let mut list = Self::empty();
        for term in kiosk_policy::DEFAULT_EXEMPT_TERMS {
            list = list.term(*term);
        }
        for marker in ["user-avatar", "avatar-frame", "logout", "theme-switcher", "navbar-user"] {
            list = list.marker(marker);
        }
        list
    }
}
