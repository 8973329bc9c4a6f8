//! Text vocabulary backing the `TextSubstring` signal.

use crate::label::NodeLabel;
use serde::{Deserialize, Serialize};

/// Case-insensitive term lists per label.
///
/// Kept as ordered pairs so table construction is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    terms: Vec<(NodeLabel, Vec<String>)>,
}

impl Vocabulary {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Replace or append the term list for a label.
    pub fn with_terms<I, S>(mut self, label: NodeLabel, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list: Vec<String> = terms.into_iter().map(Into::into).collect();
        if let Some(entry) = self.terms.iter_mut().find(|(l, _)| *l == label) {
            entry.1 = list;
        } else {
            self.terms.push((label, list));
        }
        self
    }

    /// Iterate label/term-list pairs in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (NodeLabel, &[String])> {
        self.terms.iter().map(|(l, t)| (*l, t.as_slice()))
    }

    /// Terms for one label.
    pub fn terms_for(&self, label: NodeLabel) -> &[String] {
        self.terms
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, t)| t.as_slice())
            .unwrap_or(&[])
    }

    /// The stock vocabulary for the shell chrome the original deployment
    /// runs against.
    pub fn standard() -> Self {
        Self::empty()
            .with_terms(NodeLabel::WorkspaceSwitcher, ["workspaces", "switch workspace"])
            .with_terms(
                NodeLabel::WorkspaceDropdown,
                ["workspace", "desktop", "website"],
            )
            .with_terms(
                NodeLabel::UserMenuItem,
                ["workspaces", "desktop", "website", "help", "session defaults"],
            )
    }
}
