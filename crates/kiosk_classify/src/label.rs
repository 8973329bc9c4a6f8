//! Semantic labels assigned to classified nodes.

use serde::{Deserialize, Serialize};

/// Semantic label for a navigation-chrome node.
///
/// Declaration order is the final tie-break when two labels accumulate
/// identical evidence, so classification stays deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NodeLabel {
    /// Workspace/navigation switcher control in the chrome.
    WorkspaceSwitcher,

    /// An open dropdown listing workspace-style destinations.
    WorkspaceDropdown,

    /// A navigation link (sidebar entry, breadcrumb, anchor).
    NavigationLink,

    /// An item inside the user/toolbar menu.
    UserMenuItem,

    /// Evidence too weak for any label; receives no corrective action.
    #[default]
    Unknown,
}

impl NodeLabel {
    /// All assignable labels, in tie-break order. `Unknown` is a result,
    /// never a candidate.
    pub fn candidates() -> impl Iterator<Item = NodeLabel> {
        [
            NodeLabel::WorkspaceSwitcher,
            NodeLabel::WorkspaceDropdown,
            NodeLabel::NavigationLink,
            NodeLabel::UserMenuItem,
        ]
        .into_iter()
    }

    /// Stable name for rule tables and journals.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeLabel::WorkspaceSwitcher => "workspace-switcher",
            NodeLabel::WorkspaceDropdown => "workspace-dropdown",
            NodeLabel::NavigationLink => "navigation-link",
            NodeLabel::UserMenuItem => "user-menu-item",
            NodeLabel::Unknown => "unknown",
        }
    }

    /// Position in the tie-break order.
    pub(crate) fn rank(&self) -> u8 {
        match self {
            NodeLabel::WorkspaceSwitcher => 0,
            NodeLabel::WorkspaceDropdown => 1,
            NodeLabel::NavigationLink => 2,
            NodeLabel::UserMenuItem => 3,
            NodeLabel::Unknown => u8::MAX,
        }
    }
}
