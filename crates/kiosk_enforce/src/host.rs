//! Host collaborator traits.
//!
//! The shell owns roles, routing, the live tree, menus, notifications, and
//! stylesheets. The engine only ever talks to them through these seams, so
//! every pass is testable against in-memory fakes and the engine survives
//! hosts that initialize late or drop nodes mid-pass.

use crate::mark::EnforcementMark;
use kiosk_policy::RoleSet;
use kiosk_snapshot::TreeSnapshot;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by host collaborators.
#[derive(Debug, Clone, Error)]
pub enum HostError {
    /// The collaborator is not initialized yet. Recoverable via backoff.
    #[error("{component} not available yet")]
    Unavailable { component: &'static str },

    /// The node was destroyed between classification and correction.
    #[error("Node {host_id} no longer exists")]
    NodeGone { host_id: u64 },

    /// The host refused the operation.
    #[error("Host rejected the operation: {reason}")]
    Rejected { reason: String },
}

/// Yields the active role set for the current session.
///
/// May be unavailable at startup; callers retry on a bounded backoff.
pub trait RoleResolver {
    fn active_roles(&self) -> Result<RoleSet, HostError>;
}

/// The shell's router.
pub trait Router {
    /// Current route path.
    fn current_route(&self) -> String;

    /// Request a route change.
    fn navigate_to(&mut self, route: &str) -> Result<(), HostError>;
}

/// Idempotent, non-destructive node mutations.
///
/// Nodes are never removed from the tree - the host's own re-render must
/// not crash on a missing node. Applying any op twice has the same
/// observable effect as once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeOp {
    /// Set the hidden presentation state.
    Hide,

    /// Set the disabled presentation state.
    Disable,

    /// Drop the node from the tab/keyboard focus order.
    DropFromTabOrder,

    /// Stop the node from receiving pointer/touch input.
    MutePointer,

    /// Close an open menu/dropdown.
    CloseMenu,
}

/// The live UI tree, as the engine is allowed to touch it.
pub trait TreeHost {
    /// Capture a fresh snapshot of the navigation chrome.
    fn capture(&self) -> Result<TreeSnapshot, HostError>;

    /// Apply one idempotent op to a node.
    fn apply(&mut self, host_id: u64, op: NodeOp) -> Result<(), HostError>;

    /// Read the enforcement mark attached to a node, if any.
    fn mark_of(&self, host_id: u64) -> Option<EnforcementMark>;

    /// Attach an enforcement mark to a node. The mark lives and dies with
    /// the host node.
    fn set_mark(&mut self, host_id: u64, mark: EnforcementMark) -> Result<(), HostError>;
}

/// Optional direct menu manipulation API.
///
/// Host versions differ in whether this exists; when it does, removing a
/// named entry beats classifying its rendered node.
pub trait MenuHost {
    /// Remove a named entry. `Ok(false)` means the entry was not present.
    fn remove_item(&mut self, label: &str) -> Result<bool, HostError>;
}

/// Severity of a user-visible notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeKind {
    Info,
    Denied,
}

/// A transient user-visible message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    /// The notice shown on a denied navigation attempt.
    pub fn denied() -> Self {
        Self {
            kind: NoticeKind::Denied,
            message: "Access restricted".to_string(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }
}

/// Transient notification surface.
pub trait Notifier {
    fn notify(&mut self, notice: &Notice);
}

/// Process-wide stylesheet injection.
pub trait StyleHost {
    /// Check whether a stylesheet with this id is already present.
    fn has_style(&self, id: &str) -> bool;

    /// Inject a stylesheet under the given id.
    fn inject_style(&mut self, id: &str, css: &str) -> Result<(), HostError>;
}
