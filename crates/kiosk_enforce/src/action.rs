//! Corrective actions and the effect output protocol.

use crate::host::NodeOp;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Node-scoped corrective action, chosen by label during CORRECTING.
///
/// Exactly one action applies per node per pass. Every action is
/// idempotent and non-destructive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CorrectiveAction {
    /// Disable a blocked menu item: disabled presentation state plus
    /// removal from the focus order. The node stays in the tree.
    Disable,

    /// Hide a chrome control (workspace switcher) and mute its pointer
    /// input.
    Hide,

    /// Close an open dropdown listing blocked destinations.
    CloseDropdown,
}

impl CorrectiveAction {
    /// The host ops realizing this action, in application order.
    pub fn node_ops(&self) -> &'static [NodeOp] {
        match self {
            CorrectiveAction::Disable => &[NodeOp::Disable, NodeOp::DropFromTabOrder],
            CorrectiveAction::Hide => &[NodeOp::Hide, NodeOp::MutePointer],
            CorrectiveAction::CloseDropdown => &[NodeOp::CloseMenu],
        }
    }

    /// Effects reported when this action is applied.
    pub fn effects(&self) -> EffectSet {
        match self {
            CorrectiveAction::Disable => EffectSet::NODES_DISABLED,
            CorrectiveAction::Hide => EffectSet::NODES_HIDDEN,
            CorrectiveAction::CloseDropdown => EffectSet::DROPDOWN_CLOSED,
        }
    }
}

bitflags! {
    /// Set of effects produced by a reconciliation pass.
    ///
    /// Effects are additive - one pass can produce several. The caller
    /// checks which are set and reacts (journal entry, log line, renderer
    /// hint).
    ///
    /// # Example
    ///
    /// ```
    /// use kiosk_enforce::EffectSet;
    ///
    /// let effects = EffectSet::ROUTE_REDIRECTED | EffectSet::NODES_DISABLED;
    ///
    /// if effects.contains(EffectSet::ROUTE_REDIRECTED) {
    ///     // The session was pulled back to its landing route
    /// }
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct EffectSet: u16 {
        /// No effects.
        const NONE = 0;

        // =====================================================================
        // SESSION EFFECTS
        // =====================================================================

        /// The session was redirected to its landing route.
        const ROUTE_REDIRECTED = 1 << 0;

        /// A user-visible notice was shown.
        const NOTICE_SHOWN = 1 << 1;

        // =====================================================================
        // NODE EFFECTS
        // =====================================================================

        /// One or more nodes were disabled.
        const NODES_DISABLED = 1 << 2;

        /// One or more nodes were hidden.
        const NODES_HIDDEN = 1 << 3;

        /// An open dropdown was closed.
        const DROPDOWN_CLOSED = 1 << 4;

        // =====================================================================
        // SESSION SETUP EFFECTS
        // =====================================================================

        /// Entries were pruned from the user menu via the host menu API.
        const MENU_PRUNED = 1 << 5;

        /// The stylesheet backstop was injected.
        const STYLE_INJECTED = 1 << 6;

        /// Stale marks from a previous epoch were superseded.
        const MARKS_INVALIDATED = 1 << 7;
    }
}

impl Default for EffectSet {
    fn default() -> Self {
        EffectSet::NONE
    }
}

impl EffectSet {
    /// Check if any node-level effects are set.
    pub fn has_node_effects(&self) -> bool {
        self.intersects(
            EffectSet::NODES_DISABLED | EffectSet::NODES_HIDDEN | EffectSet::DROPDOWN_CLOSED,
        )
    }

    /// Check if the session route changed.
    pub fn route_changed(&self) -> bool {
        self.contains(EffectSet::ROUTE_REDIRECTED)
    }
}
