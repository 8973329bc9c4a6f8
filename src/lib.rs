//! Kiosk - client-side kiosk mode for a role-restricted user.
//!
//! Confines a tagged user to one landing area of an application shell and
//! hides/disables the navigation affordances that would let them leave it,
//! while leaving the shell untouched for privileged users. This is a
//! presentation-layer restriction, not a security boundary: server-side
//! authorization stays with the host.
//!
//! # Architecture
//!
//! ```text
//! host shell ──► KioskSession ──► PassScheduler ──► EnforcementEngine
//!   events          │                                    │
//!                   │                                    ├─► Classifier
//!                   ├─► NavigationGuard (pre-activation) │     (kiosk_classify)
//!                   └─► PolicyTable.resolve(roles)       └─► TreeHost/Router
//!                         (kiosk_policy)                       (host seams)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use kiosk::{HostBindings, KioskSession, PolicyConfig};
//!
//! let table = PolicyConfig::default().compile()?;
//! let mut session = KioskSession::new(table, bindings)?;
//!
//! // Wire into the host event loop:
//! //   session.on_tick(now)            from the shell timer
//! //   session.on_tree_changed(now)    from the tree observer
//! //   session.on_route_changed(now)   from the router hook
//! //   session.on_navigation(..)       before link activation
//! ```

mod session;

pub use session::{HostBindings, KioskSession, SessionState};

// The crate family, re-exported for hosts that embed the session directly.
pub use kiosk_classify::{
    Allowlist, ClassifiedNode, Classifier, HeuristicTable, NodeLabel, Vocabulary,
};
pub use kiosk_enforce::{
    Decision, DenyReason, EffectSet, EnforcementEngine, EnforcementMark, Fault, HostError,
    MenuHost, NavIntent, NavigationGuard, NodeOp, Notice, Notifier, PassReport, PolicyEpoch,
    ReconcileContext, RoleResolver, Router, StyleHost, TreeHost, Trigger,
};
pub use kiosk_policy::{
    PolicyConfig, PolicyFingerprint, PolicyTable, RestrictionFlags, Role, RoleSet, Ruleset,
    SidebarEntry,
};
pub use kiosk_snapshot::{NodeFlags, NodeSpec, Rect, TreeBuilder, TreeSnapshot, Zone};
