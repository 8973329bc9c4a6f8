//! Kiosk enforcement - the policy reconciliation engine.
//!
//! The host shell rebuilds and mutates its UI tree at unpredictable times.
//! This crate repeatedly detects policy-violating UI state and corrects it
//! without flicker, without fighting itself into a loop, and without
//! breaking the allowed interactions (logout, theme toggle, avatar menu).
//!
//! # Architecture
//!
//! ```text
//! TreeChanged ─┐
//! RouteChanged ┼──► PassScheduler ──► EnforcementEngine ──► NodeOps, marks
//! FallbackTick ┤    (debounced,            │
//! PolicyChange ┘     one pending)          ├──► Classifier (kiosk_classify)
//!                                          └──► Router / TreeHost (host seams)
//!
//! link activation ──► NavigationGuard ──► Allow | Deny ──► notice + redirect
//! ```
//!
//! Idempotency contract: every corrective action applied twice has the
//! same observable effect as once, and sets an [`EnforcementMark`] carrying
//! the current [`PolicyEpoch`] before returning. A marked node is never
//! re-processed under the same epoch, so the engine's own mutations cannot
//! re-trigger it; bumping the epoch (role or policy change) invalidates
//! every mark at once.

mod action;
mod engine;
mod fault;
mod guard;
mod host;
mod journal;
mod mark;
mod menu;
mod style;
mod trigger;

pub use action::{CorrectiveAction, EffectSet};
pub use engine::{EnforcementEngine, PassReport, PassState, ReconcileContext};
pub use fault::Fault;
pub use guard::{Decision, DenyReason, NavIntent, NavigationGuard};
pub use host::{
    HostError, MenuHost, NodeOp, Notice, NoticeKind, Notifier, RoleResolver, Router, StyleHost,
    TreeHost,
};
pub use journal::{EnforcementJournal, PassRecord};
pub use mark::{EnforcementMark, PolicyEpoch};
pub use menu::{prune_user_menu, PruneOutcome};
pub use style::{ensure_backstop, BACKSTOP_CSS, STYLE_ID};
pub use trigger::{PassScheduler, RetryBackoff, Trigger};

/// Debounce window for collapsing simultaneous triggers (ms).
pub const DEBOUNCE_MS: u64 = 16;

/// Fallback poll interval, catching drift the observer cannot see (ms).
pub const FALLBACK_POLL_MS: u64 = 500;

/// Base delay between role-resolver availability retries (ms).
pub const ROLE_RETRY_BASE_MS: u64 = 200;

/// Retry budget for the role resolver before the session goes dormant.
pub const ROLE_RETRY_MAX_ATTEMPTS: u32 = 50;
