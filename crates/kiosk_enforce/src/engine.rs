//! The enforcement engine - the reconciliation state machine.
//!
//! Per trigger the engine runs one bounded, synchronous pass:
//!
//! ```text
//! IDLE ──► SCANNING ──► CORRECTING ──► SETTLED
//!            │                │
//!       snapshot +       one idempotent
//!       classify +       action per node,
//!       partition        mark set before return
//! ```
//!
//! Idempotency rests on the enforcement marks, not on suppressing the
//! observer: the engine's own mutations never produce fresh work for the
//! same nodes, while genuinely new host-driven changes are still caught.
//! One node failing mid-pass (vanished, host refusal) is skipped and never
//! aborts the pass over the remaining nodes.

use crate::action::{CorrectiveAction, EffectSet};
use crate::fault::Fault;
use crate::host::{HostError, Router, TreeHost};
use crate::journal::EnforcementJournal;
use crate::mark::{EnforcementMark, PolicyEpoch};
use crate::trigger::Trigger;
use kiosk_classify::{ClassifiedNode, Classifier, NodeLabel};
use kiosk_policy::{RoleSet, Ruleset};
use kiosk_snapshot::{TreeSnapshot, Validate, Zone};
use serde::{Deserialize, Serialize};

/// Everything one pass needs to know about the session's policy state.
///
/// Rebuilt (with a bumped epoch) whenever the role set or ruleset changes;
/// passes never consult mutable global state.
#[derive(Debug, Clone)]
pub struct ReconcileContext {
    pub roles: RoleSet,
    pub ruleset: Ruleset,
    pub epoch: PolicyEpoch,
}

impl ReconcileContext {
    pub fn new(roles: RoleSet, ruleset: Ruleset, epoch: PolicyEpoch) -> Self {
        Self {
            roles,
            ruleset,
            epoch,
        }
    }
}

/// State of the reconciliation machine, re-entered on every trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PassState {
    /// No pass has run yet.
    #[default]
    Idle,

    /// Taking and classifying a snapshot.
    Scanning,

    /// Applying corrective actions.
    Correcting,

    /// Quiescent until the next trigger.
    Settled,
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassReport {
    /// Nodes in the snapshot.
    pub scanned: usize,

    /// Nodes already bearing a current-epoch mark.
    pub already_marked: usize,

    /// Nodes that needed a corrective action this pass.
    pub needs_correction: usize,

    /// Nodes successfully corrected.
    pub corrected: usize,

    /// Nodes skipped because they failed mid-pass.
    pub skipped: usize,

    /// Nodes exempt via the allowlist.
    pub allowlisted: usize,

    /// Nodes classified below threshold.
    pub unknown: usize,

    /// Accumulated effects.
    pub effects: EffectSet,
}

impl PassReport {
    /// A settled pass with nothing to do.
    pub fn is_quiescent(&self) -> bool {
        self.needs_correction == 0 && self.effects.is_empty()
    }
}

/// The reconciler.
pub struct EnforcementEngine {
    classifier: Classifier,
    state: PassState,
    journal: EnforcementJournal,
}

impl EnforcementEngine {
    pub fn new(classifier: Classifier) -> Self {
        Self {
            classifier,
            state: PassState::Idle,
            journal: EnforcementJournal::new(),
        }
    }

    /// Engine with the stock classifier.
    pub fn standard() -> Self {
        Self::new(Classifier::standard())
    }

    pub fn state(&self) -> PassState {
        self.state
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn journal(&self) -> &EnforcementJournal {
        &self.journal
    }

    /// Run one full reconciliation pass.
    ///
    /// Synchronous and bounded: the pass runs to completion before the
    /// event loop yields, so two passes never interleave node-by-node.
    pub fn pass(
        &mut self,
        ctx: &ReconcileContext,
        trigger: Trigger,
        tick: u64,
        tree: &mut dyn TreeHost,
        router: &mut dyn Router,
    ) -> Result<PassReport, Fault> {
        self.state = PassState::Scanning;

        let snapshot = tree.capture()?;
        snapshot.validate()?;

        let mut report = PassReport {
            scanned: snapshot.node_count(),
            ..Default::default()
        };

        // Landing enforcement is session-scoped, not node-scoped: it fires
        // once per pass, off the router's live route. A refused redirect is
        // recoverable - the fallback poll retries it.
        if ctx.ruleset.restrictions.forces_landing() {
            let route = router.current_route();
            if !ctx.ruleset.is_on_landing(&route) {
                match router.navigate_to(&ctx.ruleset.landing) {
                    Ok(()) => report.effects |= EffectSet::ROUTE_REDIRECTED,
                    Err(err) => {
                        tracing::warn!(route = %route, error = %err, "landing redirect refused");
                    }
                }
            }
        }

        let classified = self.classifier.classify_all(&snapshot);

        self.state = PassState::Correcting;

        for node in &classified {
            if node.allowlisted {
                report.allowlisted += 1;
                continue;
            }

            let action = match decide_action(ctx, node, &snapshot) {
                Some(action) => action,
                None => {
                    if node.label == NodeLabel::Unknown {
                        report.unknown += 1;
                    }
                    continue;
                }
            };

            match tree.mark_of(node.host_id) {
                Some(mark) if mark.is_current(ctx.epoch) => {
                    report.already_marked += 1;
                    continue;
                }
                Some(_) => {
                    // Stale mark from a previous epoch; supersede it.
                    report.effects |= EffectSet::MARKS_INVALIDATED;
                }
                None => {}
            }

            report.needs_correction += 1;

            match apply_action(tree, node.host_id, action, ctx.epoch) {
                Ok(()) => {
                    report.corrected += 1;
                    report.effects |= action.effects();
                }
                Err(HostError::NodeGone { host_id }) => {
                    tracing::debug!(host_id, "node vanished mid-pass, skipped");
                    report.skipped += 1;
                }
                Err(err) => {
                    tracing::warn!(host_id = node.host_id, error = %err, "correction refused");
                    report.skipped += 1;
                }
            }
        }

        self.state = PassState::Settled;
        self.journal
            .record(tick, trigger, report.effects, report.corrected as u64);

        Ok(report)
    }
}

/// Apply one action: ops first, mark set before returning.
fn apply_action(
    tree: &mut dyn TreeHost,
    host_id: u64,
    action: CorrectiveAction,
    epoch: PolicyEpoch,
) -> Result<(), HostError> {
    for &op in action.node_ops() {
        tree.apply(host_id, op)?;
    }
    tree.set_mark(host_id, EnforcementMark::new(epoch, action))
}

/// Choose the single corrective action for a classified node, or none.
///
/// Conservative by default: `Unknown` and anything the active ruleset does
/// not block is left alone.
fn decide_action(
    ctx: &ReconcileContext,
    node: &ClassifiedNode,
    snapshot: &TreeSnapshot,
) -> Option<CorrectiveAction> {
    let ruleset = &ctx.ruleset;
    let text = snapshot.text(node.idx);

    match node.label {
        NodeLabel::WorkspaceSwitcher => {
            // Only the chrome instance in the top zone is hidden; a deep
            // duplicate elsewhere is left for the link rules.
            if ruleset.restrictions.hides_switcher() && node.zone == Zone::TopBar {
                return Some(CorrectiveAction::Hide);
            }
            None
        }
        NodeLabel::WorkspaceDropdown => {
            if ruleset.restrictions.closes_dropdowns()
                && text.is_some_and(|t| ruleset.blocks_label(t))
            {
                return Some(CorrectiveAction::CloseDropdown);
            }
            None
        }
        NodeLabel::UserMenuItem => {
            if ruleset.restrictions.disables_menu_items()
                && text.is_some_and(|t| ruleset.blocks_label(t))
            {
                return Some(CorrectiveAction::Disable);
            }
            None
        }
        NodeLabel::NavigationLink => {
            let href_blocked = ruleset.restrictions.blocks_routes()
                && snapshot.href(node.idx).is_some_and(|h| ruleset.blocks_route(h));
            let text_blocked = ruleset.restrictions.disables_menu_items()
                && text.is_some_and(|t| ruleset.blocks_label(t));
            if href_blocked || text_blocked {
                return Some(CorrectiveAction::Disable);
            }
            None
        }
        NodeLabel::Unknown => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NodeOp;
    use kiosk_policy::{RestrictionFlags, Ruleset};
    use kiosk_snapshot::{NodeFlags, NodeSpec, Rect, TreeBuilder};
    use std::collections::HashMap;

    // Minimal in-memory host for engine tests. The richer end-to-end fake
    // lives in the root crate's integration tests.
    #[derive(Debug, Default)]
    struct FakeTree {
        snapshot: TreeSnapshot,
        marks: HashMap<u64, EnforcementMark>,
        ops: Vec<(u64, NodeOp)>,
        gone: Vec<u64>,
    }

    impl TreeHost for FakeTree {
        fn capture(&self) -> Result<TreeSnapshot, HostError> {
            Ok(self.snapshot.clone())
        }

        fn apply(&mut self, host_id: u64, op: NodeOp) -> Result<(), HostError> {
            if self.gone.contains(&host_id) {
                return Err(HostError::NodeGone { host_id });
            }
            self.ops.push((host_id, op));
            Ok(())
        }

        fn mark_of(&self, host_id: u64) -> Option<EnforcementMark> {
            self.marks.get(&host_id).copied()
        }

        fn set_mark(&mut self, host_id: u64, mark: EnforcementMark) -> Result<(), HostError> {
            self.marks.insert(host_id, mark);
            Ok(())
        }
    }

    #[derive(Debug)]
    struct FakeRouter {
        route: String,
        navigations: Vec<String>,
    }

    impl FakeRouter {
        fn at(route: &str) -> Self {
            Self {
                route: route.to_string(),
                navigations: Vec::new(),
            }
        }
    }

    impl Router for FakeRouter {
        fn current_route(&self) -> String {
            self.route.clone()
        }

        fn navigate_to(&mut self, route: &str) -> Result<(), HostError> {
            self.route = route.to_string();
            self.navigations.push(route.to_string());
            Ok(())
        }
    }

    fn sales_ctx() -> ReconcileContext {
        let ruleset = Ruleset::new("Sales User", "selling")
            .block_labels(["Workspaces", "Website"])
            .block_route_prefixes(["/app/workspace", "/app/website"])
            .with_restrictions(RestrictionFlags::ALL);
        ReconcileContext::new(
            RoleSet::from_names(["Sales User"]),
            ruleset,
            PolicyEpoch::initial(0xABCD),
        )
    }

    fn menu_snapshot() -> TreeSnapshot {
        let mut b = TreeBuilder::new("selling", Rect::new(0.0, 0.0, 1280.0, 720.0));
        let menu = b.push(None, NodeSpec::new("div").classes("user-menu"));
        for label in ["Workspaces", "Settings", "Website"] {
            b.push(
                Some(menu),
                NodeSpec::new("a")
                    .aria_role("menuitem")
                    .classes("dropdown-item")
                    .text(label),
            );
        }
        b.finish()
    }

    #[test]
    fn pass_disables_exactly_the_blocked_items() {
        let mut tree = FakeTree {
            snapshot: menu_snapshot(),
            ..Default::default()
        };
        let mut router = FakeRouter::at("selling");
        let mut engine = EnforcementEngine::standard();

        let report = engine
            .pass(&sales_ctx(), Trigger::Startup, 1, &mut tree, &mut router)
            .expect("pass");

        // Host ids are assigned in push order: menu=1, items 2..=4.
        assert_eq!(report.corrected, 2);
        assert!(report.effects.contains(EffectSet::NODES_DISABLED));
        let disabled: Vec<u64> = tree
            .ops
            .iter()
            .filter(|(_, op)| *op == NodeOp::Disable)
            .map(|(id, _)| *id)
            .collect();
        assert_eq!(disabled, vec![2, 4]);
        assert!(tree.marks.contains_key(&2));
        assert!(tree.marks.contains_key(&4));
        assert!(!tree.marks.contains_key(&3)); // "Settings" untouched
        assert_eq!(engine.state(), PassState::Settled);
    }

    #[test]
    fn second_pass_is_idempotent() {
        let mut tree = FakeTree {
            snapshot: menu_snapshot(),
            ..Default::default()
        };
        let mut router = FakeRouter::at("selling");
        let mut engine = EnforcementEngine::standard();
        let ctx = sales_ctx();

        engine
            .pass(&ctx, Trigger::Startup, 1, &mut tree, &mut router)
            .expect("first pass");
        let ops_after_first = tree.ops.len();

        let report = engine
            .pass(&ctx, Trigger::TreeChanged, 2, &mut tree, &mut router)
            .expect("second pass");

        assert_eq!(tree.ops.len(), ops_after_first);
        assert_eq!(report.corrected, 0);
        assert_eq!(report.already_marked, 2);
        assert!(report.is_quiescent());
    }

    #[test]
    fn landing_violation_redirects() {
        let mut tree = FakeTree {
            snapshot: menu_snapshot(),
            ..Default::default()
        };
        let mut router = FakeRouter::at("desktop");
        let mut engine = EnforcementEngine::standard();

        let report = engine
            .pass(&sales_ctx(), Trigger::RouteChanged, 1, &mut tree, &mut router)
            .expect("pass");

        assert_eq!(router.route, "selling");
        assert!(report.effects.route_changed());
    }

    #[test]
    fn epoch_bump_invalidates_marks() {
        let mut tree = FakeTree {
            snapshot: menu_snapshot(),
            ..Default::default()
        };
        let mut router = FakeRouter::at("selling");
        let mut engine = EnforcementEngine::standard();
        let ctx = sales_ctx();

        engine
            .pass(&ctx, Trigger::Startup, 1, &mut tree, &mut router)
            .expect("first pass");

        let bumped = ReconcileContext::new(
            ctx.roles.clone(),
            ctx.ruleset.clone(),
            ctx.epoch.next(0xABCD),
        );
        let report = engine
            .pass(&bumped, Trigger::PolicyChanged, 2, &mut tree, &mut router)
            .expect("second pass");

        assert_eq!(report.corrected, 2);
        assert!(report.effects.contains(EffectSet::MARKS_INVALIDATED));
    }

    #[test]
    fn vanished_node_is_skipped_not_fatal() {
        let mut tree = FakeTree {
            snapshot: menu_snapshot(),
            gone: vec![2],
            ..Default::default()
        };
        let mut router = FakeRouter::at("selling");
        let mut engine = EnforcementEngine::standard();

        let report = engine
            .pass(&sales_ctx(), Trigger::TreeChanged, 1, &mut tree, &mut router)
            .expect("pass");

        assert_eq!(report.skipped, 1);
        assert_eq!(report.corrected, 1); // "Website" still corrected
        assert!(tree.marks.contains_key(&4));
        assert!(!tree.marks.contains_key(&2));
    }

    #[test]
    fn switcher_hidden_only_in_top_zone() {
        let mut b = TreeBuilder::new("selling", Rect::new(0.0, 0.0, 1280.0, 720.0));
        b.push(
            None,
            NodeSpec::new("button")
                .classes("workspace-switcher")
                .bounds(Rect::new(500.0, 8.0, 120.0, 30.0)),
        );
        b.push(
            None,
            NodeSpec::new("button")
                .classes("workspace-switcher")
                .bounds(Rect::new(500.0, 500.0, 120.0, 30.0)),
        );
        let mut tree = FakeTree {
            snapshot: b.finish(),
            ..Default::default()
        };
        let mut router = FakeRouter::at("selling");
        let mut engine = EnforcementEngine::standard();

        let report = engine
            .pass(&sales_ctx(), Trigger::TreeChanged, 1, &mut tree, &mut router)
            .expect("pass");

        assert_eq!(report.corrected, 1);
        assert!(tree.ops.contains(&(1, NodeOp::Hide)));
        assert!(!tree.ops.iter().any(|(id, _)| *id == 2));
    }

    #[test]
    fn open_blocked_dropdown_is_closed() {
        let mut b = TreeBuilder::new("selling", Rect::new(0.0, 0.0, 1280.0, 720.0));
        b.push(
            None,
            NodeSpec::new("div")
                .classes("dropdown-menu show")
                .flags(NodeFlags::VISIBLE | NodeFlags::MENU_OPEN)
                .text("Workspaces Desktop Website"),
        );
        let mut tree = FakeTree {
            snapshot: b.finish(),
            ..Default::default()
        };
        let mut router = FakeRouter::at("selling");
        let mut engine = EnforcementEngine::standard();

        let report = engine
            .pass(&sales_ctx(), Trigger::TreeChanged, 1, &mut tree, &mut router)
            .expect("pass");

        assert!(report.effects.contains(EffectSet::DROPDOWN_CLOSED));
        assert!(tree.ops.contains(&(1, NodeOp::CloseMenu)));
    }

    #[test]
    fn allowlisted_nodes_are_never_touched() {
        let mut b = TreeBuilder::new("selling", Rect::new(0.0, 0.0, 1280.0, 720.0));
        let menu = b.push(None, NodeSpec::new("div").classes("user-menu"));
        b.push(
            Some(menu),
            NodeSpec::new("a")
                .aria_role("menuitem")
                .text("Logout")
                .href("/app/logout"),
        );
        let mut tree = FakeTree {
            snapshot: b.finish(),
            ..Default::default()
        };
        let mut router = FakeRouter::at("selling");
        let mut engine = EnforcementEngine::standard();

        let report = engine
            .pass(&sales_ctx(), Trigger::TreeChanged, 1, &mut tree, &mut router)
            .expect("pass");

        assert_eq!(report.allowlisted, 1);
        assert!(tree.ops.is_empty());
        assert!(tree.marks.is_empty());
    }

    proptest::proptest! {
        /// Whatever the menu contents, a second pass over the same tree
        /// applies no new ops and corrects nothing.
        #[test]
        fn passes_are_idempotent(labels in proptest::collection::vec("[A-Za-z ]{1,16}", 0..8)) {
            let mut b = TreeBuilder::new("selling", Rect::new(0.0, 0.0, 1280.0, 720.0));
            let menu = b.push(None, NodeSpec::new("div").classes("user-menu"));
            for label in &labels {
                b.push(
                    Some(menu),
                    NodeSpec::new("a")
                        .aria_role("menuitem")
                        .classes("dropdown-item")
                        .text(label.clone()),
                );
            }
            let mut tree = FakeTree {
                snapshot: b.finish(),
                ..Default::default()
            };
            let mut router = FakeRouter::at("selling");
            let mut engine = EnforcementEngine::standard();
            let ctx = sales_ctx();

            engine
                .pass(&ctx, Trigger::Startup, 1, &mut tree, &mut router)
                .expect("first pass");
            let ops = tree.ops.clone();

            let report = engine
                .pass(&ctx, Trigger::TreeChanged, 2, &mut tree, &mut router)
                .expect("second pass");

            proptest::prop_assert_eq!(&tree.ops, &ops);
            proptest::prop_assert_eq!(report.corrected, 0);
        }
    }

    #[test]
    fn quiescent_pass_writes_no_journal_entry() {
        let mut b = TreeBuilder::new("selling", Rect::new(0.0, 0.0, 1280.0, 720.0));
        b.push(None, NodeSpec::new("div").text("Dashboard"));
        let mut tree = FakeTree {
            snapshot: b.finish(),
            ..Default::default()
        };
        let mut router = FakeRouter::at("selling");
        let mut engine = EnforcementEngine::standard();

        let report = engine
            .pass(&sales_ctx(), Trigger::FallbackTick, 1, &mut tree, &mut router)
            .expect("pass");

        assert!(report.is_quiescent());
        assert!(engine.journal().is_empty());
    }
}
