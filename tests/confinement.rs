//! End-to-end confinement tests against an in-memory shell.
//!
//! The fake shell owns a mutable scene graph, a router, a user menu, a
//! notification surface, and a stylesheet registry, and binds itself into
//! every host seam the session needs. Tests drive the session exactly the
//! way a host event loop would: ticks, tree-change and route-change
//! notifications, and pre-activation navigation checks.

use kiosk::{
    Decision, EnforcementMark, HostBindings, HostError, KioskSession, MenuHost, NavIntent,
    NodeOp, NodeSpec, Notice, Notifier, PolicyConfig, PolicyTable, Rect, RoleResolver, RoleSet,
    Router, Ruleset, SessionState, StyleHost, TreeBuilder, TreeHost, TreeSnapshot,
};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// =============================================================================
// FAKE SHELL
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
struct SceneNode {
    host_id: u64,
    parent: Option<usize>,
    tag: String,
    text: Option<String>,
    classes: Option<String>,
    aria_role: Option<String>,
    href: Option<String>,
    bounds: Rect,
    menu_open: bool,
    hidden: bool,
    disabled: bool,
    in_tab_order: bool,
    pointer_muted: bool,
    mark: Option<EnforcementMark>,
}

impl SceneNode {
    fn new(host_id: u64, parent: Option<usize>, tag: &str) -> Self {
        Self {
            host_id,
            parent,
            tag: tag.to_string(),
            text: None,
            classes: None,
            aria_role: None,
            href: None,
            bounds: Rect::new(0.0, 200.0, 100.0, 30.0),
            menu_open: false,
            hidden: false,
            disabled: false,
            in_tab_order: true,
            pointer_muted: false,
            mark: None,
        }
    }

    fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    fn classes(mut self, classes: &str) -> Self {
        self.classes = Some(classes.to_string());
        self
    }

    fn aria_role(mut self, role: &str) -> Self {
        self.aria_role = Some(role.to_string());
        self
    }

    fn href(mut self, href: &str) -> Self {
        self.href = Some(href.to_string());
        self
    }

    fn bounds(mut self, bounds: Rect) -> Self {
        self.bounds = bounds;
        self
    }

    fn open_menu(mut self) -> Self {
        self.menu_open = true;
        self
    }
}

#[derive(Debug, Default)]
struct Shell {
    roles: Option<Vec<String>>,
    route: String,
    nodes: Vec<SceneNode>,
    menu_items: Vec<String>,
    notices: Vec<Notice>,
    styles: Vec<String>,
    navigations: Vec<String>,
}

impl Shell {
    fn find(&self, host_id: u64) -> Option<usize> {
        self.nodes.iter().position(|n| n.host_id == host_id)
    }

    fn node_named(&self, text: &str) -> &SceneNode {
        self.nodes
            .iter()
            .find(|n| n.text.as_deref() == Some(text))
            .unwrap_or_else(|| panic!("no node named {text}"))
    }
}

#[derive(Clone)]
struct ShellHandle(Rc<RefCell<Shell>>);

impl ShellHandle {
    fn new(shell: Shell) -> Self {
        Self(Rc::new(RefCell::new(shell)))
    }

    fn bindings(&self) -> HostBindings {
        HostBindings {
            roles: Box::new(self.clone()),
            router: Box::new(self.clone()),
            tree: Box::new(self.clone()),
            menu: Some(Box::new(self.clone())),
            notifier: Box::new(self.clone()),
            styles: Box::new(self.clone()),
        }
    }
}

impl RoleResolver for ShellHandle {
    fn active_roles(&self) -> Result<RoleSet, HostError> {
        match &self.0.borrow().roles {
            Some(roles) => Ok(RoleSet::from_names(roles.iter().cloned())),
            None => Err(HostError::Unavailable {
                component: "role resolver",
            }),
        }
    }
}

impl Router for ShellHandle {
    fn current_route(&self) -> String {
        self.0.borrow().route.clone()
    }

    fn navigate_to(&mut self, route: &str) -> Result<(), HostError> {
        let mut shell = self.0.borrow_mut();
        shell.route = route.to_string();
        shell.navigations.push(route.to_string());
        Ok(())
    }
}

impl TreeHost for ShellHandle {
    fn capture(&self) -> Result<TreeSnapshot, HostError> {
        let shell = self.0.borrow();
        let mut builder = TreeBuilder::new(shell.route.clone(), Rect::new(0.0, 0.0, 1280.0, 720.0));

        for node in &shell.nodes {
            let mut spec = NodeSpec::new(node.tag.clone()).bounds(node.bounds);
            if let Some(text) = &node.text {
                spec = spec.text(text.clone());
            }
            if let Some(classes) = &node.classes {
                spec = spec.classes(classes.clone());
            }
            if let Some(role) = &node.aria_role {
                spec = spec.aria_role(role.clone());
            }
            if node.in_tab_order && !node.hidden {
                spec = spec.interactive();
            }
            if node.menu_open {
                spec.flags |= kiosk::NodeFlags::MENU_OPEN;
            }
            if node.hidden {
                spec.flags -= kiosk::NodeFlags::VISIBLE;
            }
            if let Some(href) = &node.href {
                spec = spec.href(href.clone());
            }
            builder.push_with_id(node.parent, node.host_id, spec);
        }

        Ok(builder.finish())
    }

    fn apply(&mut self, host_id: u64, op: NodeOp) -> Result<(), HostError> {
        let mut shell = self.0.borrow_mut();
        let idx = shell.find(host_id).ok_or(HostError::NodeGone { host_id })?;
        let node = &mut shell.nodes[idx];
        match op {
            NodeOp::Hide => node.hidden = true,
            NodeOp::Disable => node.disabled = true,
            NodeOp::DropFromTabOrder => node.in_tab_order = false,
            NodeOp::MutePointer => node.pointer_muted = true,
            NodeOp::CloseMenu => node.menu_open = false,
        }
        Ok(())
    }

    fn mark_of(&self, host_id: u64) -> Option<EnforcementMark> {
        let shell = self.0.borrow();
        shell.find(host_id).and_then(|idx| shell.nodes[idx].mark)
    }

    fn set_mark(&mut self, host_id: u64, mark: EnforcementMark) -> Result<(), HostError> {
        let mut shell = self.0.borrow_mut();
        let idx = shell.find(host_id).ok_or(HostError::NodeGone { host_id })?;
        shell.nodes[idx].mark = Some(mark);
        Ok(())
    }
}

impl MenuHost for ShellHandle {
    fn remove_item(&mut self, label: &str) -> Result<bool, HostError> {
        let mut shell = self.0.borrow_mut();
        let before = shell.menu_items.len();
        shell.menu_items.retain(|item| item != label);
        Ok(shell.menu_items.len() != before)
    }
}

impl Notifier for ShellHandle {
    fn notify(&mut self, notice: &Notice) {
        self.0.borrow_mut().notices.push(notice.clone());
    }
}

impl StyleHost for ShellHandle {
    fn has_style(&self, id: &str) -> bool {
        self.0.borrow().styles.iter().any(|s| s == id)
    }

    fn inject_style(&mut self, id: &str, _css: &str) -> Result<(), HostError> {
        self.0.borrow_mut().styles.push(id.to_string());
        Ok(())
    }
}

// =============================================================================
// SCENE
// =============================================================================

/// The standard chrome: a navbar with a workspace switcher and a user
/// menu, plus a sidebar with one allowed and one blocked link.
fn standard_scene(route: &str, roles: &[&str]) -> Shell {
    let top = |x: f32| Rect::new(x, 8.0, 120.0, 30.0);

    let mut shell = Shell {
        roles: Some(roles.iter().map(|r| r.to_string()).collect()),
        route: route.to_string(),
        menu_items: vec![
            "My Profile".to_string(),
            "Workspaces".to_string(),
            "Session Defaults".to_string(),
            "Logout".to_string(),
        ],
        ..Default::default()
    };

    shell.nodes = vec![
        // 0: navbar
        SceneNode::new(1, None, "nav")
            .classes("navbar")
            .bounds(Rect::new(0.0, 0.0, 1280.0, 48.0)),
        // 1: workspace switcher
        SceneNode::new(2, Some(0), "button")
            .classes("workspace-switcher btn")
            .bounds(top(400.0)),
        // 2: user menu container
        SceneNode::new(3, Some(0), "div")
            .classes("dropdown user-menu")
            .bounds(top(1100.0)),
        // 3..=8: user menu items
        SceneNode::new(4, Some(2), "a")
            .aria_role("menuitem")
            .classes("dropdown-item")
            .text("Workspaces"),
        SceneNode::new(5, Some(2), "a")
            .aria_role("menuitem")
            .classes("dropdown-item")
            .text("Settings"),
        SceneNode::new(6, Some(2), "a")
            .aria_role("menuitem")
            .classes("dropdown-item")
            .text("Website"),
        SceneNode::new(7, Some(2), "a")
            .aria_role("menuitem")
            .classes("dropdown-item")
            .text("Session Defaults"),
        SceneNode::new(8, Some(2), "a")
            .aria_role("menuitem")
            .classes("dropdown-item")
            .text("Logout"),
        SceneNode::new(9, Some(2), "a")
            .aria_role("menuitem")
            .classes("dropdown-item")
            .text("Toggle Theme"),
        // 9..=10: sidebar links
        SceneNode::new(10, None, "a")
            .classes("sidebar-link")
            .text("Selling")
            .href("/app/selling")
            .bounds(Rect::new(10.0, 200.0, 160.0, 28.0)),
        SceneNode::new(11, None, "a")
            .classes("sidebar-link")
            .text("Website")
            .href("/app/website")
            .bounds(Rect::new(10.0, 240.0, 160.0, 28.0)),
        // 11: plain content, nothing the classifier should act on
        SceneNode::new(12, None, "span")
            .text("Quarterly Report")
            .bounds(Rect::new(600.0, 400.0, 200.0, 30.0)),
    ];

    shell
}

fn stock_table() -> PolicyTable {
    PolicyConfig::default().compile().expect("stock policy")
}

/// Boot a session and drive it until the startup pass has run.
fn booted(shell: Shell) -> (ShellHandle, KioskSession) {
    init_tracing();
    let handle = ShellHandle::new(shell);
    let mut session = KioskSession::new(stock_table(), handle.bindings()).expect("session");
    session.on_tick(0); // bootstrap: roles resolve, Startup requested
    session.on_tick(1); // startup pass runs (bypasses debounce)
    (handle, session)
}

// =============================================================================
// TESTABLE PROPERTIES
// =============================================================================

#[test]
fn landing_convergence() {
    let (handle, session) = booted(standard_scene("desktop", &["Sales User"]));

    assert_eq!(session.state(), SessionState::Active);
    assert_eq!(handle.0.borrow().route, "selling");
}

#[test]
fn label_correction_disables_exactly_the_blocked_items() {
    let (handle, _session) = booted(standard_scene("selling", &["Sales User"]));
    let shell = handle.0.borrow();

    assert!(shell.node_named("Workspaces").disabled);
    assert!(shell.node_named("Website").disabled);
    assert!(!shell.node_named("Workspaces").in_tab_order);

    assert!(!shell.node_named("Settings").disabled);
    assert!(shell.node_named("Settings").in_tab_order);
}

#[test]
fn allowlist_invariant_never_touches_identity_controls() {
    let (handle, _session) = booted(standard_scene("selling", &["Sales User"]));
    let shell = handle.0.borrow();

    for name in ["Logout", "Toggle Theme"] {
        let node = shell.node_named(name);
        assert!(!node.disabled, "{name} must stay enabled");
        assert!(!node.hidden, "{name} must stay visible");
        assert!(node.in_tab_order, "{name} must stay focusable");
        assert!(!node.pointer_muted, "{name} must keep pointer input");
        assert!(node.mark.is_none(), "{name} must never be marked");
    }
}

#[test]
fn privileged_override_never_enforces() {
    let shell = standard_scene("desktop", &["Sales User", "System Manager"]);
    let pristine = shell.nodes.clone();
    let (handle, mut session) = booted(shell);

    for now in [20u64, 600, 1200] {
        session.on_tree_changed(now);
        session.on_tick(now);
    }

    let shell = handle.0.borrow();
    assert_eq!(session.state(), SessionState::Dormant);
    assert_eq!(shell.nodes, pristine);
    assert_eq!(shell.route, "desktop");
    assert!(shell.navigations.is_empty());
    assert_eq!(shell.menu_items.len(), 4);
}

#[test]
fn reconciliation_is_idempotent() {
    let (handle, mut session) = booted(standard_scene("selling", &["Sales User"]));

    let after_first = handle.0.borrow().nodes.clone();
    let journal_len = session.journal().len();

    // A host mutation signal with nothing actually changed.
    session.on_tree_changed(100);
    session.on_tick(120);

    assert_eq!(handle.0.borrow().nodes, after_first);
    // Quiescent pass: no new journal entry either.
    assert_eq!(session.journal().len(), journal_len);
}

#[test]
fn no_churn_marks_do_not_retrigger_corrections() {
    let (handle, mut session) = booted(standard_scene("selling", &["Sales User"]));

    // Several fallback polls over a settled tree.
    for now in [600u64, 1200, 1800] {
        session.on_tick(now);
    }

    let shell = handle.0.borrow();
    // Still exactly one navigation-free settled state; marks unchanged.
    assert!(shell.navigations.is_empty());
    assert_eq!(session.journal().len(), 1); // the startup pass only
}

#[test]
fn conservative_default_leaves_ambiguous_nodes_alone() {
    let (handle, _session) = booted(standard_scene("selling", &["Sales User"]));
    let shell = handle.0.borrow();

    let node = shell.node_named("Quarterly Report");
    assert!(!node.hidden && !node.disabled && node.mark.is_none());
}

#[test]
fn switcher_is_hidden_and_pointer_muted() {
    let (handle, _session) = booted(standard_scene("selling", &["Sales User"]));
    let shell = handle.0.borrow();

    let switcher = &shell.nodes[1];
    assert!(switcher.hidden);
    assert!(switcher.pointer_muted);
    assert!(switcher.mark.is_some());
}

#[test]
fn user_menu_is_pruned_through_the_host_api() {
    let (handle, _session) = booted(standard_scene("selling", &["Sales User"]));
    let shell = handle.0.borrow();

    assert_eq!(shell.menu_items, vec!["My Profile", "Logout"]);
}

#[test]
fn style_backstop_is_injected_once() {
    let (handle, mut session) = booted(standard_scene("selling", &["Sales User"]));

    for now in [600u64, 1200, 1800] {
        session.on_tick(now);
    }

    assert_eq!(handle.0.borrow().styles, vec!["kiosk-enforcement-backstop"]);
}

#[test]
fn blocked_navigation_is_denied_notified_and_redirected() {
    let (handle, mut session) = booted(standard_scene("selling", &["Sales User"]));

    let decision = session.on_navigation(&NavIntent::link("/app/website", "Website"), 50);

    assert!(!decision.is_allow());
    let shell = handle.0.borrow();
    assert_eq!(shell.notices.len(), 1);
    assert_eq!(shell.notices[0].message, "Access restricted");
    assert_eq!(shell.route, "selling");
}

#[test]
fn logout_navigation_is_always_allowed() {
    let (handle, mut session) = booted(standard_scene("selling", &["Sales User"]));

    let decision = session.on_navigation(&NavIntent::link("/app/logout", "Logout"), 50);

    assert_eq!(decision, Decision::Allow);
    assert!(handle.0.borrow().notices.is_empty());
}

#[test]
fn open_blocked_dropdown_gets_closed() {
    let mut shell = standard_scene("selling", &["Sales User"]);
    shell.nodes.push(
        SceneNode::new(13, None, "div")
            .classes("dropdown-menu show")
            .text("Workspaces Desktop Website")
            .bounds(Rect::new(400.0, 60.0, 200.0, 300.0))
            .open_menu(),
    );
    let (handle, _session) = booted(shell);

    assert!(!handle.0.borrow().nodes[12].menu_open);
}

#[test]
fn role_resolver_backoff_activates_late() {
    init_tracing();
    let mut shell = standard_scene("desktop", &["Sales User"]);
    shell.roles = None;
    let handle = ShellHandle::new(shell);
    let mut session = KioskSession::new(stock_table(), handle.bindings()).expect("session");

    session.on_tick(0);
    assert_eq!(session.state(), SessionState::WaitingForRoles);

    // Inside the backoff window nothing is attempted.
    session.on_tick(100);
    assert_eq!(session.state(), SessionState::WaitingForRoles);

    // The resolver comes up; the next due retry activates the session.
    handle.0.borrow_mut().roles = Some(vec!["Sales User".to_string()]);
    session.on_tick(200);
    assert_eq!(session.state(), SessionState::Active);

    session.on_tick(201);
    assert_eq!(handle.0.borrow().route, "selling");
}

#[test]
fn policy_swap_moves_the_landing() {
    let (handle, mut session) = booted(standard_scene("selling", &["Sales User"]));

    let support_table = PolicyTable::new()
        .privilege("System Manager")
        .ruleset(Ruleset::new("Sales User", "support").block_label("Workspaces"));
    session.set_policy(support_table, 300).expect("swap");

    session.on_tick(301);
    assert_eq!(handle.0.borrow().route, "support");
}

proptest::proptest! {
    /// Any route under a blocked prefix is denied, whatever the suffix.
    #[test]
    fn blocked_prefixes_always_deny(suffix in "[a-z0-9/]{0,16}") {
        let ctx = kiosk::ReconcileContext::new(
            RoleSet::from_names(["Sales User"]),
            Ruleset::new("Sales User", "selling").block_route_prefix("/app/website"),
            kiosk::PolicyEpoch::initial(1),
        );
        let guard = kiosk::NavigationGuard::new();

        let decision = guard.before_activate(&ctx, &NavIntent::route(format!("/app/website{suffix}")));
        proptest::prop_assert!(!decision.is_allow());
    }
}

#[test]
fn coalesced_triggers_run_one_pass() {
    let (_handle, mut session) = booted(standard_scene("selling", &["Sales User"]));
    let journal_len = session.journal().len();

    // A burst of observer noise inside one debounce window.
    for now in 100u64..106 {
        session.on_tree_changed(now);
    }
    session.on_tick(130);

    // At most one (quiescent) pass ran; nothing new recorded.
    assert_eq!(session.journal().len(), journal_len);
}
