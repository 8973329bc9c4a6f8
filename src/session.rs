//! Session bootstrap and wiring.
//!
//! A `KioskSession` is constructed once at shell startup and driven by the
//! host event loop. It waits for the role resolver to come up, resolves
//! the active ruleset, and from then on turns tree/route/tick events into
//! debounced reconciliation passes. Sessions holding a privileged role, or
//! no restricted role at all, stay dormant and never touch the shell.

use kiosk_enforce::{
    ensure_backstop, prune_user_menu, Decision, EnforcementEngine, EnforcementJournal, Fault,
    MenuHost, NavIntent, NavigationGuard, Notifier, PassScheduler, PolicyEpoch, ReconcileContext,
    RetryBackoff, RoleResolver, Router, StyleHost, TreeHost, Trigger, ROLE_RETRY_BASE_MS,
    ROLE_RETRY_MAX_ATTEMPTS,
};
use kiosk_policy::{PolicyFingerprint, PolicyTable, RoleSet};

/// The host seams a session runs against.
///
/// The menu host is optional - shell versions differ in whether a direct
/// menu API exists; without one the classification path covers the menu.
pub struct HostBindings {
    pub roles: Box<dyn RoleResolver>,
    pub router: Box<dyn Router>,
    pub tree: Box<dyn TreeHost>,
    pub menu: Option<Box<dyn MenuHost>>,
    pub notifier: Box<dyn Notifier>,
    pub styles: Box<dyn StyleHost>,
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Role resolver not available yet; retrying on backoff.
    WaitingForRoles,

    /// A restricted role is active; enforcement is running.
    Active,

    /// Privileged or unmatched session; never enforces.
    Dormant,
}

/// One kiosk-mode session inside the host shell.
pub struct KioskSession {
    table: PolicyTable,
    fingerprint: PolicyFingerprint,
    hosts: HostBindings,
    engine: EnforcementEngine,
    guard: NavigationGuard,
    scheduler: PassScheduler,
    role_backoff: RetryBackoff,
    state: SessionState,
    ctx: Option<ReconcileContext>,
    menu_pruned: bool,
    style_injected: bool,
}

impl KioskSession {
    /// Build a session. The policy table is checked up front; enforcement
    /// starts once the role resolver reports a restricted role.
    pub fn new(table: PolicyTable, hosts: HostBindings) -> Result<Self, Fault> {
        table.check()?;
        let fingerprint = PolicyFingerprint::compute(&table);
        Ok(Self {
            table,
            fingerprint,
            hosts,
            engine: EnforcementEngine::standard(),
            guard: NavigationGuard::new(),
            scheduler: PassScheduler::new(),
            role_backoff: RetryBackoff::new(ROLE_RETRY_BASE_MS, ROLE_RETRY_MAX_ATTEMPTS),
            state: SessionState::WaitingForRoles,
            ctx: None,
            menu_pruned: false,
            style_injected: false,
        })
    }

    /// Replace the stock engine (custom classifier table).
    pub fn with_engine(mut self, engine: EnforcementEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn context(&self) -> Option<&ReconcileContext> {
        self.ctx.as_ref()
    }

    pub fn journal(&self) -> &EnforcementJournal {
        self.engine.journal()
    }

    // =========================================================================
    // EVENT-LOOP ENTRY POINTS
    // =========================================================================

    /// Drive the session. Hosts call this from their timer at whatever
    /// cadence they have; all scheduling is derived from `now` (ms).
    pub fn on_tick(&mut self, now: u64) {
        match self.state {
            SessionState::WaitingForRoles => self.try_bootstrap(now),
            SessionState::Active => {
                self.ensure_session_setup();
                if let Some(trigger) = self.scheduler.poll(now) {
                    self.run_pass(trigger, now);
                }
            }
            SessionState::Dormant => {}
        }
    }

    /// The tree observer saw a (possible) mutation.
    pub fn on_tree_changed(&mut self, now: u64) {
        if self.state == SessionState::Active {
            self.scheduler.request(Trigger::TreeChanged, now);
        }
    }

    /// The router reported a route change.
    pub fn on_route_changed(&mut self, now: u64) {
        if self.state == SessionState::Active {
            self.scheduler.request(Trigger::RouteChanged, now);
        }
    }

    /// A navigation is about to happen. Synchronous: the host cancels the
    /// activation when this returns a denial.
    pub fn on_navigation(&mut self, intent: &NavIntent, now: u64) -> Decision {
        let Some(ctx) = &self.ctx else {
            return Decision::Allow;
        };
        if self.state != SessionState::Active {
            return Decision::Allow;
        }

        let (decision, effects) = self.guard.handle(
            ctx,
            intent,
            self.hosts.router.as_mut(),
            self.hosts.notifier.as_mut(),
        );

        if !effects.is_empty() {
            // The denial moved the route; reconcile soon after.
            self.scheduler.request(Trigger::RouteChanged, now);
        }

        decision
    }

    /// The host's role set changed mid-session (e.g. re-login).
    pub fn on_roles_changed(&mut self, roles: RoleSet, now: u64) {
        self.apply_roles(roles, now, Trigger::PolicyChanged);
    }

    /// Swap the policy table at runtime.
    pub fn set_policy(&mut self, table: PolicyTable, now: u64) -> Result<(), Fault> {
        table.check()?;
        self.fingerprint = PolicyFingerprint::compute(&table);
        self.table = table;

        if let Some(roles) = self.ctx.as_ref().map(|ctx| ctx.roles.clone()) {
            self.apply_roles(roles, now, Trigger::PolicyChanged);
        }
        Ok(())
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn try_bootstrap(&mut self, now: u64) {
        if !self.role_backoff.ready(now) {
            if self.role_backoff.exhausted() {
                tracing::warn!(
                    attempts = self.role_backoff.attempts(),
                    "role resolver never came up; session dormant"
                );
                self.state = SessionState::Dormant;
            }
            return;
        }

        match self.hosts.roles.active_roles() {
            Ok(roles) => {
                self.role_backoff.reset();
                self.apply_roles(roles, now, Trigger::Startup);
            }
            Err(err) => {
                tracing::debug!(error = %err, "role resolver not ready");
                self.role_backoff.record_failure(now);
            }
        }
    }

    fn apply_roles(&mut self, roles: RoleSet, now: u64, trigger: Trigger) {
        let fingerprint = self.fingerprint.to_u64();
        let epoch = match &self.ctx {
            Some(ctx) => ctx.epoch.next(fingerprint),
            None => PolicyEpoch::initial(fingerprint),
        };

        match self.table.resolve(&roles) {
            Some(ruleset) => {
                tracing::info!(
                    role = %ruleset.role,
                    landing = %ruleset.landing,
                    policy = self.fingerprint.short(),
                    "kiosk confinement active"
                );
                self.ctx = Some(ReconcileContext::new(roles, ruleset.clone(), epoch));
                self.state = SessionState::Active;
                self.menu_pruned = false;
                self.scheduler.request(trigger, now);
            }
            None => {
                tracing::debug!("no restricted role matched; session dormant");
                self.ctx = None;
                self.state = SessionState::Dormant;
            }
        }
    }

    /// One-shot session setup: stylesheet backstop and user-menu pruning.
    /// Both retried until they land; both idempotent.
    fn ensure_session_setup(&mut self) {
        let Some(ctx) = &self.ctx else { return };

        if !self.style_injected {
            match ensure_backstop(self.hosts.styles.as_mut()) {
                Ok(_) => self.style_injected = true,
                Err(err) => tracing::debug!(error = %err, "style backstop not injected yet"),
            }
        }

        if !self.menu_pruned && ctx.ruleset.restrictions.prunes_user_menu() {
            match self.hosts.menu.as_deref_mut() {
                Some(menu) => match prune_user_menu(menu, &ctx.ruleset) {
                    Ok(outcome) => {
                        if outcome.removed > 0 {
                            tracing::debug!(removed = outcome.removed, "user menu pruned");
                        }
                        self.menu_pruned = true;
                    }
                    Err(fault) => {
                        tracing::debug!(error = %fault, "menu host not ready; will retry");
                    }
                },
                // No direct menu API in this host version; the
                // classification path covers the menu.
                None => self.menu_pruned = true,
            }
        }
    }

    fn run_pass(&mut self, trigger: Trigger, now: u64) {
        let Some(ctx) = &self.ctx else { return };

        let span = tracing::debug_span!("reconcile", trigger = trigger.as_str());
        let _enter = span.enter();

        match self.engine.pass(
            ctx,
            trigger,
            now,
            self.hosts.tree.as_mut(),
            self.hosts.router.as_mut(),
        ) {
            Ok(report) => {
                if !report.is_quiescent() {
                    tracing::debug!(
                        scanned = report.scanned,
                        corrected = report.corrected,
                        skipped = report.skipped,
                        effects = ?report.effects,
                        "pass complete"
                    );
                }
            }
            Err(fault) if fault.is_recoverable() => {
                tracing::debug!(error = %fault, "pass deferred");
            }
            Err(fault) => {
                tracing::error!(error = %fault, "pass failed");
            }
        }

        // A failed pass still counts as completed; the fallback poll
        // retries it at its own cadence.
        self.scheduler.complete(now);
    }
}
