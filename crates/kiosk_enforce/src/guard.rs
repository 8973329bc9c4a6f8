//! The navigation guard.
//!
//! Invoked synchronously before a link activation or route transition
//! completes. The allowlist exemption check runs first and is absolute:
//! logout, theme toggle, and reload can never be denied, whatever the
//! active ruleset matches.

use crate::action::EffectSet;
use crate::engine::ReconcileContext;
use crate::host::{Notice, Notifier, Router};
use kiosk_classify::ClassifiedNode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An intended navigation, as much of it as the host can describe.
#[derive(Debug, Clone, Default)]
pub struct NavIntent {
    /// Target route or href, if known.
    pub route: Option<String>,

    /// Text of the activated affordance, if any.
    pub text: Option<String>,

    /// Classification of the activated node, when the activation came
    /// through a classified tree node.
    pub classified: Option<ClassifiedNode>,
}

impl NavIntent {
    /// An intent for a bare route transition.
    pub fn route(route: impl Into<String>) -> Self {
        Self {
            route: Some(route.into()),
            ..Default::default()
        }
    }

    /// An intent for a link activation.
    pub fn link(route: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            route: Some(route.into()),
            text: Some(text.into()),
            classified: None,
        }
    }

    pub fn with_classified(mut self, classified: ClassifiedNode) -> Self {
        self.classified = Some(classified);
        self
    }
}

/// Why a navigation was denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenyReason {
    /// The target route falls under a blocked prefix.
    BlockedRoute { route: String },

    /// The affordance text matches a blocked label.
    BlockedLabel { text: String },
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::BlockedRoute { route } => write!(f, "route {route} is blocked"),
            DenyReason::BlockedLabel { text } => write!(f, "{text} is blocked"),
        }
    }
}

/// Guard verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Allow,
    Deny { reason: DenyReason },
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Synchronous pre-activation policy check.
#[derive(Debug, Clone)]
pub struct NavigationGuard {
    exempt_terms: Vec<String>,
}

impl NavigationGuard {
    pub fn new() -> Self {
        Self {
            exempt_terms: kiosk_policy::DEFAULT_EXEMPT_TERMS
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }

    /// Guard with extra exempt terms on top of the defaults.
    pub fn with_exempt_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exempt_terms
            .extend(terms.into_iter().map(|t| t.into().to_lowercase()));
        self
    }

    /// Decide whether an intended navigation may complete.
    pub fn before_activate(&self, ctx: &ReconcileContext, intent: &NavIntent) -> Decision {
        // Exemption first, and absolute.
        if self.is_exempt(intent) {
            return Decision::Allow;
        }

        if ctx.ruleset.restrictions.blocks_routes() {
            if let Some(route) = &intent.route {
                if ctx.ruleset.blocks_route(route) {
                    return Decision::Deny {
                        reason: DenyReason::BlockedRoute {
                            route: route.clone(),
                        },
                    };
                }
            }

            if let Some(text) = &intent.text {
                if ctx.ruleset.blocks_label(text) {
                    return Decision::Deny {
                        reason: DenyReason::BlockedLabel { text: text.clone() },
                    };
                }
            }
        }

        Decision::Allow
    }

    /// Decide, and on deny surface the notice and pull the session back to
    /// its landing route. Returns the decision plus the effects produced.
    pub fn handle(
        &self,
        ctx: &ReconcileContext,
        intent: &NavIntent,
        router: &mut dyn Router,
        notifier: &mut dyn Notifier,
    ) -> (Decision, EffectSet) {
        let decision = self.before_activate(ctx, intent);
        let mut effects = EffectSet::NONE;

        if let Decision::Deny { reason } = &decision {
            tracing::info!(%reason, "navigation denied");
            notifier.notify(&Notice::denied());
            effects |= EffectSet::NOTICE_SHOWN;

            match router.navigate_to(&ctx.ruleset.landing) {
                Ok(()) => effects |= EffectSet::ROUTE_REDIRECTED,
                Err(err) => {
                    tracing::warn!(error = %err, "landing redirect refused after denial");
                }
            }
        }

        (decision, effects)
    }

    fn is_exempt(&self, intent: &NavIntent) -> bool {
        if intent
            .classified
            .as_ref()
            .is_some_and(|c| c.allowlisted)
        {
            return true;
        }

        intent.text.as_ref().is_some_and(|text| {
            let text = text.to_lowercase();
            self.exempt_terms.iter().any(|t| text.contains(t))
        })
    }
}

impl Default for NavigationGuard {
    fn default() -> Self {
        Self::new()
    }
}
