//! Best-effort user-menu pruning via the host menu API.
//!
//! When the host exposes direct removal of named toolbar entries, pruning
//! them beats waiting for their rendered nodes to show up in a snapshot.
//! Host versions differ in whether the API exists at all; the generic
//! classification path remains the fallback either way.

use crate::action::EffectSet;
use crate::fault::Fault;
use crate::host::{HostError, MenuHost};
use kiosk_policy::Ruleset;

/// Outcome of a pruning sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneOutcome {
    /// Entries actually removed.
    pub removed: usize,

    /// Blocked labels with no matching entry.
    pub missing: usize,

    /// Entries the host refused to remove.
    pub refused: usize,
}

impl PruneOutcome {
    pub fn effects(&self) -> EffectSet {
        if self.removed > 0 {
            EffectSet::MENU_PRUNED
        } else {
            EffectSet::NONE
        }
    }
}

/// Remove every blocked label from the user menu.
///
/// One entry failing never aborts the sweep; only a menu API that is not
/// initialized yet surfaces as a fault, so the caller can back off and
/// retry the whole sweep.
pub fn prune_user_menu(menu: &mut dyn MenuHost, ruleset: &Ruleset) -> Result<PruneOutcome, Fault> {
    let mut outcome = PruneOutcome::default();

    // Sorted for a deterministic sweep order.
    let mut labels: Vec<&str> = ruleset.blocked_labels.iter().map(String::as_str).collect();
    labels.sort_unstable();

    for label in labels {
        match menu.remove_item(label) {
            Ok(true) => outcome.removed += 1,
            Ok(false) => outcome.missing += 1,
            Err(HostError::Unavailable { component }) => {
                return Err(Fault::CollaboratorUnavailable { component });
            }
            Err(err) => {
                tracing::debug!(label, error = %err, "menu entry not removed");
                outcome.refused += 1;
            }
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeMenu {
        items: Vec<String>,
        available: bool,
    }

    impl MenuHost for FakeMenu {
        fn remove_item(&mut self, label: &str) -> Result<bool, HostError> {
            if !self.available {
                return Err(HostError::Unavailable { component: "user menu" });
            }
            let before = self.items.len();
            self.items.retain(|item| item != label);
            Ok(self.items.len() != before)
        }
    }

    fn ruleset() -> Ruleset {
        Ruleset::new("Sales User", "selling").block_labels([
            "Workspaces",
            "Website",
            "Session Defaults",
        ])
    }

    #[test]
    fn prunes_blocked_entries() {
        let mut menu = FakeMenu {
            items: vec![
                "My Profile".to_string(),
                "Workspaces".to_string(),
                "Website".to_string(),
                "Logout".to_string(),
            ],
            available: true,
        };

        let outcome = prune_user_menu(&mut menu, &ruleset()).expect("prune");

        assert_eq!(outcome.removed, 2);
        assert_eq!(outcome.missing, 1); // "Session Defaults" not present
        assert_eq!(outcome.effects(), EffectSet::MENU_PRUNED);
        assert_eq!(menu.items, vec!["My Profile", "Logout"]);
    }

    #[test]
    fn unavailable_menu_is_a_recoverable_fault() {
        let mut menu = FakeMenu {
            items: vec![],
            available: false,
        };

        let fault = prune_user_menu(&mut menu, &ruleset()).unwrap_err();
        assert!(fault.is_recoverable());
    }

    #[test]
    fn nothing_to_prune_is_quiet() {
        let mut menu = FakeMenu {
            items: vec!["Logout".to_string()],
            available: true,
        };

        let outcome = prune_user_menu(&mut menu, &ruleset()).expect("prune");
        assert_eq!(outcome.removed, 0);
        assert_eq!(outcome.effects(), EffectSet::NONE);
    }
}
