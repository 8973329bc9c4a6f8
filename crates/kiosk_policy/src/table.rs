//! The policy table: priority-ordered rulesets plus the privileged escape
//! hatch.

use crate::error::PolicyError;
use crate::role::{Role, RoleSet};
use crate::ruleset::Ruleset;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Priority-ordered confinement policy for a deployment.
///
/// Resolution is deterministic and side-effect free: the privileged roles
/// suppress everything, otherwise the first ruleset (in declaration order)
/// whose role the session holds wins. At most one ruleset is ever active.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyTable {
    /// Roles that disable all enforcement for the session.
    privileged: HashSet<Role>,

    /// Rulesets in priority order (first match wins).
    rulesets: Vec<Ruleset>,
}

impl PolicyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a privileged role.
    pub fn privilege(mut self, role: impl Into<Role>) -> Self {
        self.privileged.insert(role.into());
        self
    }

    /// Append a ruleset at the lowest priority so far.
    pub fn ruleset(mut self, ruleset: Ruleset) -> Self {
        self.rulesets.push(ruleset);
        self
    }

    /// Check table invariants.
    ///
    /// Rejects duplicate ruleset roles, privileged roles that also carry a
    /// ruleset, and empty landing routes.
    pub fn check(&self) -> Result<(), PolicyError> {
        let mut seen = HashSet::new();
        for rs in &self.rulesets {
            if rs.landing.trim_matches('/').is_empty() {
                return Err(PolicyError::EmptyLanding {
                    role: rs.role.to_string(),
                });
            }
            if !seen.insert(&rs.role) {
                return Err(PolicyError::DuplicateRuleset {
                    role: rs.role.to_string(),
                });
            }
            if self.privileged.contains(&rs.role) {
                return Err(PolicyError::PrivilegedRuleset {
                    role: rs.role.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Check whether the session holds a privileged role.
    pub fn is_privileged(&self, roles: &RoleSet) -> bool {
        roles.contains_any(self.privileged.iter())
    }

    /// Resolve the active ruleset for a session.
    ///
    /// Returns `None` when a privileged role is present (admin escape
    /// hatch) or no restricted role matches.
    pub fn resolve(&self, roles: &RoleSet) -> Option<&Ruleset> {
        if self.is_privileged(roles) {
            return None;
        }
        self.rulesets.iter().find(|rs| roles.contains(&rs.role))
    }

    /// Privileged roles, for fingerprinting.
    pub fn privileged_roles(&self) -> impl Iterator<Item = &Role> {
        self.privileged.iter()
    }

    /// All rulesets in priority order.
    pub fn rulesets(&self) -> &[Ruleset] {
        &self.rulesets
    }
}
