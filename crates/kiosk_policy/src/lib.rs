//! Confinement policy for kiosk-mode sessions.
//!
//! This crate provides:
//!
//! - **Role / RoleSet**: opaque session role identities
//! - **Ruleset**: landing route + blocked labels/routes for one role
//! - **PolicyTable**: priority-ordered resolution with privileged override
//! - **PolicyConfig**: YAML/JSON policy documents compiled into a table
//! - **PolicyFingerprint**: content hash feeding enforcement epochs
//!
//! # Architecture
//!
//! ```text
//! PolicySource (YAML/JSON) ──► PolicyConfig ──► PolicyTable
//!                                                    │
//!                                          resolve(RoleSet)
//!                                                    │
//!                              ┌─────────────────────┴───────────┐
//!                              ▼                                 ▼
//!                        Some(&Ruleset)                        None
//!                  (one active confinement)        (privileged, or unmatched)
//! ```
//!
//! # Example
//!
//! ```
//! use kiosk_policy::{PolicyTable, RoleSet, Ruleset};
//!
//! let table = PolicyTable::new()
//!     .privilege("System Manager")
//!     .ruleset(Ruleset::new("Sales User", "selling").block_label("Workspaces"));
//!
//! let roles = RoleSet::from_names(["Sales User"]);
//! assert!(table.resolve(&roles).is_some());
//!
//! let admin = RoleSet::from_names(["Sales User", "System Manager"]);
//! assert!(table.resolve(&admin).is_none());
//! ```

mod config;
mod error;
mod fingerprint;
mod role;
mod ruleset;
mod table;

pub use config::{PolicyConfig, RulesetConfig};
pub use error::PolicyError;
pub use fingerprint::PolicyFingerprint;
pub use role::{Role, RoleSet};
pub use ruleset::{RestrictionFlags, Ruleset, SidebarEntry};
pub use table::PolicyTable;

/// Affordances exempt from every corrective action, whatever the active
/// ruleset says. Matching any of these short-circuits classification to
/// "no action"; logout must keep working in every configuration.
pub const DEFAULT_EXEMPT_TERMS: &[&str] = &[
    "logout",
    "log out",
    "sign out",
    "reload",
    "toggle theme",
    "theme",
    "avatar",
    "my profile",
];
