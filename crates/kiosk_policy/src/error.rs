//! Policy error types.

use thiserror::Error;

/// Errors from parsing or checking policy documents.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("YAML policy document rejected: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON policy document rejected: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Role {role} has more than one ruleset")]
    DuplicateRuleset { role: String },

    #[error("Privileged role {role} cannot also carry a ruleset")]
    PrivilegedRuleset { role: String },

    #[error("Ruleset for {role} has an empty landing route")]
    EmptyLanding { role: String },
}
