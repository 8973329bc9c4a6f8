//! Policy configuration documents.
//!
//! Deployments describe confinement as data (YAML or JSON) and compile it
//! into a checked [`PolicyTable`]:
//!
//! ```text
//! PolicySource (YAML/JSON) ──► PolicyConfig ──► PolicyTable
//! ```

use crate::error::PolicyError;
use crate::ruleset::{RestrictionFlags, Ruleset, SidebarEntry};
use crate::table::PolicyTable;
use serde::{Deserialize, Serialize};

/// Serde shape of one ruleset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesetConfig {
    pub role: String,
    pub landing: String,
    #[serde(default)]
    pub blocked_labels: Vec<String>,
    #[serde(default)]
    pub blocked_route_prefixes: Vec<String>,
    #[serde(default)]
    pub restrictions: Option<RestrictionFlags>,
    #[serde(default)]
    pub sidebar: Vec<SidebarEntry>,
}

/// Serde shape of a full policy document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub privileged_roles: Vec<String>,
    #[serde(default)]
    pub rulesets: Vec<RulesetConfig>,
}

impl PolicyConfig {
    /// Parse a YAML policy document.
    pub fn from_yaml(source: &str) -> Result<Self, PolicyError> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Parse a JSON policy document.
    pub fn from_json(source: &str) -> Result<Self, PolicyError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Compile into a checked policy table. Ruleset order in the document
    /// is the priority order.
    pub fn compile(self) -> Result<PolicyTable, PolicyError> {
        let mut table = PolicyTable::new();

        for role in self.privileged_roles {
            table = table.privilege(role.as_str());
        }

        for rc in self.rulesets {
            let mut rs = Ruleset::new(rc.role.as_str(), rc.landing)
                .block_labels(rc.blocked_labels)
                .block_route_prefixes(rc.blocked_route_prefixes);
            if let Some(restrictions) = rc.restrictions {
                rs = rs.with_restrictions(restrictions);
            }
            for entry in rc.sidebar {
                rs = rs.sidebar_entry(entry);
            }
            table = table.ruleset(rs);
        }

        table.check()?;
        Ok(table)
    }
}

impl Default for PolicyConfig {
    /// The stock sales-workspace confinement: "Sales User" is pinned to
    /// the selling workspace with the chrome escape routes blocked, and
    /// "System Manager" bypasses everything.
    fn default() -> Self {
        Self {
            privileged_roles: vec!["System Manager".to_string()],
            rulesets: vec![RulesetConfig {
                role: "Sales User".to_string(),
                landing: "selling".to_string(),
                blocked_labels: vec![
                    "Workspaces".to_string(),
                    "Desktop".to_string(),
                    "Website".to_string(),
                    "Help".to_string(),
                    "Session Defaults".to_string(),
                ],
                blocked_route_prefixes: vec![
                    "/app/workspace".to_string(),
                    "/app/workspaces".to_string(),
                    "/app/desktop".to_string(),
                    "/app/website".to_string(),
                ],
                restrictions: Some(RestrictionFlags::ALL),
                sidebar: vec![
                    SidebarEntry::new("Selling", "Selling").with_icon("sell"),
                    SidebarEntry::new("Quotation", "Quotation").with_icon("sell"),
                    SidebarEntry::new("Sales Orders", "Sales Order").with_icon("clipboard"),
                    SidebarEntry::new("Customers", "Customer").with_icon("users"),
                ],
            }],
        }
    }
}
