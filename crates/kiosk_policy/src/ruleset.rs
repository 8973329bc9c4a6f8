//! Per-role confinement rulesets.

use crate::role::Role;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

bitflags! {
    /// Toggles selecting which enforcement families a ruleset activates.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct RestrictionFlags: u32 {
        /// Redirect to the landing route whenever the session leaves it.
        const FORCE_LANDING = 1 << 0;

        /// Deny navigation to blocked route prefixes.
        const BLOCK_ROUTES = 1 << 1;

        /// Disable menu items whose label is blocked.
        const DISABLE_MENU_ITEMS = 1 << 2;

        /// Hide the workspace/navigation switcher in the top zone.
        const HIDE_SWITCHER = 1 << 3;

        /// Prune blocked entries from the user menu via the host menu API.
        const PRUNE_USER_MENU = 1 << 4;

        /// Close open dropdowns whose content matches blocked vocabulary.
        const CLOSE_BLOCKED_DROPDOWNS = 1 << 5;

        /// No enforcement.
        const NONE = 0;

        /// The default confinement set.
        const STANDARD = Self::FORCE_LANDING.bits()
            | Self::BLOCK_ROUTES.bits()
            | Self::DISABLE_MENU_ITEMS.bits()
            | Self::HIDE_SWITCHER.bits()
            | Self::PRUNE_USER_MENU.bits();

        /// Everything, dropdown auto-close included.
        const ALL = Self::STANDARD.bits() | Self::CLOSE_BLOCKED_DROPDOWNS.bits();
    }
}

impl Default for RestrictionFlags {
    fn default() -> Self {
        RestrictionFlags::STANDARD
    }
}

impl RestrictionFlags {
    pub fn forces_landing(&self) -> bool {
        self.contains(RestrictionFlags::FORCE_LANDING)
    }

    pub fn blocks_routes(&self) -> bool {
        self.contains(RestrictionFlags::BLOCK_ROUTES)
    }

    pub fn disables_menu_items(&self) -> bool {
        self.contains(RestrictionFlags::DISABLE_MENU_ITEMS)
    }

    pub fn hides_switcher(&self) -> bool {
        self.contains(RestrictionFlags::HIDE_SWITCHER)
    }

    pub fn prunes_user_menu(&self) -> bool {
        self.contains(RestrictionFlags::PRUNE_USER_MENU)
    }

    pub fn closes_dropdowns(&self) -> bool {
        self.contains(RestrictionFlags::CLOSE_BLOCKED_DROPDOWNS)
    }
}

/// One allowed entry in the curated landing sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidebarEntry {
    /// Display label.
    pub label: String,
    /// Host-side link target (document type, workspace, route).
    pub target: String,
    /// Icon name, host vocabulary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl SidebarEntry {
    pub fn new(label: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target: target.into(),
            icon: None,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// Confinement rules for one restricted role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ruleset {
    /// The restricted role this ruleset applies to.
    pub role: Role,

    /// Landing route prefix the session is confined to.
    pub landing: String,

    /// Menu labels to disable (matched case-insensitively).
    pub blocked_labels: HashSet<String>,

    /// Route prefixes navigation may never reach.
    pub blocked_route_prefixes: HashSet<String>,

    /// Which enforcement families are active.
    pub restrictions: RestrictionFlags,

    /// Curated sidebar for the landing area. The host rebuilds its sidebar
    /// from this plan; an empty plan leaves the host sidebar alone.
    pub sidebar: Vec<SidebarEntry>,
}

impl Ruleset {
    /// Create a ruleset with the standard restriction set and no blocks.
    pub fn new(role: impl Into<Role>, landing: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            landing: landing.into(),
            blocked_labels: HashSet::new(),
            blocked_route_prefixes: HashSet::new(),
            restrictions: RestrictionFlags::STANDARD,
            sidebar: Vec::new(),
        }
    }

    /// Block a menu label.
    pub fn block_label(mut self, label: impl Into<String>) -> Self {
        self.blocked_labels.insert(label.into());
        self
    }

    /// Block several menu labels.
    pub fn block_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blocked_labels.extend(labels.into_iter().map(Into::into));
        self
    }

    /// Block a route prefix.
    pub fn block_route_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.blocked_route_prefixes.insert(prefix.into());
        self
    }

    /// Block several route prefixes.
    pub fn block_route_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blocked_route_prefixes
            .extend(prefixes.into_iter().map(Into::into));
        self
    }

    /// Set the restriction flags.
    pub fn with_restrictions(mut self, restrictions: RestrictionFlags) -> Self {
        self.restrictions = restrictions;
        self
    }

    /// Append a curated sidebar entry.
    pub fn sidebar_entry(mut self, entry: SidebarEntry) -> Self {
        self.sidebar.push(entry);
        self
    }

    /// Check whether a menu label is blocked. Case-insensitive; a blocked
    /// label also matches as a substring of longer item text, the way menu
    /// items carry icons and counters around their caption.
    pub fn blocks_label(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.blocked_labels
            .iter()
            .any(|label| text.contains(&label.to_lowercase()))
    }

    /// Check whether a route (or href) falls under a blocked prefix.
    pub fn blocks_route(&self, route: &str) -> bool {
        let route = normalize_route(route);
        self.blocked_route_prefixes
            .iter()
            .any(|prefix| route.starts_with(&normalize_route(prefix)))
    }

    /// Check whether a route is inside the landing area.
    pub fn is_on_landing(&self, route: &str) -> bool {
        normalize_route(route).starts_with(&normalize_route(&self.landing))
    }
}

/// Leading-slash-insensitive route comparison key.
///
/// Hosts mix `/app/selling`-style hrefs with `selling`-style router paths;
/// both sides of every prefix comparison go through this.
fn normalize_route(route: &str) -> String {
    route
        .trim_start_matches('/')
        .trim_start_matches("app/")
        .trim_end_matches('/')
        .to_lowercase()
}
