//! Tree snapshot and builder.
//!
//! A `TreeSnapshot` is the immutable-for-one-pass view of the navigation
//! chrome that the reconciler scans. It is recreated on every trigger
//! firing and never cached across triggers - a stale snapshot would cause
//! missed corrections.

use crate::node::{has_string, NodeFlags, NodeTable};
use crate::types::{Rect, Zone};
use crate::{NONE_IDX, NONE_STR, SCHEMA_VERSION};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Snapshot metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEnvelope {
    /// Schema version for forward compatibility.
    pub schema_version: u32,

    /// Event-loop tick at capture time.
    pub captured_tick: u64,

    /// Route the shell was on when the snapshot was taken.
    pub route: String,

    /// Viewport bounds at capture time.
    pub viewport: Rect,
}

/// Point-in-time view of the navigation UI tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeSnapshot {
    /// Capture metadata.
    pub envelope: SnapshotEnvelope,

    /// Deduplicated strings referenced by the node table.
    pub string_table: Vec<String>,

    /// Node arena.
    pub nodes: NodeTable,
}

impl TreeSnapshot {
    /// Number of nodes in the snapshot.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Route at capture time.
    #[inline]
    pub fn route(&self) -> &str {
        &self.envelope.route
    }

    /// Iterate over all node indices.
    pub fn indices(&self) -> impl Iterator<Item = usize> {
        0..self.nodes.len()
    }

    /// Resolve a string id against the string table.
    pub fn resolve(&self, string_id: u32) -> Option<&str> {
        if !has_string(string_id) {
            return None;
        }
        self.string_table.get(string_id as usize).map(String::as_str)
    }

    /// Element tag name.
    pub fn tag(&self, idx: usize) -> Option<&str> {
        self.nodes.tag_ids.get(idx).and_then(|&id| self.resolve(id))
    }

    /// Visible text content.
    pub fn text(&self, idx: usize) -> Option<&str> {
        self.nodes.text_ids.get(idx).and_then(|&id| self.resolve(id))
    }

    /// Element id attribute.
    pub fn elem_id(&self, idx: usize) -> Option<&str> {
        self.nodes.elem_ids.get(idx).and_then(|&id| self.resolve(id))
    }

    /// Space-joined class attribute.
    pub fn classes(&self, idx: usize) -> Option<&str> {
        self.nodes.class_ids.get(idx).and_then(|&id| self.resolve(id))
    }

    /// ARIA role attribute.
    pub fn aria_role(&self, idx: usize) -> Option<&str> {
        self.nodes.role_ids.get(idx).and_then(|&id| self.resolve(id))
    }

    /// ARIA label attribute.
    pub fn aria_label(&self, idx: usize) -> Option<&str> {
        self.nodes
            .aria_label_ids
            .get(idx)
            .and_then(|&id| self.resolve(id))
    }

    /// Link target.
    pub fn href(&self, idx: usize) -> Option<&str> {
        self.nodes.href_ids.get(idx).and_then(|&id| self.resolve(id))
    }

    /// Position bucket for a node relative to the capture viewport.
    pub fn zone(&self, idx: usize, top_fraction: f32, sidebar_fraction: f32) -> Zone {
        match self.nodes.bounds(idx) {
            Some(bounds) => Zone::from_bounds(
                bounds,
                self.envelope.viewport,
                top_fraction,
                sidebar_fraction,
            ),
            None => Zone::Body,
        }
    }
}

/// Per-node input to the builder.
#[derive(Debug, Clone, Default)]
pub struct NodeSpec {
    pub tag: String,
    pub text: Option<String>,
    pub elem_id: Option<String>,
    pub classes: Option<String>,
    pub aria_role: Option<String>,
    pub aria_label: Option<String>,
    pub href: Option<String>,
    pub bounds: Rect,
    pub flags: NodeFlags,
}

impl NodeSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            flags: NodeFlags::VISIBLE,
            ..Default::default()
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn elem_id(mut self, id: impl Into<String>) -> Self {
        self.elem_id = Some(id.into());
        self
    }

    pub fn classes(mut self, classes: impl Into<String>) -> Self {
        self.classes = Some(classes.into());
        self
    }

    pub fn aria_role(mut self, role: impl Into<String>) -> Self {
        self.aria_role = Some(role.into());
        self
    }

    pub fn aria_label(mut self, label: impl Into<String>) -> Self {
        self.aria_label = Some(label.into());
        self
    }

    pub fn href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self.flags |= NodeFlags::LINK | NodeFlags::INTERACTIVE;
        self
    }

    pub fn bounds(mut self, bounds: Rect) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn flags(mut self, flags: NodeFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn interactive(mut self) -> Self {
        self.flags |= NodeFlags::INTERACTIVE | NodeFlags::FOCUSABLE;
        self
    }
}

/// Incremental snapshot builder with string interning.
///
/// Hosts push nodes in document order; sibling chains and parent links are
/// derived as nodes arrive.
#[derive(Debug)]
pub struct TreeBuilder {
    route: String,
    viewport: Rect,
    captured_tick: u64,
    strings: Vec<String>,
    lookup: HashMap<String, u32>,
    nodes: NodeTable,
    last_child: Vec<u32>,
    next_auto_id: u64,
}

impl TreeBuilder {
    pub fn new(route: impl Into<String>, viewport: Rect) -> Self {
        Self {
            route: route.into(),
            viewport,
            captured_tick: 0,
            strings: Vec::new(),
            lookup: HashMap::new(),
            nodes: NodeTable::default(),
            last_child: Vec::new(),
            next_auto_id: 1,
        }
    }

    pub fn captured_at(mut self, tick: u64) -> Self {
        self.captured_tick = tick;
        self
    }

    /// Push a node with an auto-assigned host handle.
    ///
    /// Intended for tests and synthetic trees; real hosts should use
    /// [`TreeBuilder::push_with_id`] so marks survive across captures.
    pub fn push(&mut self, parent: Option<usize>, spec: NodeSpec) -> usize {
        let host_id = self.next_auto_id;
        self.next_auto_id += 1;
        self.push_with_id(parent, host_id, spec)
    }

    /// Push a node carrying the host's stable handle.
    pub fn push_with_id(&mut self, parent: Option<usize>, host_id: u64, spec: NodeSpec) -> usize {
        let idx = self.nodes.len();

        let tag_id = self.intern(&spec.tag);
        let text_id = self.intern_opt(spec.text.as_deref());
        let elem_id = self.intern_opt(spec.elem_id.as_deref());
        let class_id = self.intern_opt(spec.classes.as_deref());
        let role_id = self.intern_opt(spec.aria_role.as_deref());
        let aria_label_id = self.intern_opt(spec.aria_label.as_deref());
        let href_id = self.intern_opt(spec.href.as_deref());

        self.nodes.host_ids.push(host_id);
        self.nodes.tag_ids.push(tag_id);
        self.nodes.text_ids.push(text_id);
        self.nodes.elem_ids.push(elem_id);
        self.nodes.class_ids.push(class_id);
        self.nodes.role_ids.push(role_id);
        self.nodes.aria_label_ids.push(aria_label_id);
        self.nodes.href_ids.push(href_id);
        self.nodes.x.push(spec.bounds.x);
        self.nodes.y.push(spec.bounds.y);
        self.nodes.w.push(spec.bounds.w);
        self.nodes.h.push(spec.bounds.h);
        self.nodes.flags.push(spec.flags);
        self.nodes.first_child.push(NONE_IDX);
        self.nodes.next_sibling.push(NONE_IDX);
        self.nodes.prev_sibling.push(NONE_IDX);
        self.last_child.push(NONE_IDX);

        match parent {
            Some(p) if p < idx => {
                self.nodes.parent.push(p as u32);
                let prev = self.last_child[p];
                if prev == NONE_IDX {
                    self.nodes.first_child[p] = idx as u32;
                } else {
                    self.nodes.next_sibling[prev as usize] = idx as u32;
                    self.nodes.prev_sibling[idx] = prev;
                }
                self.last_child[p] = idx as u32;
            }
            _ => {
                self.nodes.parent.push(NONE_IDX);
            }
        }

        idx
    }

    /// Finish the build.
    pub fn finish(self) -> TreeSnapshot {
        TreeSnapshot {
            envelope: SnapshotEnvelope {
                schema_version: SCHEMA_VERSION,
                captured_tick: self.captured_tick,
                route: self.route,
                viewport: self.viewport,
            },
            string_table: self.strings,
            nodes: self.nodes,
        }
    }

    fn intern(&mut self, s: &str) -> u32 {
        if let Some(&id) = self.lookup.get(s) {
            return id;
        }
        let id = self.strings.len() as u32;
        self.strings.push(s.to_string());
        self.lookup.insert(s.to_string(), id);
        id
    }

    fn intern_opt(&mut self, s: Option<&str>) -> u32 {
        match s {
            Some(s) if !s.is_empty() => self.intern(s),
            _ => NONE_STR,
        }
    }
}
