//! Node table - the SoA arena holding one snapshot's UI nodes.
//!
//! Node data is stored in parallel arrays for cache-friendly iteration.
//! Tree links (`parent`, `first_child`, `next_sibling`, `prev_sibling`)
//! are indices into the arrays with `NONE_IDX` for "no link".

use crate::{Rect, MAX_TREE_DEPTH, NONE_IDX, NONE_STR};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Structural flags captured per node.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct NodeFlags: u16 {
        /// Node responds to activation (click/keyboard).
        const INTERACTIVE = 1 << 0;

        /// Node is currently rendered.
        const VISIBLE = 1 << 1;

        /// Node participates in the tab/keyboard focus order.
        const FOCUSABLE = 1 << 2;

        /// Node is a navigation link (carries an href).
        const LINK = 1 << 3;

        /// Node is a menu/dropdown that is currently open.
        const MENU_OPEN = 1 << 4;
    }
}

/// Parallel-array node storage.
///
/// # Invariants
///
/// - All arrays have the same length N
/// - Tree link indices are either `NONE_IDX` or < N
/// - All `host_ids` are non-zero (`NONE_ID` is reserved)
/// - String ids are either `NONE_STR` or valid indices into the owning
///   snapshot's string table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeTable {
    /// Opaque host handles (non-zero, stable for the node's lifetime).
    pub host_ids: Vec<u64>,

    /// Element tag name (string id).
    pub tag_ids: Vec<u32>,

    /// Visible text content (string id, `NONE_STR` if empty).
    pub text_ids: Vec<u32>,

    /// Element id attribute (string id, `NONE_STR` if absent).
    pub elem_ids: Vec<u32>,

    /// Space-joined class attribute (string id, `NONE_STR` if absent).
    pub class_ids: Vec<u32>,

    /// ARIA role attribute (string id, `NONE_STR` if absent).
    pub role_ids: Vec<u32>,

    /// ARIA label attribute (string id, `NONE_STR` if absent).
    pub aria_label_ids: Vec<u32>,

    /// Link target (string id, `NONE_STR` if not a link).
    pub href_ids: Vec<u32>,

    /// Bounds in viewport space.
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub w: Vec<f32>,
    pub h: Vec<f32>,

    /// Structural flags.
    pub flags: Vec<NodeFlags>,

    /// Tree links (`NONE_IDX` for no link).
    pub parent: Vec<u32>,
    pub first_child: Vec<u32>,
    pub next_sibling: Vec<u32>,
    pub prev_sibling: Vec<u32>,
}

impl NodeTable {
    /// Number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.host_ids.len()
    }

    /// Check if the table is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.host_ids.is_empty()
    }

    /// Get node bounds by index.
    #[inline]
    pub fn bounds(&self, idx: usize) -> Option<Rect> {
        if idx < self.len() {
            Some(Rect::new(self.x[idx], self.y[idx], self.w[idx], self.h[idx]))
        } else {
            None
        }
    }

    /// Get the host handle by index.
    #[inline]
    pub fn host_id(&self, idx: usize) -> Option<u64> {
        self.host_ids.get(idx).copied()
    }

    /// Get node flags by index.
    #[inline]
    pub fn node_flags(&self, idx: usize) -> NodeFlags {
        self.flags.get(idx).copied().unwrap_or(NodeFlags::empty())
    }

    /// Find node index by host handle.
    pub fn find_host(&self, host_id: u64) -> Option<usize> {
        self.host_ids.iter().position(|&id| id == host_id)
    }

    /// Get parent index (O(1)).
    #[inline]
    pub fn parent_idx(&self, idx: usize) -> Option<usize> {
        self.parent.get(idx).and_then(|&p| {
            if p == NONE_IDX {
                None
            } else {
                Some(p as usize)
            }
        })
    }

    /// Get first child index (O(1)).
    #[inline]
    pub fn first_child_idx(&self, idx: usize) -> Option<usize> {
        self.first_child.get(idx).and_then(|&fc| {
            if fc == NONE_IDX {
                None
            } else {
                Some(fc as usize)
            }
        })
    }

    /// Get next sibling index (O(1)).
    #[inline]
    pub fn next_sibling_idx(&self, idx: usize) -> Option<usize> {
        self.next_sibling.get(idx).and_then(|&ns| {
            if ns == NONE_IDX {
                None
            } else {
                Some(ns as usize)
            }
        })
    }

    /// Get previous sibling index (O(1)).
    #[inline]
    pub fn prev_sibling_idx(&self, idx: usize) -> Option<usize> {
        self.prev_sibling.get(idx).and_then(|&ps| {
            if ps == NONE_IDX {
                None
            } else {
                Some(ps as usize)
            }
        })
    }

    /// Iterate over children of a node.
    pub fn children(&self, parent_idx: usize) -> impl Iterator<Item = usize> + '_ {
        ChildrenIter {
            table: self,
            next_idx: self.first_child.get(parent_idx).copied(),
        }
    }

    /// Iterate over ancestors, nearest first.
    ///
    /// Bounded by `MAX_TREE_DEPTH` so a corrupt table cannot loop forever.
    pub fn ancestors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        AncestorsIter {
            table: self,
            current: idx,
            remaining: MAX_TREE_DEPTH,
        }
    }
}

/// Iterator over children of a node.
struct ChildrenIter<'a> {
    table: &'a NodeTable,
    next_idx: Option<u32>,
}

impl<'a> Iterator for ChildrenIter<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.next_idx?;
        if idx == NONE_IDX {
            return None;
        }

        let result = idx as usize;

        self.next_idx = self
            .table
            .next_sibling
            .get(result)
            .copied()
            .filter(|&ns| ns != NONE_IDX);

        Some(result)
    }
}

/// Iterator over ancestors of a node.
struct AncestorsIter<'a> {
    table: &'a NodeTable,
    current: usize,
    remaining: usize,
}

impl<'a> Iterator for AncestorsIter<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let parent = self.table.parent_idx(self.current)?;
        self.current = parent;
        Some(parent)
    }
}

/// Is this string id a real string-table reference?
#[inline]
pub fn has_string(id: u32) -> bool {
    id != NONE_STR
}
