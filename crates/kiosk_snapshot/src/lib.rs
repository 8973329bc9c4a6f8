//! Kiosk Navigation Snapshot Format
//!
//! This crate defines the snapshot format for the navigation chrome's UI
//! tree - the point-in-time view that the enforcement engine scans on every
//! reconciliation pass. The host shell captures a snapshot per trigger; the
//! engine never caches one across triggers.
//!
//! # Architecture
//!
//! The snapshot uses Structure-of-Arrays (SoA) layout for cache-friendly
//! iteration and O(1) tree navigation via precomputed link indices, with a
//! shared string table deduplicating text, classes, and attribute values.
//!
//! # Sentinel Constants
//!
//! SoA arrays use sentinel values instead of `Option<T>` to avoid branching:
//! - `NONE_IDX` (u32::MAX) - No tree link
//! - `NONE_ID` (0) - No host handle
//! - `NONE_STR` (u32::MAX) - No string-table entry

mod error;
mod node;
mod snapshot;
mod types;
mod validate;

pub use error::SnapshotError;
pub use node::{has_string, NodeFlags, NodeTable};
pub use snapshot::{NodeSpec, SnapshotEnvelope, TreeBuilder, TreeSnapshot};
pub use types::{Rect, Zone};
pub use validate::Validate;

// =============================================================================
// SENTINEL CONSTANTS
// =============================================================================

/// Tree link sentinel: no link exists.
///
/// Used in `parent`, `first_child`, `next_sibling`, `prev_sibling` arrays.
///
/// # Example
///
/// ```
/// use kiosk_snapshot::NONE_IDX;
///
/// let next_sibling = vec![1, 2, NONE_IDX]; // Node 2 has no next sibling
/// assert_eq!(next_sibling[2], u32::MAX);
/// ```
pub const NONE_IDX: u32 = u32::MAX;

/// Host handle sentinel: no node.
///
/// All host ids in `host_ids` arrays MUST be non-zero. Zero is reserved
/// as the sentinel value.
pub const NONE_ID: u64 = 0;

/// String id sentinel: no string-table entry (absent attribute, empty text).
pub const NONE_STR: u32 = u32::MAX;

/// Maximum nodes per snapshot (sanity check).
pub const MAX_NODES_PER_SNAPSHOT: usize = 65_536;

/// Maximum tree depth (bounds ancestor walks, catches cyclic parent links).
pub const MAX_TREE_DEPTH: usize = 64;

/// Current schema version for forward compatibility.
pub const SCHEMA_VERSION: u32 = 1;

/// Default top band share of the viewport for position bucketing.
pub const DEFAULT_TOP_ZONE_FRACTION: f32 = 0.15;

/// Default left sidebar band share of the viewport for position bucketing.
pub const DEFAULT_SIDEBAR_ZONE_FRACTION: f32 = 0.20;

// =============================================================================
// SERIALIZATION
// =============================================================================

impl TreeSnapshot {
    /// Serialize to bytes using bincode.
    ///
    /// Compact binary output for snapshot capture in bug reports and
    /// deterministic journal replay.
    pub fn serialize(&self) -> Result<Vec<u8>, SnapshotError> {
        bincode::serialize(self).map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    /// Deserialize from bytes.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, SnapshotError> {
        bincode::deserialize(bytes).map_err(|e| SnapshotError::DeserializationFailed(e.to_string()))
    }
}
