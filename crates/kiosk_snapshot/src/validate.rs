//! Snapshot validation.
//!
//! All snapshots MUST be validated before a reconciliation pass runs over
//! them. Validation enforces the SoA invariants the engine depends on.

use crate::{
    NodeTable, SnapshotError, TreeSnapshot, MAX_NODES_PER_SNAPSHOT, MAX_TREE_DEPTH, NONE_IDX,
    NONE_STR, SCHEMA_VERSION,
};
use std::collections::HashSet;

/// Trait for validatable types.
pub trait Validate {
    /// Validate the object, returning an error if invalid.
    fn validate(&self) -> Result<(), SnapshotError>;

    /// Validate in debug builds only (for performance).
    #[cfg(debug_assertions)]
    fn debug_validate(&self) -> Result<(), SnapshotError> {
        self.validate()
    }

    #[cfg(not(debug_assertions))]
    fn debug_validate(&self) -> Result<(), SnapshotError> {
        Ok(())
    }
}

impl Validate for TreeSnapshot {
    fn validate(&self) -> Result<(), SnapshotError> {
        if self.envelope.schema_version != SCHEMA_VERSION {
            return Err(SnapshotError::SchemaVersionMismatch {
                expected: SCHEMA_VERSION,
                actual: self.envelope.schema_version,
            });
        }

        self.nodes.validate_with_string_table(self.string_table.len())
    }
}

impl Validate for NodeTable {
    fn validate(&self) -> Result<(), SnapshotError> {
        self.validate_with_string_table(usize::MAX)
    }
}

impl NodeTable {
    /// Validate with known string table size.
    pub fn validate_with_string_table(&self, string_table_len: usize) -> Result<(), SnapshotError> {
        let n = self.host_ids.len();

        if n > MAX_NODES_PER_SNAPSHOT {
            return Err(SnapshotError::TooManyNodes {
                count: n,
                max: MAX_NODES_PER_SNAPSHOT,
            });
        }

        self.check_array_len(n, self.tag_ids.len(), "tag_ids")?;
        self.check_array_len(n, self.text_ids.len(), "text_ids")?;
        self.check_array_len(n, self.elem_ids.len(), "elem_ids")?;
        self.check_array_len(n, self.class_ids.len(), "class_ids")?;
        self.check_array_len(n, self.role_ids.len(), "role_ids")?;
        self.check_array_len(n, self.aria_label_ids.len(), "aria_label_ids")?;
        self.check_array_len(n, self.href_ids.len(), "href_ids")?;
        self.check_array_len(n, self.x.len(), "x")?;
        self.check_array_len(n, self.y.len(), "y")?;
        self.check_array_len(n, self.w.len(), "w")?;
        self.check_array_len(n, self.h.len(), "h")?;
        self.check_array_len(n, self.flags.len(), "flags")?;
        self.check_array_len(n, self.parent.len(), "parent")?;
        self.check_array_len(n, self.first_child.len(), "first_child")?;
        self.check_array_len(n, self.next_sibling.len(), "next_sibling")?;
        self.check_array_len(n, self.prev_sibling.len(), "prev_sibling")?;

        // Host ids: non-zero and unique (marks key on them).
        let mut seen = HashSet::with_capacity(n);
        for (idx, &id) in self.host_ids.iter().enumerate() {
            if id == crate::NONE_ID {
                return Err(SnapshotError::InvalidHostId { index: idx });
            }
            if !seen.insert(id) {
                return Err(SnapshotError::DuplicateHostId { host_id: id, index: idx });
            }
        }

        self.check_link_indices(n, &self.parent, "parent")?;
        self.check_link_indices(n, &self.first_child, "first_child")?;
        self.check_link_indices(n, &self.next_sibling, "next_sibling")?;
        self.check_link_indices(n, &self.prev_sibling, "prev_sibling")?;

        self.check_string_ids(string_table_len, &self.tag_ids, "tag_ids")?;
        self.check_string_ids(string_table_len, &self.text_ids, "text_ids")?;
        self.check_string_ids(string_table_len, &self.elem_ids, "elem_ids")?;
        self.check_string_ids(string_table_len, &self.class_ids, "class_ids")?;
        self.check_string_ids(string_table_len, &self.role_ids, "role_ids")?;
        self.check_string_ids(string_table_len, &self.aria_label_ids, "aria_label_ids")?;
        self.check_string_ids(string_table_len, &self.href_ids, "href_ids")?;

        // Parent chains must terminate within MAX_TREE_DEPTH (catches cycles).
        for idx in 0..n {
            let mut current = idx;
            let mut depth = 0;
            while let Some(parent) = self.parent_idx(current) {
                depth += 1;
                if depth > MAX_TREE_DEPTH {
                    return Err(SnapshotError::DepthExceeded {
                        index: idx,
                        max: MAX_TREE_DEPTH,
                    });
                }
                current = parent;
            }
        }

        Ok(())
    }

    fn check_array_len(
        &self,
        expected: usize,
        actual: usize,
        field: &'static str,
    ) -> Result<(), SnapshotError> {
        if actual != expected {
            Err(SnapshotError::ArrayLengthMismatch {
                expected,
                actual,
                field,
            })
        } else {
            Ok(())
        }
    }

    fn check_link_indices(
        &self,
        n: usize,
        indices: &[u32],
        field: &'static str,
    ) -> Result<(), SnapshotError> {
        for &idx in indices.iter() {
            if idx != NONE_IDX && idx as usize >= n {
                return Err(SnapshotError::IndexOutOfBounds {
                    index: idx,
                    max: n,
                    field,
                });
            }
        }
        Ok(())
    }

    fn check_string_ids(
        &self,
        string_table_len: usize,
        ids: &[u32],
        _field: &'static str,
    ) -> Result<(), SnapshotError> {
        if string_table_len == usize::MAX {
            return Ok(());
        }
        for &id in ids.iter() {
            if id != NONE_STR && id as usize >= string_table_len {
                return Err(SnapshotError::InvalidStringId {
                    index: id,
                    size: string_table_len,
                });
            }
        }
        Ok(())
    }
}
