//! Snapshot error types.

use thiserror::Error;

/// Errors produced while validating or serializing snapshots.
#[derive(Debug, Clone, Error)]
pub enum SnapshotError {
    #[error("Schema version mismatch: expected {expected}, got {actual}")]
    SchemaVersionMismatch { expected: u32, actual: u32 },

    #[error("Too many nodes: {count} exceeds max {max}")]
    TooManyNodes { count: usize, max: usize },

    #[error("Array length mismatch in {field}: expected {expected}, got {actual}")]
    ArrayLengthMismatch {
        expected: usize,
        actual: usize,
        field: &'static str,
    },

    #[error("Invalid host id at index {index}: zero is reserved")]
    InvalidHostId { index: usize },

    #[error("Duplicate host id {host_id} at index {index}")]
    DuplicateHostId { host_id: u64, index: usize },

    #[error("Index {index} out of bounds in {field} (max {max})")]
    IndexOutOfBounds {
        index: u32,
        max: usize,
        field: &'static str,
    },

    #[error("Invalid string id {index} (table size {size})")]
    InvalidStringId { index: u32, size: usize },

    #[error("Parent chain from node {index} exceeds max depth {max}")]
    DepthExceeded { index: usize, max: usize },

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),
}
