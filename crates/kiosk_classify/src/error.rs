//! Classifier error types.

use thiserror::Error;

/// Errors from checking a heuristic table.
#[derive(Debug, Clone, Error)]
pub enum ClassifyError {
    #[error("Confidence threshold {threshold} outside (0, 1]")]
    InvalidThreshold { threshold: f32 },

    #[error("Rule for {label} has invalid weight {weight}")]
    InvalidWeight { label: &'static str, weight: f32 },

    #[error("Label {label} is backed only by positional evidence")]
    PositionOnlyLabel { label: &'static str },

    #[error("Positional rule for {label} reaches the threshold alone (weight {weight})")]
    PositionWeightTooHigh { label: &'static str, weight: f32 },

    #[error("Rules may not target the Unknown label")]
    UnknownLabelRule,
}
