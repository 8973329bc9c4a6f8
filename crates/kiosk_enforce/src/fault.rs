//! Fault types for enforcement errors.
//!
//! Faults are recoverable errors that occur around a reconciliation pass.
//! They never crash the host shell; the worst case is "restriction
//! incompletely applied" until a later trigger re-derives the corrections.

use crate::host::HostError;
use kiosk_classify::ClassifyError;
use kiosk_policy::PolicyError;
use kiosk_snapshot::SnapshotError;
use thiserror::Error;

/// Enforcement fault - a recoverable error around a pass.
#[derive(Debug, Error)]
pub enum Fault {
    /// A collaborator is not initialized yet.
    #[error("{component} not available yet")]
    CollaboratorUnavailable { component: &'static str },

    /// The role resolver stayed unavailable past the retry budget.
    #[error("Role resolver unavailable after {attempts} attempts")]
    RolesUnavailable { attempts: u32 },

    /// A node vanished between classification and correction.
    #[error("Node {host_id} vanished mid-pass")]
    NodeVanished { host_id: u64 },

    /// The host refused an operation.
    #[error("Host rejected operation: {reason}")]
    HostRejected { reason: String },

    /// The captured snapshot failed validation.
    #[error("Snapshot rejected: {0}")]
    Snapshot(#[from] SnapshotError),

    /// The classifier configuration is invalid.
    #[error("Classifier rejected: {0}")]
    Classifier(#[from] ClassifyError),

    /// The policy configuration is invalid.
    #[error("Policy rejected: {0}")]
    Policy(#[from] PolicyError),
}

impl Fault {
    /// Check if this fault clears on its own via retry or a later pass.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Fault::CollaboratorUnavailable { .. }
                | Fault::RolesUnavailable { .. }
                | Fault::NodeVanished { .. }
                | Fault::HostRejected { .. }
        )
    }

    /// Check if this fault indicates a configuration or programming error.
    pub fn is_bug(&self) -> bool {
        matches!(
            self,
            Fault::Snapshot(_) | Fault::Classifier(_) | Fault::Policy(_)
        )
    }
}

impl From<HostError> for Fault {
    fn from(err: HostError) -> Self {
        match err {
            HostError::Unavailable { component } => Fault::CollaboratorUnavailable { component },
            HostError::NodeGone { host_id } => Fault::NodeVanished { host_id },
            HostError::Rejected { reason } => Fault::HostRejected { reason },
        }
    }
}
