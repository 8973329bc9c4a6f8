//! Policy fingerprinting for epoch derivation.

use crate::table::PolicyTable;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Content-addressed fingerprint of a policy table.
///
/// Enforcement marks carry the fingerprint (via the epoch) they were set
/// under; a policy edit changes the fingerprint and thereby invalidates
/// every prior mark without a sweep.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyFingerprint {
    /// SHA-256 hash of the table.
    pub hash: String,
    /// Fingerprint scheme version.
    pub version: u64,
}

impl PolicyFingerprint {
    /// Compute the fingerprint for a policy table.
    pub fn compute(table: &PolicyTable) -> Self {
        let mut hasher = Sha256::new();

        let mut privileged: Vec<&str> = table.privileged_roles().map(|r| r.as_str()).collect();
        privileged.sort_unstable();
        for role in privileged {
            hasher.update(role.as_bytes());
            hasher.update([0u8]);
        }

        for rs in table.rulesets() {
            hasher.update(rs.role.as_str().as_bytes());
            hasher.update([0u8]);
            hasher.update(rs.landing.as_bytes());
            hasher.update([0u8]);
            hasher.update(rs.restrictions.bits().to_le_bytes());

            let mut labels: Vec<&str> = rs.blocked_labels.iter().map(String::as_str).collect();
            labels.sort_unstable();
            for label in labels {
                hasher.update(label.as_bytes());
                hasher.update([1u8]);
            }

            let mut prefixes: Vec<&str> =
                rs.blocked_route_prefixes.iter().map(String::as_str).collect();
            prefixes.sort_unstable();
            for prefix in prefixes {
                hasher.update(prefix.as_bytes());
                hasher.update([2u8]);
            }

            for entry in &rs.sidebar {
                hasher.update(entry.label.as_bytes());
                hasher.update([3u8]);
                hasher.update(entry.target.as_bytes());
                hasher.update([3u8]);
            }
        }

        let hash = hex::encode(hasher.finalize());

        Self { hash, version: 1 }
    }

    /// Get a short version of the hash (first 16 chars).
    pub fn short(&self) -> &str {
        &self.hash[..16.min(self.hash.len())]
    }

    /// Convert to u64 for embedding in epochs and journals.
    pub fn to_u64(&self) -> u64 {
        let bytes: [u8; 8] = self.hash.as_bytes()[..8].try_into().unwrap_or([0; 8]);
        u64::from_le_bytes(bytes)
    }
}
