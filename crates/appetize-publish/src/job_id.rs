//! Stable job identifiers

use sha2::{Digest, Sha256};

/// Derive the job identifier for a project on a host instance
///
/// SHA-256 over `instance_id`, `project_name`, `instance_id`, hex encoded.
/// The instance id is hashed on both sides of the project name to match
/// identifiers already stored by the service. Empty inputs are skipped.
pub fn derive_job_id(instance_id: &str, project_name: &str) -> String {
    let mut hasher = Sha256::new();

    for part in [instance_id, project_name, instance_id] {
        if !part.is_empty() {
            hasher.update(part.as_bytes());
        }
    }

    format!("{:x}", hasher.finalize())
}
