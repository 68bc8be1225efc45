//! Content-based hashing for run IDs.

use bh_project::schema::Project;
use sha2::{Digest, Sha256};

/// Hex SHA-256 over the project, the run mode and the solver version.
///
/// The project name is part of the hash input, so two identically configured
/// projects with different names get distinct IDs.
pub fn compute_run_id(
    project: &Project,
    run_type: &crate::types::RunType,
    solver_version: &str,
) -> String {
    let mut hasher = Sha256::new();

    let project_json = serde_json::to_string(project).unwrap_or_default();
    hasher.update(project_json.as_bytes());

    let run_type_json = serde_json::to_string(run_type).unwrap_or_default();
    hasher.update(run_type_json.as_bytes());

    hasher.update(solver_version.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}
