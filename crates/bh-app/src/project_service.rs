//! Project loading, saving and validation.

use std::path::Path;

use bh_project::schema::Project;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Load, migrate and validate a project (YAML, or JSON by extension).
pub fn load_project(path: &Path) -> AppResult<Project> {
    let project = bh_project::load_project(path)?;
    debug!(name = %project.name, version = project.version, "loaded project");
    Ok(project)
}

/// Save a project; `.json` paths are written as JSON, anything else as YAML.
pub fn save_project(path: &Path, project: &Project) -> AppResult<()> {
    let result = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => bh_project::save_json(path, project),
        _ => bh_project::save_yaml(path, project),
    };
    result.map_err(|e| match e {
        bh_project::ProjectError::Io(source) => AppError::ProjectFileWrite {
            path: path.to_path_buf(),
            source,
        },
        other => other.into(),
    })
}

pub fn validate_project(project: &Project) -> AppResult<()> {
    bh_project::validate_project(project)?;
    Ok(())
}

/// Write a reference-board project to `path`. Refuses to overwrite.
pub fn init_project(path: &Path, name: &str) -> AppResult<Project> {
    if path.exists() {
        return Err(AppError::InvalidInput(format!(
            "{} already exists",
            path.display()
        )));
    }
    let project = Project::new(name);
    save_project(path, &project)?;
    Ok(project)
}
