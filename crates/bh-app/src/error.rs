//! Error types for the bh-app service layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the backend crates
/// behind one interface for every front-end.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(String),

    #[error("Failed to write project file: {path}")]
    ProjectFileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Project validation failed: {0}")]
    Validation(String),

    #[error("Setup compilation failed: {0}")]
    Compile(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for bh-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<bh_project::ProjectError> for AppError {
    fn from(err: bh_project::ProjectError) -> Self {
        match err {
            bh_project::ProjectError::Validation(e) => AppError::Validation(e.to_string()),
            other => AppError::Project(other.to_string()),
        }
    }
}

impl From<bh_project::ValidationError> for AppError {
    fn from(err: bh_project::ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<bh_sim::SimError> for AppError {
    fn from(err: bh_sim::SimError) -> Self {
        AppError::Simulation(err.to_string())
    }
}

impl From<bh_results::ResultsError> for AppError {
    fn from(err: bh_results::ResultsError) -> Self {
        match err {
            bh_results::ResultsError::RunNotFound { run_id } => AppError::RunNotFound(run_id),
            bh_results::ResultsError::InvalidPath { message } => AppError::InvalidInput(message),
            other => AppError::Results(other.to_string()),
        }
    }
}
