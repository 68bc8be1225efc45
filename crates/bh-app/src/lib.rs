//! Shared application service layer for buckhil.
//!
//! Front-ends go through this crate for project handling, building runs from
//! project files, executing and caching lockstep runs, driving the real-time
//! runtime, and querying recorded results.

pub mod dac_service;
pub mod error;
pub mod progress;
pub mod project_service;
pub mod query;
pub mod realtime_service;
pub mod run_service;
pub mod setup_compile;

// Re-export key types for convenience
pub use dac_service::{DEFAULT_TIMER_CLOCK_HZ, render_sine_table};
pub use error::{AppError, AppResult};
pub use progress::{RunProgressEvent, RunStage};
pub use project_service::{init_project, load_project, save_project, validate_project};
pub use query::{RunSummary, SERIES_VARIABLES, extract_series, get_run_summary};
pub use realtime_service::{RealtimeRequest, run_realtime_project};
pub use run_service::{
    RunOptions, RunRequest, RunResponse, RunTimingSummary, delete_run, ensure_run,
    ensure_run_with_progress, list_runs, load_run,
};
pub use setup_compile::{compile_dac, compile_setup, compile_sim_options};
