//! Threaded real-time execution of a project on the host platform.

use std::path::Path;

use bh_core::timing::Timer;
use bh_sim::{HostPlatform, RuntimeOptions, RuntimeReport};
use tracing::debug;

use crate::error::AppResult;
use crate::{project_service, setup_compile};

pub struct RealtimeRequest<'a> {
    pub project_path: &'a Path,
    pub ticks: u64,
    /// Pace firings at the step size in wall-clock time; otherwise free-running.
    pub paced: bool,
}

pub fn run_realtime_project(request: &RealtimeRequest) -> AppResult<RuntimeReport> {
    let project = project_service::load_project(request.project_path)?;
    let setup = setup_compile::compile_setup(&project)?;
    let opts = RuntimeOptions {
        ticks: request.ticks,
        paced: request.paced,
    };

    let timer = Timer::start("real-time run");
    let mut platform = HostPlatform::new();
    let report = bh_sim::run_realtime(&setup, &opts, &mut platform)?;
    timer.stop_and_print();

    debug!(
        stages = platform.stages().len(),
        interrupts = platform.interrupts_enabled(),
        "host platform brought up"
    );
    Ok(report)
}
