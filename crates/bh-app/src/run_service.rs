//! Lockstep run execution and caching service.

use std::path::Path;
use std::time::Instant;

use bh_core::timing::Timer;
use bh_project::schema::Project;
use bh_results::{RunCounters, RunManifest, RunStore, RunType, TimeseriesRecord};
use bh_sim::SimRecord;
use tracing::{info, warn};

use crate::error::AppResult;
use crate::progress::{RunProgressEvent, RunStage};
use crate::{project_service, setup_compile};

/// Options for running simulations.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub use_cache: bool,
    pub solver_version: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            solver_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Request to execute a lockstep run.
pub struct RunRequest<'a> {
    pub project_path: &'a Path,
    /// Overrides `run.t_end_s` of the project.
    pub t_end_s: Option<f64>,
    pub options: RunOptions,
}

/// Wall-clock breakdown of a run.
#[derive(Debug, Clone, Default)]
pub struct RunTimingSummary {
    pub compile_time_s: f64,
    pub simulate_time_s: f64,
    pub save_time_s: f64,
    pub load_cache_time_s: f64,
    pub total_time_s: f64,
}

/// Response from a run execution.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub run_id: String,
    pub manifest: RunManifest,
    pub loaded_from_cache: bool,
    pub timing: RunTimingSummary,
}

fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    stage: RunStage,
    started: Instant,
    message: &str,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent::stage(
            stage,
            started.elapsed().as_secs_f64(),
            Some(message.to_string()),
        ));
    }
}

/// Execute or load a run based on request.
pub fn ensure_run(request: &RunRequest) -> AppResult<RunResponse> {
    ensure_run_with_progress(request, None)
}

/// Execute or load a run and stream stage events.
pub fn ensure_run_with_progress(
    request: &RunRequest,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunResponse> {
    let started = Instant::now();
    let mut timing = RunTimingSummary::default();

    emit_progress(&mut progress_cb, RunStage::LoadingProject, started, "Loading project");
    let project = project_service::load_project(request.project_path)?;
    let opts = setup_compile::compile_sim_options(&project, request.t_end_s);

    emit_progress(&mut progress_cb, RunStage::CheckingCache, started, "Checking run cache");
    let run_type = RunType::Lockstep {
        step_s: project.timing.step_s,
        t_end_s: opts.t_end,
        poll_every: opts.poll_every,
        record_every: opts.record_every,
    };
    let run_id = bh_results::compute_run_id(&project, &run_type, &request.options.solver_version);
    let store = RunStore::for_project(request.project_path)?;

    if request.options.use_cache && store.has_run(&run_id) {
        emit_progress(
            &mut progress_cb,
            RunStage::LoadingCachedResult,
            started,
            "Loading cached run",
        );
        let load_started = Instant::now();
        let manifest = store.load_manifest(&run_id)?;
        timing.load_cache_time_s = load_started.elapsed().as_secs_f64();
        timing.total_time_s = started.elapsed().as_secs_f64();
        info!(run_id = %run_id, "loaded cached run");

        emit_progress(&mut progress_cb, RunStage::Completed, started, "Loaded cached run");
        return Ok(RunResponse {
            run_id,
            manifest,
            loaded_from_cache: true,
            timing,
        });
    }

    emit_progress(&mut progress_cb, RunStage::Compiling, started, "Building run");
    let compile_started = Instant::now();
    let setup = setup_compile::compile_setup(&project)?;
    timing.compile_time_s = compile_started.elapsed().as_secs_f64();

    emit_progress(&mut progress_cb, RunStage::Simulating, started, "Running lockstep simulation");
    let sim_timer = Timer::start("lockstep simulation");
    let simulate_started = Instant::now();
    let record = bh_sim::run_sim(&setup, &opts)?;
    timing.simulate_time_s = simulate_started.elapsed().as_secs_f64();
    sim_timer.stop_and_print();

    if record.coalesced > 0 {
        warn!(
            coalesced = record.coalesced,
            ticks = record.ticks,
            "plant fell behind the timer; coalesced ticks were not integrated"
        );
    }

    emit_progress(&mut progress_cb, RunStage::SavingResults, started, "Saving run output");
    let save_started = Instant::now();
    let manifest = build_manifest(&project, &run_id, run_type, &request.options, &record);
    store.save_run(&manifest, &to_timeseries(&record))?;
    timing.save_time_s = save_started.elapsed().as_secs_f64();
    timing.total_time_s = started.elapsed().as_secs_f64();

    info!(
        run_id = %run_id,
        records = record.len(),
        total_s = timing.total_time_s,
        "run saved"
    );
    emit_progress(&mut progress_cb, RunStage::Completed, started, "Run completed");

    Ok(RunResponse {
        run_id,
        manifest,
        loaded_from_cache: false,
        timing,
    })
}

fn build_manifest(
    project: &Project,
    run_id: &str,
    run_type: RunType,
    options: &RunOptions,
    record: &SimRecord,
) -> RunManifest {
    RunManifest {
        run_id: run_id.to_string(),
        project_name: project.name.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        run_type,
        solver_version: options.solver_version.clone(),
        counters: RunCounters {
            ticks: record.ticks,
            steps: record.steps,
            coalesced: record.coalesced,
        },
    }
}

fn to_timeseries(record: &SimRecord) -> Vec<TimeseriesRecord> {
    (0..record.len())
        .map(|i| TimeseriesRecord {
            time_s: record.t[i],
            inductor_current_a: f64::from(record.x[i].inductor_current),
            output_voltage_v: f64::from(record.x[i].output_voltage),
            switch_on: record.switch[i],
            duty: f64::from(record.duty[i]),
        })
        .collect()
}

/// Runs recorded for the project at `project_path`, most recent first.
pub fn list_runs(project_path: &Path) -> AppResult<Vec<RunManifest>> {
    let project = project_service::load_project(project_path)?;
    let store = RunStore::for_project(project_path)?;

    Ok(store.list_runs(&project.name)?)
}

/// Load a specific run.
pub fn load_run(
    project_path: &Path,
    run_id: &str,
) -> AppResult<(RunManifest, Vec<TimeseriesRecord>)> {
    let store = RunStore::for_project(project_path)?;

    let manifest = store.load_manifest(run_id)?;
    let records = store.load_timeseries(run_id)?;

    Ok((manifest, records))
}

pub fn delete_run(project_path: &Path, run_id: &str) -> AppResult<()> {
    let store = RunStore::for_project(project_path)?;
    store.delete_run(run_id)?;
    Ok(())
}
