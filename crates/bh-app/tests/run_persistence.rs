use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use bh_app::{
    AppError, RunOptions, RunRequest, RunStage, delete_run, ensure_run, ensure_run_with_progress,
    extract_series, get_run_summary, init_project, list_runs, load_run,
};

fn temp_project(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("{prefix}_{nanos}"));
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    let path = dir.join("buck.yaml");
    init_project(&path, "buck").expect("failed to init project");
    path
}

#[test]
fn run_is_cached_and_reloaded() {
    let path = temp_project("bh_app_cache");
    let request = RunRequest {
        project_path: &path,
        t_end_s: Some(0.002),
        options: RunOptions::default(),
    };

    let first = ensure_run(&request).unwrap();
    assert!(!first.loaded_from_cache);
    assert_eq!(first.manifest.counters.ticks, 400);
    assert_eq!(first.manifest.counters.steps, 400);
    assert_eq!(first.manifest.counters.coalesced, 0);

    let second = ensure_run(&request).unwrap();
    assert!(second.loaded_from_cache);
    assert_eq!(first.run_id, second.run_id);
    assert_eq!(first.manifest, second.manifest);

    let runs = list_runs(&path).unwrap();
    assert_eq!(runs.len(), 1);

    let (_, records) = load_run(&path, &first.run_id).unwrap();
    // initial sample plus one per step
    assert_eq!(records.len(), 401);

    delete_run(&path, &first.run_id).unwrap();
    assert!(matches!(
        load_run(&path, &first.run_id),
        Err(AppError::RunNotFound(_))
    ));
}

#[test]
fn different_final_time_is_a_different_run() {
    let path = temp_project("bh_app_distinct");
    let short = ensure_run(&RunRequest {
        project_path: &path,
        t_end_s: Some(0.001),
        options: RunOptions::default(),
    })
    .unwrap();
    let long = ensure_run(&RunRequest {
        project_path: &path,
        t_end_s: Some(0.002),
        options: RunOptions::default(),
    })
    .unwrap();

    assert_ne!(short.run_id, long.run_id);
    assert_eq!(list_runs(&path).unwrap().len(), 2);
}

#[test]
fn steady_state_summary_matches_ideal_transfer() {
    let path = temp_project("bh_app_summary");
    let response = ensure_run(&RunRequest {
        project_path: &path,
        t_end_s: None,
        options: RunOptions {
            use_cache: false,
            ..RunOptions::default()
        },
    })
    .unwrap();

    let (_, records) = load_run(&path, &response.run_id).unwrap();
    let summary = get_run_summary(&records, 1e-4, None).unwrap();

    assert!((summary.time_range.1 - 0.02).abs() < 1e-9);
    assert!(
        (summary.output_mean_v - 6.0).abs() < 0.05,
        "mean {}",
        summary.output_mean_v
    );
    assert!(summary.output_ripple_v > 0.0);
    assert!(summary.output_ripple_v < 0.5);

    let switch = extract_series(&records, "switch").unwrap();
    assert!(switch.iter().any(|&(_, v)| v == 1.0));
    assert!(switch.iter().any(|&(_, v)| v == 0.0));
}

#[test]
fn progress_stages_are_reported_in_order() {
    let path = temp_project("bh_app_progress");
    let request = RunRequest {
        project_path: &path,
        t_end_s: Some(0.0005),
        options: RunOptions::default(),
    };

    let mut stages = Vec::new();
    let mut cb = |event: bh_app::RunProgressEvent| stages.push(event.stage);
    ensure_run_with_progress(&request, Some(&mut cb)).unwrap();

    assert_eq!(
        stages,
        vec![
            RunStage::LoadingProject,
            RunStage::CheckingCache,
            RunStage::Compiling,
            RunStage::Simulating,
            RunStage::SavingResults,
            RunStage::Completed,
        ]
    );
}

#[test]
fn invalid_project_is_reported_as_validation_error() {
    let path = temp_project("bh_app_invalid");
    fs::write(&path, "version: 2\nname: bad\nconverter:\n  vin_v: 12\n  inductance_h: -1\n  capacitance_f: 0.00001\n  load_ohm: 10\n").unwrap();

    let result = ensure_run(&RunRequest {
        project_path: &path,
        t_end_s: None,
        options: RunOptions::default(),
    });
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[test]
fn user_supplied_run_ids_cannot_escape_the_store() {
    let path = temp_project("bh_app_run_id");

    assert!(matches!(
        delete_run(&path, "../.."),
        Err(AppError::InvalidInput(_))
    ));
    assert!(matches!(
        load_run(&path, "../buck.yaml"),
        Err(AppError::InvalidInput(_))
    ));
    assert!(path.exists());
}
