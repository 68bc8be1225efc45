use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use bh_project::schema::Project;
use bh_results::{
    ResultsError, RunCounters, RunManifest, RunStore, RunType, TimeseriesRecord, compute_run_id,
};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    dir
}

fn run_type(t_end_s: f64) -> RunType {
    RunType::Lockstep {
        step_s: 5e-6,
        t_end_s,
        poll_every: 1,
        record_every: 1,
    }
}

/// Manifest with a real content hash; `t_end_s` makes IDs distinct.
fn manifest(project_name: &str, t_end_s: f64, timestamp: &str) -> RunManifest {
    let run_type = run_type(t_end_s);
    RunManifest {
        run_id: compute_run_id(&Project::new(project_name), &run_type, "0.1.0"),
        project_name: project_name.to_string(),
        timestamp: timestamp.to_string(),
        run_type,
        solver_version: "0.1.0".to_string(),
        counters: RunCounters {
            ticks: 200,
            steps: 200,
            coalesced: 0,
        },
    }
}

fn record(time_s: f64, output_voltage_v: f64) -> TimeseriesRecord {
    TimeseriesRecord {
        time_s,
        inductor_current_a: 0.1,
        output_voltage_v,
        switch_on: true,
        duty: 0.5,
    }
}

#[test]
fn save_list_load_roundtrip() {
    let project_dir = unique_temp_dir("bh_results_project");
    fs::create_dir_all(&project_dir).expect("failed to create temp project dir");
    let project_path = project_dir.join("project.yaml");
    fs::write(&project_path, "version: 2\nname: test\n").expect("failed to write project file");

    let store = RunStore::for_project(&project_path).expect("failed to create run store");
    assert!(store.root_dir().ends_with(".buckhil/runs"));

    let m = manifest("test", 0.001, "2026-02-26T00:00:00Z");
    let records = vec![record(0.0, 0.0), record(5e-6, 0.01)];

    store.save_run(&m, &records).expect("failed to save run");
    assert!(store.has_run(&m.run_id));

    let runs = store.list_runs("test").expect("failed to list runs");
    assert_eq!(runs, vec![m.clone()]);

    let loaded_records = store
        .load_timeseries(&m.run_id)
        .expect("failed to load records");
    assert_eq!(loaded_records, records);
}

#[test]
fn list_filters_by_project_newest_first() {
    let store = RunStore::new(unique_temp_dir("bh_results_list")).unwrap();

    let late = manifest("a", 0.002, "2026-03-02T00:00:00Z");
    let early = manifest("a", 0.001, "2026-03-01T00:00:00Z");
    let other = manifest("b", 0.001, "2026-03-03T00:00:00Z");
    for m in [&late, &early, &other] {
        store.save_run(m, &[]).unwrap();
    }
    // stray directory that is not a run
    fs::create_dir_all(store.root_dir().join("scratch")).unwrap();

    let ids: Vec<_> = store
        .list_runs("a")
        .unwrap()
        .into_iter()
        .map(|m| m.run_id)
        .collect();
    assert_eq!(ids, vec![late.run_id, early.run_id]);
}

#[test]
fn missing_and_deleted_runs() {
    let store = RunStore::new(unique_temp_dir("bh_results_delete")).unwrap();
    let m = manifest("a", 0.001, "2026-03-01T00:00:00Z");

    assert!(matches!(
        store.load_manifest(&m.run_id),
        Err(ResultsError::RunNotFound { .. })
    ));

    store.save_run(&m, &[record(0.0, 1.0)]).unwrap();
    store.delete_run(&m.run_id).unwrap();
    assert!(!store.has_run(&m.run_id));
    assert!(matches!(
        store.load_timeseries(&m.run_id),
        Err(ResultsError::RunNotFound { .. })
    ));

    // deleting twice is a no-op
    store.delete_run(&m.run_id).unwrap();
}

#[test]
fn path_like_run_ids_are_rejected_without_touching_disk() {
    let project_dir = unique_temp_dir("bh_results_traversal");
    fs::create_dir_all(&project_dir).unwrap();
    let project_path = project_dir.join("project.yaml");
    fs::write(&project_path, "version: 2\nname: test\n").unwrap();
    let store = RunStore::for_project(&project_path).unwrap();

    let upper = "A".repeat(64);
    for bad in ["../..", "..", "", "/tmp", "runs/../../x", upper.as_str()] {
        assert!(
            matches!(store.delete_run(bad), Err(ResultsError::InvalidPath { .. })),
            "delete_run({bad:?})"
        );
        assert!(matches!(
            store.load_manifest(bad),
            Err(ResultsError::InvalidPath { .. })
        ));
        assert!(matches!(
            store.load_timeseries(bad),
            Err(ResultsError::InvalidPath { .. })
        ));
        assert!(!store.has_run(bad));
    }

    let mut m = manifest("test", 0.001, "2026-03-01T00:00:00Z");
    m.run_id = "../escape".to_string();
    assert!(matches!(
        store.save_run(&m, &[]),
        Err(ResultsError::InvalidPath { .. })
    ));

    assert!(project_path.exists());
    assert!(store.root_dir().is_dir());
}

#[test]
fn manifest_without_counters_still_loads() {
    let store = RunStore::new(unique_temp_dir("bh_results_legacy")).unwrap();
    let run_id = "0".repeat(64);
    let dir = store.root_dir().join(&run_id);
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("manifest.json"),
        format!(
            r#"{{"run_id":"{run_id}","project_name":"a","timestamp":"t","run_type":{{"type":"Lockstep","step_s":5e-6,"t_end_s":0.001,"poll_every":1,"record_every":1}},"solver_version":"0.1.0"}}"#
        ),
    )
    .unwrap();

    let m = store.load_manifest(&run_id).unwrap();
    assert_eq!(m.counters, RunCounters::default());
}
