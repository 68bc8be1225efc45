//! On-disk run store.
//!
//! Layout under the root directory, one directory per run:
//!
//! ```text
//! <root>/<run id>/manifest.json
//! <root>/<run id>/timeseries.jsonl
//! ```
//!
//! Run IDs are the hex SHA-256 digests produced by [`crate::compute_run_id`].
//! Anything else is rejected before a path is built from it.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::types::{RunManifest, TimeseriesRecord};
use crate::{ResultsError, ResultsResult};

const MANIFEST_FILE: &str = "manifest.json";
const TIMESERIES_FILE: &str = "timeseries.jsonl";
const RUN_ID_LEN: usize = 64;

/// `true` for 64 lowercase hex characters.
pub fn is_valid_run_id(run_id: &str) -> bool {
    run_id.len() == RUN_ID_LEN
        && run_id
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

fn check_run_id(run_id: &str) -> ResultsResult<()> {
    if is_valid_run_id(run_id) {
        Ok(())
    } else {
        Err(ResultsError::InvalidPath {
            message: format!("not a run id: {run_id:?}"),
        })
    }
}

#[derive(Clone, Debug)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        fs::create_dir_all(&root_dir)?;
        Ok(Self { root_dir })
    }

    /// Store under `<project dir>/.buckhil/runs`.
    pub fn for_project(project_path: &Path) -> ResultsResult<Self> {
        let project_dir = project_path
            .parent()
            .ok_or_else(|| ResultsError::InvalidPath {
                message: "project path has no parent directory".to_string(),
            })?;
        Self::new(project_dir.join(".buckhil").join("runs"))
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn run_dir(&self, run_id: &str) -> ResultsResult<PathBuf> {
        check_run_id(run_id)?;
        Ok(self.root_dir.join(run_id))
    }

    /// Existing file of a run, or `RunNotFound`.
    fn run_file(&self, run_id: &str, name: &str) -> ResultsResult<PathBuf> {
        let path = self.run_dir(run_id)?.join(name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            })
        }
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_file(run_id, MANIFEST_FILE).is_ok()
    }

    /// Write the timeseries first and the manifest last, so a run only
    /// counts as present once both files are complete.
    pub fn save_run(
        &self,
        manifest: &RunManifest,
        records: &[TimeseriesRecord],
    ) -> ResultsResult<()> {
        let run_dir = self.run_dir(&manifest.run_id)?;
        fs::create_dir_all(&run_dir)?;

        let mut out = BufWriter::new(File::create(run_dir.join(TIMESERIES_FILE))?);
        for record in records {
            serde_json::to_writer(&mut out, record)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;

        let manifest_json = serde_json::to_string_pretty(manifest)?;
        fs::write(run_dir.join(MANIFEST_FILE), manifest_json)?;
        Ok(())
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        let path = self.run_file(run_id, MANIFEST_FILE)?;
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    pub fn load_timeseries(&self, run_id: &str) -> ResultsResult<Vec<TimeseriesRecord>> {
        let path = self.run_file(run_id, TIMESERIES_FILE)?;
        let mut records = Vec::new();
        for line in BufReader::new(File::open(path)?).lines() {
            let line = line?;
            if !line.trim().is_empty() {
                records.push(serde_json::from_str(&line)?);
            }
        }
        Ok(records)
    }

    /// Runs recorded for `project_name`, most recent first.
    ///
    /// Directories that are not run IDs or have no readable manifest are skipped.
    pub fn list_runs(&self, project_name: &str) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();
        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(run_id) = name.to_str() else {
                continue;
            };
            if !is_valid_run_id(run_id) || !entry.path().is_dir() {
                continue;
            }
            if let Ok(manifest) = self.load_manifest(run_id)
                && manifest.project_name == project_name
            {
                runs.push(manifest);
            }
        }

        runs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(runs)
    }

    /// Remove a run. Removing a run that is not stored is a no-op.
    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id)?;
        if run_dir.is_dir() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }
}
