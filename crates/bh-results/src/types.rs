//! Result data types.

use serde::{Deserialize, Serialize};

pub type RunId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunManifest {
    pub run_id: RunId,
    pub project_name: String,
    pub timestamp: String,
    pub run_type: RunType,
    pub solver_version: String,
    #[serde(default)]
    pub counters: RunCounters,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum RunType {
    Lockstep {
        step_s: f64,
        t_end_s: f64,
        poll_every: usize,
        record_every: usize,
    },
}

/// Tick accounting of a finished run. `steps + coalesced == ticks`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunCounters {
    pub ticks: u64,
    pub steps: u64,
    pub coalesced: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeseriesRecord {
    pub time_s: f64,
    pub inductor_current_a: f64,
    pub output_voltage_v: f64,
    pub switch_on: bool,
    pub duty: f64,
}
