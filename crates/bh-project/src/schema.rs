//! Project schema definitions.
//!
//! Plain `f64` SI values; the simulation layer narrows them to the plant's
//! single precision when it builds a run.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub converter: ConverterDef,
    #[serde(default)]
    pub timing: TimingDef,
    #[serde(default)]
    pub duty: DutyDef,
    #[serde(default)]
    pub initial_state: InitialStateDef,
    #[serde(default)]
    pub run: RunDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dac: Option<DacDef>,
}

impl Project {
    /// Reference board with the given name, at the latest schema version.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: crate::migrate::LATEST_VERSION,
            name: name.into(),
            converter: ConverterDef::default(),
            timing: TimingDef::default(),
            duty: DutyDef::default(),
            initial_state: InitialStateDef::default(),
            run: RunDef::default(),
            dac: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConverterDef {
    pub vin_v: f64,
    pub inductance_h: f64,
    pub capacitance_f: f64,
    pub load_ohm: f64,
}

impl Default for ConverterDef {
    fn default() -> Self {
        Self {
            vin_v: 12.0,
            inductance_h: 0.001,
            capacitance_f: 0.000_01,
            load_ohm: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimingDef {
    pub pwm_frequency_hz: f64,
    pub step_s: f64,
}

impl Default for TimingDef {
    fn default() -> Self {
        Self {
            pwm_frequency_hz: 10_000.0,
            step_s: 0.000_005,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DutyDef {
    pub initial: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schedule: Vec<DutyEventDef>,
}

impl Default for DutyDef {
    fn default() -> Self {
        Self {
            initial: 0.5,
            schedule: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DutyEventDef {
    pub time_s: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InitialStateDef {
    #[serde(default)]
    pub inductor_current_a: f64,
    #[serde(default)]
    pub output_voltage_v: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunDef {
    pub t_end_s: f64,
    #[serde(default = "default_one")]
    pub record_every: usize,
    #[serde(default = "default_one")]
    pub poll_every: usize,
}

fn default_one() -> usize {
    1
}

impl Default for RunDef {
    fn default() -> Self {
        Self {
            t_end_s: 0.02,
            record_every: 1,
            poll_every: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DacDef {
    pub bits: u8,
    pub full_scale_v: f64,
}

impl Default for DacDef {
    fn default() -> Self {
        Self {
            bits: 12,
            full_scale_v: 24.0,
        }
    }
}
