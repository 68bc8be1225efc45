//! Build simulation inputs from a validated project.
//!
//! Project files carry `f64` SI values; everything here narrows them to the
//! plant's single precision and goes through the unit-checked constructors.

use bh_core::units::{farads, henries, hz, ohms, s, volts};
use bh_core::Real;
use bh_project::schema::Project;
use bh_sim::{
    ConverterParams, ConverterState, DacScale, DutyEvent, DutySchedule, HilSetup, SimOptions,
    TimingParams,
};

use crate::error::{AppError, AppResult};

pub fn compile_setup(project: &Project) -> AppResult<HilSetup> {
    let c = &project.converter;
    let params = ConverterParams::new(
        volts(c.vin_v as Real),
        henries(c.inductance_h as Real),
        farads(c.capacitance_f as Real),
        ohms(c.load_ohm as Real),
    )
    .map_err(|e| AppError::Compile(e.to_string()))?;

    let timing = TimingParams::new(
        s(project.timing.step_s as Real),
        hz(project.timing.pwm_frequency_hz as Real),
    )
    .map_err(|e| AppError::Compile(e.to_string()))?;

    let events = project
        .duty
        .schedule
        .iter()
        .map(|e| DutyEvent {
            time_s: e.time_s,
            value: e.value as Real,
        })
        .collect();
    let duty = DutySchedule::new(project.duty.initial as Real, events)
        .map_err(|e| AppError::Compile(e.to_string()))?;

    let initial_state = ConverterState::new(
        project.initial_state.inductor_current_a as Real,
        project.initial_state.output_voltage_v as Real,
    );

    Ok(HilSetup {
        params,
        timing,
        initial_state,
        duty,
    })
}

/// Lockstep options from the project's `run` section, with an optional
/// override of the final time.
pub fn compile_sim_options(project: &Project, t_end_override: Option<f64>) -> SimOptions {
    SimOptions {
        t_end: t_end_override.unwrap_or(project.run.t_end_s),
        record_every: project.run.record_every,
        poll_every: project.run.poll_every,
        ..SimOptions::default()
    }
}

pub fn compile_dac(project: &Project) -> AppResult<Option<DacScale>> {
    project
        .dac
        .as_ref()
        .map(|dac| {
            DacScale::new(dac.bits, dac.full_scale_v as Real)
                .map_err(|e| AppError::Compile(e.to_string()))
        })
        .transpose()
}
