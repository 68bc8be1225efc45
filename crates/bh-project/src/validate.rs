//! Project validation logic.
//!
//! The simulation core trusts its inputs (no range checks per tick), so every
//! limit a run depends on is enforced here, before a run is built.

use crate::schema::{ConverterDef, DacDef, DutyDef, InitialStateDef, Project, RunDef, TimingDef};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn require_finite(field: &str, v: f64) -> Result<(), ValidationError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, v, "must be finite"))
    }
}

fn require_positive(field: &str, v: f64) -> Result<(), ValidationError> {
    require_finite(field, v)?;
    if v > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, v, "must be positive"))
    }
}

fn require_unit_interval(field: &str, v: f64) -> Result<(), ValidationError> {
    if (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(invalid(field, v, "must be within [0, 1]"))
    }
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version > crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    if project.name.trim().is_empty() {
        return Err(invalid("name", "", "must not be empty"));
    }

    validate_converter(&project.converter)?;
    validate_timing(&project.timing)?;
    validate_duty(&project.duty)?;
    validate_initial_state(&project.initial_state)?;
    validate_run(&project.run)?;
    if let Some(dac) = &project.dac {
        validate_dac(dac)?;
    }

    Ok(())
}

fn validate_converter(converter: &ConverterDef) -> Result<(), ValidationError> {
    require_finite("converter.vin_v", converter.vin_v)?;
    require_positive("converter.inductance_h", converter.inductance_h)?;
    require_positive("converter.capacitance_f", converter.capacitance_f)?;
    require_positive("converter.load_ohm", converter.load_ohm)?;
    Ok(())
}

fn validate_timing(timing: &TimingDef) -> Result<(), ValidationError> {
    require_positive("timing.pwm_frequency_hz", timing.pwm_frequency_hz)?;
    require_positive("timing.step_s", timing.step_s)?;
    if 1.0 / timing.pwm_frequency_hz < timing.step_s {
        return Err(invalid(
            "timing.step_s",
            timing.step_s,
            "PWM period must span at least one step",
        ));
    }
    Ok(())
}

fn validate_duty(duty: &DutyDef) -> Result<(), ValidationError> {
    require_unit_interval("duty.initial", duty.initial)?;

    let mut last_time = f64::NEG_INFINITY;
    for (i, event) in duty.schedule.iter().enumerate() {
        let field = format!("duty.schedule[{i}]");
        require_finite(&format!("{field}.time_s"), event.time_s)?;
        if event.time_s < 0.0 {
            return Err(invalid(
                &format!("{field}.time_s"),
                event.time_s,
                "must not be negative",
            ));
        }
        if event.time_s < last_time {
            return Err(invalid(
                &format!("{field}.time_s"),
                event.time_s,
                "events must be sorted by time",
            ));
        }
        require_unit_interval(&format!("{field}.value"), event.value)?;
        last_time = event.time_s;
    }
    Ok(())
}

fn validate_initial_state(state: &InitialStateDef) -> Result<(), ValidationError> {
    require_finite("initial_state.inductor_current_a", state.inductor_current_a)?;
    require_finite("initial_state.output_voltage_v", state.output_voltage_v)?;
    Ok(())
}

fn validate_run(run: &RunDef) -> Result<(), ValidationError> {
    require_positive("run.t_end_s", run.t_end_s)?;
    if run.record_every == 0 {
        return Err(invalid("run.record_every", 0, "must be at least 1"));
    }
    if run.poll_every == 0 {
        return Err(invalid("run.poll_every", 0, "must be at least 1"));
    }
    Ok(())
}

fn validate_dac(dac: &DacDef) -> Result<(), ValidationError> {
    if dac.bits == 0 || dac.bits > 16 {
        return Err(invalid("dac.bits", dac.bits, "must be 1..=16"));
    }
    require_positive("dac.full_scale_v", dac.full_scale_v)?;
    Ok(())
}
