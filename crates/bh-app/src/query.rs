//! Query helpers for extracting data from loaded runs.

use bh_core::Real;
use bh_results::TimeseriesRecord;
use bh_sim::DacScale;

use crate::error::{AppError, AppResult};

/// Variables that [`extract_series`] understands.
pub const SERIES_VARIABLES: [&str; 4] = ["inductor_current", "output_voltage", "switch", "duty"];

/// Summary of a run's time range and final behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub time_range: (f64, f64),
    pub record_count: usize,
    pub final_inductor_current_a: f64,
    pub final_output_voltage_v: f64,
    /// Mean output voltage over the last PWM period
    pub output_mean_v: f64,
    /// Peak-to-peak output voltage over the last PWM period
    pub output_ripple_v: f64,
    /// Code the output DAC would emit for the final output voltage
    pub output_dac_code: Option<u16>,
}

/// Get run summary from timeseries records.
///
/// `pwm_period_s` selects the window for the mean and ripple: every record
/// strictly later than one period before the last one.
pub fn get_run_summary(
    records: &[TimeseriesRecord],
    pwm_period_s: f64,
    dac: Option<&DacScale>,
) -> AppResult<RunSummary> {
    let (Some(first), Some(last)) = (records.first(), records.last()) else {
        return Err(AppError::InvalidInput("No records in run".to_string()));
    };
    if !pwm_period_s.is_finite() || pwm_period_s <= 0.0 {
        return Err(AppError::InvalidInput(format!(
            "PWM period must be positive, got {pwm_period_s}"
        )));
    }

    // Relative slack so a sample exactly one period back stays out.
    let window_start = last.time_s - pwm_period_s * (1.0 - 1e-6);
    let window: Vec<f64> = records
        .iter()
        .filter(|r| r.time_s > window_start)
        .map(|r| r.output_voltage_v)
        .collect();

    let mean = window.iter().sum::<f64>() / window.len() as f64;
    let (min, max) = window
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    Ok(RunSummary {
        time_range: (first.time_s, last.time_s),
        record_count: records.len(),
        final_inductor_current_a: last.inductor_current_a,
        final_output_voltage_v: last.output_voltage_v,
        output_mean_v: mean,
        output_ripple_v: max - min,
        output_dac_code: dac.map(|d| d.code(last.output_voltage_v as Real)),
    })
}

/// Extract `(time_s, value)` pairs for one variable. The switch maps to 1.0 / 0.0.
pub fn extract_series(records: &[TimeseriesRecord], variable: &str) -> AppResult<Vec<(f64, f64)>> {
    let value: fn(&TimeseriesRecord) -> f64 = match variable {
        "inductor_current" | "i_l" => |r| r.inductor_current_a,
        "output_voltage" | "v_out" => |r| r.output_voltage_v,
        "switch" => |r| if r.switch_on { 1.0 } else { 0.0 },
        "duty" => |r| r.duty,
        _ => {
            return Err(AppError::InvalidInput(format!(
                "Unknown variable: {} (expected one of {})",
                variable,
                SERIES_VARIABLES.join(", ")
            )));
        }
    };

    Ok(records.iter().map(|r| (r.time_s, value(r))).collect())
}
