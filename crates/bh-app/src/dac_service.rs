//! Sine lookup tables for the board's output DAC.

use bh_sim::{SineTable, SineTableSpec};
use tracing::debug;

use crate::error::AppResult;

/// Default timer clock of the reference board (Hz).
pub const DEFAULT_TIMER_CLOCK_HZ: f64 = 200_000_000.0;

/// Generate a table and render it as C source stamped with the current time.
pub fn render_sine_table(spec: SineTableSpec, clock_hz: f64) -> AppResult<(SineTable, String)> {
    let table = SineTable::generate(spec)?;
    debug!(
        samples = table.codes.len(),
        sample_rate_hz = table.sample_rate_hz,
        timer_period = table.timer_period(clock_hz),
        "generated sine table"
    );
    let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let source = table.to_c_source(clock_hz, &generated_at);
    Ok((table, source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_header_and_array() {
        let spec = SineTableSpec {
            wave_hz: 60.0,
            samples_per_cycle: 100,
            bits: 12,
            amplitude: 0.9,
        };
        let (table, source) = render_sine_table(spec, DEFAULT_TIMER_CLOCK_HZ).unwrap();
        assert_eq!(table.codes.len(), 100);
        assert!(source.contains("const uint16_t dac_buffer[100] = {"));
        assert!(source.contains("Generated by buckhil on "));
    }

    #[test]
    fn invalid_spec_is_an_error() {
        let spec = SineTableSpec {
            wave_hz: 60.0,
            samples_per_cycle: 0,
            bits: 12,
            amplitude: 0.9,
        };
        assert!(render_sine_table(spec, DEFAULT_TIMER_CLOCK_HZ).is_err());
    }
}
