//! DAC output stage.
//!
//! A HIL target exposes plant quantities to the device under test through a
//! DAC. [`DacScale`] maps a value to the code the DAC would be loaded with;
//! [`SineTable`] builds the one-period lookup tables used to drive a DAC
//! from a timer interrupt.

use std::f64::consts::PI;
use std::fmt::Write;

use bh_core::Real;

use crate::error::{SimError, SimResult};

const MAX_BITS: u8 = 16;

fn max_code(bits: u8) -> u32 {
    (1u32 << bits) - 1
}

/// Linear map from `[0, full_scale]` to `[0, 2^bits - 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DacScale {
    bits: u8,
    full_scale: Real,
}

impl DacScale {
    pub fn new(bits: u8, full_scale: Real) -> SimResult<Self> {
        if bits == 0 || bits > MAX_BITS {
            return Err(SimError::InvalidArg {
                what: "DAC resolution must be 1..=16 bits",
            });
        }
        if !full_scale.is_finite() || full_scale <= 0.0 {
            return Err(SimError::InvalidArg {
                what: "DAC full scale must be positive",
            });
        }
        Ok(Self { bits, full_scale })
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }

    pub fn full_scale(&self) -> Real {
        self.full_scale
    }

    pub fn max_code(&self) -> u16 {
        max_code(self.bits) as u16
    }

    /// Code for `value`, rounded and clamped to the DAC range. NaN maps to 0.
    pub fn code(&self, value: Real) -> u16 {
        let max = f32::from(self.max_code());
        let raw = (value / self.full_scale * max).round();
        if raw.is_nan() {
            return 0;
        }
        raw.clamp(0.0, max) as u16
    }
}

/// Parameters of a sine lookup table.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SineTableSpec {
    /// Frequency of the generated wave (Hz)
    pub wave_hz: f64,
    pub samples_per_cycle: usize,
    pub bits: u8,
    /// Peak amplitude relative to half the DAC range, in [0, 1]
    pub amplitude: f64,
}

/// One period of a mid-scale-offset sine, as DAC codes.
#[derive(Clone, Debug, PartialEq)]
pub struct SineTable {
    pub spec: SineTableSpec,
    pub codes: Vec<u16>,
    /// Rate at which the table must be stepped through (Hz)
    pub sample_rate_hz: f64,
}

impl SineTable {
    pub fn generate(spec: SineTableSpec) -> SimResult<Self> {
        if spec.samples_per_cycle == 0 {
            return Err(SimError::InvalidArg {
                what: "samples per cycle must be positive",
            });
        }
        if spec.bits == 0 || spec.bits > MAX_BITS {
            return Err(SimError::InvalidArg {
                what: "DAC resolution must be 1..=16 bits",
            });
        }
        if !spec.wave_hz.is_finite() || spec.wave_hz <= 0.0 {
            return Err(SimError::InvalidArg {
                what: "wave frequency must be positive",
            });
        }
        if !(0.0..=1.0).contains(&spec.amplitude) {
            return Err(SimError::InvalidArg {
                what: "amplitude must be within [0, 1]",
            });
        }

        let max = f64::from(max_code(spec.bits));
        let offset = max / 2.0;
        let amplitude = spec.amplitude * offset;
        let n = spec.samples_per_cycle as f64;

        let codes = (0..spec.samples_per_cycle)
            .map(|i| {
                let value = offset + amplitude * (2.0 * PI * i as f64 / n).sin();
                value.clamp(0.0, max).round_ties_even() as u16
            })
            .collect();

        Ok(Self {
            spec,
            codes,
            sample_rate_hz: spec.wave_hz * n,
        })
    }

    /// Period register value for a timer clocked at `clock_hz` that steps
    /// through the table at `sample_rate_hz`.
    pub fn timer_period(&self, clock_hz: f64) -> u32 {
        (clock_hz / self.sample_rate_hz - 1.0)
            .round_ties_even()
            .max(0.0) as u32
    }

    pub fn min_code(&self) -> u16 {
        self.codes.iter().copied().min().unwrap_or(0)
    }

    pub fn max_code(&self) -> u16 {
        self.codes.iter().copied().max().unwrap_or(0)
    }

    /// Render the table as a C translation unit, ten values per line.
    pub fn to_c_source(&self, clock_hz: f64, generated_at: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "/*");
        let _ = writeln!(out, " * Generated by buckhil on {generated_at}");
        let _ = writeln!(out, " * Wave frequency: {} Hz", self.spec.wave_hz);
        let _ = writeln!(out, " * Samples per cycle: {}", self.spec.samples_per_cycle);
        let _ = writeln!(
            out,
            " * DAC resolution: {} bits (codes 0 to {})",
            self.spec.bits,
            max_code(self.spec.bits)
        );
        let _ = writeln!(out, " * Normalized amplitude: {}", self.spec.amplitude);
        let _ = writeln!(out, " * Timer sample rate: {:.2} Hz", self.sample_rate_hz);
        let _ = writeln!(
            out,
            " * Timer period register ({:.0} MHz clock): {}",
            clock_hz / 1e6,
            self.timer_period(clock_hz)
        );
        let _ = writeln!(out, " */");
        let _ = writeln!(out);
        let _ = writeln!(out, "#include <stdint.h>");
        let _ = writeln!(out);
        let _ = writeln!(out, "const uint16_t dac_buffer[{}] = {{", self.codes.len());
        for line in self.codes.chunks(10) {
            let values: Vec<String> = line.iter().map(|c| format!("{c},")).collect();
            let _ = writeln!(out, "    {}", values.join(" "));
        }
        let _ = writeln!(out, "}};");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> SineTableSpec {
        SineTableSpec {
            wave_hz: 50.0,
            samples_per_cycle: 200,
            bits: 12,
            amplitude: 1.0,
        }
    }

    #[test]
    fn dac_scale_maps_and_clamps() {
        let dac = DacScale::new(12, 20.0).unwrap();
        assert_eq!(dac.max_code(), 4095);
        assert_eq!(dac.code(0.0), 0);
        assert_eq!(dac.code(20.0), 4095);
        assert_eq!(dac.code(10.0), 2048);
        assert_eq!(dac.code(-3.0), 0);
        assert_eq!(dac.code(100.0), 4095);
        assert_eq!(dac.code(Real::NAN), 0);
    }

    #[test]
    fn dac_scale_rejects_bad_arguments() {
        assert!(DacScale::new(0, 1.0).is_err());
        assert!(DacScale::new(17, 1.0).is_err());
        assert!(DacScale::new(12, 0.0).is_err());
    }

    #[test]
    fn sine_table_shape() {
        let table = SineTable::generate(spec()).unwrap();
        assert_eq!(table.codes.len(), 200);
        assert_eq!(table.sample_rate_hz, 10_000.0);
        // starts at mid-scale, peaks at full scale, troughs at zero
        assert_eq!(table.codes[0], 2048);
        assert_eq!(table.codes[50], 4095);
        assert_eq!(table.codes[150], 0);
        assert_eq!(table.min_code(), 0);
        assert_eq!(table.max_code(), 4095);
    }

    #[test]
    fn zero_amplitude_is_flat_mid_scale() {
        let table = SineTable::generate(SineTableSpec {
            amplitude: 0.0,
            ..spec()
        })
        .unwrap();
        assert!(table.codes.iter().all(|&c| c == 2048));
    }

    #[test]
    fn timer_period_for_200_mhz_clock() {
        let table = SineTable::generate(spec()).unwrap();
        assert_eq!(table.timer_period(200e6), 19_999);
    }

    #[test]
    fn timer_period_rounds_half_to_even() {
        // 4 Hz sample rate: 14 Hz gives 2.5, 10 Hz gives 1.5
        let table = SineTable::generate(SineTableSpec {
            wave_hz: 1.0,
            samples_per_cycle: 4,
            bits: 12,
            amplitude: 1.0,
        })
        .unwrap();
        assert_eq!(table.timer_period(14.0), 2);
        assert_eq!(table.timer_period(10.0), 2);
    }

    #[test]
    fn sine_table_rejects_bad_spec() {
        assert!(SineTable::generate(SineTableSpec {
            samples_per_cycle: 0,
            ..spec()
        })
        .is_err());
        assert!(SineTable::generate(SineTableSpec { bits: 0, ..spec() }).is_err());
        assert!(SineTable::generate(SineTableSpec {
            wave_hz: 0.0,
            ..spec()
        })
        .is_err());
        assert!(SineTable::generate(SineTableSpec {
            amplitude: 1.5,
            ..spec()
        })
        .is_err());
    }

    #[test]
    fn c_source_layout() {
        let table = SineTable::generate(SineTableSpec {
            samples_per_cycle: 12,
            ..spec()
        })
        .unwrap();
        let src = table.to_c_source(200e6, "2026-01-01 00:00:00");
        assert!(src.contains("const uint16_t dac_buffer[12] = {"));
        assert!(src.contains("Generated by buckhil on 2026-01-01 00:00:00"));
        let rows: Vec<&str> = src
            .lines()
            .skip_while(|l| !l.starts_with("const uint16_t"))
            .skip(1)
            .take_while(|l| !l.starts_with("};"))
            .collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].matches(',').count(), 10);
        assert_eq!(rows[1].matches(',').count(), 2);
    }
}
