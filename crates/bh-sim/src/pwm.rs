//! PWM timing: step size, switching frequency and the per-tick cycle counter.

use bh_core::Real;
use bh_core::ensure_positive;
use bh_core::units::{Frequency, Time};
use uom::si::frequency::hertz;
use uom::si::time::second;

use crate::converter::SwitchPosition;
use crate::error::{SimError, SimResult};

/// Timer step and PWM frequency, fixed for a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimingParams {
    /// Integration step and timer period (s)
    pub step: Real,
    /// Switching frequency (Hz)
    pub pwm_frequency: Real,
}

impl TimingParams {
    pub fn new(step: Time, pwm_frequency: Frequency) -> SimResult<Self> {
        let params = Self {
            step: ensure_positive(step.get::<second>(), "step")?,
            pwm_frequency: ensure_positive(pwm_frequency.get::<hertz>(), "pwm_frequency")?,
        };
        if params.pwm_period() < params.step {
            return Err(SimError::InvalidArg {
                what: "PWM period must span at least one step",
            });
        }
        Ok(params)
    }

    /// 5 us step, 10 kHz switching.
    pub const fn reference() -> Self {
        Self {
            step: 0.000_005,
            pwm_frequency: 10_000.0,
        }
    }

    pub fn pwm_period(&self) -> Real {
        1.0 / self.pwm_frequency
    }

    /// `round(pwm_period / step)`, never less than one.
    pub fn steps_per_period(&self) -> u32 {
        let ratio = f64::from(self.pwm_period()) / f64::from(self.step);
        (ratio.round() as u32).max(1)
    }
}

impl Default for TimingParams {
    fn default() -> Self {
        Self::reference()
    }
}

/// Position inside the current PWM period.
///
/// Owned by the timer context; `step_index` advances once per firing and
/// wraps at `steps_per_period`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PwmCounter {
    step_index: u32,
    steps_per_period: u32,
}

impl PwmCounter {
    pub fn new(steps_per_period: u32) -> Self {
        Self {
            step_index: 0,
            steps_per_period: steps_per_period.max(1),
        }
    }

    pub fn for_timing(timing: &TimingParams) -> Self {
        Self::new(timing.steps_per_period())
    }

    pub fn step_index(&self) -> u32 {
        self.step_index
    }

    pub fn steps_per_period(&self) -> u32 {
        self.steps_per_period
    }

    /// Switch position for the current index. Strict `<`: duty 0 is always
    /// off, duty 1 is always on.
    #[inline]
    pub fn is_on(&self, duty: Real) -> bool {
        (self.step_index as Real) < duty * self.steps_per_period as Real
    }

    /// Decide the switch for the upcoming sub-interval, then move to the next one.
    #[inline]
    pub fn advance(&mut self, duty: Real) -> SwitchPosition {
        let switch = SwitchPosition {
            is_on: self.is_on(duty),
        };
        self.step_index += 1;
        if self.step_index >= self.steps_per_period {
            self.step_index = 0;
        }
        switch
    }
}
