//! Deterministic lockstep runner and result recording.
//!
//! One thread plays both contexts: every tick the timer context fires, and
//! every `poll_every` ticks the plant context polls once. With
//! `poll_every == 1` no event is ever coalesced; larger values reproduce a
//! main loop that falls behind the timer.

use bh_core::Real;
use tracing::{debug, info};

use crate::converter::{BuckConverter, ConverterParams, ConverterState};
use crate::driver::TimingDriver;
use crate::error::{SimError, SimResult};
use crate::plant::PlantTask;
use crate::platform::TimerArm;
use crate::pwm::{PwmCounter, TimingParams};
use crate::shared::HilShared;

/// Duty cycle written by an external writer at a given simulated time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DutyEvent {
    pub time_s: f64,
    pub value: Real,
}

/// Initial duty cycle plus time-ordered changes.
#[derive(Clone, Debug, PartialEq)]
pub struct DutySchedule {
    initial: Real,
    events: Vec<DutyEvent>,
}

impl DutySchedule {
    pub fn constant(duty: Real) -> Self {
        Self {
            initial: duty,
            events: Vec::new(),
        }
    }

    /// Create a schedule. Event times must be finite, non-negative and sorted.
    pub fn new(initial: Real, events: Vec<DutyEvent>) -> SimResult<Self> {
        if events.iter().any(|e| !e.time_s.is_finite() || e.time_s < 0.0) {
            return Err(SimError::InvalidArg {
                what: "duty event time must be finite and non-negative",
            });
        }
        if events.windows(2).any(|w| w[1].time_s < w[0].time_s) {
            return Err(SimError::InvalidArg {
                what: "duty events must be sorted by time",
            });
        }
        Ok(Self { initial, events })
    }

    pub fn initial(&self) -> Real {
        self.initial
    }

    pub fn events(&self) -> &[DutyEvent] {
        &self.events
    }

    /// Duty in effect at time `t` (last event at or before `t`).
    pub fn value_at(&self, t: f64) -> Real {
        self.events
            .iter()
            .take_while(|e| e.time_s <= t)
            .last()
            .map_or(self.initial, |e| e.value)
    }
}

/// Everything needed to instantiate one simulated converter.
#[derive(Clone, Debug, PartialEq)]
pub struct HilSetup {
    pub params: ConverterParams,
    pub timing: TimingParams,
    pub initial_state: ConverterState,
    pub duty: DutySchedule,
}

impl Default for HilSetup {
    fn default() -> Self {
        Self {
            params: ConverterParams::reference(),
            timing: TimingParams::reference(),
            initial_state: ConverterState::default(),
            duty: DutySchedule::constant(0.5),
        }
    }
}

/// Options for lockstep runs.
#[derive(Clone, Debug)]
pub struct SimOptions {
    /// Final simulation time (seconds)
    pub t_end: f64,
    /// Maximum number of timer ticks (safety limit)
    pub max_steps: u64,
    /// Record every N-th plant step (decimation)
    pub record_every: usize,
    /// Plant polls once every N timer ticks
    pub poll_every: usize,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            t_end: 0.02,
            max_steps: 10_000_000,
            record_every: 1,
            poll_every: 1,
        }
    }
}

/// Record of simulation results.
#[derive(Clone, Debug, Default)]
pub struct SimRecord {
    /// Time points (seconds), end of the integrated interval
    pub t: Vec<f64>,
    /// State snapshots
    pub x: Vec<ConverterState>,
    /// Switch position used for the step that produced each snapshot
    pub switch: Vec<bool>,
    /// Duty cycle in effect at each snapshot
    pub duty: Vec<Real>,
    /// Timer firings
    pub ticks: u64,
    /// Plant steps taken
    pub steps: u64,
    /// Firings overwritten before the plant consumed them
    pub coalesced: u64,
}

impl SimRecord {
    fn push(&mut self, t: f64, x: ConverterState, switch: bool, duty: Real) {
        self.t.push(t);
        self.x.push(x);
        self.switch.push(switch);
        self.duty.push(duty);
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn final_state(&self) -> Option<ConverterState> {
        self.x.last().copied()
    }
}

/// Run a lockstep simulation.
pub fn run_sim(setup: &HilSetup, opts: &SimOptions) -> SimResult<SimRecord> {
    if !opts.t_end.is_finite() || opts.t_end <= 0.0 {
        return Err(SimError::InvalidArg {
            what: "t_end must be positive",
        });
    }
    if opts.record_every == 0 {
        return Err(SimError::InvalidArg {
            what: "record_every must be positive",
        });
    }
    if opts.poll_every == 0 {
        return Err(SimError::InvalidArg {
            what: "poll_every must be positive",
        });
    }

    let dt = f64::from(setup.timing.step);
    let ticks = (opts.t_end / dt).round() as u64;
    if ticks > opts.max_steps {
        return Err(SimError::InvalidArg {
            what: "t_end / step exceeds max_steps",
        });
    }

    let shared = HilShared::new(setup.duty.initial(), setup.initial_state);
    let counter = PwmCounter::for_timing(&setup.timing);
    debug!(
        ticks,
        steps_per_period = counter.steps_per_period(),
        poll_every = opts.poll_every,
        "lockstep run"
    );
    let mut driver = TimingDriver::new(counter, &shared, TimerArm::new());
    let mut plant = PlantTask::new(
        BuckConverter::new(setup.params),
        setup.timing.step,
        setup.initial_state,
        &shared,
    );

    let mut record = SimRecord::default();
    record.push(0.0, setup.initial_state, false, shared.duty.get());
    let mut recorded_step = 0;

    let mut events = setup.duty.events().iter().peekable();
    for tick in 0..ticks {
        let t = tick as f64 * dt;
        while let Some(event) = events.next_if(|e| e.time_s <= t) {
            shared.duty.set(event.value);
        }

        if !driver.ack_mut().take() {
            return Err(SimError::Invariant {
                what: "timer fired without acknowledgment",
            });
        }
        driver.fire();

        if (tick + 1) % opts.poll_every as u64 == 0 && plant.poll() {
            let steps = plant.steps();
            if steps % opts.record_every as u64 == 0 {
                record.push(
                    (tick + 1) as f64 * dt,
                    plant.state(),
                    plant.last_switch().is_on,
                    shared.duty.get(),
                );
                recorded_step = steps;
            }
        }
    }

    // Always record final state
    if plant.steps() != recorded_step {
        record.push(
            ticks as f64 * dt,
            plant.state(),
            plant.last_switch().is_on,
            shared.duty.get(),
        );
    }

    record.ticks = ticks;
    record.steps = plant.steps();
    record.coalesced = shared.switch.coalesced();
    info!(
        ticks = record.ticks,
        steps = record.steps,
        coalesced = record.coalesced,
        "lockstep run complete"
    );

    Ok(record)
}
