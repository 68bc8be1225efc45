//! Threaded real-time runtime.
//!
//! The timer context runs on its own thread and fires [`TimingDriver::fire`]
//! once per step of wall-clock time. The plant context runs on a second
//! thread and blocks on the switch slot between events. Both threads are
//! scoped to the call, so the shared cells live on this function's stack.

use std::sync::Barrier;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use bh_core::timing::{AccumulatingTimer, TimingSummary};
use tracing::{debug, info, warn};

use crate::converter::{BuckConverter, ConverterState};
use crate::driver::TimingDriver;
use crate::error::{SimError, SimResult};
use crate::plant::PlantTask;
use crate::platform::{Platform, TimerArm, bring_up};
use crate::pwm::PwmCounter;
use crate::shared::HilShared;
use crate::sim::HilSetup;

/// Sleep is too coarse below this; the last stretch before a deadline is spun.
const SPIN_WINDOW: Duration = Duration::from_micros(200);

/// Options for real-time runs.
#[derive(Clone, Debug)]
pub struct RuntimeOptions {
    /// Number of timer firings
    pub ticks: u64,
    /// Pace firings at the step period; otherwise fire back to back
    pub paced: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            ticks: 20_000,
            paced: true,
        }
    }
}

/// Outcome of a real-time run.
#[derive(Clone, Debug)]
pub struct RuntimeReport {
    /// Timer firings
    pub ticks: u64,
    /// Plant steps taken
    pub steps: u64,
    /// Firings overwritten before the plant consumed them
    pub coalesced: u64,
    /// Firings that started more than one period late
    pub late_ticks: u64,
    pub final_state: ConverterState,
    pub wall_time_s: f64,
    pub fire_timing: TimingSummary,
    pub step_timing: TimingSummary,
}

/// Wall-clock pacing for the timer thread.
struct Pacer {
    period: Duration,
    next: Instant,
    paced: bool,
    late: u64,
}

impl Pacer {
    fn new(period: Duration, paced: bool) -> Self {
        Self {
            period,
            next: Instant::now(),
            paced,
            late: 0,
        }
    }

    /// Wait for the next deadline. A missed deadline fires immediately.
    fn wait(&mut self) {
        if !self.paced {
            return;
        }
        let now = Instant::now();
        if now > self.next + self.period {
            self.late += 1;
        } else if self.next > now {
            let remaining = self.next - now;
            if remaining > SPIN_WINDOW {
                thread::sleep(remaining - SPIN_WINDOW);
            }
            while Instant::now() < self.next {
                std::hint::spin_loop();
            }
        }
        self.next += self.period;
    }
}

/// Bring the platform up, then run both contexts for `opts.ticks` firings.
pub fn run_realtime<P: Platform + ?Sized>(
    setup: &HilSetup,
    opts: &RuntimeOptions,
    platform: &mut P,
) -> SimResult<RuntimeReport> {
    if opts.ticks == 0 {
        return Err(SimError::InvalidArg {
            what: "ticks must be positive",
        });
    }

    bring_up(platform);

    let shared = HilShared::new(setup.duty.initial(), setup.initial_state);
    let stop = AtomicBool::new(false);
    let receiver_ready = Barrier::new(2);
    let fire_timer = AccumulatingTimer::new();
    let step_timer = AccumulatingTimer::new();
    let dt = f64::from(setup.timing.step);
    let period = Duration::from_secs_f64(dt);

    let started = Instant::now();
    let (ticks, late_ticks, final_state, steps) = thread::scope(|scope| {
        let plant_thread = scope.spawn(|| {
            let mut plant = PlantTask::new(
                BuckConverter::new(setup.params),
                setup.timing.step,
                setup.initial_state,
                &shared,
            );
            shared.switch.register_receiver();
            receiver_ready.wait();
            while let Some(switch) = shared.switch.recv_blocking(&stop) {
                let t0 = Instant::now();
                plant.step(switch);
                step_timer.record(t0.elapsed());
            }
            (plant.state(), plant.steps())
        });

        receiver_ready.wait();
        debug!(ticks = opts.ticks, paced = opts.paced, "timer thread started");

        let mut driver = TimingDriver::new(
            PwmCounter::for_timing(&setup.timing),
            &shared,
            TimerArm::new(),
        );
        let mut pacer = Pacer::new(period, opts.paced);
        let mut events = setup.duty.events().iter().peekable();
        let mut fired = 0u64;

        while fired < opts.ticks {
            if !driver.ack_mut().take() {
                warn!(fired, "timer not re-armed, stopping");
                break;
            }
            pacer.wait();

            let t = fired as f64 * dt;
            while let Some(event) = events.next_if(|e| e.time_s <= t) {
                shared.duty.set(event.value);
            }

            let t0 = Instant::now();
            driver.fire();
            fire_timer.record(t0.elapsed());
            fired += 1;
        }

        stop.store(true, Ordering::Release);
        shared.switch.wake();

        let (state, steps) = plant_thread.join().map_err(|_| SimError::Backend {
            message: "plant thread panicked".to_string(),
        })?;
        Ok::<_, SimError>((fired, pacer.late, state, steps))
    })?;

    let coalesced = shared.switch.coalesced();
    if coalesced > 0 {
        warn!(coalesced, ticks, "plant fell behind the timer; steps were dropped");
    }

    let report = RuntimeReport {
        ticks,
        steps,
        coalesced,
        late_ticks,
        final_state,
        wall_time_s: started.elapsed().as_secs_f64(),
        fire_timing: fire_timer.summary(),
        step_timing: step_timer.summary(),
    };
    info!(
        ticks = report.ticks,
        steps = report.steps,
        coalesced = report.coalesced,
        late = report.late_ticks,
        "real-time run complete"
    );
    Ok(report)
}
