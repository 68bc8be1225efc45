//! Hardware-in-the-loop model of a buck DC-DC converter.
//!
//! Provides:
//! - Switched buck converter plant and fixed-step forward Euler integrator
//! - PWM counter and the timer-context driver that decides the switch position
//! - Single-slot overwrite channel between the timer and plant contexts
//! - Plant task that consumes one tick per step
//! - Deterministic lockstep runner and a threaded real-time runtime
//! - DAC output scaling and sine lookup table generation

pub mod converter;
pub mod dac;
pub mod driver;
pub mod error;
pub mod handshake;
pub mod integrator;
pub mod model;
pub mod plant;
pub mod platform;
pub mod pwm;
pub mod runtime;
pub mod shared;
pub mod sim;

// Re-exports for public API
pub use converter::{
    BranchQuantities, BuckConverter, ConverterParams, ConverterState, EulerGains, SwitchPosition,
};
pub use dac::{DacScale, SineTable, SineTableSpec};
pub use driver::TimingDriver;
pub use error::{SimError, SimResult};
pub use handshake::{Delivery, SwitchSlot};
pub use integrator::{ForwardEuler, Integrator};
pub use model::SwitchedModel;
pub use plant::PlantTask;
pub use platform::{BringUpStage, HostPlatform, Platform, TimerAck, TimerArm, bring_up};
pub use pwm::{PwmCounter, TimingParams};
pub use runtime::{RuntimeOptions, RuntimeReport, run_realtime};
pub use shared::{DutyInput, HilShared, StateCell};
pub use sim::{DutyEvent, DutySchedule, HilSetup, SimOptions, SimRecord, run_sim};
