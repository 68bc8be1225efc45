//! Plant context: consumes ready events and integrates the converter.

use std::sync::atomic::AtomicBool;

use bh_core::Real;

use crate::converter::{BuckConverter, ConverterState, EulerGains, SwitchPosition};
use crate::integrator::{ForwardEuler, Integrator};
use crate::model::SwitchedModel;
use crate::shared::HilShared;

/// Main-loop side of the handshake.
///
/// Each consumed event advances the state by exactly one step of `dt` and
/// publishes the result to [`HilShared::state`].
pub struct PlantTask<'a, I: Integrator = ForwardEuler> {
    model: BuckConverter,
    integrator: I,
    gains: EulerGains,
    state: ConverterState,
    steps: u64,
    last_switch: SwitchPosition,
    shared: &'a HilShared,
}

impl<'a> PlantTask<'a, ForwardEuler> {
    pub fn new(
        model: BuckConverter,
        dt: Real,
        initial_state: ConverterState,
        shared: &'a HilShared,
    ) -> Self {
        Self::with_integrator(model, ForwardEuler, dt, initial_state, shared)
    }
}

impl<'a, I: Integrator> PlantTask<'a, I> {
    pub fn with_integrator(
        model: BuckConverter,
        integrator: I,
        dt: Real,
        initial_state: ConverterState,
        shared: &'a HilShared,
    ) -> Self {
        shared.state.publish(initial_state);
        let gains = model.step_gains(dt);
        Self {
            model,
            integrator,
            gains,
            state: initial_state,
            steps: 0,
            last_switch: SwitchPosition::OFF,
            shared,
        }
    }

    /// One pass of the polling loop. Returns `true` if a step was taken.
    #[inline]
    pub fn poll(&mut self) -> bool {
        match self.shared.switch.try_recv() {
            Some(switch) => {
                self.step(switch);
                true
            }
            None => false,
        }
    }

    /// Advance one step with the given switch position and publish the state.
    #[inline]
    pub fn step(&mut self, switch: SwitchPosition) {
        self.state = self
            .integrator
            .step(&self.model, &self.state, switch, &self.gains);
        self.last_switch = switch;
        self.steps += 1;
        self.shared.state.publish(self.state);
    }

    /// Block on the slot and step for every event until `stop` is raised.
    ///
    /// An event already sent when `stop` is observed is still integrated.
    pub fn run_until(&mut self, stop: &AtomicBool) {
        while let Some(switch) = self.shared.switch.recv_blocking(stop) {
            self.step(switch);
        }
    }

    pub fn state(&self) -> ConverterState {
        self.state
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn last_switch(&self) -> SwitchPosition {
        self.last_switch
    }

    pub fn model(&self) -> &BuckConverter {
        &self.model
    }
}
