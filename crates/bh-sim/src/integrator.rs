//! Fixed-step time integrators.

use crate::model::SwitchedModel;

/// Trait for time integrators.
pub trait Integrator {
    /// Advance state by one time step with the input held constant.
    fn step<M: SwitchedModel>(
        &self,
        model: &M,
        x: &M::State,
        u: M::Input,
        gains: &M::StepGains,
    ) -> M::State;
}

/// Forward Euler (explicit, 1st order).
///
/// The increment is evaluated once, from the pre-update state, and then
/// applied to every component at the same time.
#[derive(Clone, Copy, Debug, Default)]
pub struct ForwardEuler;

impl Integrator for ForwardEuler {
    #[inline]
    fn step<M: SwitchedModel>(
        &self,
        model: &M,
        x: &M::State,
        u: M::Input,
        gains: &M::StepGains,
    ) -> M::State {
        model.add(x, &model.increment(x, u, gains))
    }
}
