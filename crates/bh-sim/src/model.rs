//! SwitchedModel trait for plants driven by a discrete input each step.

use bh_core::Real;

/// Trait for switched dynamic system models.
///
/// A SwitchedModel must implement:
/// - State type (Copy, so the plant can publish snapshots without allocation)
/// - Input type held constant over one step (e.g. a switch position)
/// - RHS computation: x_dot = f(x, u)
/// - Step gains: the step size folded into per-state coefficients, once per run
/// - Increment over one step from those gains, and state addition
///
/// Everything here is infallible and allocation-free: it runs once per timer tick.
pub trait SwitchedModel {
    /// State type, reused for derivatives and increments.
    type State: Copy;

    /// Input held over one step.
    type Input: Copy;

    /// Coefficients for a fixed step size.
    type StepGains: Copy;

    /// Compute state derivative dxdt = f(x, u), evaluated at the start of the step.
    fn rhs(&self, x: &Self::State, u: Self::Input) -> Self::State;

    /// Gains for step size `dt`. Computed once when the step size is fixed.
    fn step_gains(&self, dt: Real) -> Self::StepGains;

    /// Change of state over one step, from the pre-update state only.
    fn increment(&self, x: &Self::State, u: Self::Input, gains: &Self::StepGains) -> Self::State;

    /// Add two states element-wise: result = a + b.
    fn add(&self, a: &Self::State, b: &Self::State) -> Self::State;
}
