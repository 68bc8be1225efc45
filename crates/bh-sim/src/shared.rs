//! Cells shared between the timer context, the plant context and observers.
//!
//! Each cell has exactly one writer. None of them lock.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use bh_core::Real;

use crate::converter::ConverterState;
use crate::handshake::SwitchSlot;

/// Duty cycle input, stored as raw `f32` bits.
///
/// Any writer may update it between firings. No range check: values outside
/// [0, 1] simply yield an always-off or always-on switch.
#[derive(Debug)]
pub struct DutyInput(AtomicU32);

impl DutyInput {
    pub const fn new(duty: Real) -> Self {
        Self(AtomicU32::new(duty.to_bits()))
    }

    #[inline]
    pub fn set(&self, duty: Real) {
        self.0.store(duty.to_bits(), Ordering::Relaxed);
    }

    #[inline]
    pub fn get(&self) -> Real {
        Real::from_bits(self.0.load(Ordering::Relaxed))
    }
}

/// Published converter state.
///
/// Both fields live in one 64-bit word (current in the high half, voltage in
/// the low half) so a snapshot always pairs values from the same step.
#[derive(Debug)]
pub struct StateCell(AtomicU64);

#[inline]
fn pack(state: ConverterState) -> u64 {
    (u64::from(state.inductor_current.to_bits()) << 32) | u64::from(state.output_voltage.to_bits())
}

#[inline]
fn unpack(raw: u64) -> ConverterState {
    ConverterState {
        inductor_current: Real::from_bits((raw >> 32) as u32),
        output_voltage: Real::from_bits(raw as u32),
    }
}

impl StateCell {
    pub fn new(state: ConverterState) -> Self {
        Self(AtomicU64::new(pack(state)))
    }

    #[inline]
    pub fn publish(&self, state: ConverterState) {
        self.0.store(pack(state), Ordering::Release);
    }

    #[inline]
    pub fn snapshot(&self) -> ConverterState {
        unpack(self.0.load(Ordering::Acquire))
    }
}

/// Everything the two contexts share for one simulated converter.
#[derive(Debug)]
pub struct HilShared {
    pub switch: SwitchSlot,
    pub duty: DutyInput,
    pub state: StateCell,
}

impl HilShared {
    pub fn new(duty: Real, initial_state: ConverterState) -> Self {
        Self {
            switch: SwitchSlot::new(),
            duty: DutyInput::new(duty),
            state: StateCell::new(initial_state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duty_round_trips_exact_bits() {
        let duty = DutyInput::new(0.5);
        assert_eq!(duty.get(), 0.5);
        duty.set(0.123_456_7);
        assert_eq!(duty.get(), 0.123_456_7);
    }

    #[test]
    fn state_cell_keeps_pair_together() {
        let cell = StateCell::new(ConverterState::default());
        assert_eq!(cell.snapshot(), ConverterState::default());

        let s = ConverterState::new(-0.75, 5.999);
        cell.publish(s);
        assert_eq!(cell.snapshot(), s);
    }

    #[test]
    fn state_cell_preserves_special_values() {
        let cell = StateCell::new(ConverterState::new(Real::INFINITY, -0.0));
        let s = cell.snapshot();
        assert_eq!(s.inductor_current, Real::INFINITY);
        assert!(s.output_voltage == 0.0 && s.output_voltage.is_sign_negative());
    }

    #[test]
    fn observer_never_sees_torn_pair() {
        let cell = StateCell::new(ConverterState::new(0.0, 0.0));
        std::thread::scope(|scope| {
            scope.spawn(|| {
                for k in 1..5_000u32 {
                    let v = k as Real;
                    cell.publish(ConverterState::new(v, -v));
                }
            });
            for _ in 0..5_000 {
                let s = cell.snapshot();
                assert_eq!(s.inductor_current, -s.output_voltage);
            }
        });
    }
}
