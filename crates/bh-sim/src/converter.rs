//! Switched buck converter plant.
//!
//! Switch-resolved model:
//! `L·dI/dt = v_l`, `C·dV/dt = i_c` with
//! `v_l = on ? (Vin - V) : -V` and `i_c = I - V / R`.

use bh_core::units::{Capacitance, Inductance, Resistance, Voltage};
use bh_core::{Real, ensure_finite, ensure_positive};
use uom::si::capacitance::farad;
use uom::si::electric_potential::volt;
use uom::si::electrical_resistance::ohm;
use uom::si::inductance::henry;

use crate::error::SimResult;
use crate::model::SwitchedModel;

/// Position of the power switch for one sub-interval.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SwitchPosition {
    pub is_on: bool,
}

impl SwitchPosition {
    pub const ON: Self = Self { is_on: true };
    pub const OFF: Self = Self { is_on: false };
}

impl From<bool> for SwitchPosition {
    fn from(is_on: bool) -> Self {
        Self { is_on }
    }
}

/// Electrical state of the converter at one instant.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ConverterState {
    /// Inductor current (A)
    pub inductor_current: Real,
    /// Output (capacitor) voltage (V)
    pub output_voltage: Real,
}

impl ConverterState {
    pub fn new(inductor_current: Real, output_voltage: Real) -> Self {
        Self {
            inductor_current,
            output_voltage,
        }
    }
}

/// Circuit constants, fixed for a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConverterParams {
    /// Input voltage (V)
    pub vin: Real,
    /// Inductance (H)
    pub inductance: Real,
    /// Output capacitance (F)
    pub capacitance: Real,
    /// Resistive load (Ohm)
    pub load_resistance: Real,
}

impl ConverterParams {
    /// Create converter parameters.
    ///
    /// `vin` only needs to be finite; the passive elements must be positive.
    pub fn new(
        vin: Voltage,
        inductance: Inductance,
        capacitance: Capacitance,
        load_resistance: Resistance,
    ) -> SimResult<Self> {
        Ok(Self {
            vin: ensure_finite(vin.get::<volt>(), "vin")?,
            inductance: ensure_positive(inductance.get::<henry>(), "inductance")?,
            capacitance: ensure_positive(capacitance.get::<farad>(), "capacitance")?,
            load_resistance: ensure_positive(load_resistance.get::<ohm>(), "load_resistance")?,
        })
    }

    /// 12 V in, 1 mH, 10 uF, 10 Ohm load.
    pub const fn reference() -> Self {
        Self {
            vin: 12.0,
            inductance: 0.001,
            capacitance: 0.000_01,
            load_resistance: 10.0,
        }
    }

    /// Ideal DC transfer of a buck stage in continuous conduction.
    pub fn ideal_output(&self, duty: Real) -> Real {
        self.vin * duty
    }
}

impl Default for ConverterParams {
    fn default() -> Self {
        Self::reference()
    }
}

/// Instantaneous branch quantities for one switch position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BranchQuantities {
    /// Voltage across the inductor (V)
    pub inductor_voltage: Real,
    /// Current into the output capacitor (A)
    pub capacitor_current: Real,
}

/// Buck converter plant.
#[derive(Clone, Copy, Debug)]
pub struct BuckConverter {
    params: ConverterParams,
}

impl BuckConverter {
    pub fn new(params: ConverterParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ConverterParams {
        &self.params
    }

    /// Branch voltage and current for the given state and switch position.
    #[inline]
    pub fn branch(&self, x: &ConverterState, switch: SwitchPosition) -> BranchQuantities {
        let v_out = x.output_voltage;
        let inductor_voltage = if switch.is_on {
            self.params.vin - v_out
        } else {
            -v_out
        };
        let capacitor_current = x.inductor_current - v_out / self.params.load_resistance;
        BranchQuantities {
            inductor_voltage,
            capacitor_current,
        }
    }
}

/// `dt / L` and `dt / C` for a fixed step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EulerGains {
    pub dt_over_l: Real,
    pub dt_over_c: Real,
}

impl SwitchedModel for BuckConverter {
    type State = ConverterState;
    type Input = SwitchPosition;
    type StepGains = EulerGains;

    #[inline]
    fn rhs(&self, x: &ConverterState, u: SwitchPosition) -> ConverterState {
        let b = self.branch(x, u);
        ConverterState {
            inductor_current: b.inductor_voltage / self.params.inductance,
            output_voltage: b.capacitor_current / self.params.capacitance,
        }
    }

    fn step_gains(&self, dt: Real) -> EulerGains {
        EulerGains {
            dt_over_l: dt / self.params.inductance,
            dt_over_c: dt / self.params.capacitance,
        }
    }

    /// `(dt / L) * v_l` and `(dt / C) * i_c`, in that operand order.
    #[inline]
    fn increment(&self, x: &ConverterState, u: SwitchPosition, gains: &EulerGains) -> ConverterState {
        let b = self.branch(x, u);
        ConverterState {
            inductor_current: gains.dt_over_l * b.inductor_voltage,
            output_voltage: gains.dt_over_c * b.capacitor_current,
        }
    }

    #[inline]
    fn add(&self, a: &ConverterState, b: &ConverterState) -> ConverterState {
        ConverterState {
            inductor_current: a.inductor_current + b.inductor_current,
            output_voltage: a.output_voltage + b.output_voltage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::{ForwardEuler, Integrator};
    use bh_core::units::{farads, henries, ohms, volts};

    const DT: Real = 5e-6;

    #[test]
    fn params_from_si_match_reference() {
        let p = ConverterParams::new(volts(12.0), henries(1e-3), farads(10e-6), ohms(10.0)).unwrap();
        let r = ConverterParams::reference();
        assert!((p.vin - r.vin).abs() < 1e-6);
        assert!((p.inductance - r.inductance).abs() < 1e-9);
        assert!((p.capacitance - r.capacitance).abs() < 1e-12);
        assert!((p.load_resistance - r.load_resistance).abs() < 1e-6);
    }

    #[test]
    fn params_reject_non_positive_passives() {
        assert!(ConverterParams::new(volts(12.0), henries(0.0), farads(1e-5), ohms(10.0)).is_err());
        assert!(ConverterParams::new(volts(12.0), henries(1e-3), farads(-1e-5), ohms(10.0)).is_err());
        assert!(ConverterParams::new(volts(12.0), henries(1e-3), farads(1e-5), ohms(0.0)).is_err());
        assert!(
            ConverterParams::new(volts(Real::NAN), henries(1e-3), farads(1e-5), ohms(10.0)).is_err()
        );
    }

    #[test]
    fn branch_quantities_switch_on() {
        let plant = BuckConverter::new(ConverterParams::reference());
        let b = plant.branch(&ConverterState::new(0.5, 3.0), SwitchPosition::ON);
        assert!((b.inductor_voltage - 9.0).abs() < 1e-6);
        assert!((b.capacitor_current - 0.2).abs() < 1e-6);
    }

    #[test]
    fn euler_step_from_rest_with_switch_on() {
        let p = ConverterParams::reference();
        let plant = BuckConverter::new(p);
        let gains = plant.step_gains(DT);
        let x = ForwardEuler.step(&plant, &ConverterState::default(), SwitchPosition::ON, &gains);

        assert_eq!(x.inductor_current, (DT / p.inductance) * p.vin);
        // i_c comes from the pre-update voltage, which is zero
        assert_eq!(x.output_voltage, 0.0);
    }

    #[test]
    fn euler_step_with_switch_off_uses_pre_update_values() {
        let p = ConverterParams::reference();
        let plant = BuckConverter::new(p);
        let x0 = ConverterState::new(1.0, 2.0);

        let b = plant.branch(&x0, SwitchPosition::OFF);
        assert_eq!(b.inductor_voltage, -2.0);
        assert!((b.capacitor_current - (1.0 - 2.0 / p.load_resistance)).abs() < 1e-6);

        let x1 = ForwardEuler.step(&plant, &x0, SwitchPosition::OFF, &plant.step_gains(DT));
        let expected_il = 1.0 + (DT / p.inductance) * -2.0;
        let expected_vo = 2.0 + (DT / p.capacitance) * (1.0 - 2.0 / p.load_resistance);
        assert_eq!(x1.inductor_current, expected_il);
        assert_eq!(x1.output_voltage, expected_vo);

        // Sequential (Gauss-Seidel) update would have fed the new current into i_c
        let sequential_vo = 2.0 + (DT / p.capacitance) * (expected_il - 2.0 / p.load_resistance);
        assert!((x1.output_voltage - sequential_vo).abs() > 1e-4);
    }

    #[test]
    fn ideal_output_is_vin_times_duty() {
        let p = ConverterParams::reference();
        assert_eq!(p.ideal_output(0.5), 6.0);
        assert_eq!(p.ideal_output(0.0), 0.0);
    }

    #[test]
    fn euler_steps_are_bit_exact_over_several_periods() {
        let p = ConverterParams::reference();
        let plant = BuckConverter::new(p);
        let gains = plant.step_gains(DT);

        let mut x = ConverterState::default();
        let (mut i_l, mut v_out): (Real, Real) = (0.0, 0.0);
        for step in 0..4000u32 {
            let on = step % 20 < 10;
            x = ForwardEuler.step(&plant, &x, SwitchPosition::from(on), &gains);

            let v_l = if on { p.vin - v_out } else { -v_out };
            let i_c = i_l - v_out / p.load_resistance;
            i_l += (DT / p.inductance) * v_l;
            v_out += (DT / p.capacitance) * i_c;

            assert_eq!(x, ConverterState::new(i_l, v_out), "step {step}");
        }
    }

    #[test]
    fn rhs_is_increment_per_unit_step() {
        let plant = BuckConverter::new(ConverterParams::reference());
        let x = ConverterState::new(0.3, 4.0);
        let dxdt = plant.rhs(&x, SwitchPosition::ON);
        let per_second = plant.increment(&x, SwitchPosition::ON, &plant.step_gains(1.0));
        let tol = bh_core::Tolerances::default();
        assert!(bh_core::nearly_equal(dxdt.inductor_current, per_second.inductor_current, tol));
        assert!(bh_core::nearly_equal(dxdt.output_voltage, per_second.output_voltage, tol));
    }
}
