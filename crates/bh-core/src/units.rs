// bh-core/src/units.rs

use uom::si::f32::{
    Capacitance as UomCapacitance, ElectricCurrent as UomElectricCurrent,
    ElectricPotential as UomElectricPotential, ElectricalResistance as UomElectricalResistance,
    Frequency as UomFrequency, Inductance as UomInductance, Time as UomTime,
};

// Public canonical unit types (SI, f32)
pub type Capacitance = UomCapacitance;
pub type Current = UomElectricCurrent;
pub type Frequency = UomFrequency;
pub type Inductance = UomInductance;
pub type Resistance = UomElectricalResistance;
pub type Time = UomTime;
pub type Voltage = UomElectricPotential;

#[inline]
pub fn volts(v: f32) -> Voltage {
    use uom::si::electric_potential::volt;
    Voltage::new::<volt>(v)
}

#[inline]
pub fn amps(v: f32) -> Current {
    use uom::si::electric_current::ampere;
    Current::new::<ampere>(v)
}

#[inline]
pub fn henries(v: f32) -> Inductance {
    use uom::si::inductance::henry;
    Inductance::new::<henry>(v)
}

#[inline]
pub fn farads(v: f32) -> Capacitance {
    use uom::si::capacitance::farad;
    Capacitance::new::<farad>(v)
}

#[inline]
pub fn ohms(v: f32) -> Resistance {
    use uom::si::electrical_resistance::ohm;
    Resistance::new::<ohm>(v)
}

#[inline]
pub fn hz(v: f32) -> Frequency {
    use uom::si::frequency::hertz;
    Frequency::new::<hertz>(v)
}

#[inline]
pub fn s(v: f32) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

#[inline]
pub fn us(v: f32) -> Time {
    use uom::si::time::microsecond;
    Time::new::<microsecond>(v)
}
