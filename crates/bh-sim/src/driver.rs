//! Timer-context driver: one call per timer firing.

use crate::handshake::Delivery;
use crate::platform::TimerAck;
use crate::pwm::PwmCounter;
use crate::shared::HilShared;

/// Decides the switch position for each sub-interval and raises ready.
///
/// [`TimingDriver::fire`] is the interrupt body: constant time, no
/// allocation, no locks, no logging.
pub struct TimingDriver<'a, A: TimerAck> {
    counter: PwmCounter,
    shared: &'a HilShared,
    ack: A,
}

impl<'a, A: TimerAck> TimingDriver<'a, A> {
    pub fn new(counter: PwmCounter, shared: &'a HilShared, ack: A) -> Self {
        Self {
            counter,
            shared,
            ack,
        }
    }

    /// Handle one timer firing.
    ///
    /// Reads the duty cycle, decides the switch for the upcoming interval,
    /// advances the counter, publishes switch + ready, then acknowledges the
    /// timer. Returns whether the previous event was still pending.
    #[inline]
    pub fn fire(&mut self) -> Delivery {
        let duty = self.shared.duty.get();
        let switch = self.counter.advance(duty);
        let delivery = self.shared.switch.try_send(switch);
        self.ack.acknowledge();
        delivery
    }

    pub fn counter(&self) -> &PwmCounter {
        &self.counter
    }

    pub fn ack(&self) -> &A {
        &self.ack
    }

    pub fn ack_mut(&mut self) -> &mut A {
        &mut self.ack
    }
}
