//! Platform layer: one-shot bring-up and timer acknowledgment.
//!
//! The core never looks inside these calls. On a real target they wrap the
//! vendor driver library; on the host, [`HostPlatform`] records that each
//! stage ran and in which order.

use tracing::debug;

/// Bring-up stages, in the order [`bring_up`] runs them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BringUpStage {
    Device,
    InterruptModule,
    VectorTable,
    Board,
    GlobalInterrupts,
}

impl BringUpStage {
    pub fn label(&self) -> &'static str {
        match self {
            BringUpStage::Device => "device",
            BringUpStage::InterruptModule => "interrupt module",
            BringUpStage::VectorTable => "vector table",
            BringUpStage::Board => "board",
            BringUpStage::GlobalInterrupts => "global interrupts",
        }
    }
}

/// Startup calls of the target, each invoked exactly once.
pub trait Platform {
    fn init_device(&mut self);
    fn init_interrupt_module(&mut self);
    fn init_vector_table(&mut self);
    fn init_board(&mut self);
    fn enable_global_interrupts(&mut self);
}

/// Acknowledge the timer interrupt so the next firing is scheduled.
pub trait TimerAck {
    fn acknowledge(&mut self);
}

/// Run the platform bring-up sequence.
pub fn bring_up<P: Platform + ?Sized>(platform: &mut P) {
    debug!("platform bring-up: start");
    platform.init_device();
    platform.init_interrupt_module();
    platform.init_vector_table();
    platform.init_board();
    platform.enable_global_interrupts();
    debug!("platform bring-up: interrupts enabled");
}

/// Host stand-in for the target platform.
#[derive(Debug, Default)]
pub struct HostPlatform {
    stages: Vec<BringUpStage>,
}

impl HostPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages completed so far, in call order.
    pub fn stages(&self) -> &[BringUpStage] {
        &self.stages
    }

    pub fn interrupts_enabled(&self) -> bool {
        self.stages.contains(&BringUpStage::GlobalInterrupts)
    }

    fn enter(&mut self, stage: BringUpStage) {
        debug!(stage = stage.label(), "host platform stage");
        self.stages.push(stage);
    }
}

impl Platform for HostPlatform {
    fn init_device(&mut self) {
        self.enter(BringUpStage::Device);
    }

    fn init_interrupt_module(&mut self) {
        self.enter(BringUpStage::InterruptModule);
    }

    fn init_vector_table(&mut self) {
        self.enter(BringUpStage::VectorTable);
    }

    fn init_board(&mut self) {
        self.enter(BringUpStage::Board);
    }

    fn enable_global_interrupts(&mut self) {
        self.enter(BringUpStage::GlobalInterrupts);
    }
}

/// Re-arm latch of a one-shot-per-period timer.
///
/// Starts armed. Each firing consumes the latch with [`TimerArm::take`];
/// only an acknowledgment re-arms it.
#[derive(Debug)]
pub struct TimerArm {
    armed: bool,
    acks: u64,
}

impl Default for TimerArm {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerArm {
    pub fn new() -> Self {
        Self {
            armed: true,
            acks: 0,
        }
    }

    /// Consume the latch; `false` means the last firing was never acknowledged.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.armed)
    }

    pub fn acks(&self) -> u64 {
        self.acks
    }
}

impl TimerAck for TimerArm {
    #[inline]
    fn acknowledge(&mut self) {
        self.armed = true;
        self.acks += 1;
    }
}
