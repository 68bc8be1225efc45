//! Integration test: threaded real-time runtime.
//!
//! The timer and plant contexts run on separate threads, so the number of
//! coalesced ticks depends on the host scheduler. Every tick must still be
//! accounted for as either a step or a coalesced event.

use bh_sim::{
    BringUpStage, HilSetup, HostPlatform, RuntimeOptions, SimOptions, run_realtime, run_sim,
};

#[test]
fn free_running_accounts_for_every_tick() {
    let setup = HilSetup::default();
    let mut platform = HostPlatform::new();
    let opts = RuntimeOptions {
        ticks: 5_000,
        paced: false,
    };

    let report = run_realtime(&setup, &opts, &mut platform).unwrap();

    assert_eq!(report.ticks, 5_000);
    assert!(report.steps >= 1);
    assert_eq!(report.steps + report.coalesced, report.ticks);
    assert!(report.final_state.inductor_current.is_finite());
    assert!(report.final_state.output_voltage.is_finite());
    assert_eq!(report.fire_timing.count, 5_000);
    assert_eq!(report.step_timing.count, report.steps);
}

#[test]
fn platform_is_brought_up_before_first_tick() {
    let mut platform = HostPlatform::new();
    let opts = RuntimeOptions {
        ticks: 10,
        paced: false,
    };

    run_realtime(&HilSetup::default(), &opts, &mut platform).unwrap();

    assert_eq!(platform.stages().len(), 5);
    assert_eq!(platform.stages()[0], BringUpStage::Device);
    assert_eq!(platform.stages()[4], BringUpStage::GlobalInterrupts);
}

#[test]
fn paced_run_matches_lockstep_when_nothing_is_dropped() {
    let setup = HilSetup::default();
    let mut platform = HostPlatform::new();
    let ticks = 400u64;
    let opts = RuntimeOptions { ticks, paced: true };

    let report = run_realtime(&setup, &opts, &mut platform).unwrap();
    assert_eq!(report.steps + report.coalesced, ticks);

    if report.coalesced == 0 {
        let lockstep = run_sim(
            &setup,
            &SimOptions {
                t_end: ticks as f64 * f64::from(setup.timing.step),
                ..SimOptions::default()
            },
        )
        .unwrap();
        assert_eq!(lockstep.steps, ticks);
        assert_eq!(lockstep.final_state(), Some(report.final_state));
    }
}
