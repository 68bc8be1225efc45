use bh_project::schema::{DutyEventDef, Project};
use bh_project::validate_project;
use proptest::prelude::*;

proptest! {
    #[test]
    fn duty_in_unit_interval_is_accepted(duty in 0.0f64..=1.0) {
        let mut p = Project::new("prop");
        p.duty.initial = duty;
        prop_assert!(validate_project(&p).is_ok());
    }

    #[test]
    fn duty_above_one_is_rejected(duty in 1.0001f64..100.0) {
        let mut p = Project::new("prop");
        p.duty.initial = duty;
        prop_assert!(validate_project(&p).is_err());
    }

    #[test]
    fn sorted_schedules_are_accepted(mut times in prop::collection::vec(0.0f64..1.0, 0..8)) {
        times.sort_by(f64::total_cmp);
        let mut p = Project::new("prop");
        p.duty.schedule = times
            .into_iter()
            .map(|time_s| DutyEventDef { time_s, value: 0.5 })
            .collect();
        prop_assert!(validate_project(&p).is_ok());
    }
}
