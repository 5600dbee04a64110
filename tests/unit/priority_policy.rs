//! Unit tests for the period-to-priority policy.

use std::time::Duration;

use proptest::prelude::*;
use tripteron_motion::task::{
    periodic_priority, resolve, Priority, TaskPriority, MAX_PRIORITY, PERIODIC_CEILING,
};

#[test]
fn test_documented_anchor_points() {
    let at = |ms| periodic_priority(Duration::from_millis(ms)).unwrap().value();

    assert_eq!(at(1), PERIODIC_CEILING);
    assert_eq!(at(10), 16);
    assert_eq!(at(100), 8);
    assert_eq!(at(1000), 1);
}

#[test]
fn test_aperiodic_outranks_every_periodic_task() {
    let aperiodic = resolve(TaskPriority::Automatic, None).unwrap();
    assert_eq!(aperiodic.value(), MAX_PRIORITY);
    assert!(aperiodic > periodic_priority(Duration::from_micros(1)).unwrap());
}

proptest! {
    /// A longer period never yields a higher priority.
    #[test]
    fn prop_priority_non_increasing_in_period(a in 1u64..5_000_000, b in 1u64..5_000_000) {
        let (short, long) = if a <= b { (a, b) } else { (b, a) };
        let p_short = periodic_priority(Duration::from_micros(short)).unwrap();
        let p_long = periodic_priority(Duration::from_micros(long)).unwrap();
        prop_assert!(p_short >= p_long);
    }

    /// Every periodic priority stays in range and below the aperiodic level.
    #[test]
    fn prop_priority_in_range(micros in 1u64..u64::from(u32::MAX)) {
        let priority = periodic_priority(Duration::from_micros(micros)).unwrap();
        prop_assert!(priority >= Priority::MIN);
        prop_assert!(priority.value() <= PERIODIC_CEILING);
    }
}
