use dayrun::program::Outcome;
use dayrun::schedule::{DayState, DayStateMachine, RetryDecision};

#[test]
fn full_day_with_a_retry_loop() {
    let mut machine = DayStateMachine::new("nightly");
    assert_eq!(machine.state(), DayState::Idle);

    assert!(machine.trigger_fired());
    assert_eq!(machine.state(), DayState::Due);

    machine.launch_started();
    assert_eq!(machine.state(), DayState::Running);

    assert_eq!(
        machine.outcome_received(Outcome::Retry),
        RetryDecision::RetryAfterDelay
    );
    assert_eq!(machine.state(), DayState::RetryScheduled);

    assert!(machine.retry_delay_elapsed());
    assert_eq!(machine.state(), DayState::Due);

    machine.launch_started();
    assert_eq!(
        machine.outcome_received(Outcome::Success),
        RetryDecision::DoneForToday
    );
    assert_eq!(machine.state(), DayState::DoneToday);

    // Next day's trigger re-arms the machine.
    assert!(machine.trigger_fired());
    assert_eq!(machine.state(), DayState::Due);
}

#[test]
fn day_rollover_leaves_inflight_work_alone() {
    let mut machine = DayStateMachine::new("slow");
    assert!(machine.trigger_fired());
    machine.launch_started();

    // A new day's trigger while still running must not interrupt.
    assert!(!machine.trigger_fired());
    assert_eq!(machine.state(), DayState::Running);

    machine.outcome_received(Outcome::Retry);
    assert!(!machine.trigger_fired());
    assert_eq!(machine.state(), DayState::RetryScheduled);
}

#[test]
fn failure_is_terminal_for_the_day() {
    for outcome in [Outcome::Failed, Outcome::InternalError] {
        let mut machine = DayStateMachine::new("brittle");
        assert!(machine.trigger_fired());
        machine.launch_started();

        assert_eq!(machine.outcome_received(outcome), RetryDecision::DoneForToday);
        assert_eq!(machine.state(), DayState::DoneToday);
    }
}

#[test]
fn launch_failure_waits_for_the_next_trigger() {
    let mut machine = DayStateMachine::new("ghost");
    assert!(machine.trigger_fired());

    machine.launch_failed();
    assert_eq!(machine.state(), DayState::Idle);

    // The next daily trigger tries again; no retry timer is armed.
    assert!(machine.trigger_fired());
    assert_eq!(machine.state(), DayState::Due);
}

#[test]
fn stray_retry_timer_is_ignored() {
    let mut machine = DayStateMachine::new("odd");
    assert!(!machine.retry_delay_elapsed());
    assert_eq!(machine.state(), DayState::Idle);
}
