// Finish-detection and restart/stop mutation tests for the `timer-bar` crate.
// Native-friendly: everything here operates on plain record lists, the way the
// tick loop does between its storage read and write.

use serde_json::json;
use timer_bar::model::{
    TimerRecord, finished_since, restart_timer, stop_timer, take_snapshot,
};

fn finished(name: &str, total: u64) -> TimerRecord {
    TimerRecord {
        name: Some(name.to_string()),
        total,
        remaining: 0,
        running: false,
        started: true,
        end_time: None,
        extra: serde_json::Map::new(),
    }
}

fn running(name: &str, total: u64, end_time: f64) -> TimerRecord {
    TimerRecord {
        name: Some(name.to_string()),
        total,
        remaining: total,
        running: true,
        started: true,
        end_time: Some(end_time),
        extra: serde_json::Map::new(),
    }
}

#[test]
fn running_to_stopped_with_zero_remaining_is_a_finish() {
    let before = vec![running("Pasta", 600, 1_000_000.0)];
    let snapshot = take_snapshot(&before);

    let after = vec![finished("Pasta", 600)];
    assert_eq!(finished_since(&snapshot, &after), ["Pasta"]);
}

#[test]
fn finish_fires_exactly_once_across_polls() {
    let snapshot = take_snapshot(&[running("Pasta", 600, 1_000_000.0)]);
    let after = vec![finished("Pasta", 600)];

    assert_eq!(finished_since(&snapshot, &after).len(), 1);

    // Next poll compares against the refreshed snapshot: nothing new.
    let snapshot = take_snapshot(&after);
    assert!(finished_since(&snapshot, &after).is_empty());
}

#[test]
fn stopped_with_time_left_is_a_pause_not_a_finish() {
    let snapshot = take_snapshot(&[running("Pasta", 600, 1_000_000.0)]);
    let mut paused = finished("Pasta", 600);
    paused.remaining = 42;
    assert!(finished_since(&snapshot, &[paused]).is_empty());
}

#[test]
fn never_started_records_produce_no_finish() {
    let idle = TimerRecord {
        name: Some("Idle".to_string()),
        total: 60,
        remaining: 0,
        running: false,
        started: false,
        end_time: None,
        extra: serde_json::Map::new(),
    };
    let snapshot = take_snapshot(&[idle.clone()]);
    assert!(finished_since(&snapshot, &[idle]).is_empty());
}

#[test]
fn comparison_is_positional() {
    // Record deleted between polls: the list shrank, the survivor at index 0
    // is still running, so no finish is reported.
    let snapshot = take_snapshot(&[
        running("first", 60, 1_000_000.0),
        running("second", 60, 2_000_000.0),
    ]);
    let after = vec![running("second", 60, 2_000_000.0)];
    assert!(finished_since(&snapshot, &after).is_empty());
}

#[test]
fn multiple_finishes_in_one_poll_are_all_reported() {
    let snapshot = take_snapshot(&[
        running("a", 60, 1_000_000.0),
        running("b", 60, 1_000_000.0),
    ]);
    let after = vec![finished("a", 60), finished("b", 60)];
    assert_eq!(finished_since(&snapshot, &after), ["a", "b"]);
}

#[test]
fn restart_rearms_the_finished_record() {
    let now = 1_700_000_000_000.0;
    let mut timers = vec![finished("Pasta", 600)];

    assert!(restart_timer(&mut timers, "Pasta", now));

    let t = &timers[0];
    assert!(t.running);
    assert!(t.started);
    assert_eq!(t.remaining, 600);
    let end = t.end_time.expect("restart sets a deadline");
    assert!((end - (now + 600_000.0)).abs() < 1000.0, "deadline ~ now + total");
}

#[test]
fn stop_resets_to_the_unstarted_state() {
    let mut timers = vec![finished("Pasta", 600)];

    assert!(stop_timer(&mut timers, "Pasta"));

    let t = &timers[0];
    assert!(!t.running);
    assert!(!t.started);
    assert_eq!(t.remaining, 600);
    assert_eq!(t.end_time, None);
}

#[test]
fn lookup_miss_leaves_the_list_untouched() {
    let mut timers = vec![running("Tea", 300, 1_000_000.0)];
    let before = timers.clone();

    assert!(!restart_timer(&mut timers, "Pasta", 0.0));
    assert!(!stop_timer(&mut timers, "Pasta"));
    // "Tea" is running, so it does not satisfy the finished predicate either.
    assert!(!restart_timer(&mut timers, "Tea", 0.0));

    assert_eq!(timers, before);
}

#[test]
fn lookup_takes_the_first_finished_record_with_that_name() {
    let mut timers = vec![
        running("Pasta", 600, 1_000_000.0), // same name, still running: skipped
        finished("Pasta", 300),
        finished("Pasta", 900),
    ];
    assert!(stop_timer(&mut timers, "Pasta"));
    assert_eq!(timers[1].remaining, 300, "second record was reset");
    assert_eq!(timers[2].remaining, 0, "third record untouched");
}

#[test]
fn unnamed_records_match_under_the_default_label() {
    let mut timers = parse_timers_fixture();
    assert!(restart_timer(&mut timers, "Timer", 0.0));
    assert!(timers[0].running);
}

fn parse_timers_fixture() -> Vec<TimerRecord> {
    let raw = json!([{ "total": 120, "remaining": 0, "running": false, "started": true }]).to_string();
    timer_bar::model::parse_timers(&raw)
}
