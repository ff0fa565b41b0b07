//! Integration tests for the click-gesture controller on virtual time.

use proptest::prelude::*;
use smartsaver_core::events::{Event, LockMode};
use smartsaver_core::simulation::{Actuation, Notice};
use smartsaver_core::{GestureState, Settings, Simulation};

fn settings(threshold_ms: u32, countdown_secs: u32) -> Settings {
    Settings {
        delay_double_click: threshold_ms,
        delay_off: countdown_secs,
        ..Settings::default()
    }
}

fn resolved_modes(sim: &Simulation) -> Vec<LockMode> {
    sim.events()
        .iter()
        .filter_map(|e| match e.event {
            Event::GestureResolved { mode, .. } => Some(mode),
            _ => None,
        })
        .collect()
}

#[test]
fn test_single_press_starts_screensaver() {
    // threshold=400ms, countdown=2s
    let mut sim = Simulation::new(settings(400, 2));
    sim.press_at(0);
    sim.run_until(500);

    assert_eq!(sim.state(), GestureState::CountdownArmed(LockMode::Activate));
    assert_eq!(resolved_modes(&sim), vec![LockMode::Activate]);
    assert_eq!(
        sim.log().notices,
        vec![Notice::Shown("The screensaver will start in 2 seconds!".into())]
    );

    // Countdown armed at 400ms runs for 2s.
    sim.run_until(2_400);
    assert_eq!(sim.log().actuations, vec![Actuation::SetActive]);
    assert_eq!(sim.log().notices.len(), 1);
    assert_eq!(sim.saver().click_count(), 0);
    assert_eq!(sim.state(), GestureState::Idle);
}

#[test]
fn test_double_press_locks_screen() {
    let mut sim = Simulation::new(settings(400, 2));
    sim.press_at(0);
    sim.press_at(100);
    sim.run_until(400);

    let resolved = sim
        .events()
        .iter()
        .find(|e| matches!(e.event, Event::GestureResolved { .. }))
        .expect("gesture resolved");
    assert_eq!(resolved.t_ms, 400);
    assert!(matches!(
        resolved.event,
        Event::GestureResolved {
            mode: LockMode::Lock,
            click_count: 2,
            countdown_secs: 2,
            ..
        }
    ));
    assert_eq!(
        sim.log().notices,
        vec![Notice::Shown("Screensaver will lock the screen in 2 seconds!".into())]
    );

    sim.run_until(2_400);
    assert_eq!(sim.log().actuations, vec![Actuation::Lock]);
}

#[test]
fn test_third_press_cancels_and_later_presses_start_over() {
    let mut sim = Simulation::new(settings(400, 2));
    sim.press_at(0);
    sim.press_at(100);
    sim.run_until(400);

    sim.press_at(1_000);
    assert_eq!(sim.state(), GestureState::Idle);
    let canceled: Vec<_> = sim
        .log()
        .notices
        .iter()
        .filter(|n| **n == Notice::Shown("Screensaver activation canceled!".into()))
        .cloned()
        .collect();
    assert_eq!(canceled.len(), 1);

    // 4th and 5th presses open a fresh gesture; the canceled countdown never fires.
    sim.press_at(1_100);
    sim.press_at(1_200);
    assert_eq!(sim.state(), GestureState::AwaitingResolution);
    sim.run_until(2_400);
    assert!(sim.log().actuations.is_empty());
    assert!(sim
        .events()
        .iter()
        .any(|e| matches!(e.event, Event::CountdownCanceled { mode: LockMode::Lock, .. })));

    // The fresh double press resolves at 1500 and locks 2s later, once.
    assert_eq!(sim.state(), GestureState::CountdownArmed(LockMode::Lock));
    sim.run_until(3_499);
    assert!(sim.log().actuations.is_empty());
    sim.run_until(6_000);
    assert_eq!(sim.log().actuations, vec![Actuation::Lock]);
    assert_eq!(resolved_modes(&sim), vec![LockMode::Lock, LockMode::Lock]);
    let fired: Vec<u64> = sim
        .events()
        .iter()
        .filter(|e| matches!(e.event, Event::CountdownFired { .. }))
        .map(|e| e.t_ms)
        .collect();
    assert_eq!(fired, vec![3_500]);
    assert_eq!(sim.state(), GestureState::Idle);
}

#[test]
fn test_countdown_fires_exactly_once() {
    let mut sim = Simulation::new(settings(200, 1));
    sim.press_at(0);
    sim.run_until(60_000);

    let fired = sim
        .events()
        .iter()
        .filter(|e| matches!(e.event, Event::CountdownFired { .. }))
        .count();
    assert_eq!(fired, 1);
    assert_eq!(sim.log().actuations, vec![Actuation::SetActive]);
    assert_eq!(sim.timers().armed(), 0);
}

#[test]
fn test_back_to_back_gestures() {
    let mut sim = Simulation::new(settings(300, 1));
    sim.press_at(0);
    sim.run_until(1_300);
    sim.press_at(2_000);
    sim.press_at(2_050);
    sim.run_until(5_000);

    assert_eq!(
        sim.log().actuations,
        vec![Actuation::SetActive, Actuation::Lock]
    );
    assert_eq!(resolved_modes(&sim), vec![LockMode::Activate, LockMode::Lock]);
}

#[test]
fn test_teardown_after_cancel_stays_silent() {
    let mut sim = Simulation::new(settings(400, 3));
    sim.press_at(0);
    sim.press_at(50);
    sim.run_until(400);
    sim.press_at(500);
    assert_eq!(sim.state(), GestureState::Idle);

    sim.teardown();
    sim.run_until(60_000);
    assert!(sim.log().actuations.is_empty());
    assert_eq!(sim.log().notices.last(), Some(&Notice::Cleared));
}

proptest! {
    #[test]
    fn presses_inside_window_resolve_by_count(
        threshold in 100u32..=1000,
        offsets in proptest::collection::vec(0u64..100, 1..6),
    ) {
        let mut offsets = offsets;
        offsets.sort_unstable();
        let window_end = u64::from(threshold);
        let offsets: Vec<u64> = offsets
            .into_iter()
            .map(|o| o * (window_end - 1) / 100)
            .collect();

        let mut sim = Simulation::new(settings(threshold, 5));
        for at in &offsets {
            sim.press_at(*at);
        }
        prop_assert_eq!(sim.timers().armed(), 1);

        sim.run_until(offsets[0] + window_end);
        let expected = if offsets.len() >= 2 { LockMode::Lock } else { LockMode::Activate };
        prop_assert_eq!(resolved_modes(&sim), vec![expected]);
        prop_assert_eq!(sim.state(), GestureState::CountdownArmed(expected));
        prop_assert_eq!(sim.saver().click_count(), offsets.len() as u32);
    }
}
