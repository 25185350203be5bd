use chrono::{DateTime, Utc};
use proptest::prelude::*;

use issuedeck::services::{KeyValueStore, SqliteStore};
use issuedeck::tutorial::{
    reduce, StepId, TUTORIAL_PROGRESS_KEY, TUTORIAL_STATE_KEY, LAST_STEP,
};
use issuedeck::{Tutorial, TutorialAction, TutorialState, TutorialStore};

fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_717_200_000, 0).unwrap()
}

fn arb_step() -> impl Strategy<Value = StepId> {
    prop_oneof![
        Just(StepId::Welcome),
        Just(StepId::Signup),
        Just(StepId::Tour),
        Just(StepId::Creation),
        Just(StepId::Completion),
    ]
}

fn arb_action() -> impl Strategy<Value = TutorialAction> {
    prop_oneof![
        Just(TutorialAction::Open),
        Just(TutorialAction::Close),
        Just(TutorialAction::Next),
        Just(TutorialAction::Previous),
        Just(TutorialAction::Skip),
        Just(TutorialAction::Reset),
        any::<i64>().prop_map(TutorialAction::GoToStep),
        arb_step().prop_map(TutorialAction::MarkStepCompleted),
    ]
}

proptest! {
    #[test]
    fn step_index_stays_in_bounds(actions in proptest::collection::vec(arb_action(), 0..60)) {
        let mut state = TutorialState::default();
        for action in actions {
            state = reduce(state, action, now());
            prop_assert!(state.current_step <= LAST_STEP);
            prop_assert!(state.user_progress.last_active_step <= LAST_STEP);
        }
    }

    #[test]
    fn mark_completed_is_idempotent(step in arb_step(), actions in proptest::collection::vec(arb_action(), 0..20)) {
        let mut state = TutorialState::default();
        for action in actions {
            state = reduce(state, action, now());
        }
        let once = reduce(state.clone(), TutorialAction::MarkStepCompleted(step), now());
        let twice = reduce(once.clone(), TutorialAction::MarkStepCompleted(step), now());
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(once.current_step, state.current_step);
    }

    #[test]
    fn reset_always_returns_to_the_start(actions in proptest::collection::vec(arb_action(), 0..30)) {
        let mut state = TutorialState::default();
        for action in actions {
            state = reduce(state, action, now());
        }
        prop_assert_eq!(reduce(state, TutorialAction::Reset, now()), TutorialState::default());
    }
}

#[test]
fn skip_closes_and_counts_as_done_from_any_step() {
    for step in 0..=LAST_STEP as i64 {
        let state = reduce(TutorialState::default(), TutorialAction::Open, now());
        let state = reduce(state, TutorialAction::GoToStep(step), now());
        let state = reduce(state, TutorialAction::Skip, now());
        assert!(!state.is_open);
        assert!(state.is_skipped);
        assert!(state.is_done());
        assert_eq!(state.current_step, step as usize);
        assert_eq!(state.user_progress.completed_at, Some(now()));
    }
}

#[test]
fn progress_survives_a_restart_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.db");

    let mut tutorial = Tutorial::load(TutorialStore::new(SqliteStore::new(path.clone())));
    tutorial.dispatch_at(TutorialAction::Open, now());
    tutorial.dispatch_at(TutorialAction::MarkStepCompleted(StepId::Welcome), now());
    tutorial.dispatch_at(TutorialAction::Next, now());
    tutorial.dispatch_at(TutorialAction::MarkStepCompleted(StepId::Signup), now());
    tutorial.dispatch_at(TutorialAction::Next, now());

    let reloaded = Tutorial::load(TutorialStore::new(SqliteStore::new(path.clone())));
    assert_eq!(reloaded.state(), tutorial.state());
    assert_eq!(reloaded.state().current_step, 2);
    assert!(reloaded.state().user_progress.has_viewed_welcome);
    assert!(reloaded.state().user_progress.has_clicked_signup);
    assert!(!reloaded.state().user_progress.has_completed_tour);

    // Both snapshots are stored as JSON under their own keys
    let store = SqliteStore::new(path);
    let raw_state = store.get(TUTORIAL_STATE_KEY).unwrap().unwrap();
    let raw_progress = store.get(TUTORIAL_PROGRESS_KEY).unwrap().unwrap();
    let state: serde_json::Value = serde_json::from_str(&raw_state).unwrap();
    let progress: serde_json::Value = serde_json::from_str(&raw_progress).unwrap();
    assert_eq!(state["current_step"], 2);
    assert_eq!(progress["has_clicked_signup"], true);
}

#[test]
fn partial_snapshot_on_disk_merges_over_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.db");
    let store = SqliteStore::new(path.clone());
    store.set(TUTORIAL_STATE_KEY, r#"{"current_step":3}"#).unwrap();

    let tutorial = Tutorial::load(TutorialStore::new(SqliteStore::new(path)));
    let state = tutorial.state();
    assert_eq!(state.current_step, 3);
    assert!(!state.is_open);
    assert!(!state.is_completed);
    assert_eq!(state.user_progress, Default::default());
}
