use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::steps::{StepId, TutorialStep, LAST_STEP, TUTORIAL_STEPS};

/// Durable record of which stages the user has been through.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProgress {
    pub has_viewed_welcome: bool,
    pub has_clicked_signup: bool,
    pub has_completed_tour: bool,
    pub has_viewed_issue_creation: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_active_step: usize,
}

impl UserProgress {
    /// Steps whose "has seen" flag is set.
    pub fn completed_steps(&self) -> Vec<StepId> {
        [
            (self.has_viewed_welcome, StepId::Welcome),
            (self.has_clicked_signup, StepId::Signup),
            (self.has_completed_tour, StepId::Tour),
            (self.has_viewed_issue_creation, StepId::Creation),
        ]
        .into_iter()
        .filter_map(|(done, id)| done.then_some(id))
        .collect()
    }
}

/// The part of the state stored under the `tutorial-state` key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StateSnapshot {
    pub is_open: bool,
    pub current_step: usize,
    pub is_completed: bool,
    pub is_skipped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TutorialState {
    pub is_open: bool,
    pub current_step: usize,
    pub is_completed: bool,
    pub is_skipped: bool,
    pub user_progress: UserProgress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TutorialAction {
    Open,
    Close,
    Next,
    Previous,
    GoToStep(i64),
    Skip,
    MarkStepCompleted(StepId),
    Reset,
    Load(Box<TutorialState>),
}

impl TutorialState {
    pub fn from_parts(snapshot: StateSnapshot, user_progress: UserProgress) -> Self {
        Self {
            is_open: snapshot.is_open,
            current_step: snapshot.current_step.min(LAST_STEP),
            is_completed: snapshot.is_completed,
            is_skipped: snapshot.is_skipped,
            user_progress,
        }
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            is_open: self.is_open,
            current_step: self.current_step,
            is_completed: self.is_completed,
            is_skipped: self.is_skipped,
        }
    }

    pub fn step(&self) -> &'static TutorialStep {
        &TUTORIAL_STEPS[self.current_step.min(LAST_STEP)]
    }

    pub fn can_skip(&self) -> bool {
        self.step().can_skip
    }

    pub fn is_first_step(&self) -> bool {
        self.current_step == 0
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step == LAST_STEP
    }

    /// Finished either by walking to the end or by skipping.
    pub fn is_done(&self) -> bool {
        self.is_completed || self.is_skipped
    }
}

/// Apply `action` to `state`. `now` stamps completion times.
pub fn reduce(state: TutorialState, action: TutorialAction, now: DateTime<Utc>) -> TutorialState {
    match action {
        TutorialAction::Open => TutorialState {
            is_open: true,
            is_skipped: false,
            ..state
        },
        TutorialAction::Close => TutorialState {
            is_open: false,
            ..state
        },
        TutorialAction::Next => {
            let next = (state.current_step + 1).min(LAST_STEP);
            let reached_end = next == LAST_STEP;
            TutorialState {
                current_step: next,
                is_completed: reached_end,
                user_progress: UserProgress {
                    last_active_step: next,
                    completed_at: if reached_end {
                        Some(now)
                    } else {
                        state.user_progress.completed_at
                    },
                    ..state.user_progress
                },
                ..state
            }
        }
        TutorialAction::Previous => TutorialState {
            current_step: state.current_step.saturating_sub(1),
            ..state
        },
        TutorialAction::GoToStep(target) => {
            let step = target.clamp(0, LAST_STEP as i64) as usize;
            TutorialState {
                current_step: step,
                user_progress: UserProgress {
                    last_active_step: step,
                    ..state.user_progress
                },
                ..state
            }
        }
        TutorialAction::Skip => TutorialState {
            is_open: false,
            is_skipped: true,
            user_progress: UserProgress {
                completed_at: Some(now),
                ..state.user_progress
            },
            ..state
        },
        TutorialAction::MarkStepCompleted(id) => {
            let mut progress = state.user_progress.clone();
            match id {
                StepId::Welcome => progress.has_viewed_welcome = true,
                StepId::Signup => progress.has_clicked_signup = true,
                StepId::Tour => progress.has_completed_tour = true,
                StepId::Creation => progress.has_viewed_issue_creation = true,
                StepId::Completion => {}
            }
            TutorialState {
                user_progress: progress,
                ..state
            }
        }
        TutorialAction::Reset => TutorialState::default(),
        TutorialAction::Load(loaded) => *loaded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    #[test]
    fn initial_state() {
        let state = TutorialState::default();
        assert_eq!(state.current_step, 0);
        assert!(!state.is_open && !state.is_completed && !state.is_skipped);
        assert_eq!(state.user_progress, UserProgress::default());
    }

    #[test]
    fn four_nexts_complete_the_tutorial() {
        let mut state = TutorialState::default();
        for _ in 0..3 {
            state = reduce(state, TutorialAction::Next, at(1));
            assert!(!state.is_completed);
            assert!(state.user_progress.completed_at.is_none());
        }
        state = reduce(state, TutorialAction::Next, at(2));
        assert_eq!(state.current_step, 4);
        assert_eq!(state.step().id, StepId::Completion);
        assert!(state.is_completed);
        assert_eq!(state.user_progress.completed_at, Some(at(2)));
        assert_eq!(state.user_progress.last_active_step, 4);
    }

    #[test]
    fn next_at_the_last_step_restamps() {
        let state = reduce(TutorialState::default(), TutorialAction::GoToStep(4), at(1));
        let state = reduce(state, TutorialAction::Next, at(5));
        let again = reduce(state.clone(), TutorialAction::Next, at(9));
        assert_eq!(again.current_step, 4);
        assert!(again.is_completed);
        assert_eq!(again.user_progress.completed_at, Some(at(9)));
    }

    #[test]
    fn previous_clamps_at_zero() {
        let state = reduce(TutorialState::default(), TutorialAction::Previous, at(0));
        assert_eq!(state.current_step, 0);
        let state = reduce(state, TutorialAction::GoToStep(3), at(0));
        let state = reduce(state, TutorialAction::Previous, at(0));
        assert_eq!(state.current_step, 2);
        // previous does not move the last-active marker
        assert_eq!(state.user_progress.last_active_step, 3);
    }

    #[test]
    fn go_to_step_saturates() {
        let state = reduce(TutorialState::default(), TutorialAction::GoToStep(99), at(0));
        assert_eq!(state.current_step, 4);
        assert_eq!(state.user_progress.last_active_step, 4);
        let state = reduce(state, TutorialAction::GoToStep(-5), at(0));
        assert_eq!(state.current_step, 0);
        assert_eq!(state.user_progress.last_active_step, 0);
    }

    #[test]
    fn open_clears_skip_and_close_keeps_position() {
        let state = reduce(TutorialState::default(), TutorialAction::GoToStep(2), at(0));
        let state = reduce(state, TutorialAction::Skip, at(3));
        assert!(state.is_skipped && !state.is_open);
        assert_eq!(state.user_progress.completed_at, Some(at(3)));

        let state = reduce(state, TutorialAction::Open, at(4));
        assert!(state.is_open && !state.is_skipped);
        let state = reduce(state, TutorialAction::Close, at(5));
        assert!(!state.is_open);
        assert_eq!(state.current_step, 2);
    }

    #[test]
    fn skip_is_unconditional() {
        let state = reduce(TutorialState::default(), TutorialAction::GoToStep(3), at(0));
        assert!(!state.can_skip());
        let state = reduce(state, TutorialAction::Skip, at(1));
        assert!(state.is_skipped);
        assert!(state.is_done());
    }

    #[test]
    fn mark_step_completed_is_idempotent() {
        let once = reduce(
            TutorialState::default(),
            TutorialAction::MarkStepCompleted(StepId::Tour),
            at(0),
        );
        let twice = reduce(
            once.clone(),
            TutorialAction::MarkStepCompleted(StepId::Tour),
            at(0),
        );
        assert!(twice.user_progress.has_completed_tour);
        assert_eq!(once, twice);
        assert_eq!(twice.current_step, 0);
        assert_eq!(twice.user_progress.completed_steps(), vec![StepId::Tour]);
    }

    #[test]
    fn marking_completion_has_no_flag() {
        let state = reduce(
            TutorialState::default(),
            TutorialAction::MarkStepCompleted(StepId::Completion),
            at(0),
        );
        assert_eq!(state, TutorialState::default());
    }

    #[test]
    fn reset_clears_everything_including_completion_time() {
        let mut state = TutorialState::default();
        for action in [
            TutorialAction::Open,
            TutorialAction::MarkStepCompleted(StepId::Welcome),
            TutorialAction::GoToStep(4),
            TutorialAction::Next,
        ] {
            state = reduce(state, action, at(7));
        }
        assert!(state.user_progress.completed_at.is_some());
        let state = reduce(state, TutorialAction::Reset, at(8));
        assert_eq!(state, TutorialState::default());
    }

    #[test]
    fn from_parts_bounds_the_step() {
        let state = TutorialState::from_parts(
            StateSnapshot {
                current_step: 42,
                ..StateSnapshot::default()
            },
            UserProgress::default(),
        );
        assert_eq!(state.current_step, 4);
    }
}
