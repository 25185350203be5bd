//! Guided onboarding: a fixed five-step sequence with durable progress.
//!
//! [`reduce`] is the whole state machine. [`Tutorial`] pairs the current
//! state with its store and persists a snapshot after every action.

pub mod state;
pub mod steps;
pub mod store;

use chrono::{DateTime, Utc};
use tracing::debug;

pub use state::{reduce, StateSnapshot, TutorialAction, TutorialState, UserProgress};
pub use steps::{LinkTarget, StepId, StepLink, TutorialStep, LAST_STEP, STEP_COUNT, TUTORIAL_STEPS};
pub use store::{TutorialStore, TUTORIAL_PROGRESS_KEY, TUTORIAL_STATE_KEY};

/// How the guide is brought up when the dashboard starts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Launch {
    /// Open only while the guide is neither completed nor skipped.
    #[default]
    Auto,
    /// Open at the saved position.
    Resume,
    /// Open at the step named by a route slug; unknown slugs land on `welcome`.
    At(String),
}

/// Tutorial state container, owned by the dashboard model.
pub struct Tutorial {
    state: TutorialState,
    store: TutorialStore,
}

impl Tutorial {
    /// Restore the persisted state from `store`.
    pub fn load(store: TutorialStore) -> Self {
        let state = store.load();
        Self { state, store }
    }

    pub fn state(&self) -> &TutorialState {
        &self.state
    }

    /// Apply the start-up options: an optional reset, then the launch mode.
    pub fn start(&mut self, launch: &Launch, reset: bool) {
        if reset {
            self.dispatch(TutorialAction::Reset);
        }
        match launch {
            Launch::Auto if self.state.is_done() => {}
            Launch::Auto | Launch::Resume => self.dispatch(TutorialAction::Open),
            Launch::At(slug) => {
                self.dispatch(TutorialAction::Open);
                let step = StepId::route_index(slug);
                self.dispatch(TutorialAction::GoToStep(step as i64));
            }
        }
    }

    pub fn dispatch(&mut self, action: TutorialAction) {
        self.dispatch_at(action, Utc::now());
    }

    pub fn dispatch_at(&mut self, action: TutorialAction, now: DateTime<Utc>) {
        debug!(?action, step = self.state.current_step, "tutorial action");
        let current = std::mem::take(&mut self.state);
        self.state = reduce(current, action, now);
        self.store.save(&self.state);
    }
}
