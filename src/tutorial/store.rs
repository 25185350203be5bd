use serde::de::DeserializeOwned;
use tracing::warn;

use crate::services::KeyValueStore;

use super::state::{StateSnapshot, TutorialState, UserProgress};

pub const TUTORIAL_STATE_KEY: &str = "tutorial-state";
pub const TUTORIAL_PROGRESS_KEY: &str = "tutorial-progress";

/// Best-effort persistence for the tutorial. Failures are logged, never returned.
pub struct TutorialStore {
    store: Box<dyn KeyValueStore>,
}

impl TutorialStore {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    /// Read both snapshots and merge them over the defaults.
    pub fn load(&self) -> TutorialState {
        let snapshot: StateSnapshot = self.read(TUTORIAL_STATE_KEY).unwrap_or_default();
        let progress: UserProgress = self.read(TUTORIAL_PROGRESS_KEY).unwrap_or_default();
        TutorialState::from_parts(snapshot, progress)
    }

    pub fn save(&self, state: &TutorialState) {
        self.write(TUTORIAL_STATE_KEY, &state.snapshot());
        self.write(TUTORIAL_PROGRESS_KEY, &state.user_progress);
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "failed to read tutorial snapshot");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "ignoring unreadable tutorial snapshot");
                None
            }
        }
    }

    fn write<T: serde::Serialize>(&self, key: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                warn!(key, error = %e, "failed to encode tutorial snapshot");
                return;
            }
        };
        if let Err(e) = self.store.set(key, &json) {
            warn!(key, error = %e, "failed to persist tutorial snapshot");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MemoryStore;

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
            anyhow::bail!("storage disabled")
        }

        fn set(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
            anyhow::bail!("quota exceeded")
        }

        fn remove(&self, _key: &str) -> anyhow::Result<()> {
            anyhow::bail!("storage disabled")
        }
    }

    #[test]
    fn absent_keys_mean_defaults() {
        let store = TutorialStore::new(MemoryStore::new());
        assert_eq!(store.load(), TutorialState::default());
    }

    #[test]
    fn partial_snapshots_merge_over_defaults() {
        let memory = MemoryStore::new();
        memory
            .set(TUTORIAL_STATE_KEY, r#"{"current_step": 2}"#)
            .unwrap();
        memory
            .set(TUTORIAL_PROGRESS_KEY, r#"{"has_completed_tour": true}"#)
            .unwrap();

        let state = TutorialStore::new(memory).load();
        assert_eq!(state.current_step, 2);
        assert!(!state.is_open);
        assert!(state.user_progress.has_completed_tour);
        assert!(!state.user_progress.has_viewed_welcome);
        assert_eq!(state.user_progress.last_active_step, 0);
    }

    #[test]
    fn corrupt_snapshot_is_ignored() {
        let memory = MemoryStore::new();
        memory.set(TUTORIAL_STATE_KEY, "{not json").unwrap();
        memory
            .set(TUTORIAL_PROGRESS_KEY, r#"{"has_viewed_welcome": true}"#)
            .unwrap();

        let state = TutorialStore::new(memory).load();
        assert_eq!(state.current_step, 0);
        assert!(state.user_progress.has_viewed_welcome);
    }

    #[test]
    fn failures_are_swallowed() {
        let store = TutorialStore::new(BrokenStore);
        let state = TutorialState {
            current_step: 3,
            ..TutorialState::default()
        };
        store.save(&state);
        assert_eq!(store.load(), TutorialState::default());
    }
}
