//! Typed facade over the well-known store keys.

use crate::{StateStore, StoreError};
use lockstep_types::{Contribution, ParticipantId, Role, RunConfig, Step};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// Well-known keys in the shared state store.
///
/// All keys live for the duration of one run and are wiped only at setup.
pub mod keys {
    /// Current step of the replicated state machine.
    pub const STEP: &str = "step";
    /// This participant's id.
    pub const ID: &str = "id";
    /// Role flag: `true` for the coordinator.
    pub const IS_COORDINATOR: &str = "is_coordinator";
    /// Full roster of participant ids (coordinator only).
    pub const PARTICIPANTS: &str = "participants";
    /// Roster size (coordinator only).
    pub const NR_PARTICIPANTS: &str = "nr_participants";
    /// Input samples loaded during init.
    pub const INPUT: &str = "input";
    /// This participant's staged contribution (members only).
    pub const LOCAL_DATA: &str = "local_data";
    /// Aggregate collection of contributions (coordinator only).
    pub const GLOBAL_DATA: &str = "global_data";
    /// Finished-flags collection (coordinator only).
    pub const FINISHED: &str = "finished";
    /// The aggregated global result.
    pub const GLOBAL_RESULT: &str = "global_result";
    /// Availability flag read by the status poll.
    pub const AVAILABLE: &str = "available";
}

/// Typed view of one participant's protocol state.
///
/// Wraps a [`StateStore`] and exposes each well-known key as a typed
/// getter/setter, so the state machine and the exchange handler never
/// handle raw JSON. The facade adds no caching: every call goes straight
/// to the store, which is what keeps independently-polling processes
/// coherent.
#[derive(Debug)]
pub struct RunState<S> {
    store: S,
}

impl<S: StateStore> RunState<S> {
    /// Wrap a store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Access the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, StoreError> {
        let value = self
            .store
            .get(key)
            .ok_or_else(|| StoreError::Missing(key.to_owned()))?;
        serde_json::from_value(value).map_err(|e| StoreError::WrongShape {
            key: key.to_owned(),
            detail: e.to_string(),
        })
    }

    fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value).map_err(|e| StoreError::WrongShape {
            key: key.to_owned(),
            detail: e.to_string(),
        })?;
        self.store.set(key, value);
        Ok(())
    }

    /// Wipe the store and write the run configuration.
    ///
    /// Seeds the coordinator's collections empty, clears the availability
    /// flag, and moves the step to [`Step::Init`]. The configuration must
    /// already be validated; nothing here can reject it.
    pub fn initialize(&self, config: &RunConfig) -> Result<(), StoreError> {
        self.store.reset();
        self.set(keys::ID, &config.id)?;
        self.set(keys::IS_COORDINATOR, &config.role.is_coordinator())?;
        if config.role.is_coordinator() {
            self.set(keys::PARTICIPANTS, &config.participants)?;
            self.set(keys::NR_PARTICIPANTS, &config.nr_participants())?;
            self.set(keys::GLOBAL_DATA, &Vec::<Contribution>::new())?;
            self.set(keys::FINISHED, &Vec::<bool>::new())?;
        }
        self.set(keys::AVAILABLE, &false)?;
        self.set_step(Step::Init)
    }

    /// Current step; [`Step::Start`] until setup has run.
    pub fn step(&self) -> Result<Step, StoreError> {
        match self.store.get(keys::STEP) {
            None => Ok(Step::Start),
            Some(value) => serde_json::from_value(value).map_err(|e| StoreError::WrongShape {
                key: keys::STEP.to_owned(),
                detail: e.to_string(),
            }),
        }
    }

    /// Move the step pointer.
    pub fn set_step(&self, step: Step) -> Result<(), StoreError> {
        debug!(step = %step, "Step transition");
        self.set(keys::STEP, &step)
    }

    /// This participant's role.
    pub fn role(&self) -> Result<Role, StoreError> {
        let is_coordinator: bool = self.get(keys::IS_COORDINATOR)?;
        Ok(Role::from_flag(is_coordinator))
    }

    /// This participant's id.
    pub fn id(&self) -> Result<ParticipantId, StoreError> {
        self.get(keys::ID)
    }

    /// Expected participant count (coordinator only).
    pub fn nr_participants(&self) -> Result<usize, StoreError> {
        self.get(keys::NR_PARTICIPANTS)
    }

    /// Input samples loaded during init.
    pub fn input(&self) -> Result<Vec<f64>, StoreError> {
        self.get(keys::INPUT)
    }

    /// Store the input samples.
    pub fn set_input(&self, samples: &[f64]) -> Result<(), StoreError> {
        self.set(keys::INPUT, &samples)
    }

    /// The staged local contribution (members only).
    pub fn local_contribution(&self) -> Result<Contribution, StoreError> {
        self.get(keys::LOCAL_DATA)
    }

    /// Stage the local contribution for pickup (members only).
    pub fn set_local_contribution(&self, contribution: Contribution) -> Result<(), StoreError> {
        self.set(keys::LOCAL_DATA, &contribution)
    }

    /// Append to the aggregate collection, returning the new size.
    ///
    /// Atomic via the store's append primitive; the returned size is safe
    /// to compare against the quorum count.
    pub fn append_contribution(&self, contribution: Contribution) -> Result<usize, StoreError> {
        let value = serde_json::to_value(contribution).map_err(|e| StoreError::WrongShape {
            key: keys::GLOBAL_DATA.to_owned(),
            detail: e.to_string(),
        })?;
        self.store.append(keys::GLOBAL_DATA, value)
    }

    /// The aggregate collection (coordinator only).
    pub fn contributions(&self) -> Result<Vec<Contribution>, StoreError> {
        self.get(keys::GLOBAL_DATA)
    }

    /// Append to the finished-flags collection, returning the new size.
    pub fn append_finished_flag(&self, flag: bool) -> Result<usize, StoreError> {
        self.store
            .append(keys::FINISHED, serde_json::Value::Bool(flag))
    }

    /// The finished-flags collection (coordinator only).
    pub fn finished_flags(&self) -> Result<Vec<bool>, StoreError> {
        self.get(keys::FINISHED)
    }

    /// The global result.
    pub fn global_result(&self) -> Result<f64, StoreError> {
        self.get(keys::GLOBAL_RESULT)
    }

    /// Store the global result.
    pub fn set_global_result(&self, result: f64) -> Result<(), StoreError> {
        self.set(keys::GLOBAL_RESULT, &result)
    }

    /// Availability flag; `false` until first set.
    pub fn available(&self) -> Result<bool, StoreError> {
        match self.store.get(keys::AVAILABLE) {
            None => Ok(false),
            Some(value) => serde_json::from_value(value).map_err(|e| StoreError::WrongShape {
                key: keys::AVAILABLE.to_owned(),
                detail: e.to_string(),
            }),
        }
    }

    /// Toggle the availability flag.
    pub fn set_available(&self, available: bool) -> Result<(), StoreError> {
        self.set(keys::AVAILABLE, &available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn coordinator_config() -> RunConfig {
        RunConfig::new(
            ParticipantId::from("c0"),
            Role::Coordinator,
            vec![
                ParticipantId::from("c0"),
                ParticipantId::from("m1"),
                ParticipantId::from("m2"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_fresh_state_defaults() {
        let state = RunState::new(MemoryStore::new());
        assert_eq!(state.step().unwrap(), Step::Start);
        assert!(!state.available().unwrap());
        assert!(matches!(state.role(), Err(StoreError::Missing(_))));
    }

    #[test]
    fn test_initialize_coordinator() {
        let state = RunState::new(MemoryStore::new());
        state.initialize(&coordinator_config()).unwrap();

        assert_eq!(state.step().unwrap(), Step::Init);
        assert_eq!(state.role().unwrap(), Role::Coordinator);
        assert_eq!(state.nr_participants().unwrap(), 3);
        assert!(state.contributions().unwrap().is_empty());
        assert!(state.finished_flags().unwrap().is_empty());
        assert!(!state.available().unwrap());
    }

    #[test]
    fn test_initialize_member_has_no_collections() {
        let state = RunState::new(MemoryStore::new());
        let config =
            RunConfig::new(ParticipantId::from("m1"), Role::Member, Vec::new()).unwrap();
        state.initialize(&config).unwrap();

        assert_eq!(state.role().unwrap(), Role::Member);
        assert!(matches!(state.contributions(), Err(StoreError::Missing(_))));
        assert!(matches!(
            state.nr_participants(),
            Err(StoreError::Missing(_))
        ));
    }

    #[test]
    fn test_initialize_wipes_previous_run() {
        let state = RunState::new(MemoryStore::new());
        state.initialize(&coordinator_config()).unwrap();
        state.append_contribution(Contribution::new(4.0, 2)).unwrap();
        state.set_step(Step::Waiting).unwrap();

        state.initialize(&coordinator_config()).unwrap();
        assert_eq!(state.step().unwrap(), Step::Init);
        assert!(state.contributions().unwrap().is_empty());
    }

    #[test]
    fn test_append_contribution_reports_size() {
        let state = RunState::new(MemoryStore::new());
        state.initialize(&coordinator_config()).unwrap();

        assert_eq!(
            state.append_contribution(Contribution::new(1.0, 1)).unwrap(),
            1
        );
        assert_eq!(
            state.append_contribution(Contribution::new(2.0, 1)).unwrap(),
            2
        );
        let collected = state.contributions().unwrap();
        assert_eq!(collected[1], Contribution::new(2.0, 1));
    }

    #[test]
    fn test_wrong_shape_is_reported() {
        let store = MemoryStore::new();
        store.set(keys::STEP, serde_json::json!(42));
        let state = RunState::new(store);
        assert!(matches!(state.step(), Err(StoreError::WrongShape { .. })));
    }
}
