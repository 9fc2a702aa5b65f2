//! The participant node.

use lockstep_protocol::{
    poll, retrieve, submit, Computation, ProtocolError, RunIo, StatusReport,
};
use lockstep_store::{RunState, StateStore, StoreError};
use lockstep_types::{ExchangePayload, ParticipantId, Role, RunConfig, Step};
use tracing::{info, warn};

/// One participant process: a state store plus the injected collaborators.
///
/// All methods take `&self`; the store provides the interior mutability.
/// The transport layer must serialize calls per node so that a step with
/// side effects is never run twice for the same phase.
#[derive(Debug)]
pub struct Node<S, C, I> {
    state: RunState<S>,
    computation: C,
    io: I,
}

impl<S, C, I> Node<S, C, I>
where
    S: StateStore,
    C: Computation,
    I: RunIo,
{
    /// Compose a node from a store and collaborators.
    pub fn new(store: S, computation: C, io: I) -> Self {
        Self {
            state: RunState::new(store),
            computation,
            io,
        }
    }

    /// Configure this participant for a run.
    ///
    /// Validates the parameters first; a rejected setup mutates nothing
    /// and the step stays where it was. On success the store is wiped,
    /// the configuration written, and the step moved to `Init`.
    pub fn setup(
        &self,
        id: ParticipantId,
        role: Role,
        participants: Vec<ParticipantId>,
    ) -> Result<(), ProtocolError> {
        let config = match RunConfig::new(id, role, participants) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Setup rejected");
                return Err(e.into());
            }
        };
        self.state.initialize(&config)?;
        info!(
            id = %config.id,
            role = %config.role,
            participants = config.nr_participants(),
            "Run configured"
        );
        Ok(())
    }

    /// Run one status poll.
    pub fn status(&self) -> Result<StatusReport, ProtocolError> {
        poll(&self.state, &self.computation, &self.io)
    }

    /// Accept a payload pushed by another participant.
    pub fn submit(&self, payload: ExchangePayload) -> Result<(), ProtocolError> {
        submit(&self.state, payload)
    }

    /// Hand out the pending payload, if any.
    pub fn retrieve(&self) -> Result<Option<ExchangePayload>, ProtocolError> {
        retrieve(&self.state)
    }

    /// Current step, for observers.
    pub fn step(&self) -> Result<Step, StoreError> {
        self.state.step()
    }

    /// The protocol state, for observers.
    pub fn state(&self) -> &RunState<S> {
        &self.state
    }

    /// The I/O collaborator, for observers.
    pub fn io(&self) -> &I {
        &self.io
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockstep_compute::{MeanComputation, MemoryIo};
    use lockstep_store::MemoryStore;
    use lockstep_types::ConfigError;

    fn node(samples: Vec<f64>) -> Node<MemoryStore, MeanComputation, MemoryIo> {
        Node::new(MemoryStore::new(), MeanComputation, MemoryIo::new(samples))
    }

    #[test]
    fn test_setup_with_empty_roster_is_rejected_without_transition() {
        let node = node(vec![1.0]);
        let err = node
            .setup(ParticipantId::from("c0"), Role::Coordinator, Vec::new())
            .unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::Config(ConfigError::EmptyRoster)
        ));
        assert_eq!(node.step().unwrap(), Step::Start);
    }

    #[test]
    fn test_status_before_setup_reports_nothing() {
        let node = node(vec![1.0]);
        let report = node.status().unwrap();
        assert!(!report.available);
        assert!(!report.finished);
        assert_eq!(node.step().unwrap(), Step::Start);
    }

    #[test]
    fn test_solo_coordinator_runs_to_completion() {
        // A roster of one: both barriers are satisfied by the
        // coordinator's own entries.
        let node = node(vec![2.0, 4.0]);
        node.setup(
            ParticipantId::from("c0"),
            Role::Coordinator,
            vec![ParticipantId::from("c0")],
        )
        .unwrap();

        let mut polls = 0;
        while !node.status().unwrap().finished {
            polls += 1;
            assert!(polls < 20, "run did not converge");
        }

        assert_eq!(node.io().written(), Some(3.0));
        assert_eq!(node.state().global_result().unwrap(), 3.0);
    }

    #[test]
    fn test_setup_resets_a_finished_run() {
        let node = node(vec![2.0, 4.0]);
        let roster = vec![ParticipantId::from("c0")];
        node.setup(ParticipantId::from("c0"), Role::Coordinator, roster.clone())
            .unwrap();
        while !node.status().unwrap().finished {}

        node.setup(ParticipantId::from("c0"), Role::Coordinator, roster)
            .unwrap();
        assert_eq!(node.step().unwrap(), Step::Init);
        assert!(node.state().contributions().unwrap().is_empty());
    }
}
