//! Deterministic in-process cluster.
//!
//! Runs a coordinator and N members inside one process, each with its own
//! in-memory state store, and plays the external polling driver: every
//! tick polls each participant once and ferries available payloads to
//! their destination. No network, no timers, no threads; given the same
//! seed the run is identical every time, which is what makes the
//! end-to-end protocol scenarios testable.

use indexmap::IndexMap;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::debug;

use lockstep_compute::{MeanComputation, MemoryIo};
use lockstep_node::Node;
use lockstep_protocol::ProtocolError;
use lockstep_store::{MemoryStore, StoreError};
use lockstep_types::{ExchangePayload, ParticipantId, Role, Step};

/// A participant node as composed by the harness.
pub type HarnessNode = Node<MemoryStore, MeanComputation, MemoryIo>;

/// Errors raised while driving a cluster.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A participant returned a protocol error.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A store read failed while observing the cluster.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The run did not converge within the tick bound.
    #[error("Run stalled after {ticks} ticks")]
    Stalled {
        /// How many ticks were driven before giving up.
        ticks: usize,
    },
}

/// Outcome of a converged run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunReport {
    /// How many ticks the run took.
    pub ticks: usize,
    /// The global result, if it passed through the harness relay.
    pub global_result: Option<f64>,
}

/// An in-process cluster of one coordinator and N members.
pub struct Cluster {
    nodes: IndexMap<ParticipantId, HarnessNode>,
    rng: Option<ChaCha8Rng>,
    global_result: Option<f64>,
}

impl Cluster {
    /// Build a cluster with one participant per sample vector.
    ///
    /// Participant `i` is named `node-i`; `node-0` coordinates. Ticks poll
    /// participants in index order.
    pub fn new(samples: Vec<Vec<f64>>) -> Self {
        let nodes = samples
            .into_iter()
            .enumerate()
            .map(|(i, samples)| {
                let id = ParticipantId::new(format!("node-{i}"));
                let node = Node::new(MemoryStore::new(), MeanComputation, MemoryIo::new(samples));
                (id, node)
            })
            .collect();
        Self {
            nodes,
            rng: None,
            global_result: None,
        }
    }

    /// Like [`Cluster::new`], but every tick polls participants in an
    /// order shuffled by a seeded RNG. Same seed, same run.
    pub fn with_seed(samples: Vec<Vec<f64>>, seed: u64) -> Self {
        let mut cluster = Self::new(samples);
        cluster.rng = Some(ChaCha8Rng::seed_from_u64(seed));
        cluster
    }

    /// Number of participants.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the cluster has no participants.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The coordinator node.
    pub fn coordinator(&self) -> &HarnessNode {
        &self.nodes[0]
    }

    /// Participant by index; index 0 is the coordinator.
    pub fn node(&self, index: usize) -> &HarnessNode {
        &self.nodes[index]
    }

    /// Every participant's current step, in index order.
    pub fn steps(&self) -> Result<Vec<Step>, StoreError> {
        self.nodes.values().map(|node| node.step()).collect()
    }

    /// Send the setup call to every participant.
    ///
    /// The coordinator's roster lists every participant, itself included.
    pub fn setup(&self) -> Result<(), ProtocolError> {
        let roster: Vec<ParticipantId> = self.nodes.keys().cloned().collect();
        for (index, (id, node)) in self.nodes.iter().enumerate() {
            if index == 0 {
                node.setup(id.clone(), Role::Coordinator, roster.clone())?;
            } else {
                node.setup(id.clone(), Role::Member, Vec::new())?;
            }
        }
        Ok(())
    }

    /// Poll every participant once and relay available payloads.
    ///
    /// Returns `true` once every participant reports finished.
    pub fn tick(&mut self) -> Result<bool, ProtocolError> {
        let mut order: Vec<usize> = (0..self.nodes.len()).collect();
        if let Some(rng) = &mut self.rng {
            order.shuffle(rng);
        }

        let mut all_finished = true;
        for index in order {
            let Some((id, node)) = self.nodes.get_index(index) else {
                continue;
            };
            let report = node.status()?;
            debug!(
                id = %id,
                available = report.available,
                finished = report.finished,
                "Polled"
            );

            if report.finished {
                continue;
            }
            all_finished = false;
            if !report.available {
                continue;
            }

            let Some(payload) = node.retrieve()? else {
                continue;
            };
            match payload {
                // The coordinator's result goes to every member.
                ExchangePayload::GlobalResult(result) => {
                    for member in self.nodes.values().skip(1) {
                        member.submit(ExchangePayload::GlobalResult(result))?;
                    }
                    self.global_result = Some(result);
                }
                // Member payloads go to the coordinator.
                payload => {
                    self.coordinator().submit(payload)?;
                }
            }
        }
        Ok(all_finished)
    }

    /// Tick until every participant is finished.
    ///
    /// The protocol itself would stall forever on a missing participant;
    /// `max_ticks` bounds the wait so tests fail instead of hanging.
    pub fn run(&mut self, max_ticks: usize) -> Result<RunReport, HarnessError> {
        for ticks in 1..=max_ticks {
            if self.tick()? {
                return Ok(RunReport {
                    ticks,
                    global_result: self.global_result,
                });
            }
        }
        Err(HarnessError::Stalled { ticks: max_ticks })
    }
}
