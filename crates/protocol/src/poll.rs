//! The status poll entry point.

use crate::{advance, Computation, ProtocolError, RunIo};
use lockstep_store::{RunState, StateStore};
use serde::{Deserialize, Serialize};

/// What one status poll reports back to the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    /// A data-exchange call should now be made against this participant.
    pub available: bool,
    /// The run is complete on this participant.
    pub finished: bool,
}

/// Run one step of the state machine and report progress.
///
/// This is the only entry point the transport layer calls repeatedly; all
/// protocol progress happens as a side effect of these calls, never from
/// an internal timer.
///
/// The availability flag is snapshotted before the step runs, so an
/// exchange armed by this poll is observed by the next one. Once the step
/// is `Finished` the poll mutates nothing and reports `finished`.
pub fn poll<S, C, I>(
    state: &RunState<S>,
    computation: &C,
    io: &I,
) -> Result<StatusReport, ProtocolError>
where
    S: StateStore,
    C: Computation,
    I: RunIo,
{
    if state.step()?.is_terminal() {
        return Ok(StatusReport {
            available: false,
            finished: true,
        });
    }

    let available = state.available()?;
    advance(state, computation, io)?;

    Ok(StatusReport {
        available,
        finished: false,
    })
}
