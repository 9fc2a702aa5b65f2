//! The step state machine.

use crate::{quorum_reached, Computation, ProtocolError, RunIo};
use lockstep_store::{RunState, StateStore};
use lockstep_types::{Role, Step};
use tracing::{debug, info, warn};

/// Perform one step's work and move the step pointer.
///
/// Dispatches over `(Role, Step)` per the protocol's transition table.
/// Read-only steps (`Start`, a barrier without quorum, `Finished`) are
/// idempotent; steps with side effects run exactly once because this
/// function transitions out of them before returning and is only invoked
/// from the single poll handler.
///
/// A failed step leaves the step pointer where it was; the next poll
/// retries it.
pub fn advance<S, C, I>(
    state: &RunState<S>,
    computation: &C,
    io: &I,
) -> Result<(), ProtocolError>
where
    S: StateStore,
    C: Computation,
    I: RunIo,
{
    let step = state.step()?;
    if step == Step::Start {
        // No run configuration exists yet; the external setup call moves
        // the step to Init.
        debug!("Awaiting setup");
        return Ok(());
    }
    let role = state.role()?;

    match (role, step) {
        // Handled above, before the role is known.
        (_, Step::Start) => {}

        (_, Step::Init) => {
            let samples = io.read_input()?;
            if samples.is_empty() {
                return Err(ProtocolError::NoInput);
            }
            info!(samples = samples.len(), "Input loaded");
            state.set_input(&samples)?;
            state.set_step(Step::LocalCalculation)?;
        }

        (Role::Coordinator, Step::LocalCalculation) => {
            let samples = state.input()?;
            let contribution = computation.compute_local(&samples);
            // The coordinator's own contribution goes straight into the
            // aggregate collection; nothing to transfer.
            let collected = state.append_contribution(contribution)?;
            debug!(
                value = contribution.value,
                weight = contribution.weight,
                collected,
                "Own contribution collected"
            );
            state.set_step(Step::Waiting)?;
        }

        (Role::Member, Step::LocalCalculation) => {
            let samples = state.input()?;
            let contribution = computation.compute_local(&samples);
            state.set_local_contribution(contribution)?;
            state.set_available(true)?;
            debug!(
                value = contribution.value,
                weight = contribution.weight,
                "Contribution staged for the coordinator"
            );
            state.set_step(Step::Waiting)?;
        }

        (Role::Coordinator, Step::Waiting) => {
            let collected = state.contributions()?.len();
            let expected = state.nr_participants()?;
            debug!(collected, expected, "Checking contribution barrier");
            if quorum_reached(collected, expected) {
                state.set_step(Step::GlobalCalculation)?;
            }
        }

        (Role::Member, Step::Waiting) => {
            // Nothing to evaluate locally; receiving the global result
            // moves the step externally.
            debug!("Waiting for the global result");
        }

        (Role::Coordinator, Step::GlobalCalculation) => {
            let contributions = state.contributions()?;
            let result = computation.aggregate(&contributions);
            state.set_global_result(result)?;
            info!(result, contributions = contributions.len(), "Global result computed");
            state.set_step(Step::BroadcastResults)?;
        }

        (Role::Coordinator, Step::BroadcastResults) => {
            state.set_available(true)?;
            debug!("Global result armed for broadcast");
            state.set_step(Step::WriteOutput)?;
        }

        (Role::Member, Step::GlobalCalculation) | (Role::Member, Step::BroadcastResults) => {
            // Coordinator-only steps; a member step pointer can never
            // reach them through this machine.
            warn!(step = %step, "Coordinator-only step on a member; ignoring");
        }

        (role, Step::WriteOutput) => {
            let result = state.global_result()?;
            io.write_results(result)?;
            info!(result, "Results written");
            if role.is_coordinator() {
                // Seed the finished-flags barrier with the coordinator's
                // own flag.
                state.append_finished_flag(true)?;
            }
            state.set_step(Step::Finalize)?;
        }

        (Role::Coordinator, Step::Finalize) => {
            let finished = state.finished_flags()?.len();
            let expected = state.nr_participants()?;
            debug!(finished, expected, "Checking finished barrier");
            if quorum_reached(finished, expected) {
                info!("All participants finished");
                state.set_step(Step::Finished)?;
            }
        }

        (Role::Member, Step::Finalize) => {
            // Arm the finished flag for pickup; retrieving it moves the
            // step to Finished.
            state.set_available(true)?;
        }

        (_, Step::Finished) => {
            debug!("Run complete");
        }
    }

    Ok(())
}
