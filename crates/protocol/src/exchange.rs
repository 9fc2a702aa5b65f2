//! Role-asymmetric data exchange.
//!
//! The transport layer exposes exactly two operations: `submit` pushes a
//! payload into a participant's store, `retrieve` pulls the pending one
//! out. Which payload variant is legal depends on the receiver's role and
//! current step; everything else is rejected without mutating state.

use crate::ProtocolError;
use lockstep_store::{RunState, StateStore};
use lockstep_types::{ExchangePayload, Role, Step};
use tracing::debug;

/// Accept a payload pushed by another participant.
///
/// - Coordinator outside `Finalize`: a member's contribution, appended to
///   the aggregate collection.
/// - Coordinator in `Finalize`: a member's finished flag, appended to the
///   finished-flags collection.
/// - Member, any step: the coordinator's global result; stores it and
///   forces the step to `WriteOutput`. This is how members leave the
///   `Waiting` barrier.
pub fn submit<S: StateStore>(
    state: &RunState<S>,
    payload: ExchangePayload,
) -> Result<(), ProtocolError> {
    let role = state.role()?;
    let step = state.step()?;

    match (role, &payload) {
        (Role::Coordinator, ExchangePayload::Contribution(contribution))
            if step != Step::Finalize =>
        {
            let collected = state.append_contribution(*contribution)?;
            debug!(
                value = contribution.value,
                weight = contribution.weight,
                collected,
                "Contribution received"
            );
            Ok(())
        }

        (Role::Coordinator, ExchangePayload::FinishedFlag(flag)) if step == Step::Finalize => {
            let finished = state.append_finished_flag(*flag)?;
            debug!(finished, "Finished flag received");
            Ok(())
        }

        (Role::Member, ExchangePayload::GlobalResult(result)) => {
            state.set_global_result(*result)?;
            debug!(result, "Global result received");
            state.set_step(Step::WriteOutput)?;
            Ok(())
        }

        _ => Err(ProtocolError::UnexpectedPayload {
            payload: payload.type_name(),
            role,
            step,
        }),
    }
}

/// Hand out the pending payload, if any.
///
/// Returns `None` without touching state when the availability flag is
/// down; a premature retrieve is not an error. Otherwise the flag is
/// cleared and the payload depends on role and step:
///
/// - Member outside `Finalize`: the staged contribution.
/// - Member in `Finalize`: the finished flag; the step moves to
///   `Finished`.
/// - Coordinator: the global result.
pub fn retrieve<S: StateStore>(
    state: &RunState<S>,
) -> Result<Option<ExchangePayload>, ProtocolError> {
    if !state.available()? {
        return Ok(None);
    }
    let role = state.role()?;
    let step = state.step()?;

    let payload = match (role, step) {
        (Role::Coordinator, _) => {
            let result = state.global_result()?;
            state.set_available(false)?;
            debug!(result, "Broadcasting global result");
            ExchangePayload::GlobalResult(result)
        }

        (Role::Member, Step::Finalize) => {
            state.set_available(false)?;
            state.set_step(Step::Finished)?;
            debug!("Handing out finished flag");
            ExchangePayload::FinishedFlag(true)
        }

        (Role::Member, _) => {
            let contribution = state.local_contribution()?;
            state.set_available(false)?;
            debug!(
                value = contribution.value,
                weight = contribution.weight,
                "Handing out contribution"
            );
            ExchangePayload::Contribution(contribution)
        }
    };

    Ok(Some(payload))
}
