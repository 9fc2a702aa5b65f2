//! Protocol steps.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A phase of the lockstep protocol.
///
/// Every participant replicates the same step sequence and only ever moves
/// forward through it. `Waiting` and `Finalize` are the two barrier steps:
/// they are re-entered on every poll until their exit condition holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Initial state before setup has been received.
    Start,
    /// Setup received; input data is read on the next poll.
    Init,
    /// Run the local computation and stage the contribution.
    LocalCalculation,
    /// Barrier: coordinator waits for all contributions, members wait for
    /// the global result.
    Waiting,
    /// Coordinator aggregates the collected contributions.
    GlobalCalculation,
    /// Coordinator arms the broadcast of the global result.
    BroadcastResults,
    /// Persist the global result to the output collaborator.
    WriteOutput,
    /// Barrier: coordinator waits for all finished flags, members signal
    /// theirs.
    Finalize,
    /// Terminal state.
    Finished,
}

impl Step {
    /// All steps in protocol order.
    pub const ALL: [Step; 9] = [
        Step::Start,
        Step::Init,
        Step::LocalCalculation,
        Step::Waiting,
        Step::GlobalCalculation,
        Step::BroadcastResults,
        Step::WriteOutput,
        Step::Finalize,
        Step::Finished,
    ];

    /// Position of this step in the protocol order.
    ///
    /// A participant's rank is monotonically non-decreasing across polls;
    /// the only steps observed more than once are the barriers.
    pub fn rank(self) -> u8 {
        match self {
            Step::Start => 0,
            Step::Init => 1,
            Step::LocalCalculation => 2,
            Step::Waiting => 3,
            Step::GlobalCalculation => 4,
            Step::BroadcastResults => 5,
            Step::WriteOutput => 6,
            Step::Finalize => 7,
            Step::Finished => 8,
        }
    }

    /// Check whether this is the terminal step.
    pub fn is_terminal(self) -> bool {
        matches!(self, Step::Finished)
    }

    /// Check whether polling may observe this step more than once.
    pub fn is_barrier(self) -> bool {
        matches!(self, Step::Waiting | Step::Finalize)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Start => "start",
            Step::Init => "init",
            Step::LocalCalculation => "local_calculation",
            Step::Waiting => "waiting",
            Step::GlobalCalculation => "global_calculation",
            Step::BroadcastResults => "broadcast_results",
            Step::WriteOutput => "write_output",
            Step::Finalize => "finalize",
            Step::Finished => "finished",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_is_strictly_increasing_over_all() {
        for pair in Step::ALL.windows(2) {
            assert!(pair[0].rank() < pair[1].rank());
        }
    }

    #[test]
    fn test_serde_round_trip_uses_snake_case() {
        let json = serde_json::to_string(&Step::LocalCalculation).unwrap();
        assert_eq!(json, "\"local_calculation\"");
        let step: Step = serde_json::from_str("\"broadcast_results\"").unwrap();
        assert_eq!(step, Step::BroadcastResults);
    }

    #[test]
    fn test_display_matches_serde_encoding() {
        for step in Step::ALL {
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(json, format!("\"{}\"", step));
        }
    }

    #[test]
    fn test_only_barriers_repeat() {
        assert!(Step::Waiting.is_barrier());
        assert!(Step::Finalize.is_barrier());
        assert!(!Step::GlobalCalculation.is_barrier());
        assert!(Step::Finished.is_terminal());
    }
}
