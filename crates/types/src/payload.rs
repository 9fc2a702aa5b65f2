//! Payloads carried by the data-exchange operations.

use serde::{Deserialize, Serialize};

/// A participant's local computation output.
///
/// Produced exactly once per process during the local calculation step and
/// transmitted at most once to the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    /// The partial result of the local computation.
    pub value: f64,
    /// How much this partial result counts during aggregation (for the
    /// placeholder mean computation, the number of local samples).
    pub weight: u64,
}

impl Contribution {
    /// Create a new contribution.
    pub fn new(value: f64, weight: u64) -> Self {
        Self { value, weight }
    }
}

/// Payload carried by a single data-exchange call.
///
/// Which variant a receiver accepts depends on its role and current step:
/// the coordinator accepts contributions (finished flags during finalize),
/// members accept only the global result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum ExchangePayload {
    /// A member's local contribution, bound for the coordinator.
    Contribution(Contribution),
    /// A member's finished flag, bound for the coordinator.
    FinishedFlag(bool),
    /// The coordinator's global result, bound for every member.
    GlobalResult(f64),
}

impl ExchangePayload {
    /// Get a human-readable name for this payload variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            ExchangePayload::Contribution(_) => "Contribution",
            ExchangePayload::FinishedFlag(_) => "FinishedFlag",
            ExchangePayload::GlobalResult(_) => "GlobalResult",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_json_is_tagged() {
        let payload = ExchangePayload::Contribution(Contribution::new(10.0, 3));
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["kind"], "contribution");
        assert_eq!(json["body"]["value"], 10.0);
        assert_eq!(json["body"]["weight"], 3);
    }

    #[test]
    fn test_global_result_round_trip() {
        let payload = ExchangePayload::GlobalResult(2.5);
        let json = serde_json::to_string(&payload).unwrap();
        let back: ExchangePayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, payload);
    }
}
