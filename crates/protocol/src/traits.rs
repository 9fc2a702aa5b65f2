//! Collaborator traits injected into the protocol.

use crate::IoError;
use lockstep_types::Contribution;

/// The domain computation, swappable behind the protocol.
///
/// Both methods must be pure: same input, same output, no side effects.
/// The protocol relies on this to treat the global result as immutable
/// once computed.
pub trait Computation {
    /// Compute this participant's partial result and weight from its local
    /// samples.
    fn compute_local(&self, samples: &[f64]) -> Contribution;

    /// Aggregate the collected contributions into the global result.
    fn aggregate(&self, contributions: &[Contribution]) -> f64;
}

/// Input/output collaborator for one run.
pub trait RunIo {
    /// Load the local input samples.
    fn read_input(&self) -> Result<Vec<f64>, IoError>;

    /// Persist the global result.
    fn write_results(&self, result: f64) -> Result<(), IoError>;
}
