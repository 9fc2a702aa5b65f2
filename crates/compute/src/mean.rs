//! Weighted mean computation.

use lockstep_protocol::Computation;
use lockstep_types::Contribution;

/// The placeholder domain computation: an arithmetic mean locally, a
/// sample-count-weighted mean globally.
///
/// Aggregating the per-participant means weighted by their sample counts
/// yields exactly the mean over all samples, so the federated result
/// matches what a single process would compute on the union of the
/// inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanComputation;

impl Computation for MeanComputation {
    fn compute_local(&self, samples: &[f64]) -> Contribution {
        if samples.is_empty() {
            return Contribution::new(0.0, 0);
        }
        let sum: f64 = samples.iter().sum();
        Contribution::new(sum / samples.len() as f64, samples.len() as u64)
    }

    fn aggregate(&self, contributions: &[Contribution]) -> f64 {
        let total_weight: u64 = contributions.iter().map(|c| c.weight).sum();
        if total_weight == 0 {
            return 0.0;
        }
        let weighted_sum: f64 = contributions
            .iter()
            .map(|c| c.value * c.weight as f64)
            .sum();
        weighted_sum / total_weight as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_mean() {
        let contribution = MeanComputation.compute_local(&[2.0, 4.0, 6.0]);
        assert_eq!(contribution, Contribution::new(4.0, 3));
    }

    #[test]
    fn test_weighted_aggregate() {
        // Means of [1, 2, 3] and [10]: the weights recover the pooled mean.
        let result = MeanComputation.aggregate(&[
            Contribution::new(2.0, 3),
            Contribution::new(10.0, 1),
        ]);
        assert_eq!(result, 4.0);
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let contributions = vec![
            Contribution::new(3.5, 2),
            Contribution::new(1.5, 6),
        ];
        let first = MeanComputation.aggregate(&contributions);
        assert_eq!(MeanComputation.aggregate(&contributions), first);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(MeanComputation.compute_local(&[]), Contribution::new(0.0, 0));
        assert_eq!(MeanComputation.aggregate(&[]), 0.0);
    }
}
