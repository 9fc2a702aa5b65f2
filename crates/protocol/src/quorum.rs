//! Barrier quorum check.

/// Check whether a collection has reached the expected participant count.
///
/// The barrier requires an exact match, not a majority: a participant that
/// never contributes stalls the run forever rather than being fenced out.
/// Counts above `expected` also fail the check; they cannot occur as long
/// as each participant submits at most once and only the owner appends.
pub fn quorum_reached(len: usize, expected: usize) -> bool {
    len == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_count_only() {
        assert!(!quorum_reached(0, 3));
        assert!(!quorum_reached(2, 3));
        assert!(quorum_reached(3, 3));
        assert!(!quorum_reached(4, 3));
    }

    #[test]
    fn test_empty_run() {
        assert!(quorum_reached(0, 0));
    }
}
