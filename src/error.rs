//! Error types shared by the solver library and the CLI.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QapError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed or unreadable instance data.
    #[error("Instance Error: {0}")]
    Instance(String),

    /// Permutation and matrices disagree on the problem size.
    #[error("Shape Mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Configuration Error: {0}")]
    Config(String),

    /// An operator produced something that is not a permutation. Fatal for the run.
    #[error("Invariant violated after {stage}: {detail}")]
    InvariantViolation { stage: &'static str, detail: String },
}

pub type QapResult<T> = Result<T, QapError>;

/// Check that `permutation` is a bijection over `0..permutation.len()`.
pub fn ensure_permutation(permutation: &[usize], stage: &'static str) -> QapResult<()> {
    let n = permutation.len();
    let mut seen = vec![false; n];

    for (pos, &value) in permutation.iter().enumerate() {
        if value >= n {
            return Err(QapError::InvariantViolation {
                stage,
                detail: format!("value {} at position {} is out of range 0..{}", value, pos, n),
            });
        }
        if seen[value] {
            return Err(QapError::InvariantViolation {
                stage,
                detail: format!("value {} appears more than once (position {})", value, pos),
            });
        }
        seen[value] = true;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_permutation() {
        assert!(ensure_permutation(&[2, 0, 3, 1], "test").is_ok());
        assert!(ensure_permutation(&[], "test").is_ok());
    }

    #[test]
    fn test_duplicate_is_rejected() {
        let err = ensure_permutation(&[0, 1, 1, 3], "mutation").unwrap_err();
        match err {
            QapError::InvariantViolation { stage, .. } => assert_eq!(stage, "mutation"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        assert!(ensure_permutation(&[0, 4, 1, 2], "crossover").is_err());
    }
}
