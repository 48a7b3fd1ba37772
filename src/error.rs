use thiserror::Error;

use crate::solution::Solution;

/// The reward matrix could not be built from the given rows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DimensionError {
    #[error("reward matrix is empty ({measurements} measurements x {tracks} tracks)")]
    Empty { measurements: usize, tracks: usize },

    #[error("row {row} has {found} entries, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Error)]
pub enum SolveError<T> {
    #[error(transparent)]
    Dimension(#[from] DimensionError),

    /// The iteration cap was hit while tracks were still queued.
    /// `partial` holds the assignment reached so far, which is still injective
    /// and feasible.
    #[error("auction did not converge within {iterations} iterations")]
    NotConverged {
        iterations: usize,
        partial: Solution<T>,
    },
}

impl<T> SolveError<T> {
    pub fn partial(&self) -> Option<&Solution<T>> {
        match self {
            SolveError::Dimension(_) => None,
            SolveError::NotConverged { partial, .. } => Some(partial),
        }
    }
}
