use std::fmt;
use std::num::NonZeroUsize;

use nalgebra::RealField;

/// Which iteration engine [`crate::solve`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Variant {
    /// One bidder at a time against the current prices.
    Sequential,
    /// Bidders read prices that lag the committed ones by `pipeline_depth - 1`
    /// commits.
    Pipelined,
    /// Recomputes a tentative pick for every track on each step and evicts on
    /// conflict. Slow, kept for cross-checking.
    BatchConflict,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Sequential, Variant::Pipelined, Variant::BatchConflict];
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Sequential => write!(f, "Sequential"),
            Variant::Pipelined => write!(f, "Pipelined"),
            Variant::BatchConflict => write!(f, "BatchConflict"),
        }
    }
}

pub const DEFAULT_MAX_ITERATIONS: usize = 1_000_000;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AuctionConfig<T> {
    /// Minimum price increment of a successful bid.
    pub epsilon: T,
    /// Number of staged price slots, only read by [`Variant::Pipelined`].
    pub pipeline_depth: NonZeroUsize,
    /// Steps allowed before giving up with
    /// [`crate::SolveError::NotConverged`].
    pub max_iterations: usize,
}

impl<T> Default for AuctionConfig<T>
where
    T: RealField + Copy,
{
    fn default() -> Self {
        Self {
            epsilon: nalgebra::convert(0.01),
            pipeline_depth: NonZeroUsize::MIN,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl<T> AuctionConfig<T>
where
    T: RealField + Copy,
{
    /// # Panics
    /// Panics unless `epsilon` is finite and strictly positive.
    pub fn with_epsilon(mut self, epsilon: T) -> Self {
        assert!(
            epsilon.is_finite() && epsilon > T::zero(),
            "epsilon must be finite and positive"
        );
        self.epsilon = epsilon;
        self
    }

    pub fn with_pipeline_depth(mut self, depth: NonZeroUsize) -> Self {
        self.pipeline_depth = depth;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let config = AuctionConfig::<f64>::default();
        assert_eq!(config.epsilon, 0.01);
        assert_eq!(config.pipeline_depth.get(), 1);
        assert_eq!(config.max_iterations, DEFAULT_MAX_ITERATIONS);
    }

    #[test]
    #[should_panic(expected = "epsilon must be finite and positive")]
    fn zero_epsilon_panics() {
        let _ = AuctionConfig::<f64>::default().with_epsilon(0.);
    }

    #[test]
    fn variant_names() {
        let names: Vec<_> = Variant::ALL.iter().map(|v| v.to_string()).collect();
        assert_eq!(names, ["Sequential", "Pipelined", "BatchConflict"]);
    }
}
