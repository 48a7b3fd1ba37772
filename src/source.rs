use nalgebra::{DMatrix, RealField};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::reward::RewardMatrix;

/// Supplies reward matrices for comparative runs.
///
/// Any iterator of matrices is a source, so a `Vec<RewardMatrix<T>>` works
/// through `into_iter()`.
pub trait MatrixSource<T> {
    fn next_matrix(&mut self) -> Option<RewardMatrix<T>>;
}

impl<T, I> MatrixSource<T> for I
where
    I: Iterator<Item = RewardMatrix<T>>,
{
    fn next_matrix(&mut self) -> Option<RewardMatrix<T>> {
        self.next()
    }
}

/// Endless stream of random reward matrices from a seeded generator.
#[derive(Debug, Clone)]
pub struct RandomMatrices {
    rng: StdRng,
    measurements: usize,
    tracks: usize,
    feasible: f64,
    low: f64,
    high: f64,
}

impl RandomMatrices {
    /// Fully feasible matrices with rewards drawn uniformly from `[1, 10)`.
    ///
    /// # Panics
    /// Panics if either dimension is zero.
    pub fn new(seed: u64, measurements: usize, tracks: usize) -> Self {
        assert!(measurements > 0 && tracks > 0, "dimensions must be non-zero");
        Self {
            rng: StdRng::seed_from_u64(seed),
            measurements,
            tracks,
            feasible: 1.,
            low: 1.,
            high: 10.,
        }
    }

    /// Each cell is feasible with probability `p`.
    ///
    /// # Panics
    /// Panics unless `0 <= p <= 1`.
    pub fn with_feasible_probability(mut self, p: f64) -> Self {
        assert!((0. ..=1.).contains(&p), "probability out of range");
        self.feasible = p;
        self
    }

    /// # Panics
    /// Panics unless `low < high`.
    pub fn with_reward_range(mut self, low: f64, high: f64) -> Self {
        assert!(low < high, "empty reward range");
        self.low = low;
        self.high = high;
        self
    }

    pub fn sample<T>(&mut self) -> RewardMatrix<T>
    where
        T: RealField + Copy,
    {
        let cells = DMatrix::from_fn(self.measurements, self.tracks, |_, _| {
            self.rng
                .gen_bool(self.feasible)
                .then(|| nalgebra::convert(self.rng.gen_range(self.low..self.high)))
        });
        RewardMatrix::from_cells(cells).unwrap_or_else(|_| unreachable!("dimensions are non-zero"))
    }
}

impl Iterator for RandomMatrices {
    type Item = RewardMatrix<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.sample())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn same_seed_same_matrices() {
        let a: Vec<_> = RandomMatrices::new(7, 3, 4).take(3).collect();
        let b: Vec<_> = RandomMatrices::new(7, 3, 4).take(3).collect();
        assert_eq!(a, b);
        assert_ne!(a[0], a[1]);
    }

    #[test]
    fn respects_shape_and_range() {
        let mut source = RandomMatrices::new(1, 5, 2)
            .with_reward_range(2., 3.)
            .with_feasible_probability(0.5);
        let rewards = source.next_matrix().unwrap();
        assert_eq!(rewards.num_measurements(), 5);
        assert_eq!(rewards.num_tracks(), 2);
        for r in rewards.cells().iter().flatten() {
            assert!((2. ..3.).contains(r));
        }
    }

    #[test]
    fn vec_is_a_source() {
        let matrices = vec![RewardMatrix::from_rows(&[vec![1.]]).unwrap()];
        let mut source = matrices.into_iter();
        assert!(source.next_matrix().is_some());
        assert!(source.next_matrix().is_none());
    }
}
