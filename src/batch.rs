use nalgebra::RealField;

use crate::bid::Bid;
use crate::engine::{AuctionEngine, StepOutcome};
use crate::observer::TraceObserver;
use crate::price::{CurrentPrices, PriceStore};
use crate::reward::RewardMatrix;
use crate::solution::Solution;
use crate::state::AssignmentState;

/// Batch-conflict auction.
///
/// Every step recomputes the tentative best measurement of *every* track
/// before serving the head of the queue, then hands that track its pick and
/// evicts whoever held it. Each step costs a full pass over the matrix, which
/// is fine for cross-checking the other engines but not for throughput.
#[derive(Debug, Clone)]
pub struct BatchConflictEngine<'a, T> {
    rewards: &'a RewardMatrix<T>,
    prices: CurrentPrices<T>,
    state: AssignmentState,
    tentative: Vec<Option<usize>>,
    epsilon: T,
    iterations: usize,
}

impl<'a, T> BatchConflictEngine<'a, T>
where
    T: RealField + Copy,
{
    pub fn new(rewards: &'a RewardMatrix<T>, epsilon: T) -> Self {
        Self {
            rewards,
            prices: CurrentPrices::new(rewards.num_measurements()),
            state: AssignmentState::new(rewards.num_tracks(), rewards.num_measurements()),
            tentative: vec![None; rewards.num_tracks()],
            epsilon,
            iterations: 0,
        }
    }

    /// Tentative picks computed by the last step.
    pub fn tentative(&self) -> &[Option<usize>] {
        &self.tentative
    }

    pub fn prices(&self) -> &CurrentPrices<T> {
        &self.prices
    }

    pub fn state(&self) -> &AssignmentState {
        &self.state
    }

    fn recompute_tentative(&mut self) {
        let prices = &self.prices;
        for (track, pick) in self.tentative.iter_mut().enumerate() {
            *pick = Bid::search(self.rewards, track, |meas| prices.visible(meas))
                .map(|bid| bid.measurement);
        }
    }
}

impl<'a, T> AuctionEngine<T> for BatchConflictEngine<'a, T>
where
    T: RealField + Copy,
{
    fn step(&mut self, observer: &mut dyn TraceObserver<T>) -> StepOutcome {
        let Some(track) = self.state.pop_unassigned() else {
            return StepOutcome::Idle;
        };
        self.iterations += 1;
        observer.on_track_picked(self.iterations, track);

        self.recompute_tentative();
        let prices = &self.prices;
        let bid = match self.tentative[track] {
            Some(_) => Bid::search(self.rewards, track, |meas| prices.visible(meas)),
            None => None,
        };
        let Some(bid) = bid else {
            observer.on_dropped(track);
            return StepOutcome::Dropped { track };
        };
        debug_assert_eq!(Some(bid.measurement), self.tentative[track]);
        observer.on_measurement_chosen(track, &bid);

        let preferred = bid.measurement;
        let evicted = self.state.assign(track, preferred);
        if let Some(evicted) = evicted {
            observer.on_evicted(evicted, preferred);
        }

        let delta = bid.increment(self.epsilon);
        let previous = self.prices.raise(preferred, delta);
        observer.on_price_updated(preferred, previous, previous + delta);

        StepOutcome::Assigned {
            track,
            measurement: preferred,
            evicted,
        }
    }

    fn is_converged(&self) -> bool {
        !self.state.has_unassigned()
    }

    fn iterations(&self) -> usize {
        self.iterations
    }

    fn solution(&self) -> Solution<T> {
        let assignment = self.state.assignment().to_vec();
        Solution {
            gain: self.rewards.gain(&assignment),
            assignment,
            iterations: self.iterations,
            prices: self.prices.committed_prices(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::engine::run;
    use crate::observer::NoopObserver;

    #[test]
    fn two_by_two() {
        #[rustfmt::skip]
        let rewards = RewardMatrix::<f64>::from_rows(&[
            vec![3., 4.],
            vec![5., 1.],
        ]).unwrap();
        let mut engine = BatchConflictEngine::new(&rewards, 0.01);

        engine.step(&mut NoopObserver);
        assert_eq!(engine.tentative(), [Some(1), Some(0)]);
        assert!((engine.prices().committed(1) - 2.01).abs() < 1e-12);

        let solution = run(&mut engine, 100, &mut NoopObserver).unwrap();
        assert_eq!(solution.assignment, [Some(1), Some(0)]);
        assert_eq!(solution.gain, 9.);
        assert_eq!(solution.iterations, 2);
    }

    #[test]
    fn tentative_covers_every_track() {
        let inf = f64::INFINITY;
        #[rustfmt::skip]
        let rewards = RewardMatrix::from_rows(&[
            vec![-inf, 2., 7.],
            vec![-inf, 3., 1.],
        ]).unwrap();
        let mut engine = BatchConflictEngine::new(&rewards, 0.01);

        assert_eq!(
            engine.step(&mut NoopObserver),
            StepOutcome::Dropped { track: 0 }
        );
        assert_eq!(engine.tentative(), [None, Some(1), Some(0)]);
    }

    #[test]
    fn eviction_requeues_previous_holder() {
        #[rustfmt::skip]
        let rewards = RewardMatrix::from_rows(&[
            vec![10., 20.],
            vec![ 9.,  1.],
        ]).unwrap();
        let mut engine = BatchConflictEngine::new(&rewards, 0.01);

        engine.step(&mut NoopObserver);
        assert_eq!(
            engine.step(&mut NoopObserver),
            StepOutcome::Assigned {
                track: 1,
                measurement: 0,
                evicted: Some(0)
            }
        );
        assert_eq!(engine.state().queued().collect::<Vec<_>>(), [0]);

        let solution = run(&mut engine, 100, &mut NoopObserver).unwrap();
        assert_eq!(solution.assignment, [Some(1), Some(0)]);
        assert_eq!(solution.gain, 29.);
    }
}
