//! Auction iteration engines.
//!
//! An engine owns the prices and the assignment state of one run. Each call
//! to [`AuctionEngine::step`] serves the track at the head of the unassigned
//! queue, and the run is over once that queue is empty.

use std::num::NonZeroUsize;

use nalgebra::RealField;

use crate::bid::Bid;
use crate::error::SolveError;
use crate::observer::TraceObserver;
use crate::price::{Commit, CurrentPrices, PriceStore, StagedPrices};
use crate::reward::RewardMatrix;
use crate::solution::Solution;
use crate::state::AssignmentState;

/// What a single step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Assigned {
        track: usize,
        measurement: usize,
        evicted: Option<usize>,
    },
    /// The bid lost against the committed price; the track went back in the
    /// queue.
    Rejected { track: usize, measurement: usize },
    /// The track left the auction for good.
    Dropped { track: usize },
    /// Nothing left to do.
    Idle,
}

pub trait AuctionEngine<T> {
    fn step(&mut self, observer: &mut dyn TraceObserver<T>) -> StepOutcome;

    fn is_converged(&self) -> bool;

    fn iterations(&self) -> usize;

    /// Snapshot of the current assignment, its gain and the committed prices.
    fn solution(&self) -> Solution<T>;
}

/// Drives `engine` until it converges or `max_iterations` steps were taken.
pub fn run<T, E>(
    engine: &mut E,
    max_iterations: usize,
    observer: &mut dyn TraceObserver<T>,
) -> Result<Solution<T>, SolveError<T>>
where
    E: AuctionEngine<T> + ?Sized,
{
    while !engine.is_converged() {
        if engine.iterations() >= max_iterations {
            return Err(SolveError::NotConverged {
                iterations: engine.iterations(),
                partial: engine.solution(),
            });
        }
        engine.step(observer);
    }
    Ok(engine.solution())
}

/// Bidding engine shared by the sequential and pipelined variants; they only
/// differ in the [`PriceStore`] they read and write.
#[derive(Debug, Clone)]
pub struct BiddingEngine<'a, T, P> {
    rewards: &'a RewardMatrix<T>,
    prices: P,
    state: AssignmentState,
    epsilon: T,
    iterations: usize,
}

pub type SequentialEngine<'a, T> = BiddingEngine<'a, T, CurrentPrices<T>>;

pub type PipelinedEngine<'a, T> = BiddingEngine<'a, T, StagedPrices<T>>;

impl<'a, T> SequentialEngine<'a, T>
where
    T: RealField + Copy,
{
    pub fn sequential(rewards: &'a RewardMatrix<T>, epsilon: T) -> Self {
        Self::with_prices(rewards, CurrentPrices::new(rewards.num_measurements()), epsilon)
    }
}

impl<'a, T> PipelinedEngine<'a, T>
where
    T: RealField + Copy,
{
    pub fn pipelined(rewards: &'a RewardMatrix<T>, epsilon: T, depth: NonZeroUsize) -> Self {
        Self::with_prices(
            rewards,
            StagedPrices::new(rewards.num_measurements(), depth),
            epsilon,
        )
    }
}

impl<'a, T, P> BiddingEngine<'a, T, P>
where
    T: RealField + Copy,
    P: PriceStore<T>,
{
    pub fn with_prices(rewards: &'a RewardMatrix<T>, prices: P, epsilon: T) -> Self {
        debug_assert_eq!(prices.num_measurements(), rewards.num_measurements());
        Self {
            rewards,
            prices,
            state: AssignmentState::new(rewards.num_tracks(), rewards.num_measurements()),
            epsilon,
            iterations: 0,
        }
    }

    pub fn prices(&self) -> &P {
        &self.prices
    }

    pub fn state(&self) -> &AssignmentState {
        &self.state
    }
}

impl<'a, T, P> AuctionEngine<T> for BiddingEngine<'a, T, P>
where
    T: RealField + Copy,
    P: PriceStore<T>,
{
    fn step(&mut self, observer: &mut dyn TraceObserver<T>) -> StepOutcome {
        let Some(track) = self.state.pop_unassigned() else {
            return StepOutcome::Idle;
        };
        self.iterations += 1;
        observer.on_track_picked(self.iterations, track);

        let prices = &self.prices;
        let Some(bid) = Bid::search(self.rewards, track, |meas| prices.visible(meas)) else {
            // prices only rise, so this track can never afford anything later
            observer.on_dropped(track);
            return StepOutcome::Dropped { track };
        };
        observer.on_measurement_chosen(track, &bid);

        let meas = bid.measurement;
        let proposed = self.prices.visible(meas) + bid.increment(self.epsilon);
        match self.prices.commit(meas, proposed) {
            Commit::Accepted { previous } => {
                observer.on_price_updated(meas, previous, proposed);
                let evicted = self.state.assign(track, meas);
                if let Some(evicted) = evicted {
                    observer.on_evicted(evicted, meas);
                }
                StepOutcome::Assigned {
                    track,
                    measurement: meas,
                    evicted,
                }
            }
            Commit::Rejected { committed } => {
                observer.on_rejected(track, meas, proposed, committed);
                self.state.enqueue(track);
                StepOutcome::Rejected {
                    track,
                    measurement: meas,
                }
            }
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
    use crate::observer::{EventLog, NoopObserver, TraceEvent};

    fn depth(d: usize) -> NonZeroUsize {
        NonZeroUsize::new(d).unwrap()
    }

    #[test]
    fn sequential_two_by_two() {
        #[rustfmt::skip]
        let rewards = RewardMatrix::<f64>::from_rows(&[
            vec![3., 4.],
            vec![5., 1.],
        ]).unwrap();
        let mut engine = SequentialEngine::sequential(&rewards, 0.01);

        assert_eq!(
            engine.step(&mut NoopObserver),
            StepOutcome::Assigned {
                track: 0,
                measurement: 1,
                evicted: None
            }
        );
        assert!((engine.prices().committed(1) - 2.01).abs() < 1e-12);
        assert_eq!(
            engine.step(&mut NoopObserver),
            StepOutcome::Assigned {
                track: 1,
                measurement: 0,
                evicted: None
            }
        );
        assert!((engine.prices().committed(0) - 5.02).abs() < 1e-12);
        assert!(engine.is_converged());
        assert_eq!(engine.step(&mut NoopObserver), StepOutcome::Idle);

        let solution = engine.solution();
        assert_eq!(solution.assignment, [Some(1), Some(0)]);
        assert_eq!(solution.gain, 9.);
        assert_eq!(solution.iterations, 2);
    }

    #[test]
    fn contested_measurement_evicts() {
        // track 1 values measurement 0 far more than track 0 does
        #[rustfmt::skip]
        let rewards = RewardMatrix::from_rows(&[
            vec![10., 20.],
            vec![ 9.,  1.],
        ]).unwrap();
        let mut engine = SequentialEngine::sequential(&rewards, 0.01);
        let mut log = EventLog::new();

        engine.step(&mut log);
        assert_eq!(
            engine.step(&mut log),
            StepOutcome::Assigned {
                track: 1,
                measurement: 0,
                evicted: Some(0)
            }
        );
        assert!(log.events.contains(&TraceEvent::Evicted { track: 0, meas: 0 }));

        let solution = run(&mut engine, 100, &mut log).unwrap();
        assert_eq!(solution.assignment, [Some(1), Some(0)]);
        assert_eq!(solution.gain, 29.);
        assert_eq!(solution.iterations, 3);
    }

    #[test]
    fn track_without_feasible_measurement_is_dropped() {
        let inf = f64::INFINITY;
        #[rustfmt::skip]
        let rewards = RewardMatrix::from_rows(&[
            vec![-inf, 2.],
            vec![-inf, 3.],
        ]).unwrap();
        let mut engine = SequentialEngine::sequential(&rewards, 0.01);
        assert_eq!(
            engine.step(&mut NoopObserver),
            StepOutcome::Dropped { track: 0 }
        );
        let solution = run(&mut engine, 100, &mut NoopObserver).unwrap();
        assert_eq!(solution.assignment, [None, Some(1)]);
        assert_eq!(solution.gain, 3.);
    }

    #[test]
    fn pipelined_rejects_stale_bid_and_retries() {
        // track 1 bids on measurement 0 against a stale zero price while the
        // committed price is already far above its proposal
        #[rustfmt::skip]
        let rewards = RewardMatrix::from_rows(&[
            vec![10.,  2.],
            vec![ 0.5, 1.],
        ]).unwrap();
        let mut engine = PipelinedEngine::pipelined(&rewards, 0.01, depth(3));
        let mut log = EventLog::new();

        assert!(matches!(
            engine.step(&mut log),
            StepOutcome::Assigned { track: 0, measurement: 0, .. }
        ));
        // stale view: nets 2 and 1, proposal 0 + 1.01 < committed 9.51
        assert_eq!(
            engine.step(&mut log),
            StepOutcome::Rejected {
                track: 1,
                measurement: 0
            }
        );
        assert_eq!(log.rejections(), 1);

        let solution = run(&mut engine, 100, &mut log).unwrap();
        assert_eq!(solution.assignment, [Some(0), Some(1)]);
        assert_eq!(solution.gain, 11.);
    }

    #[test]
    fn iteration_cap_reports_partial_solution() {
        #[rustfmt::skip]
        let rewards = RewardMatrix::from_rows(&[
            vec![3., 4.],
            vec![5., 1.],
        ]).unwrap();
        let mut engine = SequentialEngine::sequential(&rewards, 0.01);
        match run(&mut engine, 1, &mut NoopObserver) {
            Err(SolveError::NotConverged {
                iterations,
                partial,
            }) => {
                assert_eq!(iterations, 1);
                assert_eq!(partial.assignment, [Some(1), None]);
                assert_eq!(partial.gain, 5.);
            }
            other => panic!("expected NotConverged, got {other:?}"),
        }
    }
}
