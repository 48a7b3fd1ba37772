//! Auction algorithm for the rectangular assignment problem.
//!
//! Each of `N` tracks is matched to at most one of `M` measurements so that
//! the summed reward is maximal (to within `epsilon * N`). Unassigned tracks
//! bid for the measurement with the best net value (`reward - price`) and
//! raise its price; a track that cannot find a positive net value drops out.
//!
//! Three engines are available through [`Variant`]:
//! - [`Variant::Sequential`] bids against the live prices.
//! - [`Variant::Pipelined`] bids against prices that lag `depth - 1` commits
//!   behind, and rejects bids that lose against the committed price. It is a
//!   deterministic, single-threaded model of a staged hardware pipeline.
//! - [`Variant::BatchConflict`] recomputes every track's pick on each step
//!   and resolves conflicts by eviction. Slow, used for cross-checking.
//!
//! ```
//! use auction::{solve, AuctionConfig, RewardMatrix, Variant};
//!
//! // rows are measurements, columns are tracks
//! let rewards = RewardMatrix::from_rows(&[vec![3., 4.], vec![5., 1.]]).unwrap();
//! let solution = solve(&rewards, Variant::Sequential, &AuctionConfig::default()).unwrap();
//! assert_eq!(solution.assignment, [Some(1), Some(0)]);
//! assert_eq!(solution.gain, 9.);
//! ```

pub mod batch;
pub mod bid;
pub mod config;
pub mod engine;
pub mod error;
pub mod observer;
pub mod price;
pub mod reference;
pub mod reward;
pub mod solution;
pub mod source;
pub mod state;
pub mod validate;

use nalgebra::RealField;
use tracing::{debug, warn};

pub use batch::BatchConflictEngine;
pub use bid::Bid;
pub use config::{AuctionConfig, Variant};
pub use engine::{AuctionEngine, BiddingEngine, PipelinedEngine, SequentialEngine, StepOutcome};
pub use error::{DimensionError, SolveError};
pub use observer::{EventLog, NoopObserver, TraceEvent, TraceObserver, TracingObserver};
pub use price::{Commit, CurrentPrices, PriceStore, StagedPrices};
pub use reward::RewardMatrix;
pub use solution::Solution;
pub use state::AssignmentState;

/// Runs the chosen auction variant on `rewards` to completion.
pub fn solve<T>(
    rewards: &RewardMatrix<T>,
    variant: Variant,
    config: &AuctionConfig<T>,
) -> Result<Solution<T>, SolveError<T>>
where
    T: RealField + Copy,
{
    solve_with_observer(rewards, variant, config, &mut NoopObserver)
}

/// [`solve`] on raw measurement rows, where non-finite entries mark
/// infeasible pairs.
pub fn solve_rows<T>(
    rows: &[Vec<T>],
    variant: Variant,
    config: &AuctionConfig<T>,
) -> Result<Solution<T>, SolveError<T>>
where
    T: RealField + Copy,
{
    let rewards = RewardMatrix::from_rows(rows)?;
    solve(&rewards, variant, config)
}

/// [`solve`] with every step reported to `observer`.
pub fn solve_with_observer<T>(
    rewards: &RewardMatrix<T>,
    variant: Variant,
    config: &AuctionConfig<T>,
    observer: &mut dyn TraceObserver<T>,
) -> Result<Solution<T>, SolveError<T>>
where
    T: RealField + Copy,
{
    debug!(
        %variant,
        measurements = rewards.num_measurements(),
        tracks = rewards.num_tracks(),
        epsilon = ?config.epsilon,
        depth = config.pipeline_depth.get(),
        "starting auction"
    );

    let result = match variant {
        Variant::Sequential => engine::run(
            &mut SequentialEngine::sequential(rewards, config.epsilon),
            config.max_iterations,
            observer,
        ),
        Variant::Pipelined => engine::run(
            &mut PipelinedEngine::pipelined(rewards, config.epsilon, config.pipeline_depth),
            config.max_iterations,
            observer,
        ),
        Variant::BatchConflict => engine::run(
            &mut BatchConflictEngine::new(rewards, config.epsilon),
            config.max_iterations,
            observer,
        ),
    };

    match &result {
        Ok(solution) => debug!(
            %variant,
            gain = ?solution.gain,
            iterations = solution.iterations,
            assigned = solution.num_assigned(),
            "auction converged"
        ),
        Err(SolveError::NotConverged { iterations, partial }) => warn!(
            %variant,
            iterations,
            gain = ?partial.gain,
            "auction hit the iteration cap"
        ),
        Err(SolveError::Dimension(_)) => {}
    }
    result
}
