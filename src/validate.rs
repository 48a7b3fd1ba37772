//! Cross-checks the three engines against each other and against the exact
//! Hungarian solution.

use nalgebra::RealField;
use tracing::{debug, warn};

use crate::config::{AuctionConfig, Variant};
use crate::error::SolveError;
use crate::reference::{optimal_assignment, ReferenceAssignment};
use crate::reward::RewardMatrix;
use crate::solution::Solution;
use crate::source::MatrixSource;

#[derive(Debug, Clone, PartialEq)]
pub struct CrossValidation<T> {
    pub runs: Vec<(Variant, Solution<T>)>,
    pub reference: ReferenceAssignment<T>,
    /// `epsilon * num_tracks`.
    pub tolerance: T,
}

impl<T> CrossValidation<T>
where
    T: RealField + Copy,
{
    /// Largest gap between any two engine gains.
    pub fn spread(&self) -> T {
        let gains = self.runs.iter().map(|(_, s)| s.gain);
        let lo = gains.clone().reduce(|a, b| if b < a { b } else { a });
        let hi = gains.reduce(|a, b| if b > a { b } else { a });
        match (lo, hi) {
            (Some(lo), Some(hi)) => hi - lo,
            _ => T::zero(),
        }
    }

    /// Largest shortfall of an engine gain below the exact optimum.
    pub fn shortfall(&self) -> T {
        self.runs
            .iter()
            .map(|(_, s)| self.reference.gain - s.gain)
            .fold(T::zero(), |acc, d| if d > acc { d } else { acc })
    }

    /// Both [`spread`](Self::spread) and [`shortfall`](Self::shortfall) are
    /// within `tolerance`. Guaranteed for dense square matrices only; with
    /// infeasible cells or a rectangular shape the engines may settle below
    /// the optimum, and pipelined engines may differ from the others.
    pub fn within_tolerance(&self) -> bool {
        self.spread() <= self.tolerance && self.shortfall() <= self.tolerance
    }
}

/// Runs every [`Variant`] on `rewards` plus the exact solver.
pub fn cross_validate<T>(
    rewards: &RewardMatrix<T>,
    config: &AuctionConfig<T>,
) -> Result<CrossValidation<T>, SolveError<T>>
where
    T: RealField + Copy,
{
    let runs = Variant::ALL
        .iter()
        .map(|&variant| crate::solve(rewards, variant, config).map(|s| (variant, s)))
        .collect::<Result<Vec<_>, _>>()?;
    let reference = optimal_assignment(rewards);
    let tolerance = config.epsilon * nalgebra::convert::<f64, T>(rewards.num_tracks() as f64);

    let validation = CrossValidation {
        runs,
        reference,
        tolerance,
    };
    let spread = validation.spread();
    let shortfall = validation.shortfall();
    if spread > validation.tolerance {
        warn!(
            reference = ?validation.reference.gain,
            spread = ?spread,
            tolerance = ?validation.tolerance,
            "engine gains disagree"
        );
    } else {
        debug!(reference = ?validation.reference.gain, spread = ?spread, "engines agree");
    }
    if shortfall > validation.tolerance {
        // Only bounded for dense square inputs; infeasible cells or extra
        // measurements can leave every engine below the optimum.
        warn!(
            reference = ?validation.reference.gain,
            shortfall = ?shortfall,
            tolerance = ?validation.tolerance,
            "engines fall short of the exact optimum"
        );
    }
    Ok(validation)
}

/// [`cross_validate`] over up to `limit` matrices drawn from `source`.
pub fn cross_validate_source<T, S>(
    source: &mut S,
    config: &AuctionConfig<T>,
    limit: usize,
) -> Result<Vec<CrossValidation<T>>, SolveError<T>>
where
    T: RealField + Copy,
    S: MatrixSource<T> + ?Sized,
{
    let mut results = Vec::new();
    while results.len() < limit {
        let Some(rewards) = source.next_matrix() else {
            break;
        };
        results.push(cross_validate(&rewards, config)?);
    }
    Ok(results)
}
