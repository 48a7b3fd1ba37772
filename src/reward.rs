use nalgebra::{DMatrix, RealField};

use crate::error::DimensionError;

/// Dense `measurements x tracks` reward table.
///
/// Rows are measurements and columns are tracks. An infeasible pairing is
/// stored as `None` rather than as an infinite reward, so feasibility never
/// depends on comparing floats against a sentinel. Non-finite input values
/// (the `-inf` convention of persisted matrices, but also `+inf` and NaN) are
/// folded into `None` on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardMatrix<T> {
    cells: DMatrix<Option<T>>,
}

impl<T> RewardMatrix<T>
where
    T: RealField + Copy,
{
    /// Builds the matrix from measurement rows.
    pub fn from_rows(rows: &[Vec<T>]) -> Result<Self, DimensionError> {
        let measurements = rows.len();
        let tracks = rows.first().map_or(0, Vec::len);
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != tracks) {
            return Err(DimensionError::Ragged {
                row,
                expected: tracks,
                found: r.len(),
            });
        }
        Self::check_nonempty(measurements, tracks)?;

        let cells =
            DMatrix::from_fn(measurements, tracks, |meas, track| finite(rows[meas][track]));
        Ok(Self { cells })
    }

    pub fn from_dmatrix(rewards: &DMatrix<T>) -> Result<Self, DimensionError> {
        let (measurements, tracks) = rewards.shape();
        Self::check_nonempty(measurements, tracks)?;
        Ok(Self {
            cells: rewards.map(finite),
        })
    }

    /// Builds the matrix from an explicit feasibility mask. A `Some` holding a
    /// non-finite value is still treated as infeasible.
    pub fn from_cells(cells: DMatrix<Option<T>>) -> Result<Self, DimensionError> {
        let (measurements, tracks) = cells.shape();
        Self::check_nonempty(measurements, tracks)?;
        Ok(Self {
            cells: cells.map(|c| c.and_then(finite)),
        })
    }

    fn check_nonempty(measurements: usize, tracks: usize) -> Result<(), DimensionError> {
        if measurements == 0 || tracks == 0 {
            return Err(DimensionError::Empty {
                measurements,
                tracks,
            });
        }
        Ok(())
    }

    #[inline]
    pub fn num_measurements(&self) -> usize {
        self.cells.nrows()
    }

    #[inline]
    pub fn num_tracks(&self) -> usize {
        self.cells.ncols()
    }

    /// Reward of pairing `meas` with `track`, `None` if infeasible.
    #[inline]
    pub fn reward(&self, meas: usize, track: usize) -> Option<T> {
        self.cells[(meas, track)]
    }

    #[inline]
    pub fn is_feasible(&self, meas: usize, track: usize) -> bool {
        self.cells[(meas, track)].is_some()
    }

    /// Feasible measurements of `track` with their rewards, in ascending
    /// measurement order.
    pub fn feasible_rewards(&self, track: usize) -> impl Iterator<Item = (usize, T)> + '_ {
        (0..self.num_measurements())
            .filter_map(move |meas| self.cells[(meas, track)].map(|r| (meas, r)))
    }

    pub fn feasible_measurements(&self, track: usize) -> impl Iterator<Item = usize> + '_ {
        self.feasible_rewards(track).map(|(meas, _)| meas)
    }

    /// Total reward of `assignment` (indexed by track). Unassigned tracks and
    /// infeasible pairs contribute nothing.
    pub fn gain(&self, assignment: &[Option<usize>]) -> T {
        assignment
            .iter()
            .enumerate()
            .filter_map(|(track, meas)| meas.and_then(|m| self.reward(m, track)))
            .fold(T::zero(), |acc, r| acc + r)
    }

    pub fn cells(&self) -> &DMatrix<Option<T>> {
        &self.cells
    }
}

#[inline]
fn finite<T: RealField + Copy>(value: T) -> Option<T> {
    value.is_finite().then_some(value)
}
