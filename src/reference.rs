//! Exact reference solver.
//!
//! A dense Hungarian (Munkres) implementation used to check the auction
//! engines. It works on square cost matrices; [`optimal_assignment`] pads a
//! reward matrix to square and turns it into a maximum-weight matching.

use nalgebra::{DMatrix, RealField};
use num_traits::Zero;

use crate::reward::RewardMatrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Star,
    Prime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    row: usize,
    col: usize,
    mark: Mark,
}

impl Allocation {
    pub fn assignment(&self) -> (usize, usize) {
        (self.row, self.col)
    }
}

/// Minimum-cost perfect assignment of a square matrix. `costs` is reduced in
/// place; `allocations` receives one `(row, col)` pair per row.
///
/// # Panics
/// Panics if `costs` is not square.
pub fn hungarian<T>(costs: &mut DMatrix<T>, allocations: &mut Vec<Allocation>)
where
    T: RealField + Copy,
{
    let (h, w) = costs.shape();
    assert_eq!(h, w, "hungarian needs a square cost matrix");
    allocations.clear();
    let mut covered_rows = vec![false; h];
    let mut covered_cols = vec![false; w];

    for row in 0..h {
        let min = smallest(costs.row(row).iter().copied());
        costs.row_mut(row).add_scalar_mut(-min);
    }
    for col in 0..w {
        let min = smallest(costs.column(col).iter().copied());
        costs.column_mut(col).add_scalar_mut(-min);
    }

    // star one zero per column where the row is still free
    for col in 0..w {
        if let Some(row) = (0..h).find(|&row| {
            Zero::is_zero(&costs[(row, col)]) && !allocations.iter().any(|a| a.row == row)
        }) {
            covered_cols[col] = true;
            allocations.push(Allocation {
                row,
                col,
                mark: Mark::Star,
            });
        }
    }

    loop {
        let uncovered_zero = (0..w)
            .filter(|&col| !covered_cols[col])
            .find_map(|col| {
                (0..h)
                    .find(|&row| !covered_rows[row] && Zero::is_zero(&costs[(row, col)]))
                    .map(|row| (row, col))
            });

        if let Some((row, col)) = uncovered_zero {
            let star_in_row = allocations
                .iter()
                .find(|a| a.mark == Mark::Star && a.row == row)
                .copied();
            match star_in_row {
                Some(star) => {
                    covered_cols[star.col] = false;
                    covered_rows[star.row] = true;
                    allocations.push(Allocation {
                        row,
                        col,
                        mark: Mark::Prime,
                    });
                }
                None => {
                    augment(allocations, (row, col));
                    covered_rows.fill(false);
                    covered_cols.fill(false);
                    for a in allocations.iter() {
                        covered_cols[a.col] = true;
                    }
                }
            }
            continue;
        }

        if allocations.iter().filter(|a| a.mark == Mark::Star).count() == h {
            break;
        }

        let min = smallest(
            (0..w)
                .filter(|&col| !covered_cols[col])
                .flat_map(|col| (0..h).map(move |row| (row, col)))
                .filter(|&(row, _)| !covered_rows[row])
                .map(|cell| costs[cell]),
        );

        for row in (0..h).filter(|&row| !covered_rows[row]) {
            costs.row_mut(row).add_scalar_mut(-min);
        }
        for col in (0..w).filter(|&col| covered_cols[col]) {
            costs.column_mut(col).add_scalar_mut(min);
        }
    }

    allocations.retain(|a| a.mark == Mark::Star);
}

/// Flips the alternating path starting at the primed zero `start`: its stars
/// become unstarred and its primes become stars. Leaves only stars behind.
fn augment(allocations: &mut Vec<Allocation>, start: (usize, usize)) {
    let mut current = start;
    allocations.push(Allocation {
        row: start.0,
        col: start.1,
        mark: Mark::Star,
    });

    while let Some(index) = allocations
        .iter()
        .position(|a| a.mark == Mark::Star && a.col == current.1 && a.row != current.0)
    {
        let star = allocations.remove(index);
        current.0 = star.row;

        let prime = allocations
            .iter_mut()
            .find(|a| a.mark == Mark::Prime && a.row == current.0)
            .expect("starred zero on the path has a primed zero in its row");
        prime.mark = Mark::Star;
        current.1 = prime.col;
    }

    allocations.retain(|a| a.mark == Mark::Star);
}

fn smallest<T, I>(values: I) -> T
where
    T: RealField + Copy,
    I: Iterator<Item = T>,
{
    values
        .reduce(|a, b| if b < a { b } else { a })
        .unwrap_or_else(T::zero)
}

/// Exact maximum-reward assignment of `rewards`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceAssignment<T> {
    pub gain: T,
    pub assignment: Vec<Option<usize>>,
}

/// Solves `rewards` exactly. Tracks may stay unassigned; only feasible pairs
/// with a positive reward are ever used, which matches what the auction can
/// reach since it never bids at a non-positive net value.
pub fn optimal_assignment<T>(rewards: &RewardMatrix<T>) -> ReferenceAssignment<T>
where
    T: RealField + Copy,
{
    let (measurements, tracks) = (rewards.num_measurements(), rewards.num_tracks());
    let size = measurements.max(tracks);
    let useful = |meas: usize, track: usize| {
        if meas < measurements && track < tracks {
            rewards.reward(meas, track).filter(|r| *r > T::zero())
        } else {
            None
        }
    };

    let mut costs = DMatrix::from_fn(size, size, |meas, track| {
        useful(meas, track).map_or_else(T::zero, |r| -r)
    });
    let mut allocations = Vec::with_capacity(size);
    hungarian(&mut costs, &mut allocations);

    let mut assignment = vec![None; tracks];
    for (meas, track) in allocations.iter().map(Allocation::assignment) {
        if useful(meas, track).is_some() {
            assignment[track] = Some(meas);
        }
    }
    ReferenceAssignment {
        gain: rewards.gain(&assignment),
        assignment,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn assert_costs(costs: &DMatrix<f64>, allocations: &[Allocation], cost_expected: f64) -> bool {
        (allocations
            .iter()
            .map(|a| costs.get(a.assignment()).expect("within cost bounds"))
            .sum::<f64>()
            - cost_expected)
            .abs()
            < f64::EPSILON
    }

    fn solve(costs: DMatrix<f64>, expected: f64) {
        let mut allocations = Vec::new();
        hungarian(&mut costs.clone(), &mut allocations);
        assert_eq!(allocations.len(), costs.nrows());
        assert!(assert_costs(&costs, &allocations, expected));
    }

    #[test]
    fn basic_two() {
        #[rustfmt::skip]
        let costs = DMatrix::from_row_slice(
            2, 2, &[
                1., 2.,
                2., 100.,
            ]
        );
        solve(costs, 4.);
    }

    #[test]
    fn basic_four() {
        #[rustfmt::skip]
        let costs = DMatrix::from_row_slice(
            4, 4, &[
                82., 83., 69., 92.,
                77., 37., 49., 92.,
                11., 69.,  5., 86.,
                 8.,  9., 98., 23.,
            ]
        );
        solve(costs, 140.);
    }

    #[test]
    fn basic_five() {
        #[rustfmt::skip]
        let costs = DMatrix::from_row_slice(
            5, 5, &[
                20., 15., 18., 20., 25.,
                18., 20., 12., 14., 15.,
                21., 23., 25., 27., 25.,
                17., 18., 21., 23., 20.,
                18., 18., 16., 19., 20.,
            ]
        );
        solve(costs, 86.);
    }

    #[test]
    fn optimal_two_by_two() {
        #[rustfmt::skip]
        let rewards = RewardMatrix::from_rows(&[
            vec![3., 4.],
            vec![5., 1.],
        ]).unwrap();
        let reference = optimal_assignment(&rewards);
        assert_eq!(reference.assignment, [Some(1), Some(0)]);
        assert_eq!(reference.gain, 9.);
    }

    #[test]
    fn optimal_rectangular_with_gaps() {
        let inf = f64::INFINITY;
        #[rustfmt::skip]
        let rewards = RewardMatrix::from_rows(&[
            vec![-inf,    2., -inf, -inf,    3.],
            vec![  7., -inf,   23., -inf, -inf],
            vec![ 17.,   24., -inf, -inf, -inf],
            vec![-inf,    6.,   13.,   2., -inf],
        ]).unwrap();
        let reference = optimal_assignment(&rewards);
        // 17 + 24 cannot both be taken from measurement 2
        assert_eq!(reference.gain, 3. + 23. + 24. + 2.);
        assert_eq!(
            reference.assignment,
            [None, Some(2), Some(1), Some(3), Some(0)]
        );
    }

    #[test]
    fn unprofitable_tracks_stay_unassigned() {
        let inf = f64::INFINITY;
        #[rustfmt::skip]
        let rewards = RewardMatrix::from_rows(&[
            vec![-inf, -1., 4.],
        ]).unwrap();
        let reference = optimal_assignment(&rewards);
        assert_eq!(reference.assignment, [None, None, Some(0)]);
        assert_eq!(reference.gain, 4.);
    }
}
