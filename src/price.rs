//! Per-measurement prices.
//!
//! Prices never decrease during a run. [`CurrentPrices`] is a single vector
//! read and written by the same bidder. [`StagedPrices`] models a pipeline in
//! which a bidder sees prices that are `depth - 1` commits old while the
//! conflict check runs against the committed price.

use std::collections::VecDeque;
use std::num::NonZeroUsize;

use nalgebra::{DVector, RealField};

/// Result of trying to commit a proposed price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Commit<T> {
    Accepted { previous: T },
    /// The committed price already matched or exceeded the proposal.
    Rejected { committed: T },
}

impl<T> Commit<T> {
    #[inline]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Commit::Accepted { .. })
    }
}

pub trait PriceStore<T> {
    fn num_measurements(&self) -> usize;

    /// Price a bidder reads when computing net values.
    fn visible(&self, meas: usize) -> T;

    /// Authoritative price used for conflict resolution.
    fn committed(&self, meas: usize) -> T;

    /// Writes `proposed` as the new price of `meas` if it is strictly greater
    /// than the committed price.
    fn commit(&mut self, meas: usize, proposed: T) -> Commit<T>;

    fn committed_prices(&self) -> Vec<T>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentPrices<T> {
    prices: DVector<T>,
}

impl<T> CurrentPrices<T>
where
    T: RealField + Copy,
{
    pub fn new(num_measurements: usize) -> Self {
        Self {
            prices: DVector::zeros(num_measurements),
        }
    }

    /// Adds `delta` to the price of `meas` and returns the previous price.
    pub fn raise(&mut self, meas: usize, delta: T) -> T {
        let previous = self.prices[meas];
        self.prices[meas] = previous + delta;
        previous
    }
}

impl<T> PriceStore<T> for CurrentPrices<T>
where
    T: RealField + Copy,
{
    fn num_measurements(&self) -> usize {
        self.prices.len()
    }

    #[inline]
    fn visible(&self, meas: usize) -> T {
        self.prices[meas]
    }

    #[inline]
    fn committed(&self, meas: usize) -> T {
        self.prices[meas]
    }

    fn commit(&mut self, meas: usize, proposed: T) -> Commit<T> {
        let previous = self.prices[meas];
        if previous >= proposed {
            return Commit::Rejected {
                committed: previous,
            };
        }
        self.prices[meas] = proposed;
        Commit::Accepted { previous }
    }

    fn committed_prices(&self) -> Vec<T> {
        self.prices.iter().copied().collect()
    }
}

/// Shift register of `depth` price vectors.
///
/// Slot `0` is the stale view handed to bidders and slot `depth - 1` is the
/// committed one. Every call to [`PriceStore::commit`] is one clock tick: the
/// history moves one slot toward the stale end, then the proposal is written
/// into the committed slot if it beats the committed price. A write made on
/// tick `k` therefore reaches slot `0` on tick `k + depth - 1`. Rejected
/// proposals still clock the register.
///
/// Only the two ends are stored densely. The writes still in flight between
/// them sit in a ring of length `depth - 1`, so a tick costs O(1) whatever the
/// depth.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedPrices<T> {
    stale: DVector<T>,
    committed: DVector<T>,
    in_flight: VecDeque<Option<(usize, T)>>,
    depth: NonZeroUsize,
    ticks: usize,
}

impl<T> StagedPrices<T>
where
    T: RealField + Copy,
{
    pub fn new(num_measurements: usize, depth: NonZeroUsize) -> Self {
        Self {
            stale: DVector::zeros(num_measurements),
            committed: DVector::zeros(num_measurements),
            in_flight: VecDeque::with_capacity(depth.get() - 1),
            depth,
            ticks: 0,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    /// Number of commit attempts so far.
    pub fn ticks(&self) -> usize {
        self.ticks
    }

    /// Materialises slot `index` (`0` stale, `depth - 1` committed).
    ///
    /// # Panics
    /// Panics if `index >= depth`.
    pub fn slot(&self, index: usize) -> Vec<T> {
        assert!(index < self.depth(), "slot {index} out of range");
        if index == self.depth() - 1 {
            return self.committed.iter().copied().collect();
        }
        let mut prices: Vec<T> = self.stale.iter().copied().collect();
        // the ring is not full until depth - 1 ticks have happened; missing
        // leading entries behave like ticks without a write
        let pending = self.in_flight.len();
        let skip = self.depth() - 1 - pending;
        for write in self.in_flight.iter().take(index.saturating_sub(skip)).flatten() {
            let (meas, price) = *write;
            prices[meas] = price;
        }
        prices
    }

    fn tick(&mut self, write: Option<(usize, T)>) {
        self.ticks += 1;
        if self.depth.get() == 1 {
            if let Some((meas, price)) = write {
                self.stale[meas] = price;
            }
            return;
        }
        if self.in_flight.len() == self.depth.get() - 1 {
            if let Some(Some((meas, price))) = self.in_flight.pop_front() {
                self.stale[meas] = price;
            }
        }
        self.in_flight.push_back(write);
    }
}

impl<T> PriceStore<T> for StagedPrices<T>
where
    T: RealField + Copy,
{
    fn num_measurements(&self) -> usize {
        self.committed.len()
    }

    #[inline]
    fn visible(&self, meas: usize) -> T {
        self.stale[meas]
    }

    #[inline]
    fn committed(&self, meas: usize) -> T {
        self.committed[meas]
    }

    fn commit(&mut self, meas: usize, proposed: T) -> Commit<T> {
        let previous = self.committed[meas];
        if previous >= proposed {
            self.tick(None);
            return Commit::Rejected {
                committed: previous,
            };
        }
        self.committed[meas] = proposed;
        self.tick(Some((meas, proposed)));
        Commit::Accepted { previous }
    }

    fn committed_prices(&self) -> Vec<T> {
        self.committed.iter().copied().collect()
    }
}
