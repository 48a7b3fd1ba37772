use nalgebra::RealField;

use crate::reward::RewardMatrix;

/// The best measurement a track can bid on at the prices it sees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bid<T> {
    pub measurement: usize,
    /// Highest net value (`reward - price`).
    pub best: T,
    /// Second highest net value over the track's feasible measurements, zero
    /// when it has only one.
    pub second: T,
}

impl<T> Bid<T>
where
    T: RealField + Copy,
{
    /// Scans the feasible measurements of `track` in ascending order. Ties on
    /// the best net value go to the lowest measurement index.
    ///
    /// Returns `None` when nothing is feasible or no net value is positive.
    pub fn search<F>(rewards: &RewardMatrix<T>, track: usize, price: F) -> Option<Self>
    where
        F: Fn(usize) -> T,
    {
        let mut best: Option<(usize, T)> = None;
        let mut second: Option<T> = None;
        for (meas, reward) in rewards.feasible_rewards(track) {
            let net = reward - price(meas);
            match best {
                Some((_, b)) if net <= b => {
                    if second.map_or(true, |s| net > s) {
                        second = Some(net);
                    }
                }
                _ => {
                    second = best.map(|(_, b)| b);
                    best = Some((meas, net));
                }
            }
        }

        let (measurement, best) = best?;
        if best <= T::zero() {
            return None;
        }
        Some(Self {
            measurement,
            best,
            second: second.unwrap_or_else(T::zero),
        })
    }

    /// Price increment that leaves the bidder indifferent between its two best
    /// options, plus `epsilon`.
    #[inline]
    pub fn increment(&self, epsilon: T) -> T {
        self.best - self.second + epsilon
    }
}
