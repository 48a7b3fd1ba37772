/// Outcome of one auction run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Solution<T> {
    /// Sum of rewards over the assigned (measurement, track) pairs.
    pub gain: T,
    /// Measurement held by each track, `None` when the track stayed unassigned.
    pub assignment: Vec<Option<usize>>,
    pub iterations: usize,
    /// Final committed price of each measurement.
    pub prices: Vec<T>,
}

impl<T> Solution<T> {
    pub fn num_assigned(&self) -> usize {
        self.assignment.iter().filter(|a| a.is_some()).count()
    }

    /// Assigned pairs as `(measurement, track)`, the same index order the
    /// reward matrix uses.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.assignment
            .iter()
            .enumerate()
            .filter_map(|(track, meas)| meas.map(|m| (m, track)))
    }
}
