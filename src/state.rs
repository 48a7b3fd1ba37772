use std::collections::VecDeque;

/// Partial injective mapping between tracks and measurements, plus the FIFO
/// of tracks still waiting to bid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentState {
    assignment: Vec<Option<usize>>,
    owner: Vec<Option<usize>>,
    unassigned: VecDeque<usize>,
}

impl AssignmentState {
    /// Every track starts unassigned and queued in index order.
    pub fn new(num_tracks: usize, num_measurements: usize) -> Self {
        Self {
            assignment: vec![None; num_tracks],
            owner: vec![None; num_measurements],
            unassigned: (0..num_tracks).collect(),
        }
    }

    #[inline]
    pub fn pop_unassigned(&mut self) -> Option<usize> {
        self.unassigned.pop_front()
    }

    #[inline]
    pub fn enqueue(&mut self, track: usize) {
        self.unassigned.push_back(track);
    }

    #[inline]
    pub fn has_unassigned(&self) -> bool {
        !self.unassigned.is_empty()
    }

    pub fn queued(&self) -> impl Iterator<Item = usize> + '_ {
        self.unassigned.iter().copied()
    }

    #[inline]
    pub fn measurement_of(&self, track: usize) -> Option<usize> {
        self.assignment[track]
    }

    #[inline]
    pub fn owner_of(&self, meas: usize) -> Option<usize> {
        self.owner[meas]
    }

    /// Gives `meas` to `track`. The previous holder, if any, loses it and is
    /// queued at the tail; it is returned.
    pub fn assign(&mut self, track: usize, meas: usize) -> Option<usize> {
        if let Some(previous) = self.assignment[track].take() {
            self.owner[previous] = None;
        }
        let evicted = self.owner[meas].replace(track).filter(|&t| t != track);
        if let Some(evicted) = evicted {
            self.assignment[evicted] = None;
            self.unassigned.push_back(evicted);
        }
        self.assignment[track] = Some(meas);
        evicted
    }

    pub fn assignment(&self) -> &[Option<usize>] {
        &self.assignment
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn queue_starts_over_tracks() {
        // more tracks than measurements, the queue must cover every track
        let mut state = AssignmentState::new(3, 2);
        assert_eq!(state.queued().collect::<Vec<_>>(), [0, 1, 2]);
        assert_eq!(state.pop_unassigned(), Some(0));
        assert_eq!(state.pop_unassigned(), Some(1));
        assert_eq!(state.pop_unassigned(), Some(2));
        assert!(!state.has_unassigned());
    }

    #[test]
    fn assign_evicts_previous_owner() {
        let mut state = AssignmentState::new(3, 2);
        while state.pop_unassigned().is_some() {}

        assert_eq!(state.assign(0, 1), None);
        assert_eq!(state.assign(2, 0), None);
        assert_eq!(state.assign(1, 1), Some(0));

        assert_eq!(state.assignment(), [None, Some(1), Some(0)]);
        assert_eq!(state.owner_of(1), Some(1));
        assert_eq!(state.queued().collect::<Vec<_>>(), [0]);
    }

    #[test]
    fn reassigning_a_track_frees_its_old_measurement() {
        let mut state = AssignmentState::new(1, 2);
        state.pop_unassigned();
        state.assign(0, 0);
        assert_eq!(state.assign(0, 1), None);
        assert_eq!(state.owner_of(0), None);
        assert_eq!(state.measurement_of(0), Some(1));
        assert!(!state.has_unassigned());
    }
}
