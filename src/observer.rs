//! Per-step trace hooks.
//!
//! Observers only watch; nothing they do can change prices or assignments.
//! All methods default to doing nothing so an implementation picks the events
//! it cares about.

use std::fmt::Debug;

use crate::bid::Bid;

pub trait TraceObserver<T> {
    /// A track was taken from the head of the queue.
    fn on_track_picked(&mut self, _iteration: usize, _track: usize) {}

    fn on_measurement_chosen(&mut self, _track: usize, _bid: &Bid<T>) {}

    /// A committed price moved from `previous` to `price`.
    fn on_price_updated(&mut self, _meas: usize, _previous: T, _price: T) {}

    /// A pipelined bid lost against the committed price.
    fn on_rejected(&mut self, _track: usize, _meas: usize, _proposed: T, _committed: T) {}

    /// The track had nothing worth bidding on and leaves the auction.
    fn on_dropped(&mut self, _track: usize) {}

    fn on_evicted(&mut self, _track: usize, _meas: usize) {}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoopObserver;

impl<T> TraceObserver<T> for NoopObserver {}

/// Forwards every event to `tracing` at `TRACE` level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TracingObserver;

impl<T: Debug> TraceObserver<T> for TracingObserver {
    fn on_track_picked(&mut self, iteration: usize, track: usize) {
        tracing::trace!(iteration, track, "track picked");
    }

    fn on_measurement_chosen(&mut self, track: usize, bid: &Bid<T>) {
        tracing::trace!(
            track,
            meas = bid.measurement,
            best = ?bid.best,
            second = ?bid.second,
            "measurement chosen"
        );
    }

    fn on_price_updated(&mut self, meas: usize, previous: T, price: T) {
        tracing::trace!(meas, ?previous, ?price, "price updated");
    }

    fn on_rejected(&mut self, track: usize, meas: usize, proposed: T, committed: T) {
        tracing::trace!(track, meas, ?proposed, ?committed, "bid rejected");
    }

    fn on_dropped(&mut self, track: usize) {
        tracing::trace!(track, "no measurement with positive net value");
    }

    fn on_evicted(&mut self, track: usize, meas: usize) {
        tracing::trace!(track, meas, "track unassigned");
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent<T> {
    TrackPicked { iteration: usize, track: usize },
    MeasurementChosen { track: usize, bid: Bid<T> },
    PriceUpdated { meas: usize, previous: T, price: T },
    Rejected { track: usize, meas: usize, proposed: T, committed: T },
    Dropped { track: usize },
    Evicted { track: usize, meas: usize },
}

/// Records every event in order.
#[derive(Debug, Clone, PartialEq)]
pub struct EventLog<T> {
    pub events: Vec<TraceEvent<T>>,
}

impl<T> Default for EventLog<T> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<T> EventLog<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn price_updates(&self) -> impl Iterator<Item = (usize, &T, &T)> + '_ {
        self.events.iter().filter_map(|e| match e {
            TraceEvent::PriceUpdated {
                meas,
                previous,
                price,
            } => Some((*meas, previous, price)),
            _ => None,
        })
    }

    pub fn rejections(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, TraceEvent::Rejected { .. }))
            .count()
    }
}

impl<T: Clone> TraceObserver<T> for EventLog<T> {
    fn on_track_picked(&mut self, iteration: usize, track: usize) {
        self.events.push(TraceEvent::TrackPicked { iteration, track });
    }

    fn on_measurement_chosen(&mut self, track: usize, bid: &Bid<T>) {
        self.events.push(TraceEvent::MeasurementChosen {
            track,
            bid: bid.clone(),
        });
    }

    fn on_price_updated(&mut self, meas: usize, previous: T, price: T) {
        self.events.push(TraceEvent::PriceUpdated {
            meas,
            previous,
            price,
        });
    }

    fn on_rejected(&mut self, track: usize, meas: usize, proposed: T, committed: T) {
        self.events.push(TraceEvent::Rejected {
            track,
            meas,
            proposed,
            committed,
        });
    }

    fn on_dropped(&mut self, track: usize) {
        self.events.push(TraceEvent::Dropped { track });
    }

    fn on_evicted(&mut self, track: usize, meas: usize) {
        self.events.push(TraceEvent::Evicted { track, meas });
    }
}
