//! Demand accounting and the subscriber contract

use std::ops::Add;

use crate::error::BindError;

/// Number of snapshots a subscriber is ready to receive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Demand {
    Bounded(usize),
    Unlimited,
}

impl Demand {
    pub const fn none() -> Self {
        Demand::Bounded(0)
    }

    pub const fn max(count: usize) -> Self {
        Demand::Bounded(count)
    }

    pub const fn unlimited() -> Self {
        Demand::Unlimited
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Demand::Bounded(0))
    }

    /// Account for one delivered snapshot
    pub(crate) fn consume_one(&mut self) {
        if let Demand::Bounded(count) = self {
            *count = count.saturating_sub(1);
        }
    }
}

impl Default for Demand {
    fn default() -> Self {
        Demand::none()
    }
}

impl Add for Demand {
    type Output = Demand;

    fn add(self, other: Demand) -> Demand {
        match (self, other) {
            (Demand::Bounded(a), Demand::Bounded(b)) => Demand::Bounded(a.saturating_add(b)),
            _ => Demand::Unlimited,
        }
    }
}

/// Receiver of live snapshots.
///
/// `receive` returns additional demand, so a subscriber can keep pulling
/// without calling back into its subscription. Closures taking the snapshot
/// are subscribers that add no demand.
pub trait Subscriber<T>: Send + 'static {
    fn receive(&mut self, snapshot: T) -> Demand;

    /// A re-fetch failed; the last delivered snapshot is still current
    fn receive_stale(&mut self, _error: &BindError) {}
}

impl<T, F> Subscriber<T> for F
where
    F: FnMut(T) + Send + 'static,
{
    fn receive(&mut self, snapshot: T) -> Demand {
        self(snapshot);
        Demand::none()
    }
}
