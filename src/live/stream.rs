//! `futures` adapter for live sources
//!
//! Each poll with an empty buffer requests one snapshot. Dropping the stream
//! cancels the subscription.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};

use futures_util::Stream;

use super::bridge::Subscription;
use super::demand::{Demand, Subscriber};

struct Slot<T> {
    buffer: VecDeque<T>,
    waker: Option<Waker>,
    /// One unit of demand is outstanding
    awaiting: bool,
}

type SharedSlot<T> = Arc<Mutex<Slot<T>>>;

fn lock<T>(slot: &SharedSlot<T>) -> MutexGuard<'_, Slot<T>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Subscriber feeding a `SnapshotStream`
pub struct StreamSink<T> {
    slot: SharedSlot<T>,
}

impl<T: Send + 'static> Subscriber<T> for StreamSink<T> {
    fn receive(&mut self, snapshot: T) -> Demand {
        let waker = {
            let mut slot = lock(&self.slot);
            slot.buffer.push_back(snapshot);
            slot.awaiting = false;
            slot.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
        Demand::none()
    }
}

/// Live snapshots as a `Stream`
pub struct SnapshotStream<T> {
    slot: SharedSlot<T>,
    subscription: Subscription,
}

impl<T: Send + 'static> SnapshotStream<T> {
    pub(crate) fn new(attach: impl FnOnce(StreamSink<T>) -> Subscription) -> Self {
        let slot = Arc::new(Mutex::new(Slot {
            buffer: VecDeque::new(),
            waker: None,
            awaiting: false,
        }));
        let subscription = attach(StreamSink {
            slot: Arc::clone(&slot),
        });
        Self { slot, subscription }
    }

    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }
}

impl<T: Send + 'static> Stream for SnapshotStream<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let this = self.get_mut();
        {
            let mut slot = lock(&this.slot);
            if let Some(snapshot) = slot.buffer.pop_front() {
                return Poll::Ready(Some(snapshot));
            }
            if this.subscription.is_cancelled() {
                return Poll::Ready(None);
            }
            slot.waker = Some(cx.waker().clone());
            if slot.awaiting {
                return Poll::Pending;
            }
            slot.awaiting = true;
        }

        this.subscription.request(1);

        match lock(&this.slot).buffer.pop_front() {
            Some(snapshot) => Poll::Ready(Some(snapshot)),
            None => Poll::Pending,
        }
    }
}
