//! Bridge between store change notifications and one subscriber
//!
//! Delivery rules:
//! - nothing is fetched before the first nonzero demand
//! - each delivered snapshot consumes one unit of demand
//! - a change seen with zero demand marks the bridge stale; the next
//!   nonzero demand delivers one snapshot of the latest state
//! - a failed re-fetch leaves demand untouched and the bridge stale
//! - cancellation unregisters the observer and drops the subscriber
//!
//! The subscriber and the source run outside the state lock.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::error::BindResult;
use crate::observability::{log_event, metrics, Event};
use crate::store::{ChangeCallback, ObserverToken, SharedContext};

use super::demand::{Demand, Subscriber};

type Source<T> = Box<dyn Fn() -> BindResult<Option<T>> + Send + Sync>;

struct BridgeState<T> {
    demand: Demand,
    subscriber: Option<Box<dyn Subscriber<T>>>,
    tokens: Vec<ObserverToken>,
    /// First fetch has run
    started: bool,
    /// A change arrived since the last fetch
    stale: bool,
    delivering: bool,
    cancelled: bool,
}

struct Bridge<T> {
    /// Observed entity names, comma separated, for log records
    entity: String,
    context: SharedContext,
    source: Source<T>,
    state: Mutex<BridgeState<T>>,
}

/// Control surface shared by every bridge, independent of snapshot type
trait StreamControl: Send + Sync {
    fn request(&self, demand: Demand);
    fn cancel(&self);
    fn is_cancelled(&self) -> bool;
}

/// Handle to a live subscription. Dropping it cancels.
pub struct Subscription {
    control: Arc<dyn StreamControl>,
}

impl Subscription {
    /// Ask for `count` more snapshots
    pub fn request(&self, count: usize) {
        self.control.request(Demand::max(count));
    }

    pub fn request_unlimited(&self) {
        self.control.request(Demand::unlimited());
    }

    pub fn cancel(&self) {
        self.control.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.control.is_cancelled()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.control.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Attach `subscriber` to changes of any of `entities` in `context`.
/// `source` produces the next snapshot, or `None` when there is nothing new.
pub(crate) fn subscribe<T: Send + 'static>(
    context: SharedContext,
    entities: &[&str],
    source: impl Fn() -> BindResult<Option<T>> + Send + Sync + 'static,
    subscriber: impl Subscriber<T>,
) -> Subscription {
    let bridge = Arc::new(Bridge {
        entity: entities.join(","),
        context: Arc::clone(&context),
        source: Box::new(source),
        state: Mutex::new(BridgeState {
            demand: Demand::none(),
            subscriber: Some(Box::new(subscriber)),
            tokens: Vec::new(),
            started: false,
            stale: false,
            delivering: false,
            cancelled: false,
        }),
    });

    let weak: Weak<Bridge<T>> = Arc::downgrade(&bridge);
    let callback: ChangeCallback = Arc::new(move || {
        if let Some(bridge) = weak.upgrade() {
            bridge.on_change();
        }
    });
    let tokens: Vec<ObserverToken> = entities
        .iter()
        .map(|entity| context.register_observer(entity, Arc::clone(&callback)))
        .collect();
    let observers = tokens
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    bridge.lock().tokens = tokens;

    log_event(
        Event::StreamSubscribed,
        &[("entity", &bridge.entity), ("observer", &observers)],
    );
    Subscription { control: bridge }
}

impl<T: Send + 'static> Bridge<T> {
    fn lock(&self) -> MutexGuard<'_, BridgeState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn on_change(&self) {
        {
            let mut state = self.lock();
            if state.cancelled {
                return;
            }
            state.stale = true;
            if state.delivering {
                return;
            }
            if state.demand.is_zero() {
                drop(state);
                metrics().increment_snapshots_deferred();
                log_event(Event::SnapshotDeferred, &[("entity", &self.entity)]);
                return;
            }
            state.delivering = true;
        }
        self.deliver();
    }

    fn deliver(&self) {
        loop {
            {
                let mut state = self.lock();
                if state.cancelled {
                    state.delivering = false;
                    return;
                }
                state.stale = false;
            }

            let outcome = (self.source)();

            let mut state = self.lock();
            if state.cancelled {
                state.delivering = false;
                return;
            }
            state.started = true;

            match outcome {
                Ok(Some(snapshot)) => {
                    let Some(mut subscriber) = state.subscriber.take() else {
                        state.delivering = false;
                        return;
                    };
                    state.demand.consume_one();
                    drop(state);

                    metrics().increment_snapshots_delivered();
                    log_event(Event::SnapshotDelivered, &[("entity", &self.entity)]);
                    let extra = subscriber.receive(snapshot);

                    let mut state = self.lock();
                    if state.cancelled {
                        state.delivering = false;
                        drop(state);
                        drop(subscriber);
                        return;
                    }
                    state.subscriber = Some(subscriber);
                    state.demand = state.demand + extra;
                    if !state.stale || state.demand.is_zero() {
                        state.delivering = false;
                        return;
                    }
                }
                Ok(None) => {
                    if !state.stale || state.demand.is_zero() {
                        state.delivering = false;
                        return;
                    }
                }
                Err(err) => {
                    // Retried on the next demand or change
                    state.stale = true;
                    let subscriber = state.subscriber.take();
                    drop(state);

                    metrics().increment_refetch_failures();
                    log_event(
                        Event::RefetchFailed,
                        &[
                            ("code", err.code()),
                            ("entity", &self.entity),
                            ("reason", &err.to_string()),
                        ],
                    );

                    let mut subscriber = subscriber;
                    if let Some(subscriber) = subscriber.as_mut() {
                        subscriber.receive_stale(&err);
                    }

                    let mut state = self.lock();
                    if !state.cancelled {
                        state.subscriber = subscriber;
                    }
                    state.delivering = false;
                    return;
                }
            }
        }
    }
}

impl<T: Send + 'static> StreamControl for Bridge<T> {
    fn request(&self, demand: Demand) {
        {
            let mut state = self.lock();
            if state.cancelled {
                return;
            }
            state.demand = state.demand + demand;
            let pending = !state.started || state.stale;
            if state.delivering || state.demand.is_zero() || !pending {
                return;
            }
            state.delivering = true;
        }
        self.deliver();
    }

    fn cancel(&self) {
        let (subscriber, tokens) = {
            let mut state = self.lock();
            if state.cancelled {
                return;
            }
            state.cancelled = true;
            state.demand = Demand::none();
            (state.subscriber.take(), std::mem::take(&mut state.tokens))
        };

        for token in tokens {
            self.context.unregister_observer(token);
        }
        drop(subscriber);
        log_event(Event::StreamCancelled, &[("entity", &self.entity)]);
    }

    fn is_cancelled(&self) -> bool {
        self.lock().cancelled
    }
}
