//=========================================================================
// Tick Bus
//=========================================================================
//
// Named, synchronous publish/subscribe for loop ticks.
//
// Architecture:
//   subscribe::<P>(name, handler) → HashMap<TickName, Vec<Subscriber<P>>>
//                                                │
//   fire::<P>(name, &mut payload) ── snapshot ───┘ (lock released)
//                │
//                └─► handler 1 → handler 2 → ... (registration order)
//                      │ Err / panic
//                      └─► logged, counted, returned in FireReport
//
// Firing blocks until every handler has returned. A failing handler
// never stops the handlers after it.
//
//=========================================================================

//=== Submodules ==========================================================

mod subscriber_list;

//=== External Dependencies ===============================================

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{error, trace, warn};
use parking_lot::Mutex;

//=== Internal Dependencies ===============================================

use crate::core::error::{panic_message, HandlerResult, TickError};
use subscriber_list::{Handler, Subscriber, SubscriberList};

//=== TickName ============================================================

/// Identifier of a tick event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickName(&'static str);

impl TickName {
    /// Fired zero or more times per iteration to advance simulation.
    /// Payload: `()`.
    pub const UPDATE: TickName = TickName("update-tick");

    /// Fired exactly once per iteration. Payload: the window's frame.
    pub const RENDER: TickName = TickName("render-tick");

    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for TickName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

//=== Subscription ========================================================

/// Handle returned by [`TickBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    tick: TickName,
    id: u64,
}

impl Subscription {
    pub fn tick(&self) -> TickName {
        self.tick
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

//=== Fire Reporting ======================================================

/// Why a single handler invocation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The handler returned `Err`.
    Error(String),
    /// The handler panicked; the panic was contained.
    Panic(String),
    /// The handler was already running further up the same thread's stack
    /// (the tick was re-fired from inside itself), so this call was skipped.
    Busy,
}

/// One failed handler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    pub subscription: Subscription,
    pub kind: FailureKind,
}

/// Outcome of one [`TickBus::fire`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FireReport {
    pub tick: TickName,
    /// Handlers that were called (successfully or not).
    pub invoked: usize,
    pub failures: Vec<HandlerFailure>,
}

impl FireReport {
    fn empty(tick: TickName) -> Self {
        Self {
            tick,
            invoked: 0,
            failures: Vec::new(),
        }
    }

    /// `true` if every handler succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

//=== TickBus =============================================================

/// Registry of tick subscribers. Clones share the same registry.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use parking_lot::Mutex;
/// use decaf_engine::core::tick_bus::TickBus;
///
/// let bus = TickBus::new();
/// let order = Arc::new(Mutex::new(Vec::new()));
///
/// for label in ["physics", "ai"] {
///     let order = order.clone();
///     bus.on_update(move || {
///         order.lock().push(label);
///         Ok(())
///     });
/// }
///
/// assert!(bus.fire_update().is_clean());
/// assert_eq!(*order.lock(), ["physics", "ai"]);
/// ```
#[derive(Clone, Default)]
pub struct TickBus {
    inner: Arc<BusInner>,
}

#[derive(Default)]
struct BusInner {
    registry: Mutex<HashMap<TickName, Box<dyn SubscriberList>>>,
    next_id: AtomicU64,
    failures: AtomicU64,
}

impl TickBus {
    pub fn new() -> Self {
        Self::default()
    }

    //--- Registration -----------------------------------------------------

    /// Appends `handler` to `tick`'s subscriber list.
    ///
    /// The first subscription to a tick fixes its payload type; later
    /// subscriptions with a different `P` are rejected. The update tick
    /// always carries `()`.
    pub fn subscribe<P, F>(&self, tick: TickName, handler: F) -> Result<Subscription, TickError>
    where
        P: 'static,
        F: FnMut(&mut P) -> HandlerResult + Send + 'static,
    {
        if tick == TickName::UPDATE && TypeId::of::<P>() != TypeId::of::<()>() {
            return Err(TickError::PayloadMismatch {
                tick,
                expected: type_name::<()>(),
                found: type_name::<P>(),
            });
        }

        let mut registry = self.inner.registry.lock();

        let list = registry
            .entry(tick)
            .or_insert_with(|| Box::new(Vec::<Subscriber<P>>::new()));

        let registered = list.payload_type();
        let subscribers = list
            .as_any_mut()
            .downcast_mut::<Vec<Subscriber<P>>>()
            .ok_or(TickError::PayloadMismatch {
                tick,
                expected: registered,
                found: type_name::<P>(),
            })?;

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let boxed: Handler<P> = Box::new(handler);
        subscribers.push(Subscriber::new(id, boxed));

        trace!(target: "tick_bus", "Subscribed #{} to {} ({} total)", id, tick, subscribers.len());
        Ok(Subscription { tick, id })
    }

    /// Removes a subscription. Takes effect from the next fire.
    pub fn unsubscribe(&self, subscription: &Subscription) -> Result<(), TickError> {
        let mut registry = self.inner.registry.lock();

        let removed = registry
            .get_mut(&subscription.tick)
            .map(|list| list.remove(subscription.id))
            .unwrap_or(false);

        if removed {
            trace!(target: "tick_bus", "Unsubscribed #{} from {}", subscription.id, subscription.tick);
            Ok(())
        } else {
            Err(TickError::UnknownSubscription {
                tick: subscription.tick,
                id: subscription.id,
            })
        }
    }

    /// Subscribes a payload-less handler to [`TickName::UPDATE`].
    pub fn on_update<F>(&self, mut handler: F) -> Subscription
    where
        F: FnMut() -> HandlerResult + Send + 'static,
    {
        self.subscribe(TickName::UPDATE, move |_: &mut ()| handler())
            .unwrap_or_else(|e| unreachable!("update tick payload is fixed to (): {e}"))
    }

    /// Subscribes a handler to [`TickName::RENDER`] for frame type `Fr`.
    pub fn on_render<Fr, F>(&self, handler: F) -> Result<Subscription, TickError>
    where
        Fr: 'static,
        F: FnMut(&mut Fr) -> HandlerResult + Send + 'static,
    {
        self.subscribe(TickName::RENDER, handler)
    }

    //--- Dispatch ---------------------------------------------------------

    /// Calls every handler subscribed to `tick`, in registration order,
    /// passing `payload` to each in turn.
    ///
    /// Returns `Err` only for API misuse (payload type mismatch). Handler
    /// errors and panics are logged and collected in the [`FireReport`].
    ///
    /// A handler is never run by two threads at once: a fire from another
    /// thread waits for the running call to finish and then runs it. Only a
    /// fire from inside the handler itself (same thread) skips it, reported
    /// as [`FailureKind::Busy`]. A handler that blocks on another thread
    /// firing the same tick therefore deadlocks.
    pub fn fire<P: 'static>(&self, tick: TickName, payload: &mut P) -> Result<FireReport, TickError> {
        let snapshot = match self.snapshot::<P>(tick)? {
            Some(snapshot) => snapshot,
            None => return Ok(FireReport::empty(tick)),
        };

        let mut report = FireReport::empty(tick);

        for subscriber in snapshot {
            let subscription = Subscription {
                tick,
                id: subscriber.id,
            };

            let cell = subscriber.handler.lock();
            let kind = match cell.try_borrow_mut() {
                Ok(mut handler) => {
                    report.invoked += 1;
                    match catch_unwind(AssertUnwindSafe(|| (*handler)(payload))) {
                        Ok(Ok(())) => continue,
                        Ok(Err(e)) => {
                            warn!(target: "tick_bus", "{} handler #{} failed: {}", tick, subscriber.id, e);
                            FailureKind::Error(e.to_string())
                        }
                        Err(panic) => {
                            let msg = panic_message(panic.as_ref());
                            error!(target: "tick_bus", "{} handler #{} panicked: {}", tick, subscriber.id, msg);
                            FailureKind::Panic(msg)
                        }
                    }
                }
                Err(_) => {
                    warn!(target: "tick_bus", "{} handler #{} fired from inside itself, skipped", tick, subscriber.id);
                    FailureKind::Busy
                }
            };

            self.inner.failures.fetch_add(1, Ordering::Relaxed);
            report.failures.push(HandlerFailure { subscription, kind });
        }

        Ok(report)
    }

    /// Fires [`TickName::UPDATE`].
    pub fn fire_update(&self) -> FireReport {
        self.fire(TickName::UPDATE, &mut ())
            .unwrap_or_else(|e| unreachable!("update tick payload is fixed to (): {e}"))
    }

    //--- Query API --------------------------------------------------------

    /// Number of handlers subscribed to `tick`.
    pub fn subscriber_count(&self, tick: TickName) -> usize {
        self.inner
            .registry
            .lock()
            .get(&tick)
            .map(|list| list.len())
            .unwrap_or(0)
    }

    /// Total handler failures (errors, panics, busy skips) since creation.
    pub fn failure_count(&self) -> u64 {
        self.inner.failures.load(Ordering::Relaxed)
    }

    //--- Internal Helpers -------------------------------------------------

    /// Copies the subscriber list so handlers run without the registry lock.
    fn snapshot<P: 'static>(&self, tick: TickName) -> Result<Option<Vec<Subscriber<P>>>, TickError> {
        let registry = self.inner.registry.lock();

        let Some(list) = registry.get(&tick) else {
            return Ok(None);
        };

        list.as_any()
            .downcast_ref::<Vec<Subscriber<P>>>()
            .map(|subscribers| Some(subscribers.clone()))
            .ok_or(TickError::PayloadMismatch {
                tick,
                expected: list.payload_type(),
                found: type_name::<P>(),
            })
    }
}

impl fmt::Debug for TickBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.inner.registry.lock();
        let ticks: HashMap<&str, usize> = registry
            .iter()
            .map(|(name, list)| (name.as_str(), list.len()))
            .collect();

        f.debug_struct("TickBus")
            .field("subscribers", &ticks)
            .field("failures", &self.failure_count())
            .finish()
    }
}

//=========================================================================
// Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn recorder() -> Arc<Mutex<Vec<&'static str>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[test]
    fn fire_without_subscribers_is_empty() {
        let bus = TickBus::new();
        let report = bus.fire_update();
        assert_eq!(report.invoked, 0);
        assert!(report.is_clean());
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let bus = TickBus::new();
        let log = recorder();

        for label in ["first", "second", "third"] {
            let log = log.clone();
            bus.on_update(move || {
                log.lock().push(label);
                Ok(())
            });
        }

        let report = bus.fire_update();
        assert_eq!(report.invoked, 3);
        assert_eq!(*log.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn failing_handler_does_not_stop_later_handlers() {
        let bus = TickBus::new();
        let log = recorder();

        let l = log.clone();
        bus.on_update(move || {
            l.lock().push("before");
            Ok(())
        });
        let failing = bus.on_update(|| Err("physics exploded".into()));
        let l = log.clone();
        bus.on_update(move || {
            l.lock().push("after");
            Ok(())
        });

        let report = bus.fire_update();

        assert_eq!(*log.lock(), vec!["before", "after"]);
        assert_eq!(report.invoked, 3);
        assert_eq!(
            report.failures,
            vec![HandlerFailure {
                subscription: failing,
                kind: FailureKind::Error("physics exploded".to_string()),
            }]
        );
        assert_eq!(bus.failure_count(), 1);
    }

    #[test]
    fn panicking_handler_is_contained() {
        let bus = TickBus::new();
        let reached = Arc::new(AtomicUsize::new(0));

        bus.on_update(|| panic!("boom"));
        let r = reached.clone();
        bus.on_update(move || {
            r.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let report = bus.fire_update();

        assert_eq!(reached.load(Ordering::SeqCst), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, FailureKind::Panic("boom".to_string()));

        // The panicked handler stays subscribed and callable.
        let report = bus.fire_update();
        assert_eq!(report.invoked, 2);
        assert_eq!(bus.failure_count(), 2);
    }

    #[test]
    fn payload_is_passed_to_each_handler_in_turn() {
        let bus = TickBus::new();
        let tick = TickName::new("score");

        bus.subscribe(tick, |score: &mut u32| {
            *score += 1;
            Ok(())
        })
        .unwrap();
        bus.subscribe(tick, |score: &mut u32| {
            *score *= 10;
            Ok(())
        })
        .unwrap();

        let mut score = 4u32;
        bus.fire(tick, &mut score).unwrap();
        assert_eq!(score, 50, "handlers must see each other's writes in order");
    }

    #[test]
    fn payload_type_is_fixed_by_first_subscription() {
        let bus = TickBus::new();
        bus.on_render(|_: &mut String| Ok(())).unwrap();

        let err = bus.on_render(|_: &mut u64| Ok(())).unwrap_err();
        assert!(matches!(
            err,
            TickError::PayloadMismatch { tick, .. } if tick == TickName::RENDER
        ));

        let err = bus.fire(TickName::RENDER, &mut 5u64).unwrap_err();
        assert!(matches!(err, TickError::PayloadMismatch { .. }));
        assert_eq!(bus.subscriber_count(TickName::RENDER), 1);
    }

    #[test]
    fn unsubscribe_removes_only_that_handler() {
        let bus = TickBus::new();
        let log = recorder();

        let l = log.clone();
        let a = bus.on_update(move || {
            l.lock().push("a");
            Ok(())
        });
        let l = log.clone();
        bus.on_update(move || {
            l.lock().push("b");
            Ok(())
        });

        bus.unsubscribe(&a).unwrap();
        bus.fire_update();

        assert_eq!(*log.lock(), vec!["b"]);
        assert_eq!(bus.subscriber_count(TickName::UPDATE), 1);
        assert_eq!(
            bus.unsubscribe(&a),
            Err(TickError::UnknownSubscription {
                tick: TickName::UPDATE,
                id: a.id()
            })
        );
    }

    #[test]
    fn subscribing_from_inside_a_handler_applies_next_fire() {
        let bus = TickBus::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let inner_bus = bus.clone();
        let c = calls.clone();
        let mut added = false;
        bus.on_update(move || {
            if !added {
                let c = c.clone();
                inner_bus.on_update(move || {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                });
                added = true;
            }
            Ok(())
        });

        assert_eq!(bus.fire_update().invoked, 1, "new handler must not join this fire");
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(bus.fire_update().invoked, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reentrant_fire_reports_busy_instead_of_deadlocking() {
        let bus = TickBus::new();
        let inner_bus = bus.clone();
        let inner_report = Arc::new(Mutex::new(None));

        let slot = inner_report.clone();
        bus.on_update(move || {
            *slot.lock() = Some(inner_bus.fire_update());
            Ok(())
        });

        let outer = bus.fire_update();
        assert!(outer.is_clean());

        let inner = inner_report.lock().take().unwrap();
        assert_eq!(inner.invoked, 0);
        assert_eq!(inner.failures[0].kind, FailureKind::Busy);
    }

    #[test]
    fn fire_from_another_thread_waits_for_running_handler() {
        use std::time::Duration;

        let bus = TickBus::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let (entered_tx, entered_rx) = crossbeam_channel::bounded(1);

        let c = calls.clone();
        bus.on_update(move || {
            let _ = entered_tx.try_send(());
            std::thread::sleep(Duration::from_millis(50));
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let first_bus = bus.clone();
        let first = std::thread::spawn(move || first_bus.fire_update());

        entered_rx.recv().unwrap();
        let second = bus.fire_update();
        let first = first.join().unwrap();

        assert!(first.is_clean(), "{first:?}");
        assert!(second.is_clean(), "{second:?}");
        assert_eq!((first.invoked, second.invoked), (1, 1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(bus.failure_count(), 0);
    }

    #[test]
    fn concurrent_subscribe_while_firing_is_safe() {
        let bus = TickBus::new();
        bus.on_update(|| Ok(()));

        let writer_bus = bus.clone();
        let writer = std::thread::spawn(move || {
            for _ in 0..500 {
                let sub = writer_bus.on_update(|| Ok(()));
                writer_bus.unsubscribe(&sub).unwrap();
            }
        });

        for _ in 0..500 {
            let report = bus.fire_update();
            assert!(report.is_clean());
            assert!(report.invoked >= 1);
        }

        writer.join().unwrap();
        assert_eq!(bus.subscriber_count(TickName::UPDATE), 1);
    }

    #[test]
    fn update_tick_only_accepts_unit_payload() {
        let bus = TickBus::new();
        let err = bus.subscribe(TickName::UPDATE, |_: &mut u8| Ok(())).unwrap_err();
        assert!(matches!(err, TickError::PayloadMismatch { expected: "()", .. }));
        assert_eq!(bus.subscriber_count(TickName::UPDATE), 0);
    }

    #[test]
    fn tick_names_display_their_label() {
        assert_eq!(TickName::UPDATE.to_string(), "update-tick");
        assert_eq!(TickName::RENDER.as_str(), "render-tick");
    }
}
