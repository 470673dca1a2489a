//! # Settlement Event Bus
//!
//! Tells dependent views that an order was closed, the moment it happens.
//!
//! ## Dispatch Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Ledger::close_order(7)                                                 │
//! │       │                                                                 │
//! │       │  (status, closed_at, paid written)                              │
//! │       ▼                                                                 │
//! │  bus.publish(&SettlementEvent { order_id: 7, total: R$ 20,00 })         │
//! │       │                                                                 │
//! │       ├──► handler #1 (revenue dashboard)   Ok                          │
//! │       ├──► handler #2 (receipt view)        Err  → warn!, keep going    │
//! │       └──► handler #3 (order list)          panic → warn!, keep going   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PublishReport { delivered: 1, failed: 2 }                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The bus is an ordinary value owned by whoever builds the ledger; there is
//! no global registry. Clones share the same handler list.
//!
//! Handlers run synchronously, in registration order, on the publishing
//! thread. The registry lock is released before any handler runs, so a
//! handler may subscribe, unsubscribe or publish without deadlocking.
//! A handler revoked by an earlier handler of the same publish is skipped.

use std::error::Error;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tracing::{debug, warn};

use crate::types::SettlementEvent;

/// What a handler returns. Errors are logged, never propagated.
pub type HandlerResult = Result<(), Box<dyn Error + Send + Sync>>;

type Handler = Arc<dyn Fn(&SettlementEvent) -> HandlerResult + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: Vec<(u64, Handler)>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    // A handler never runs while the lock is held, so poisoning can only
    // come from a panic inside the registry bookkeeping itself.
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// =============================================================================
// Settlement Bus
// =============================================================================

/// Context-owned registry of settlement handlers.
#[derive(Clone, Default)]
pub struct SettlementBus {
    inner: Arc<Mutex<Registry>>,
}

impl SettlementBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler and returns its subscription token.
    ///
    /// Dropping the token unsubscribes the handler.
    ///
    /// ```rust
    /// use comanda_core::events::SettlementBus;
    /// use comanda_core::{Money, SettlementEvent};
    ///
    /// let bus = SettlementBus::new();
    /// let subscription = bus.subscribe(|event| {
    ///     println!("order {} closed at {}", event.order_id, event.total);
    ///     Ok(())
    /// });
    ///
    /// let report = bus.publish(&SettlementEvent { order_id: 1, total: Money::from_cents(500) });
    /// assert_eq!(report.delivered, 1);
    ///
    /// drop(subscription);
    /// assert_eq!(bus.subscriber_count(), 0);
    /// ```
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&SettlementEvent) -> HandlerResult + Send + Sync + 'static,
    {
        let mut registry = lock(&self.inner);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.handlers.push((id, Arc::new(handler)));

        debug!(subscription_id = id, subscribers = registry.handlers.len(), "Handler subscribed");

        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Delivers `event` to every handler registered at the time of the call
    /// that is still registered when its turn comes.
    pub fn publish(&self, event: &SettlementEvent) -> PublishReport {
        // Snapshot so handlers run without the lock held.
        let handlers: Vec<(u64, Handler)> = lock(&self.inner).handlers.clone();

        let mut report = PublishReport::default();
        for (id, handler) in handlers {
            if !self.is_registered(id) {
                debug!(subscription_id = id, "Skipping handler revoked during publish");
                continue;
            }
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(err)) => {
                    report.failed += 1;
                    warn!(
                        subscription_id = id,
                        order_id = event.order_id,
                        error = %err,
                        "Settlement handler failed"
                    );
                }
                Err(panic) => {
                    report.failed += 1;
                    warn!(
                        subscription_id = id,
                        order_id = event.order_id,
                        panic = panic_message(panic.as_ref()),
                        "Settlement handler panicked"
                    );
                }
            }
        }

        debug!(
            order_id = event.order_id,
            total_cents = event.total.cents(),
            delivered = report.delivered,
            failed = report.failed,
            "Settlement event published"
        );
        report
    }

    fn is_registered(&self, id: u64) -> bool {
        lock(&self.inner).handlers.iter().any(|(live, _)| *live == id)
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner).handlers.len()
    }
}

impl fmt::Debug for SettlementBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettlementBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

// =============================================================================
// Publish Report
// =============================================================================

/// Outcome counts of one [`SettlementBus::publish`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Handlers that returned `Ok`.
    pub delivered: usize,
    /// Handlers that returned `Err` or panicked.
    pub failed: usize,
}

// =============================================================================
// Subscription
// =============================================================================

/// Subscription token. The handler stays registered while this is alive.
///
/// Holds only a weak reference, so a subscription never keeps a dropped
/// bus alive.
#[must_use = "dropping a Subscription immediately unsubscribes its handler"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Revokes the handler now.
    pub fn unsubscribe(self) {
        // Drop does the work.
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = lock(&registry);
        registry.handlers.retain(|(id, _)| *id != self.id);
        debug!(subscription_id = self.id, "Handler unsubscribed");
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    fn event(order_id: i64) -> SettlementEvent {
        SettlementEvent {
            order_id,
            total: Money::from_cents(2000),
        }
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let bus = SettlementBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let _subs: Vec<Subscription> = (0..3)
            .map(|n| {
                let seen = Arc::clone(&seen);
                bus.subscribe(move |e| {
                    seen.lock().unwrap().push((n, e.order_id));
                    Ok(())
                })
            })
            .collect();

        let report = bus.publish(&event(7));

        assert_eq!(report, PublishReport { delivered: 3, failed: 0 });
        assert_eq!(*seen.lock().unwrap(), vec![(0, 7), (1, 7), (2, 7)]);
    }

    #[test]
    fn test_failing_handlers_do_not_stop_delivery() {
        let bus = SettlementBus::new();
        let reached = Arc::new(Mutex::new(false));

        let _a = bus.subscribe(|_| Err("receipt printer offline".into()));
        let _b = bus.subscribe(|_| panic!("view crashed"));
        let flag = Arc::clone(&reached);
        let _c = bus.subscribe(move |_| {
            *flag.lock().unwrap() = true;
            Ok(())
        });

        let report = bus.publish(&event(1));

        assert_eq!(report, PublishReport { delivered: 1, failed: 2 });
        assert!(*reached.lock().unwrap());

        // The bus is still usable after a handler panicked.
        assert_eq!(bus.publish(&event(2)).failed, 2);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let bus = SettlementBus::new();
        let count = Arc::new(Mutex::new(0));

        let c = Arc::clone(&count);
        let sub = bus.subscribe(move |_| {
            *c.lock().unwrap() += 1;
            Ok(())
        });
        assert_eq!(bus.subscriber_count(), 1);

        bus.publish(&event(1));
        drop(sub);
        bus.publish(&event(2));

        assert_eq!(*count.lock().unwrap(), 1);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_explicit_unsubscribe() {
        let bus = SettlementBus::new();
        let sub = bus.subscribe(|_| Ok(()));
        sub.unsubscribe();
        assert_eq!(bus.publish(&event(1)), PublishReport::default());
    }

    #[test]
    fn test_clones_share_registry() {
        let bus = SettlementBus::new();
        let other = bus.clone();
        let _sub = other.subscribe(|_| Ok(()));
        assert_eq!(bus.publish(&event(1)).delivered, 1);
    }

    #[test]
    fn test_subscription_outliving_bus() {
        let bus = SettlementBus::new();
        let sub = bus.subscribe(|_| Ok(()));
        drop(bus);
        drop(sub); // must not panic
    }

    #[test]
    fn test_handler_may_unsubscribe_during_publish() {
        let bus = SettlementBus::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let inner = Arc::clone(&slot);
        let sub = bus.subscribe(move |_| {
            inner.lock().unwrap().take();
            Ok(())
        });
        *slot.lock().unwrap() = Some(sub);

        assert_eq!(bus.publish(&event(1)).delivered, 1);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_handler_revoked_by_earlier_handler_is_skipped() {
        let bus = SettlementBus::new();
        let later_slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let later_ran = Arc::new(Mutex::new(false));

        let slot = Arc::clone(&later_slot);
        let _first = bus.subscribe(move |_| {
            slot.lock().unwrap().take();
            Ok(())
        });
        let ran = Arc::clone(&later_ran);
        let later = bus.subscribe(move |_| {
            *ran.lock().unwrap() = true;
            Ok(())
        });
        *later_slot.lock().unwrap() = Some(later);

        let report = bus.publish(&event(1));

        assert_eq!(report, PublishReport { delivered: 1, failed: 0 });
        assert!(!*later_ran.lock().unwrap());
        assert_eq!(bus.subscriber_count(), 1);
    }
}
