//! # Revenue Dashboard
//!
//! Daily revenue that follows order closings as they happen.
//!
//! ## Staleness
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  close_order(7) ──► bus.publish ──► handler: stale = true, gen += 1   │
//! │                                                                         │
//! │  dashboard.today().await                                               │
//! │       │                                                                 │
//! │       ├── fresh cache for this day? ──► cached value                   │
//! │       │                                                                 │
//! │       └── otherwise: SUM from the store (lock released while awaiting) │
//! │                │                                                        │
//! │                ▼                                                        │
//! │           store result; clear `stale` only if no event arrived         │
//! │           during the query (generation unchanged)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The dashboard is a consumer of settlement events; it never writes.
//! Dropping it unsubscribes its handler.

use chrono::NaiveDate;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::error::LedgerResult;
use crate::ledger::Ledger;
use comanda_core::{Money, SettlementEvent, Subscription};

#[derive(Debug)]
struct DashboardState {
    stale: bool,
    /// Bumped on every closure event.
    generation: u64,
    cached: Option<(NaiveDate, Money)>,
    last_event: Option<SettlementEvent>,
}

/// Daily revenue view kept in step with the settlement bus.
#[derive(Debug)]
pub struct RevenueDashboard {
    ledger: Ledger,
    state: Arc<Mutex<DashboardState>>,
    _subscription: Subscription,
}

fn lock(state: &Mutex<DashboardState>) -> MutexGuard<'_, DashboardState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RevenueDashboard {
    /// Subscribes to the ledger's bus. Starts stale.
    pub fn new(ledger: &Ledger) -> Self {
        let state = Arc::new(Mutex::new(DashboardState {
            stale: true,
            generation: 0,
            cached: None,
            last_event: None,
        }));

        let sink = Arc::clone(&state);
        let subscription = ledger.bus().subscribe(move |event| {
            let mut state = lock(&sink);
            state.stale = true;
            state.generation += 1;
            state.last_event = Some(*event);
            Ok(())
        });

        RevenueDashboard {
            ledger: ledger.clone(),
            state,
            _subscription: subscription,
        }
    }

    /// Revenue of the current business day.
    pub async fn today(&self) -> LedgerResult<Money> {
        self.revenue(self.ledger.day_clock().today()).await
    }

    /// Revenue of `day`, recomputed if a closure happened since the last read.
    pub async fn revenue(&self, day: NaiveDate) -> LedgerResult<Money> {
        let generation = {
            let state = lock(&self.state);
            match state.cached {
                Some((cached_day, value)) if !state.stale && cached_day == day => {
                    return Ok(value)
                }
                _ => state.generation,
            }
        };

        let value = self.ledger.revenue_for_day(day).await?;

        let mut state = lock(&self.state);
        if state.generation == generation {
            state.stale = false;
            state.cached = Some((day, value));
        }
        debug!(%day, revenue = %value, stale = state.stale, "Revenue recomputed");
        Ok(value)
    }

    /// Whether a closure arrived since the last recompute.
    pub fn is_stale(&self) -> bool {
        lock(&self.state).stale
    }

    /// Closure events received so far.
    pub fn closures_seen(&self) -> u64 {
        lock(&self.state).generation
    }

    pub fn last_event(&self) -> Option<SettlementEvent> {
        lock(&self.state).last_event
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PixSettings;
    use comanda_core::{SettlementBus, SettlementDisposition};
    use comanda_db::{Database, DbConfig};

    async fn ledger() -> Ledger {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        Ledger::new(db, SettlementBus::new(), PixSettings::default())
    }

    #[tokio::test]
    async fn test_goes_stale_on_close_and_recomputes() {
        let ledger = ledger().await;
        let dashboard = RevenueDashboard::new(&ledger);

        assert!(dashboard.is_stale());
        assert_eq!(dashboard.today().await.unwrap(), Money::zero());
        assert!(!dashboard.is_stale());

        let order = ledger.create_order("Mesa 1").await.unwrap();
        ledger
            .add_free_item(order.id, "Pastel", Money::from_cents(900), 2)
            .await
            .unwrap();

        // Open orders don't move revenue or the dashboard.
        assert!(!dashboard.is_stale());

        ledger
            .close_order(order.id, SettlementDisposition::Paid)
            .await
            .unwrap();

        assert!(dashboard.is_stale());
        assert_eq!(dashboard.closures_seen(), 1);
        assert_eq!(
            dashboard.last_event(),
            Some(SettlementEvent {
                order_id: order.id,
                total: Money::from_cents(1800)
            })
        );
        assert_eq!(dashboard.today().await.unwrap().cents(), 1800);
        assert!(!dashboard.is_stale());
    }

    #[tokio::test]
    async fn test_other_day_is_not_served_from_cache() {
        let ledger = ledger().await;
        let dashboard = RevenueDashboard::new(&ledger);

        let order = ledger.create_order("Mesa 2").await.unwrap();
        ledger
            .add_free_item(order.id, "Suco", Money::from_cents(600), 1)
            .await
            .unwrap();
        ledger
            .close_order(order.id, SettlementDisposition::NotPaid)
            .await
            .unwrap();

        let today = ledger.day_clock().today();
        let yesterday = today.pred_opt().unwrap();
        assert_eq!(dashboard.revenue(today).await.unwrap().cents(), 600);
        assert_eq!(dashboard.revenue(yesterday).await.unwrap(), Money::zero());
    }

    #[tokio::test]
    async fn test_today_follows_ledger_day_clock() {
        use chrono::{FixedOffset, Utc};
        use comanda_core::DayClock;

        // Far enough east that its day differs from UTC for half of every day.
        let kiritimati = DayClock::Fixed(FixedOffset::east_opt(14 * 3600).unwrap());
        let ledger = ledger().await.with_day_clock(kiritimati);
        let dashboard = RevenueDashboard::new(&ledger);

        let order = ledger.create_order("Mesa 5").await.unwrap();
        ledger
            .add_free_item(order.id, "Café", Money::from_cents(450), 1)
            .await
            .unwrap();
        ledger
            .close_order(order.id, SettlementDisposition::Paid)
            .await
            .unwrap();

        let local_day = kiritimati.day_of(Utc::now());
        assert_eq!(dashboard.today().await.unwrap().cents(), 450);
        assert_eq!(dashboard.revenue(local_day).await.unwrap().cents(), 450);
    }

    #[tokio::test]
    async fn test_drop_unsubscribes() {
        let ledger = ledger().await;
        let dashboard = RevenueDashboard::new(&ledger);
        assert_eq!(ledger.bus().subscriber_count(), 1);

        drop(dashboard);
        assert_eq!(ledger.bus().subscriber_count(), 0);
    }
}
