//! # comanda-ledger: Ledger Service
//!
//! The entry point views use: open the ledger from configuration, then
//! call its operations.
//!
//! ## Module Organization
//! ```text
//! comanda_ledger/
//! ├── lib.rs          ◄─── You are here (startup & logging)
//! ├── config.rs       ◄─── AppConfig: defaults → comanda.toml → COMANDA_*
//! ├── ledger.rs       ◄─── Ledger: orders, items, settlement, catalog
//! ├── dashboard.rs    ◄─── RevenueDashboard (settlement bus subscriber)
//! └── error.rs        ◄─── LedgerError, ApiError for views
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. init_tracing()             RUST_LOG or info,comanda=debug,sqlx=warn │
//! │  2. AppConfig::load(None)      defaults, file, environment, validate    │
//! │  3. comanda_ledger::open(&cfg) pool, migrations, bus, Ledger            │
//! │  4. RevenueDashboard::new(&ledger)                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use comanda_core::SettlementDisposition;
//! use comanda_ledger::{AppConfig, RevenueDashboard};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! comanda_ledger::init_tracing();
//! let ledger = comanda_ledger::open(&AppConfig::load(None)?).await?;
//! let dashboard = RevenueDashboard::new(&ledger);
//!
//! let order = ledger.create_order("Mesa 4").await?;
//! ledger.add_free_item_entry(order.id, "Coxinha 7,50", 2).await?;
//! ledger.close_order(order.id, SettlementDisposition::PixPending).await?;
//!
//! let code = ledger.build_settlement_payload(order.id).await?;
//! println!("{}", code.payload);
//! println!("today: {}", dashboard.today().await?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dashboard;
pub mod error;
pub mod ledger;

use tracing::info;
use tracing_subscriber::EnvFilter;

use comanda_core::SettlementBus;
use comanda_db::Database;

pub use config::{AppConfig, ConfigError, DatabaseSettings, PixSettings, RevenueSettings};
pub use dashboard::RevenueDashboard;
pub use error::{ApiError, ErrorCode, LedgerError, LedgerResult};
pub use ledger::{CloseOutcome, Ledger, SettlementPayload};

const DEFAULT_LOG_FILTER: &str = "info,comanda=debug,sqlx=warn";

/// Installs the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=comanda_ledger=trace` - Trace the ledger only
/// - Default: `info,comanda=debug,sqlx=warn`
///
/// Does nothing if the host already installed a subscriber.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Connects to the configured database, applies migrations and returns a
/// ledger with a fresh settlement bus.
pub async fn open(config: &AppConfig) -> LedgerResult<Ledger> {
    let db_config = config.db_config()?;
    let day_clock = config.day_clock()?;
    let db = Database::new(db_config).await?;

    info!(
        pix_key_configured = config.pix.key.is_some(),
        merchant = %config.pix.merchant_name,
        ?day_clock,
        "Ledger ready"
    );
    Ok(Ledger::new(db, SettlementBus::new(), config.pix.clone()).with_day_clock(day_clock))
}
