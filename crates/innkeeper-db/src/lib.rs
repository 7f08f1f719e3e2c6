//! # innkeeper-db: Storage and Booking Ledger
//!
//! SQLite storage for rooms, guests, bookings and the room audit trail,
//! plus the ledger that runs every booking transition atomically.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Innkeeper Data Flow                              │
//! │                                                                         │
//! │  Front desk (create booking, check out, take payment ...)               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   innkeeper-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │ BookingLedger │    │  Repositories │    │  Migrations  │   │   │
//! │  │   │  (ledger.rs)  │───►│  room, guest  │    │  (embedded)  │   │   │
//! │  │   │               │    │  booking, log │    │              │   │   │
//! │  │   │ one tx per    │    │  settings,    │    │ 001_initial_ │   │   │
//! │  │   │ transition    │    │  report       │    │ schema.sql   │   │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘   │   │
//! │  │            │                    │                               │   │
//! │  │            └────────┬───────────┘                               │   │
//! │  │                     ▼                                           │   │
//! │  │              Database (pool.rs) + Clock                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Storage and ledger error types
//! - [`repository`] - Row-level storage and read queries
//! - [`ledger`] - Booking transitions with their room side effects
//! - [`config`] - TOML + environment configuration
//! - [`telemetry`] - Tracing subscriber setup
//!
//! ## Usage
//!
//! ```rust,ignore
//! use innkeeper_db::{Database, InnkeeperConfig};
//!
//! let config = InnkeeperConfig::load(None)?;
//! let db = Database::new(config.to_db_config()).await?;
//!
//! let booking = db.ledger().create_booking(input).await?;
//! let booking = db.ledger().check_out(&booking).await?;
//! db.ledger().mark_room_cleaned(&booking.room_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, InnkeeperConfig};
pub use error::{DbError, DbResult, LedgerError, LedgerResult};
pub use ledger::BookingLedger;
pub use pool::{Database, DbConfig};
pub use repository::EntityRef;

// Repository re-exports for convenience
pub use repository::booking::BookingRepository;
pub use repository::guest::GuestRepository;
pub use repository::report::ReportRepository;
pub use repository::room::RoomRepository;
pub use repository::settings::SettingsRepository;
pub use repository::status_log::StatusLogRepository;
