//! # rxledger-db: Storage Layer for RxLedger
//!
//! This crate provides database access for the RxLedger pharmacy ledger.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        RxLedger Data Flow                               │
//! │                                                                         │
//! │  Presentation layer (restock form, billing cart, reports)              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     rxledger-db (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  item.rs      │    │  (embedded)  │  │   │
//! │  │   │               │    │  batch.rs     │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│  bill.rs      │    │ 001_init.sql │  │   │
//! │  │   │ WAL, FKs on   │    │               │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (single node, single active writer)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (item, batch, bill)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rxledger_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./pharmacy.db")).await?;
//!
//! let item = db.items().create("Paracetamol 500", 250, Some(24)).await?;
//! let batch = db.batches().upsert(&item.code, "B1", 100, 250, mfg, exp).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::batch::BatchRepository;
pub use repository::bill::BillRepository;
pub use repository::item::ItemRepository;
