//! # Repository Module
//!
//! Database repository implementations for RxLedger.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Presentation layer                                                    │
//! │       │                                                                 │
//! │       │  db.batches().upsert("paracetamol500", "B1", 100, ...)         │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  BatchRepository                                                       │
//! │  ├── upsert(&self, item_code, batch_no, qty, price, mfg, exp)          │
//! │  ├── edit(&self, ...)                                                  │
//! │  ├── list(&self, item_code, expiry_cutoff, exact)                      │
//! │  └── deplete_for_line(conn, ...)  ← billing's transaction only         │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Plain data structs in, plain data structs out                       │
//! │  • No object carries live database-session state                       │
//! │  • SQL is isolated in one place per aggregate                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`item::ItemRepository`] - Catalog CRUD and implicit item creation
//! - [`batch::BatchRepository`] - Stock ledger: merge-upsert, edits, depletion
//! - [`bill::BillRepository`] - Atomic bill issue + reporting reads

pub mod batch;
pub mod bill;
pub mod item;
