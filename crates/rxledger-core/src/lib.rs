//! # rxledger-core: Pure Business Logic for RxLedger
//!
//! This crate is the **heart** of RxLedger, a single-counter pharmacy
//! inventory and billing ledger. It contains all business rules as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        RxLedger Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Presentation Layer (out of scope)               │   │
//! │  │    Restock forms ──► Billing cart ──► Expiry reports            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ rxledger-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   dates   │  │   code    │  │   │
//! │  │   │ Item      │  │   Money   │  │ expiry    │  │ derive_   │  │   │
//! │  │   │ Batch     │  │   cents   │  │ shelf life│  │   code    │  │   │
//! │  │   │ Bill      │  │           │  │           │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  rxledger-db (Storage Layer)                    │   │
//! │  │           SQLite queries, migrations, repositories             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Item, Batch, Bill, BillLine, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`code`] - Item code derivation (the catalog's identity rule)
//! - [`dates`] - Month-granularity expiry and shelf-life rules
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation for the presentation boundary
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use rxledger_core::code::derive_code;
//! use rxledger_core::dates::first_of_month;
//! use chrono::NaiveDate;
//!
//! // Item identity is derived, not user-chosen
//! assert_eq!(derive_code("Paracetamol 500"), "paracetamol500");
//!
//! // Batch dates only carry month precision
//! let exp = NaiveDate::from_ymd_opt(2026, 1, 20).unwrap();
//! assert_eq!(first_of_month(exp), NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod code;
pub mod dates;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use rxledger_core::Money` instead of
// `use rxledger_core::money::Money`

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed on a single bill
///
/// ## Business Reason
/// Prevents runaway carts and ensures a bill still fits on one printed page.
pub const MAX_BILL_LINES: usize = 100;

/// Maximum quantity of a single batch on one bill line
///
/// ## Business Reason
/// Prevents accidental over-dispensing (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;
