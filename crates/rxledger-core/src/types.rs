//! # Domain Types
//!
//! Core domain types used throughout RxLedger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Item       │   │      Batch      │   │      Bill       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  code (derived) │   │  id (auto)      │   │  id (auto)      │       │
//! │  │  name           │   │  item_code (FK) │   │  customer_name  │       │
//! │  │  price_cents    │   │  batch_no       │   │  lines (JSON)   │       │
//! │  │  shelf_life     │   │  quantity       │   │  totals         │       │
//! │  └─────────────────┘   │  mfg/exp dates  │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! │                                                                         │
//! │  Batches key on (item_code, batch_no); bills never reference live      │
//! │  rows - their lines are a frozen snapshot of what was actually sold.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity Pattern
//! - `Item.code` is a business key derived from the name (see [`crate::code`])
//! - `Batch.id` / `Bill.id` are storage surrogates; the batch's real key is
//!   the `(item_code, batch_no)` pair

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::dates;
use crate::money::Money;

// =============================================================================
// Item
// =============================================================================

/// A catalog entry: one drug/product the pharmacy sells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Item {
    /// Derived business key (lowercased, non-alphanumerics stripped).
    pub code: String,

    /// Display name shown on restock forms and printed bills.
    pub name: String,

    /// Unit sale price in cents.
    pub price_cents: i64,

    /// Shelf-life policy in whole months, used to default a new batch's
    /// expiry from its manufacture date. None when never supplied.
    pub shelf_life_months: Option<i64>,
}

impl Item {
    /// Returns the unit price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Batch
// =============================================================================

/// A dated lot of stock for one item.
///
/// Dates are always normalized to the first of their month before a batch is
/// persisted; day precision does not exist in this ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Batch {
    /// Storage surrogate id.
    pub id: i64,

    /// Owning item's derived code.
    pub item_code: String,

    /// Supplier batch number. Unique per item, not globally.
    pub batch_no: String,

    /// Units on hand. Invariant: never negative, and a batch that would
    /// reach zero is deleted rather than persisted at zero.
    pub quantity: i64,

    /// Purchase-time unit price in cents (last delivery wins).
    pub price_cents: i64,

    /// Manufacture month (first-of-month).
    pub mfg_date: NaiveDate,

    /// Expiry month (first-of-month).
    pub exp_date: NaiveDate,
}

impl Batch {
    /// Returns the unit price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Whether this batch is expired as of the given date (month-granular).
    #[inline]
    pub fn is_expired_as_of(&self, as_of: NaiveDate) -> bool {
        dates::is_expired(self.exp_date, as_of)
    }
}

// =============================================================================
// Batch View
// =============================================================================

/// A batch row as the reporting layer sees it: joined with the item name and
/// carrying the derived write-off highlight flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchView {
    pub id: i64,
    pub item_code: String,
    /// Item display name at read time (live join, not a snapshot).
    pub item_name: String,
    pub batch_no: String,
    pub quantity: i64,
    pub price_cents: i64,
    pub mfg_date: NaiveDate,
    pub exp_date: NaiveDate,
    /// True when the batch is already expired as of "today" - callers use
    /// this to flag stock for write-off.
    pub expired: bool,
}

// =============================================================================
// Bill Line
// =============================================================================

/// One line of a bill: a denormalized snapshot of what was sold.
///
/// ## Snapshot Pattern
/// Item name, dates, and prices are copied at billing time. A bill is a
/// legal record of the sale; later catalog or batch edits must not be able
/// to rewrite it.
///
/// `item_code` and `batch_no` are optional: service lines and free-text
/// lines carry neither, and billing skips depletion for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillLine {
    /// Item code at time of sale, when the line came from stock.
    pub item_code: Option<String>,

    /// Item display name at time of sale (frozen).
    pub item_name: String,

    /// Batch number the stock was drawn from, when known.
    pub batch_no: Option<String>,

    /// Manufacture month of the dispensed batch (frozen).
    pub mfg_date: Option<NaiveDate>,

    /// Expiry month of the dispensed batch (frozen).
    pub exp_date: Option<NaiveDate>,

    /// Units sold.
    pub quantity: i64,

    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,

    /// Line total in cents (unit price × quantity, computed by the caller).
    pub line_total_cents: i64,
}

impl BillLine {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }

    /// Whether this line references stock that billing should deplete.
    #[inline]
    pub fn references_stock(&self) -> bool {
        self.item_code.is_some() && self.batch_no.is_some()
    }
}

// =============================================================================
// Bill
// =============================================================================

/// Which ledger a bill belongs to.
///
/// Service bills (patient services: dressings, injections, consultations)
/// share the exact shape of sale bills but never touch stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillKind {
    /// Pharmacy sale - lines deplete batches.
    Sale,
    /// Patient service - no stock linkage.
    Service,
}

/// An issued bill. Immutable once created except for being read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    /// Storage surrogate id (also the printed bill number).
    pub id: i64,

    /// Customer (or patient, for service bills) name as entered.
    pub customer_name: String,

    /// Denormalized line snapshot - the legal record of the sale.
    pub lines: Vec<BillLine>,

    /// Caller-supplied gross total in cents, stored verbatim.
    pub total_cents: i64,

    /// Caller-supplied discount in cents.
    pub discount_cents: i64,

    /// Caller-supplied net amount in cents.
    pub net_cents: i64,

    /// Payment type as entered ("cash", "card", "credit", ...). The ledger
    /// archives it, the presentation layer interprets it.
    pub payment_type: String,

    /// When the bill was issued.
    pub billed_at: DateTime<Utc>,
}

/// A bill about to be created: everything but the assigned id.
///
/// Totals are caller-supplied and trusted - the ledger's job is inventory
/// truth and archival, not pricing arbitration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBill {
    pub customer_name: String,
    pub lines: Vec<BillLine>,
    pub total_cents: i64,
    pub discount_cents: i64,
    pub net_cents: i64,
    pub payment_type: String,
    pub billed_at: DateTime<Utc>,
}

// =============================================================================
// Operation Outcomes
// =============================================================================

/// What happened to a batch when a bill line was applied to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepletionOutcome {
    /// Quantity decremented; batch still exists.
    Reduced,
    /// Requested quantity met or exceeded the stock; the batch was deleted.
    Removed,
    /// Batch no longer exists; the line was tolerated and skipped.
    Skipped,
}

/// Result of an absolute batch edit.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEdit {
    /// Batch updated in place.
    Updated(Batch),
    /// Quantity was set to zero, so the batch was deleted instead.
    Deleted,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_batch_expiry_helper() {
        let batch = Batch {
            id: 1,
            item_code: "paracetamol500".to_string(),
            batch_no: "B1".to_string(),
            quantity: 100,
            price_cents: 250,
            mfg_date: d(2024, 1, 1),
            exp_date: d(2026, 1, 1),
        };

        assert!(batch.is_expired_as_of(d(2026, 1, 15)));
        assert!(!batch.is_expired_as_of(d(2025, 12, 31)));
    }

    #[test]
    fn test_line_references_stock() {
        let mut line = BillLine {
            item_code: Some("paracetamol500".to_string()),
            item_name: "Paracetamol 500".to_string(),
            batch_no: Some("B1".to_string()),
            mfg_date: Some(d(2024, 1, 1)),
            exp_date: Some(d(2026, 1, 1)),
            quantity: 30,
            unit_price_cents: 250,
            line_total_cents: 7500,
        };
        assert!(line.references_stock());

        line.batch_no = None;
        assert!(!line.references_stock());
    }

    #[test]
    fn test_bill_line_json_round_trip() {
        // The storage layer persists lines as an opaque JSON column; the
        // typed shape must survive the trip.
        let line = BillLine {
            item_code: Some("amoxicillin250mg".to_string()),
            item_name: "Amoxicillin (250mg)".to_string(),
            batch_no: Some("AMX-7".to_string()),
            mfg_date: Some(d(2025, 3, 1)),
            exp_date: Some(d(2027, 3, 1)),
            quantity: 10,
            unit_price_cents: 1200,
            line_total_cents: 12000,
        };

        let json = serde_json::to_string(&line).unwrap();
        let back: BillLine = serde_json::from_str(&json).unwrap();
        assert_eq!(line, back);
    }

    #[test]
    fn test_money_accessors() {
        let item = Item {
            code: "aspirin".to_string(),
            name: "Aspirin".to_string(),
            price_cents: 550,
            shelf_life_months: Some(36),
        };
        assert_eq!(item.price().cents(), 550);
    }
}
