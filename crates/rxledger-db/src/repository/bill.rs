//! # Bill Repository
//!
//! Atomic bill issue plus the reporting reads over the two bill ledgers.
//!
//! ## The Atomic Unit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Issuing a Sale Bill                                  │
//! │                                                                         │
//! │  BEGIN TRANSACTION                                                     │
//! │       │                                                                 │
//! │       ├── INSERT bill row (lines frozen as JSON, totals verbatim)      │
//! │       │                                                                 │
//! │       ├── for each line with (item_code, batch_no):                    │
//! │       │       deplete_for_line()                                       │
//! │       │         ├── batch missing   → skip (tolerated)                 │
//! │       │         ├── stock > wanted  → decrement                        │
//! │       │         └── stock <= wanted → delete batch row                 │
//! │       │                                                                 │
//! │  COMMIT ── the bill and every depletion land together, or none do      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Service bills go through the identical insert into `service_bill` but
//! never touch stock.
//!
//! Bills are immutable: there is no update or delete here on purpose. A bill
//! is the legal record of a sale; corrections happen as new bills.

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::{debug, info};

use rxledger_core::validation::validate_bill_lines;
use rxledger_core::{Bill, BillKind, DepletionOutcome, NewBill, ValidationError};

use crate::error::DbResult;
use crate::repository::batch::deplete_for_line;

/// Column list mapping storage names onto the bill row shape.
const BILL_COLUMNS: &str = "id, name AS customer_name, bill_json, \
     total_amount AS total_cents, discount AS discount_cents, \
     net_amount AS net_cents, payment_type, bill_date AS billed_at";

/// Which table a bill kind lives in.
fn table(kind: BillKind) -> &'static str {
    match kind {
        BillKind::Sale => "bill",
        BillKind::Service => "service_bill",
    }
}

/// Raw bill row; `bill_json` is decoded into typed lines on the way out.
#[derive(sqlx::FromRow)]
struct BillRow {
    id: i64,
    customer_name: String,
    bill_json: String,
    total_cents: i64,
    discount_cents: i64,
    net_cents: i64,
    payment_type: String,
    billed_at: chrono::DateTime<chrono::Utc>,
}

impl BillRow {
    fn into_bill(self) -> DbResult<Bill> {
        let lines = serde_json::from_str(&self.bill_json)?;
        Ok(Bill {
            id: self.id,
            customer_name: self.customer_name,
            lines,
            total_cents: self.total_cents,
            discount_cents: self.discount_cents,
            net_cents: self.net_cents,
            payment_type: self.payment_type,
            billed_at: self.billed_at,
        })
    }
}

/// Repository for bill database operations.
#[derive(Debug, Clone)]
pub struct BillRepository {
    pool: SqlitePool,
}

impl BillRepository {
    /// Creates a new BillRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BillRepository { pool }
    }

    fn validate(new: &NewBill) -> DbResult<()> {
        if new.customer_name.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "customer_name".to_string(),
            }
            .into());
        }
        validate_bill_lines(new.lines.len())?;
        Ok(())
    }

    /// Issues a sale bill: archives the bill and depletes its stock, as one
    /// transaction.
    ///
    /// Lines that carry both an item code and a batch number are depleted;
    /// free-text lines and lines whose batch has since vanished are archived
    /// verbatim without touching stock. Totals are caller-supplied and stored
    /// as given.
    ///
    /// ## Returns
    /// * `Ok(Bill)` - The archived bill with its assigned number
    /// * `Err(DbError::Validation)` - Missing customer name or empty lines
    pub async fn create(&self, new: &NewBill) -> DbResult<Bill> {
        Self::validate(new)?;

        let bill_json = serde_json::to_string(&new.lines)?;
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(&format!(
            "INSERT INTO {} (name, bill_json, total_amount, discount, net_amount, payment_type, bill_date) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
             RETURNING id",
            table(BillKind::Sale)
        ))
        .bind(&new.customer_name)
        .bind(&bill_json)
        .bind(new.total_cents)
        .bind(new.discount_cents)
        .bind(new.net_cents)
        .bind(&new.payment_type)
        .bind(new.billed_at)
        .fetch_one(&mut *tx)
        .await?;

        let mut reduced = 0u32;
        let mut removed = 0u32;
        let mut skipped = 0u32;

        for line in &new.lines {
            let (Some(item_code), Some(batch_no)) = (&line.item_code, &line.batch_no) else {
                debug!(bill_id = id, item_name = %line.item_name, "Line carries no stock reference, archiving only");
                continue;
            };
            match deplete_for_line(&mut tx, item_code, batch_no, line.quantity).await? {
                DepletionOutcome::Reduced => reduced += 1,
                DepletionOutcome::Removed => removed += 1,
                DepletionOutcome::Skipped => skipped += 1,
            }
        }

        tx.commit().await?;

        info!(
            bill_id = id,
            lines = new.lines.len(),
            reduced,
            removed,
            skipped,
            net_cents = new.net_cents,
            "Sale bill issued"
        );

        Ok(Bill {
            id,
            customer_name: new.customer_name.clone(),
            lines: new.lines.clone(),
            total_cents: new.total_cents,
            discount_cents: new.discount_cents,
            net_cents: new.net_cents,
            payment_type: new.payment_type.clone(),
            billed_at: new.billed_at,
        })
    }

    /// Issues a service bill (dressings, injections, consultations).
    ///
    /// Identical shape to a sale bill, separate ledger, and no stock is
    /// touched regardless of what the lines reference.
    pub async fn create_service(&self, new: &NewBill) -> DbResult<Bill> {
        Self::validate(new)?;

        let bill_json = serde_json::to_string(&new.lines)?;

        let id: i64 = sqlx::query_scalar(&format!(
            "INSERT INTO {} (name, bill_json, total_amount, discount, net_amount, payment_type, bill_date) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
             RETURNING id",
            table(BillKind::Service)
        ))
        .bind(&new.customer_name)
        .bind(&bill_json)
        .bind(new.total_cents)
        .bind(new.discount_cents)
        .bind(new.net_cents)
        .bind(&new.payment_type)
        .bind(new.billed_at)
        .fetch_one(&self.pool)
        .await?;

        info!(bill_id = id, net_cents = new.net_cents, "Service bill issued");

        Ok(Bill {
            id,
            customer_name: new.customer_name.clone(),
            lines: new.lines.clone(),
            total_cents: new.total_cents,
            discount_cents: new.discount_cents,
            net_cents: new.net_cents,
            payment_type: new.payment_type.clone(),
            billed_at: new.billed_at,
        })
    }

    /// Gets one bill by number from the given ledger.
    pub async fn get(&self, kind: BillKind, id: i64) -> DbResult<Option<Bill>> {
        let row = sqlx::query_as::<_, BillRow>(&format!(
            "SELECT {BILL_COLUMNS} FROM {} WHERE id = ?1",
            table(kind)
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(BillRow::into_bill).transpose()
    }

    /// Lists bills from the given ledger, newest first.
    ///
    /// ## Arguments
    /// * `on` - When given, only bills issued on that calendar day (the
    ///   end-of-day report)
    pub async fn list(&self, kind: BillKind, on: Option<NaiveDate>) -> DbResult<Vec<Bill>> {
        let rows = sqlx::query_as::<_, BillRow>(&format!(
            "SELECT {BILL_COLUMNS} FROM {} \
             WHERE (?1 IS NULL OR date(bill_date) = ?1) \
             ORDER BY bill_date DESC, id DESC",
            table(kind)
        ))
        .bind(on)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(BillRow::into_bill).collect()
    }

    /// Counts bills in the given ledger (for diagnostics and the seed tool).
    pub async fn count(&self, kind: BillKind) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table(kind)))
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
