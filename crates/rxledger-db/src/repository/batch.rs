//! # Batch Repository
//!
//! The stock ledger: dated batches keyed by `(item_code, batch_no)`.
//!
//! ## Merge-On-Restock
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                How Restocking Works                                     │
//! │                                                                         │
//! │  Delivery arrives: item "paracetamol500", batch "B1", 50 units         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT .. ON CONFLICT(item_code, batch_no) DO UPDATE                  │
//! │       │                                                                 │
//! │       ├── no such batch → new row, quantity 50                         │
//! │       │                                                                 │
//! │       └── batch exists  → quantity += 50 (ADDITIVE)                    │
//! │                           price/mfg/exp ← delivery values              │
//! │                           (last delivery wins the metadata)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two write styles coexist and must not be confused:
//! - `upsert` is RELATIVE: restock quantities accumulate
//! - `edit` is ABSOLUTE: a stock-take correction replaces the row outright,
//!   and correcting to zero deletes the row
//!
//! Depletion ([`deplete_for_line`]) is not exposed on the repository struct:
//! it takes a live transaction connection because it only ever runs inside
//! billing's transaction.

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use rxledger_core::dates::first_of_month;
use rxledger_core::validation::{validate_batch_no, validate_price_cents, validate_quantity};
use rxledger_core::{Batch, BatchEdit, BatchView, DepletionOutcome, ValidationError};

use crate::error::{DbError, DbResult};

/// Column list mapping storage names onto the `Batch` struct.
const BATCH_COLUMNS: &str =
    "id, item_code, batch_no, quantity, price AS price_cents, mfg_date, exp_date";

/// Row shape for the reporting join; `expired` is derived afterwards.
#[derive(sqlx::FromRow)]
struct BatchJoinRow {
    id: i64,
    item_code: String,
    item_name: String,
    batch_no: String,
    quantity: i64,
    price_cents: i64,
    mfg_date: NaiveDate,
    exp_date: NaiveDate,
}

impl BatchJoinRow {
    fn into_view(self, as_of: NaiveDate) -> BatchView {
        let expired = rxledger_core::dates::is_expired(self.exp_date, as_of);
        BatchView {
            id: self.id,
            item_code: self.item_code,
            item_name: self.item_name,
            batch_no: self.batch_no,
            quantity: self.quantity,
            price_cents: self.price_cents,
            mfg_date: self.mfg_date,
            exp_date: self.exp_date,
            expired,
        }
    }
}

/// Merge-upserts one delivery into the ledger on an existing connection.
///
/// Quantity is additive; price and dates are last-write-wins. Dates are
/// normalized to first-of-month before they are stored. Used by
/// [`BatchRepository::upsert`] and by the item repository's delivery
/// transaction.
pub(crate) async fn upsert_on(
    conn: &mut SqliteConnection,
    item_code: &str,
    batch_no: &str,
    quantity: i64,
    price_cents: i64,
    mfg: NaiveDate,
    exp: NaiveDate,
) -> DbResult<Batch> {
    let mfg = first_of_month(mfg);
    let exp = first_of_month(exp);

    let batch = sqlx::query_as::<_, Batch>(&format!(
        "INSERT INTO batch (item_code, batch_no, quantity, price, mfg_date, exp_date) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
         ON CONFLICT(item_code, batch_no) DO UPDATE SET \
             quantity = quantity + excluded.quantity, \
             price = excluded.price, \
             mfg_date = excluded.mfg_date, \
             exp_date = excluded.exp_date \
         RETURNING {BATCH_COLUMNS}"
    ))
    .bind(item_code)
    .bind(batch_no)
    .bind(quantity)
    .bind(price_cents)
    .bind(mfg)
    .bind(exp)
    .fetch_one(&mut *conn)
    .await?;

    debug!(
        item_code = %item_code,
        batch_no = %batch_no,
        delivered = quantity,
        on_hand = batch.quantity,
        "Batch upserted"
    );
    Ok(batch)
}

/// Depletes one bill line's stock on an existing (transaction) connection.
///
/// ## Semantics
/// - Batch missing → [`DepletionOutcome::Skipped`]; billing tolerates stale
///   lines rather than failing the whole bill
/// - Stock > requested → decrement, [`DepletionOutcome::Reduced`]
/// - Stock <= requested → delete the row, [`DepletionOutcome::Removed`];
///   zero-quantity batches never exist at rest
pub async fn deplete_for_line(
    conn: &mut SqliteConnection,
    item_code: &str,
    batch_no: &str,
    requested: i64,
) -> DbResult<DepletionOutcome> {
    let on_hand: Option<i64> =
        sqlx::query_scalar("SELECT quantity FROM batch WHERE item_code = ?1 AND batch_no = ?2")
            .bind(item_code)
            .bind(batch_no)
            .fetch_optional(&mut *conn)
            .await?;

    let Some(on_hand) = on_hand else {
        warn!(item_code = %item_code, batch_no = %batch_no, "Bill line references a missing batch, skipping depletion");
        return Ok(DepletionOutcome::Skipped);
    };

    if on_hand <= requested {
        if on_hand < requested {
            warn!(
                item_code = %item_code,
                batch_no = %batch_no,
                on_hand,
                requested,
                "Bill line oversells batch, removing remainder"
            );
        }
        sqlx::query("DELETE FROM batch WHERE item_code = ?1 AND batch_no = ?2")
            .bind(item_code)
            .bind(batch_no)
            .execute(&mut *conn)
            .await?;
        return Ok(DepletionOutcome::Removed);
    }

    sqlx::query("UPDATE batch SET quantity = quantity - ?3 WHERE item_code = ?1 AND batch_no = ?2")
        .bind(item_code)
        .bind(batch_no)
        .bind(requested)
        .execute(&mut *conn)
        .await?;

    Ok(DepletionOutcome::Reduced)
}

/// Repository for batch-ledger database operations.
#[derive(Debug, Clone)]
pub struct BatchRepository {
    pool: SqlitePool,
}

impl BatchRepository {
    /// Creates a new BatchRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BatchRepository { pool }
    }

    /// Records a delivery: merge-upserts a batch for an existing item.
    ///
    /// ## Returns
    /// * `Ok(Batch)` - The batch after the merge (accumulated quantity)
    /// * `Err(DbError::NotFound)` - No item with that code; use the item
    ///   repository's delivery path to create both at once
    /// * `Err(DbError::Validation)` - Bad batch number, quantity, or price
    pub async fn upsert(
        &self,
        item_code: &str,
        batch_no: &str,
        quantity: i64,
        price_cents: i64,
        mfg: NaiveDate,
        exp: NaiveDate,
    ) -> DbResult<Batch> {
        validate_batch_no(batch_no)?;
        validate_quantity(quantity)?;
        validate_price_cents(price_cents)?;

        let mut tx = self.pool.begin().await?;

        let known: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM item WHERE code = ?1")
            .bind(item_code)
            .fetch_one(&mut *tx)
            .await?;
        if known == 0 {
            return Err(DbError::not_found("Item", item_code));
        }

        let batch = upsert_on(&mut tx, item_code, batch_no, quantity, price_cents, mfg, exp).await?;
        tx.commit().await?;

        Ok(batch)
    }

    /// Gets a batch by its real key, the `(item_code, batch_no)` pair.
    pub async fn get(&self, item_code: &str, batch_no: &str) -> DbResult<Option<Batch>> {
        let batch = sqlx::query_as::<_, Batch>(&format!(
            "SELECT {BATCH_COLUMNS} FROM batch WHERE item_code = ?1 AND batch_no = ?2"
        ))
        .bind(item_code)
        .bind(batch_no)
        .fetch_optional(&self.pool)
        .await?;

        Ok(batch)
    }

    /// Applies a stock-take correction: absolute replacement of a batch row.
    ///
    /// Unlike [`upsert`](Self::upsert), the quantity here is the counted
    /// truth, not a delta. Correcting to zero deletes the row.
    ///
    /// ## Returns
    /// * `Ok(BatchEdit::Updated)` - Row replaced with the corrected values
    /// * `Ok(BatchEdit::Deleted)` - Quantity was zero, row removed
    /// * `Err(DbError::NotFound)` - No such batch for that item
    pub async fn edit(
        &self,
        item_code: &str,
        batch_no: &str,
        quantity: i64,
        price_cents: i64,
        mfg: NaiveDate,
        exp: NaiveDate,
    ) -> DbResult<BatchEdit> {
        if quantity < 0 {
            return Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 0,
                max: rxledger_core::MAX_LINE_QUANTITY,
            }
            .into());
        }
        validate_price_cents(price_cents)?;

        if quantity == 0 {
            info!(item_code = %item_code, batch_no = %batch_no, "Stock-take corrected batch to zero, deleting");
            self.delete(item_code, batch_no).await?;
            return Ok(BatchEdit::Deleted);
        }

        let mfg = first_of_month(mfg);
        let exp = first_of_month(exp);

        let batch = sqlx::query_as::<_, Batch>(&format!(
            "UPDATE batch SET quantity = ?3, price = ?4, mfg_date = ?5, exp_date = ?6 \
             WHERE item_code = ?1 AND batch_no = ?2 \
             RETURNING {BATCH_COLUMNS}"
        ))
        .bind(item_code)
        .bind(batch_no)
        .bind(quantity)
        .bind(price_cents)
        .bind(mfg)
        .bind(exp)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Batch", format!("{item_code}/{batch_no}")))?;

        Ok(BatchEdit::Updated(batch))
    }

    /// Deletes a batch outright (spoilage, recall, write-off).
    pub async fn delete(&self, item_code: &str, batch_no: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM batch WHERE item_code = ?1 AND batch_no = ?2")
            .bind(item_code)
            .bind(batch_no)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(
                "Batch",
                format!("{item_code}/{batch_no}"),
            ));
        }

        Ok(())
    }

    /// Lists batches joined with their item names, flagging expired stock.
    ///
    /// ## Arguments
    /// * `item_code` - Optional code filter
    /// * `expiry_cutoff` - When given, only batches expiring on or before
    ///   this month (write-off reports)
    /// * `exact` - True: `item_code` matches exactly; false: substring match
    ///   (the stock-search box)
    ///
    /// The `expired` flag is computed against the current month; a batch
    /// whose expiry month is this month counts as expired.
    pub async fn list(
        &self,
        item_code: Option<&str>,
        expiry_cutoff: Option<NaiveDate>,
        exact: bool,
    ) -> DbResult<Vec<BatchView>> {
        let cutoff = expiry_cutoff.map(first_of_month);

        let rows = sqlx::query_as::<_, BatchJoinRow>(
            "SELECT b.id, b.item_code, i.name AS item_name, b.batch_no, b.quantity, \
                    b.price AS price_cents, b.mfg_date, b.exp_date \
             FROM batch b \
             JOIN item i ON i.code = b.item_code \
             WHERE (?1 IS NULL OR \
                    (CASE WHEN ?3 THEN b.item_code = ?1 \
                          ELSE instr(b.item_code, ?1) > 0 END)) \
               AND (?2 IS NULL OR b.exp_date <= ?2) \
             ORDER BY b.exp_date, b.item_code, b.batch_no",
        )
        .bind(item_code)
        .bind(cutoff)
        .bind(exact)
        .fetch_all(&self.pool)
        .await?;

        let today = Utc::now().date_naive();
        Ok(rows.into_iter().map(|r| r.into_view(today)).collect())
    }

    /// Counts batch rows (for diagnostics and the seed tool).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM batch")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    async fn seed_item(db: &Database, name: &str, price: i64) -> String {
        db.items().create(name, price, Some(24)).await.unwrap().code
    }

    #[tokio::test]
    async fn test_upsert_creates_then_accumulates() {
        let db = test_db().await;
        let code = seed_item(&db, "Paracetamol 500", 250).await;

        let first = db
            .batches()
            .upsert(&code, "B1", 100, 250, d(2025, 1, 15), d(2027, 1, 15))
            .await
            .unwrap();
        assert_eq!(first.quantity, 100);
        assert_eq!(first.mfg_date, d(2025, 1, 1)); // normalized

        let merged = db
            .batches()
            .upsert(&code, "B1", 50, 260, d(2025, 2, 1), d(2027, 2, 1))
            .await
            .unwrap();

        assert_eq!(merged.id, first.id); // same row, not a second one
        assert_eq!(merged.quantity, 150); // additive
        assert_eq!(merged.price_cents, 260); // last delivery wins
        assert_eq!(merged.exp_date, d(2027, 2, 1));
    }

    #[tokio::test]
    async fn test_same_batch_no_under_different_items() {
        let db = test_db().await;
        let a = seed_item(&db, "Aspirin", 550).await;
        let b = seed_item(&db, "Metformin", 420).await;

        let ba = db
            .batches()
            .upsert(&a, "B1", 10, 550, d(2025, 1, 1), d(2027, 1, 1))
            .await
            .unwrap();
        let bb = db
            .batches()
            .upsert(&b, "B1", 20, 420, d(2025, 1, 1), d(2027, 1, 1))
            .await
            .unwrap();

        // Batch numbers are scoped per item
        assert_ne!(ba.id, bb.id);
        assert_eq!(ba.quantity, 10);
        assert_eq!(bb.quantity, 20);
    }

    #[tokio::test]
    async fn test_upsert_requires_known_item() {
        let db = test_db().await;

        let err = db
            .batches()
            .upsert("ghost", "B1", 10, 100, d(2025, 1, 1), d(2027, 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_edit_is_absolute_and_zero_deletes() {
        let db = test_db().await;
        let code = seed_item(&db, "Aspirin", 550).await;
        db.batches()
            .upsert(&code, "B1", 100, 550, d(2025, 1, 1), d(2027, 1, 1))
            .await
            .unwrap();

        // Stock-take counted 37, not a delta
        let edited = db
            .batches()
            .edit(&code, "B1", 37, 550, d(2025, 1, 1), d(2027, 1, 1))
            .await
            .unwrap();
        match edited {
            BatchEdit::Updated(b) => assert_eq!(b.quantity, 37),
            BatchEdit::Deleted => panic!("expected update"),
        }

        // Counted zero: the row must not survive
        let gone = db
            .batches()
            .edit(&code, "B1", 0, 550, d(2025, 1, 1), d(2027, 1, 1))
            .await
            .unwrap();
        assert_eq!(gone, BatchEdit::Deleted);
        assert!(db.batches().get(&code, "B1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_edit_rejects_negative_quantity() {
        let db = test_db().await;
        let code = seed_item(&db, "Aspirin", 550).await;
        db.batches()
            .upsert(&code, "B1", 10, 550, d(2025, 1, 1), d(2027, 1, 1))
            .await
            .unwrap();

        let err = db
            .batches()
            .edit(&code, "B1", -5, 550, d(2025, 1, 1), d(2027, 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[tokio::test]
    async fn test_edit_unknown_batch() {
        let db = test_db().await;

        let err = db
            .batches()
            .edit("ghost", "B1", 5, 100, d(2025, 1, 1), d(2027, 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_filters_and_expired_flag() {
        let db = test_db().await;
        let asp = seed_item(&db, "Aspirin", 550).await;
        let met = seed_item(&db, "Metformin", 420).await;

        // Long-expired and far-future stock; the flag must not depend on
        // which month the test runs in.
        db.batches()
            .upsert(&asp, "OLD", 5, 550, d(2019, 1, 1), d(2020, 1, 1))
            .await
            .unwrap();
        db.batches()
            .upsert(&asp, "NEW", 50, 550, d(2025, 1, 1), d(2099, 1, 1))
            .await
            .unwrap();
        db.batches()
            .upsert(&met, "M1", 30, 420, d(2025, 1, 1), d(2099, 1, 1))
            .await
            .unwrap();

        let all = db.batches().list(None, None, true).await.unwrap();
        assert_eq!(all.len(), 3);

        let asp_only = db.batches().list(Some("aspirin"), None, true).await.unwrap();
        assert_eq!(asp_only.len(), 2);
        assert!(asp_only.iter().all(|b| b.item_name == "Aspirin"));

        // Substring search: "met" hits metformin only
        let sub = db.batches().list(Some("met"), None, false).await.unwrap();
        assert_eq!(sub.len(), 1);
        assert_eq!(sub[0].item_code, "metformin");

        // Exact match must not behave like substring
        let none = db.batches().list(Some("met"), None, true).await.unwrap();
        assert!(none.is_empty());

        // Write-off report: everything expiring up to 2021
        let writeoff = db
            .batches()
            .list(None, Some(d(2021, 6, 15)), true)
            .await
            .unwrap();
        assert_eq!(writeoff.len(), 1);
        assert_eq!(writeoff[0].batch_no, "OLD");
        assert!(writeoff[0].expired);

        let fresh = all.iter().find(|b| b.batch_no == "NEW").unwrap();
        assert!(!fresh.expired);
    }

    #[tokio::test]
    async fn test_deplete_reduces_removes_and_skips() {
        let db = test_db().await;
        let code = seed_item(&db, "Aspirin", 550).await;
        db.batches()
            .upsert(&code, "B1", 10, 550, d(2025, 1, 1), d(2027, 1, 1))
            .await
            .unwrap();

        // The in-memory pool has one connection: scope each acquisition so
        // the repository reads in between can use it.
        let outcome = {
            let mut conn = db.pool().acquire().await.unwrap();
            deplete_for_line(&mut conn, &code, "B1", 4).await.unwrap()
        };
        // Partial sale: decrement
        assert_eq!(outcome, DepletionOutcome::Reduced);
        assert_eq!(
            db.batches().get(&code, "B1").await.unwrap().unwrap().quantity,
            6
        );

        // Exactly the remaining stock: the row must go, never sit at zero
        let outcome = {
            let mut conn = db.pool().acquire().await.unwrap();
            deplete_for_line(&mut conn, &code, "B1", 6).await.unwrap()
        };
        assert_eq!(outcome, DepletionOutcome::Removed);
        assert!(db.batches().get(&code, "B1").await.unwrap().is_none());

        // Batch is gone now: tolerated, skipped
        let outcome = {
            let mut conn = db.pool().acquire().await.unwrap();
            deplete_for_line(&mut conn, &code, "B1", 1).await.unwrap()
        };
        assert_eq!(outcome, DepletionOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_deplete_oversell_removes_batch() {
        let db = test_db().await;
        let code = seed_item(&db, "Aspirin", 550).await;
        db.batches()
            .upsert(&code, "B1", 3, 550, d(2025, 1, 1), d(2027, 1, 1))
            .await
            .unwrap();

        let outcome = {
            let mut conn = db.pool().acquire().await.unwrap();
            deplete_for_line(&mut conn, &code, "B1", 10).await.unwrap()
        };

        // Requested more than on hand: remainder is written off with the row
        assert_eq!(outcome, DepletionOutcome::Removed);
        assert!(db.batches().get(&code, "B1").await.unwrap().is_none());
    }
}
