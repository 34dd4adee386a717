//! # Item Repository
//!
//! Database operations for the catalog (items master).
//!
//! ## Identity Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │               How Item Identity Works                                   │
//! │                                                                         │
//! │  User types name: "Aspirin!"                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  derive_code() strips non-alphanumerics, lowercases                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  code = "aspirin"                                                      │
//! │       │                                                                 │
//! │       ├── already in catalog? → DuplicateCode (even if the display     │
//! │       │                         names differ - the CODE is identity)   │
//! │       │                                                                 │
//! │       └── free → INSERT item                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Items are also created implicitly: registering the first delivery of an
//! unknown item creates the catalog entry and its first batch in one
//! transaction, back-computing the shelf life from the supplied dates.

use sqlx::{QueryBuilder, SqlitePool};
use tracing::{debug, info};

use chrono::NaiveDate;
use rxledger_core::code::derive_code;
use rxledger_core::dates::shelf_life_months;
use rxledger_core::validation::{validate_item_name, validate_price_cents, validate_quantity};
use rxledger_core::{Batch, Item};

use crate::error::{DbError, DbResult};
use crate::repository::batch;

/// Column list mapping storage names onto the `Item` struct.
const ITEM_COLUMNS: &str = "code, name, price AS price_cents, life_cycle AS shelf_life_months";

/// Repository for catalog database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ItemRepository::new(pool);
///
/// let item = repo.create("Paracetamol 500", 250, Some(24)).await?;
/// assert_eq!(item.code, "paracetamol500");
/// ```
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Creates a catalog item, deriving its code from the name.
    ///
    /// ## Arguments
    /// * `name` - Display name; the code is derived from it
    /// * `price_cents` - Unit sale price in cents (must be positive)
    /// * `shelf_life_months` - Months-from-manufacture expiry policy, if known
    ///
    /// ## Returns
    /// * `Ok(Item)` - Created item with its derived code
    /// * `Err(DbError::DuplicateCode)` - An item with that code exists
    /// * `Err(DbError::Validation)` - Empty/invalid name or non-positive price
    pub async fn create(
        &self,
        name: &str,
        price_cents: i64,
        shelf_life_months: Option<i64>,
    ) -> DbResult<Item> {
        validate_item_name(name)?;
        validate_price_cents(price_cents)?;

        let code = derive_code(name);
        debug!(code = %code, name = %name, "Creating item");

        // Collisions on the derived code are the duplicate check, not name
        // equality; the PK constraint backstops this check.
        let taken: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM item WHERE code = ?1")
            .bind(&code)
            .fetch_one(&self.pool)
            .await?;
        if taken > 0 {
            return Err(DbError::duplicate(&code));
        }

        sqlx::query("INSERT INTO item (code, name, price, life_cycle) VALUES (?1, ?2, ?3, ?4)")
            .bind(&code)
            .bind(name)
            .bind(price_cents)
            .bind(shelf_life_months)
            .execute(&self.pool)
            .await?;

        Ok(Item {
            code,
            name: name.to_string(),
            price_cents,
            shelf_life_months,
        })
    }

    /// Registers a delivery of an item that may not be in the catalog yet.
    ///
    /// ## What This Does
    /// Inside one transaction:
    /// 1. Derives the code from `name`; if no such item exists, inserts it
    ///    with shelf life back-computed as whole months between `mfg` and
    ///    `exp`
    /// 2. Merge-upserts the batch (additive quantity, last-write-wins dates)
    ///
    /// This is the restock fast path: the clerk types what is on the carton
    /// and the catalog keeps itself consistent.
    pub async fn create_with_first_batch(
        &self,
        name: &str,
        batch_no: &str,
        quantity: i64,
        price_cents: i64,
        mfg: NaiveDate,
        exp: NaiveDate,
    ) -> DbResult<(Item, Batch)> {
        validate_item_name(name)?;
        validate_price_cents(price_cents)?;
        validate_quantity(quantity)?;

        let code = derive_code(name);
        let mut tx = self.pool.begin().await?;

        let existing: Option<Item> =
            sqlx::query_as::<_, Item>(&format!("SELECT {ITEM_COLUMNS} FROM item WHERE code = ?1"))
                .bind(&code)
                .fetch_optional(&mut *tx)
                .await?;

        let item = match existing {
            Some(item) => item,
            None => {
                let life = shelf_life_months(mfg, exp);
                debug!(code = %code, shelf_life_months = life, "Implicitly creating item from delivery");

                sqlx::query(
                    "INSERT INTO item (code, name, price, life_cycle) VALUES (?1, ?2, ?3, ?4)",
                )
                .bind(&code)
                .bind(name)
                .bind(price_cents)
                .bind(life)
                .execute(&mut *tx)
                .await?;

                Item {
                    code: code.clone(),
                    name: name.to_string(),
                    price_cents,
                    shelf_life_months: Some(life),
                }
            }
        };

        let batch =
            batch::upsert_on(&mut tx, &item.code, batch_no, quantity, price_cents, mfg, exp)
                .await?;

        tx.commit().await?;

        info!(code = %item.code, batch_no = %batch.batch_no, quantity = batch.quantity, "Delivery registered");
        Ok((item, batch))
    }

    /// Gets an item by its derived code.
    ///
    /// ## Returns
    /// * `Ok(Some(Item))` - Item found
    /// * `Ok(None)` - No item with that code
    pub async fn get(&self, code: &str) -> DbResult<Option<Item>> {
        let item =
            sqlx::query_as::<_, Item>(&format!("SELECT {ITEM_COLUMNS} FROM item WHERE code = ?1"))
                .bind(code)
                .fetch_optional(&self.pool)
                .await?;

        Ok(item)
    }

    /// Lists catalog items ordered by code.
    ///
    /// ## Arguments
    /// * `codes` - When given, restricts the listing to those codes (used by
    ///   edit forms to load a known subset); when `None`, lists everything.
    pub async fn list(&self, codes: Option<&[String]>) -> DbResult<Vec<Item>> {
        let items = match codes {
            None => {
                sqlx::query_as::<_, Item>(&format!(
                    "SELECT {ITEM_COLUMNS} FROM item ORDER BY code"
                ))
                .fetch_all(&self.pool)
                .await?
            }
            Some([]) => Vec::new(),
            Some(codes) => {
                let mut qb: QueryBuilder<sqlx::Sqlite> =
                    QueryBuilder::new(format!("SELECT {ITEM_COLUMNS} FROM item WHERE code IN ("));
                let mut separated = qb.separated(", ");
                for code in codes {
                    separated.push_bind(code);
                }
                qb.push(") ORDER BY code");

                qb.build_query_as::<Item>().fetch_all(&self.pool).await?
            }
        };

        Ok(items)
    }

    /// Updates an existing item.
    ///
    /// The code is identity and never changes; editing the name only changes
    /// what is displayed and printed.
    ///
    /// ## Returns
    /// * `Ok(Item)` - Updated item
    /// * `Err(DbError::NotFound)` - No item with that code
    pub async fn update(
        &self,
        code: &str,
        name: &str,
        price_cents: i64,
        shelf_life_months: Option<i64>,
    ) -> DbResult<Item> {
        validate_item_name(name)?;
        validate_price_cents(price_cents)?;

        debug!(code = %code, "Updating item");

        let result =
            sqlx::query("UPDATE item SET name = ?2, price = ?3, life_cycle = ?4 WHERE code = ?1")
                .bind(code)
                .bind(name)
                .bind(price_cents)
                .bind(shelf_life_months)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", code));
        }

        Ok(Item {
            code: code.to_string(),
            name: name.to_string(),
            price_cents,
            shelf_life_months,
        })
    }

    /// Deletes an item and, through the FK cascade, all of its batches.
    ///
    /// Irreversible. The boundary that calls this is responsible for the
    /// explicit "this removes N batches" confirmation.
    ///
    /// ## Returns
    /// * `Ok(())` - Item and its batches are gone
    /// * `Err(DbError::NotFound)` - No item with that code
    pub async fn delete(&self, code: &str) -> DbResult<()> {
        info!(code = %code, "Deleting item (cascades to batches)");

        let result = sqlx::query("DELETE FROM item WHERE code = ?1")
            .bind(code)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", code));
        }

        Ok(())
    }

    /// Counts catalog items (for diagnostics and the seed tool).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM item")
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
    use crate::pool::{Database, DbConfig};
    use crate::error::DbError;
    use chrono::NaiveDate;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[tokio::test]
    async fn test_create_derives_code() {
        let db = test_db().await;

        let item = db.items().create("Paracetamol 500", 250, Some(24)).await.unwrap();
        assert_eq!(item.code, "paracetamol500");
        assert_eq!(item.price_cents, 250);
    }

    #[tokio::test]
    async fn test_duplicate_is_checked_on_code_not_name() {
        let db = test_db().await;

        db.items().create("aspirin", 550, None).await.unwrap();

        // Different display name, same derived code
        let err = db.items().create("Aspirin!", 600, None).await.unwrap_err();
        assert!(matches!(err, DbError::DuplicateCode { .. }));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_input() {
        let db = test_db().await;

        assert!(matches!(
            db.items().create("", 100, None).await.unwrap_err(),
            DbError::Validation(_)
        ));
        assert!(matches!(
            db.items().create("!!!", 100, None).await.unwrap_err(),
            DbError::Validation(_)
        ));
        assert!(matches!(
            db.items().create("Aspirin", 0, None).await.unwrap_err(),
            DbError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_list_ordered_by_code_with_optional_filter() {
        let db = test_db().await;
        let items = db.items();

        items.create("Zinc", 300, None).await.unwrap();
        items.create("Aspirin", 550, None).await.unwrap();
        items.create("Metformin", 420, None).await.unwrap();

        let all = items.list(None).await.unwrap();
        let codes: Vec<_> = all.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec!["aspirin", "metformin", "zinc"]);

        let some = items
            .list(Some(&["zinc".to_string(), "aspirin".to_string()]))
            .await
            .unwrap();
        let codes: Vec<_> = some.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec!["aspirin", "zinc"]);

        let none = items.list(Some(&[])).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_update_keeps_code_stable() {
        let db = test_db().await;

        db.items().create("Aspirin", 550, Some(36)).await.unwrap();
        let updated = db
            .items()
            .update("aspirin", "Aspirin 75mg", 600, Some(48))
            .await
            .unwrap();

        assert_eq!(updated.code, "aspirin");
        assert_eq!(updated.name, "Aspirin 75mg");
        assert_eq!(updated.price_cents, 600);

        let fetched = db.items().get("aspirin").await.unwrap().unwrap();
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown_item() {
        let db = test_db().await;

        assert!(matches!(
            db.items().update("ghost", "Ghost", 100, None).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
        assert!(matches!(
            db.items().delete("ghost").await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_batches() {
        let db = test_db().await;

        db.items().create("Aspirin", 550, Some(36)).await.unwrap();
        for n in ["B1", "B2", "B3"] {
            db.batches()
                .upsert("aspirin", n, 10, 550, d(2025, 1, 1), d(2027, 1, 1))
                .await
                .unwrap();
        }
        assert_eq!(
            db.batches().list(Some("aspirin"), None, true).await.unwrap().len(),
            3
        );

        db.items().delete("aspirin").await.unwrap();

        assert!(db.items().get("aspirin").await.unwrap().is_none());
        assert!(db.batches().list(Some("aspirin"), None, true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_with_first_batch_back_computes_shelf_life() {
        let db = test_db().await;

        let (item, batch) = db
            .items()
            .create_with_first_batch(
                "Paracetamol 500",
                "B1",
                100,
                250,
                d(2024, 1, 15),
                d(2026, 1, 20),
            )
            .await
            .unwrap();

        assert_eq!(item.code, "paracetamol500");
        assert_eq!(item.shelf_life_months, Some(24));

        // Dates are stored first-of-month
        assert_eq!(batch.mfg_date, d(2024, 1, 1));
        assert_eq!(batch.exp_date, d(2026, 1, 1));
        assert_eq!(batch.quantity, 100);
    }

    #[tokio::test]
    async fn test_create_with_first_batch_merges_into_existing() {
        let db = test_db().await;

        db.items().create("Paracetamol 500", 250, Some(24)).await.unwrap();
        db.batches()
            .upsert("paracetamol500", "B1", 10, 250, d(2024, 1, 1), d(2026, 1, 1))
            .await
            .unwrap();

        // Same item, same batch number: quantity accumulates, item untouched
        let (item, batch) = db
            .items()
            .create_with_first_batch(
                "Paracetamol 500",
                "B1",
                5,
                260,
                d(2024, 2, 10),
                d(2026, 2, 10),
            )
            .await
            .unwrap();

        assert_eq!(item.shelf_life_months, Some(24)); // existing policy kept
        assert_eq!(batch.quantity, 15);
        assert_eq!(batch.price_cents, 260);
        assert_eq!(batch.mfg_date, d(2024, 2, 1));
    }
}
