//! # Month-Granularity Date Rules
//!
//! Pharmacy stock is dated by month, not by day. Suppliers print "MFG 01/2024
//! EXP 01/2026" on the strip; the day component on a delivery note is noise.
//! Every batch date in the ledger is therefore normalized to the first of its
//! month, and every expiry comparison is month-granular.
//!
//! ## The Expiry Boundary
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  today = 2026-08-30                                                     │
//! │                                                                         │
//! │  exp_date 2026-08-01  →  EXPIRED   (first of the current month counts) │
//! │  exp_date 2026-09-01  →  ok        (expires next month)                │
//! │                                                                         │
//! │  A strip stamped "EXP 08/2026" cannot be dispensed in August 2026 -    │
//! │  the printed month is the last month of manufacture warranty, and      │
//! │  the ledger flags it for write-off as soon as that month starts.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Datelike, Months, NaiveDate};

/// Normalizes a date to the first day of its month.
///
/// ## Example
/// ```rust
/// use rxledger_core::dates::first_of_month;
/// use chrono::NaiveDate;
///
/// let d = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
/// assert_eq!(first_of_month(d), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
/// ```
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    // Day 1 always exists, so the unwrap-free with_day cannot fail here;
    // fall back to the input to keep the function total.
    date.with_day(1).unwrap_or(date)
}

/// Whole months between a manufacture date and an expiry date.
///
/// Used to back-compute an item's shelf life when it is created implicitly
/// from its first batch. A partial month does not count:
/// 2024-01-15 → 2026-01-14 is 23 months, not 24.
///
/// Returns 0 when `exp` is not after `mfg`.
pub fn shelf_life_months(mfg: NaiveDate, exp: NaiveDate) -> i64 {
    let mut months = (exp.year() as i64 - mfg.year() as i64) * 12
        + (exp.month() as i64 - mfg.month() as i64);
    if exp.day() < mfg.day() {
        months -= 1;
    }
    months.max(0)
}

/// Default expiry for a manufacture date and a shelf life in months.
///
/// Restock forms pre-fill the expiry field from the item's shelf-life policy;
/// the user only corrects it when the supplier says otherwise. Month-end
/// days are clamped (2024-01-31 + 1 month = 2024-02-29).
pub fn default_expiry(mfg: NaiveDate, months: i64) -> NaiveDate {
    if months <= 0 {
        return mfg;
    }
    mfg.checked_add_months(Months::new(months as u32))
        .unwrap_or(mfg)
}

/// Whether a batch expiring on `exp` is expired as of `as_of`.
///
/// Month-granular: both sides are normalized to the first of their month,
/// and the boundary counts as expired.
///
/// ## Example
/// ```rust
/// use rxledger_core::dates::is_expired;
/// use chrono::NaiveDate;
///
/// let today = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
/// let this_month = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
/// let next_month = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
///
/// assert!(is_expired(this_month, today));
/// assert!(!is_expired(next_month, today));
/// ```
pub fn is_expired(exp: NaiveDate, as_of: NaiveDate) -> bool {
    first_of_month(exp) <= first_of_month(as_of)
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
    fn test_first_of_month() {
        assert_eq!(first_of_month(d(2024, 1, 15)), d(2024, 1, 1));
        assert_eq!(first_of_month(d(2026, 12, 31)), d(2026, 12, 1));
        assert_eq!(first_of_month(d(2026, 3, 1)), d(2026, 3, 1));
    }

    #[test]
    fn test_shelf_life_whole_months() {
        assert_eq!(shelf_life_months(d(2024, 1, 15), d(2026, 1, 20)), 24);
        // Partial month does not count
        assert_eq!(shelf_life_months(d(2024, 1, 15), d(2026, 1, 14)), 23);
        // Same date = zero
        assert_eq!(shelf_life_months(d(2024, 1, 15), d(2024, 1, 15)), 0);
        // Expiry before manufacture clamps to zero
        assert_eq!(shelf_life_months(d(2024, 6, 1), d(2024, 1, 1)), 0);
    }

    #[test]
    fn test_default_expiry() {
        assert_eq!(default_expiry(d(2024, 1, 1), 24), d(2026, 1, 1));
        // Month-end clamping
        assert_eq!(default_expiry(d(2024, 1, 31), 1), d(2024, 2, 29));
        // Non-positive shelf life is a no-op
        assert_eq!(default_expiry(d(2024, 1, 1), 0), d(2024, 1, 1));
    }

    #[test]
    fn test_expiry_boundary() {
        let today = d(2026, 8, 30);

        // First of the current month: already expired
        assert!(is_expired(d(2026, 8, 1), today));
        // Any day this month normalizes to the same verdict
        assert!(is_expired(d(2026, 8, 31), today));
        // Next month: still good
        assert!(!is_expired(d(2026, 9, 1), today));
        // Long past
        assert!(is_expired(d(2025, 1, 1), today));
    }
}
