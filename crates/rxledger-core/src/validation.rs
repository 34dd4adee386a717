//! # Validation Module
//!
//! Input validation utilities for RxLedger.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Presentation (forms)                                         │
//! │  ├── Parses user-entered dates and numbers                             │
//! │  └── THIS MODULE: business rule validation, immediate feedback         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Repositories (rxledger-db)                                   │
//! │  ├── Derived-code identity check, quantity ≥ 0 invariant               │
//! │  └── Everything else is trusted from Layer 1                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE (item_code, batch_no)                                      │
//! │  └── Foreign key cascade                                               │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::MAX_LINE_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an item display name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must be at most 64 characters
/// - Must contain at least one alphanumeric character (otherwise the derived
///   code would be empty and could not serve as an identity)
pub fn validate_item_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 64 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 64,
        });
    }

    if !name.chars().any(|c| c.is_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "name".to_string(),
            reason: "must contain at least one letter or digit".to_string(),
        });
    }

    Ok(())
}

/// Validates a supplier batch number.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 100 characters (matches the column width)
pub fn validate_batch_no(batch_no: &str) -> ValidationResult<()> {
    let batch_no = batch_no.trim();

    if batch_no.is_empty() {
        return Err(ValidationError::Required {
            field: "batch_no".to_string(),
        });
    }

    if batch_no.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "batch_no".to_string(),
            max: 100,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a restock or bill-line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY
///
/// Note: an absolute batch *edit* may legitimately pass zero (which deletes
/// the batch); that path checks for negatives itself instead of using this.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// ## Rules
/// - Must be positive (> 0); the pharmacy does not stock free items
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the line items of a bill about to be created.
///
/// ## Rules
/// - Must have at least one line
/// - Must not exceed MAX_BILL_LINES
pub fn validate_bill_lines(line_count: usize) -> ValidationResult<()> {
    if line_count == 0 {
        return Err(ValidationError::Required {
            field: "lines".to_string(),
        });
    }

    if line_count > crate::MAX_BILL_LINES {
        return Err(ValidationError::OutOfRange {
            field: "lines".to_string(),
            min: 1,
            max: crate::MAX_BILL_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_item_name() {
        assert!(validate_item_name("Paracetamol 500").is_ok());
        assert!(validate_item_name("  Aspirin  ").is_ok());

        assert!(validate_item_name("").is_err());
        assert!(validate_item_name("   ").is_err());
        assert!(validate_item_name("!!! ---").is_err());
        assert!(validate_item_name(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_batch_no() {
        assert!(validate_batch_no("B1").is_ok());
        assert!(validate_batch_no("AMX-2024-07").is_ok());

        assert!(validate_batch_no("").is_err());
        assert!(validate_batch_no(&"B".repeat(200)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(250).is_ok());

        assert!(validate_price_cents(0).is_err());
        assert!(validate_price_cents(-100).is_err());
    }

    #[test]
    fn test_validate_bill_lines() {
        assert!(validate_bill_lines(1).is_ok());
        assert!(validate_bill_lines(100).is_ok());

        assert!(validate_bill_lines(0).is_err());
        assert!(validate_bill_lines(101).is_err());
    }
}
