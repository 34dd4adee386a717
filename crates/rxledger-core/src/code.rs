//! # Item Code Derivation
//!
//! The catalog does not let users pick item identifiers. An item's code is
//! **derived** from its display name: strip everything that is not a letter
//! or digit, lowercase what remains.
//!
//! ```text
//! "Paracetamol 500"  →  "paracetamol500"
//! "A-B c1!"          →  "abc1"
//! "Aspirin!"         →  "aspirin"   (collides with "aspirin" - same item!)
//! ```
//!
//! Collisions on the derived code are the duplicate check, not name
//! equality. Two spellings of the same drug normalize to one catalog entry.

/// Derives an item code from a display name.
///
/// Pure and idempotent: deriving twice from the same name (or from the
/// derived code itself) yields the same code.
///
/// ## Example
/// ```rust
/// use rxledger_core::code::derive_code;
///
/// assert_eq!(derive_code("Paracetamol 500"), "paracetamol500");
/// assert_eq!(derive_code("A-B c1!"), "abc1");
/// assert_eq!(derive_code(&derive_code("A-B c1!")), "abc1");
/// ```
pub fn derive_code(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_and_lowercases() {
        assert_eq!(derive_code("A-B c1!"), "abc1");
        assert_eq!(derive_code("Paracetamol 500"), "paracetamol500");
        assert_eq!(derive_code("Amoxicillin (250mg)"), "amoxicillin250mg");
    }

    #[test]
    fn test_idempotent() {
        let once = derive_code("A-B c1!");
        let twice = derive_code(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_collision_by_code_not_name() {
        // Different display names, same identity
        assert_eq!(derive_code("Aspirin!"), derive_code("aspirin"));
    }

    #[test]
    fn test_symbols_only_derives_empty() {
        // The caller must reject this before it becomes a primary key
        assert_eq!(derive_code("!!! --- !!!"), "");
    }
}
