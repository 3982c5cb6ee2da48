//! Entry id utilities

use uuid::Uuid;

/// Generate a fresh entry id
///
/// Ids are opaque strings; the engine only relies on uniqueness.
pub fn generate() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Check whether a caller-supplied id is usable
pub fn is_valid(id: &str) -> bool {
    !id.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = generate();
        let b = generate();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn test_blank_ids_rejected() {
        assert!(!is_valid(""));
        assert!(!is_valid("   "));
        assert!(is_valid("a1"));
    }
}
