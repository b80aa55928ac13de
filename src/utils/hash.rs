//! Content-derived identifiers using blake3.
//!
//! # Usage
//!
//! ```ignore
//! use crate::utils::hash;
//!
//! let key = hash::bundle_key("Home"); // -> 32 hex chars, stable across runs
//! ```

/// Length of a bundle key in hex characters.
pub const BUNDLE_KEY_LEN: usize = 32;

/// Derive the bundle key for a page name.
///
/// Deterministic: the same name always yields the same key, so a page keeps
/// its output path across rebuilds and restarts.
#[inline]
pub fn bundle_key(name: &str) -> String {
    let digest = blake3::hash(name.as_bytes());
    let mut key = hex::encode(digest.as_bytes());
    key.truncate(BUNDLE_KEY_LEN);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_key_is_stable() {
        assert_eq!(bundle_key("Home"), bundle_key("Home"));
        assert_eq!(bundle_key("Home").len(), BUNDLE_KEY_LEN);
    }

    #[test]
    fn bundle_key_differs_by_name() {
        assert_ne!(bundle_key("Home"), bundle_key("About"));
    }

    #[test]
    fn bundle_key_is_lowercase_hex() {
        assert!(
            bundle_key("Home")
                .chars()
                .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
        );
    }
}
