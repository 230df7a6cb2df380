//! Deterministic identifiers for upstream registrations
//!
//! A registration is addressed upstream by a UUID. When the caller does not
//! bring one, the gateway derives it from the registration's natural key
//! (`username@domain`), so a later unregister finds the same record without
//! any lookup and without state surviving a restart.
//!
//! The derivation is name-based: SHA-256 over the nil namespace followed by
//! the key, truncated to 16 bytes, with the RFC 4122 variant bits and a
//! version nibble of 1. Identifiers issued by earlier gateway deployments
//! used the same layout and must keep resolving, so none of these constants
//! may change.
//!
//! ```rust
//! use kamrpc_core::ident;
//!
//! let id = ident::resolve_id(None, "1000", "test.com");
//! assert_eq!(id, "1648c7d7-278b-174e-9983-62b9463fef1c");
//! assert_eq!(ident::resolve_id(Some("mine"), "1000", "test.com"), "mine");
//! ```

use sha2::{Digest, Sha256};
use uuid::{Builder, Uuid, Variant, Version};

/// Derive the identifier for a natural key
///
/// Pure function of `natural_key`: same input, same output, every process.
/// The empty key is valid and yields a fixed identifier.
pub fn derive_id(natural_key: &str) -> String {
    derive_uuid(natural_key).hyphenated().to_string()
}

/// Same as [`derive_id`] but keeps the typed UUID
pub fn derive_uuid(natural_key: &str) -> Uuid {
    let mut hasher = Sha256::new();
    hasher.update(Uuid::nil().as_bytes());
    hasher.update(natural_key.as_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);

    Builder::from_bytes(bytes)
        .with_variant(Variant::RFC4122)
        .with_version(Version::Mac)
        .into_uuid()
}

/// Compose the natural key of a registration
pub fn natural_key(username: &str, domain: &str) -> String {
    format!("{}@{}", username, domain)
}

/// Pick the identifier for a registration call
///
/// A non-empty explicit id always wins. An absent or empty one falls back
/// to the identifier derived from `username@domain`.
pub fn resolve_id(explicit: Option<&str>, username: &str, domain: &str) -> String {
    match explicit {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => derive_id(&natural_key(username, domain)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vectors() {
        assert_eq!(
            derive_id("1000@test.com"),
            "1648c7d7-278b-174e-9983-62b9463fef1c"
        );
        assert_eq!(
            derive_id("1001@test.com"),
            "5b993663-6512-12c9-b22b-1927a783a8c1"
        );
        assert_eq!(
            derive_id("alice@example.org"),
            "a677af11-c61a-1c84-969f-6250be081025"
        );
    }

    #[test]
    fn test_empty_key_is_stable() {
        assert_eq!(derive_id(""), "374708ff-f771-1dd5-979e-c875d56cd228");
        assert_eq!(derive_id(""), derive_id(""));
    }

    #[test]
    fn test_deterministic_and_distinct() {
        let keys = ["a@b", "a@c", "b@b", "user@domain", "user@domain.", ""];
        for key in keys {
            assert_eq!(derive_id(key), derive_id(key));
        }
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(derive_id(a), derive_id(b), "{} vs {}", a, b);
            }
        }
    }

    #[test]
    fn test_version_and_variant_bits() {
        let id = derive_uuid("1000@test.com");
        assert_eq!(id.get_version_num(), 1);
        assert_eq!(id.get_variant(), Variant::RFC4122);
    }

    #[test]
    fn test_resolve_id() {
        assert_eq!(resolve_id(Some("explicit"), "1000", "test.com"), "explicit");
        assert_eq!(
            resolve_id(Some(""), "1000", "test.com"),
            "1648c7d7-278b-174e-9983-62b9463fef1c"
        );
        assert_eq!(
            resolve_id(None, "1000", "test.com"),
            derive_id(&natural_key("1000", "test.com"))
        );
    }
}
