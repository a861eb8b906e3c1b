//! # Content Digest
//!
//! SHA-256 over [`CanonicalBytes`]. Derived schema artifacts are keyed by the
//! digest of the schema they came from, so two schema documents that differ
//! only in key order or number spelling share one cache entry.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;
use crate::error::CanonicalizationError;

/// A 32-byte SHA-256 content digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContentDigest {
    /// The raw digest.
    pub bytes: [u8; 32],
}

impl ContentDigest {
    /// Wrap raw digest bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Digest of any serializable value, through [`CanonicalBytes`].
    pub fn of(value: &impl Serialize) -> Result<Self, CanonicalizationError> {
        Ok(sha256_digest(&CanonicalBytes::new(value)?))
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sha256:{}", self.to_hex())
    }
}

/// Compute the SHA-256 digest of canonical bytes.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    let hash = Sha256::digest(data.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    ContentDigest::new(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_digest_is_deterministic() {
        let a = ContentDigest::of(&json!({"type": "string", "minLength": 2})).unwrap();
        let b = ContentDigest::of(&json!({"minLength": 2, "type": "string"})).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_schemas_differ() {
        let a = ContentDigest::of(&json!({"type": "string"})).unwrap();
        let b = ContentDigest::of(&json!({"type": "number"})).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hex_and_display_format() {
        let digest = ContentDigest::of(&json!({"a": 1})).unwrap();
        let hex = digest.to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(digest.to_string(), format!("sha256:{hex}"));
    }

    #[test]
    fn test_known_vector_for_empty_object() {
        let cb = CanonicalBytes::new(&json!({})).unwrap();
        assert_eq!(
            sha256_digest(&cb).to_hex(),
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }
}
