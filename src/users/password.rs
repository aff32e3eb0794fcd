use sha2::{Digest, Sha256};

/// SHA-256 hex digest of the submitted plaintext password. The digest, not
/// the plaintext, is what gets persisted.
pub fn hash_password(plain: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plain.as_bytes());
    hex::encode(hasher.finalize())
}
