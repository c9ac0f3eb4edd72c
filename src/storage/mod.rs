//! Storage collaborator seam.
//!
//! The inference core only ever reads an uploaded file by key; writes exist
//! for the upload side and for seeding fixtures.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{Hc50Error, Result, StorageFailure};

/// Content type recorded for uploaded descriptor tables.
pub const CSV_CONTENT_TYPE: &str = "text/csv";

#[async_trait]
pub trait BlobStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fetch the bytes stored under `key`.
    async fn fetch_bytes(&self, key: &str) -> Result<Vec<u8>>;

    /// Store `bytes` under `key`, replacing any existing object.
    async fn put_bytes(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;
}

/// Fresh key for an uploaded table: `<uuid>.csv`.
pub fn upload_key() -> String {
    format!("{}.csv", Uuid::new_v4())
}

/// Reject keys that could escape the store's namespace.
///
/// Keys are relative, `/`-separated, non-empty and free of `.`/`..` segments.
pub fn validate_key(key: &str) -> Result<()> {
    let invalid = |reason: &str| {
        Err(Hc50Error::storage_fetch(
            key,
            StorageFailure::InvalidKey,
            reason,
        ))
    };

    if key.trim().is_empty() {
        return invalid("key is empty");
    }
    if key.starts_with('/') || key.contains('\\') {
        return invalid("key must be a relative path");
    }
    if key.chars().any(char::is_control) {
        return invalid("key contains control characters");
    }
    if key
        .split('/')
        .any(|seg| seg.is_empty() || seg == "." || seg == "..")
    {
        return invalid("key contains an empty or relative segment");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_keys_are_unique_csv_names() {
        let a = upload_key();
        let b = upload_key();
        assert_ne!(a, b);
        assert!(a.ends_with(".csv"));
        assert!(Uuid::parse_str(a.trim_end_matches(".csv")).is_ok());
        assert!(validate_key(&a).is_ok());
    }

    #[test]
    fn rejects_unsafe_keys() {
        for key in ["", "  ", "/etc/passwd", "../secret.csv", "a/../b.csv", "a//b", "a\\b", "x\n"] {
            let err = validate_key(key).unwrap_err();
            assert!(
                matches!(
                    err,
                    Hc50Error::StorageFetch {
                        kind: StorageFailure::InvalidKey,
                        ..
                    }
                ),
                "{key:?} should be rejected"
            );
        }
        assert!(validate_key("uploads/2024/file.csv").is_ok());
    }
}
