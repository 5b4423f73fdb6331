use sha2::{Digest, Sha256};

/// Integrity-checked wrapper for cached company profiles.
///
/// Enrichment responses are cached across batches keyed by normalized
/// company URL; a checksum is stored alongside the payload and verified on
/// retrieval. A failed check falls back to a fresh provider fetch.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ValidatedCacheEntry {
    /// The cached payload (JSON string).
    pub data: String,
    /// SHA-256 checksum of the payload (hex encoded).
    pub checksum: String,
}

impl ValidatedCacheEntry {
    /// Creates a new entry with its checksum computed.
    pub fn new(data: String) -> Self {
        let checksum = Self::compute_checksum(&data);
        Self { data, checksum }
    }

    fn compute_checksum(data: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// True when the stored checksum matches the payload.
    pub fn is_valid(&self) -> bool {
        Self::compute_checksum(&self.data) == self.checksum
    }

    /// Serializes the entry for storage in the cache.
    pub fn serialize(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Deserializes a cache entry, returning the payload only when it
    /// passes the integrity check.
    pub fn deserialize_and_validate(serialized: &str) -> Option<String> {
        let entry: ValidatedCacheEntry = serde_json::from_str(serialized).ok()?;

        if entry.is_valid() {
            Some(entry.data)
        } else {
            tracing::warn!(
                "Cache validation failed: checksum mismatch. Expected: {}, Data length: {}",
                entry.checksum,
                entry.data.len()
            );
            None
        }
    }
}
