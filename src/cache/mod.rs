pub mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;

use crate::core::{Dataset, RankedDataset};

pub use memory::MemoryCache;

/// SHA-256 over a dataset's content, used as the memoisation key.
///
/// The label is not hashed: the same table loaded under two names shares a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetFingerprint(String);

impl DatasetFingerprint {
    pub fn of(dataset: &Dataset) -> Self {
        let mut hasher = Sha256::new();

        hash_str(&mut hasher, "species");
        hasher.update((dataset.species().len() as u64).to_le_bytes());
        for label in dataset.species() {
            hash_str(&mut hasher, label);
        }

        hasher.update((dataset.len() as u64).to_le_bytes());
        for record in dataset.iter() {
            hash_str(&mut hasher, &record.name);
            hasher.update(record.fishing_days.to_bits().to_le_bytes());
            hasher.update(record.total_catch.to_bits().to_le_bytes());
            for catch in &record.species_catch {
                hasher.update(catch.kg.to_bits().to_le_bytes());
            }
            hasher.update((record.subtotals.len() as u64).to_le_bytes());
            for subtotal in &record.subtotals {
                hash_str(&mut hasher, &subtotal.species);
                hasher.update(subtotal.kg.to_bits().to_le_bytes());
            }
        }

        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for logs
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for DatasetFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn hash_str(hasher: &mut Sha256, s: &str) {
    hasher.update((s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

/// Trait for rank memoisation implementations
pub trait RankCache: Send {
    /// Get a cached ranking by fingerprint, counting a hit or a miss
    fn get(&mut self, key: &DatasetFingerprint) -> Option<Arc<RankedDataset>>;

    /// Save a ranking under its fingerprint
    fn insert(&mut self, key: DatasetFingerprint, ranked: Arc<RankedDataset>);

    /// Drop one entry; returns whether it was present
    fn invalidate(&mut self, key: &DatasetFingerprint) -> bool;

    /// Drop every entry
    fn clear(&mut self);

    /// Get cache statistics
    fn stats(&self) -> CacheStats;
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: u64,
    pub capacity: u64,
    pub hits: u64,
    pub misses: u64,
    pub oldest_entry: Option<DateTime<Utc>>,
    pub newest_entry: Option<DateTime<Utc>>,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}
