use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::{CacheStats, DatasetFingerprint, RankCache};
use crate::core::RankedDataset;

struct CachedRanking {
    ranked: Arc<RankedDataset>,
    inserted_at: DateTime<Utc>,
    seq: u64,
}

/// Bounded in-memory rank cache owned by one session.
///
/// When full, the entry inserted first is evicted.
pub struct MemoryCache {
    entries: HashMap<DatasetFingerprint, CachedRanking>,
    capacity: usize,
    next_seq: u64,
    hits: u64,
    misses: u64,
}

impl MemoryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            next_seq: 0,
            hits: 0,
            misses: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.seq)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            tracing::debug!("Evicting cached ranking {}", key.short());
            self.entries.remove(&key);
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(16)
    }
}

impl RankCache for MemoryCache {
    fn get(&mut self, key: &DatasetFingerprint) -> Option<Arc<RankedDataset>> {
        match self.entries.get(key) {
            Some(entry) => {
                self.hits += 1;
                Some(Arc::clone(&entry.ranked))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    fn insert(&mut self, key: DatasetFingerprint, ranked: Arc<RankedDataset>) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_oldest();
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(
            key,
            CachedRanking {
                ranked,
                inserted_at: Utc::now(),
                seq,
            },
        );
    }

    fn invalidate(&mut self, key: &DatasetFingerprint) -> bool {
        self.entries.remove(key).is_some()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            total_entries: self.entries.len() as u64,
            capacity: self.capacity as u64,
            hits: self.hits,
            misses: self.misses,
            oldest_entry: self.entries.values().map(|e| e.inserted_at).min(),
            newest_entry: self.entries.values().map(|e| e.inserted_at).max(),
        }
    }
}
