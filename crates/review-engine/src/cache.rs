//! In-memory evaluation cache, keyed by position and search parameters.
//!
//! Only remote results (and fallback results for positions the cloud does
//! not know, when enabled) are stored. Entries never expire.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::record::EvaluationRecord;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub fen: String,
    pub multi_pv: u32,
    pub depth: u32,
}

impl CacheKey {
    pub fn new(fen: &str, multi_pv: u32, depth: u32) -> Self {
        Self {
            fen: fen.to_string(),
            multi_pv,
            depth,
        }
    }
}

#[derive(Debug, Default)]
pub struct EvalCache {
    entries: Mutex<HashMap<CacheKey, EvaluationRecord>>,
}

impl EvalCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<EvaluationRecord> {
        if let Ok(entries) = self.entries.lock() {
            return entries.get(key).cloned();
        }
        None
    }

    /// Store `record` under `key`, replacing any earlier entry.
    pub fn insert(&self, key: CacheKey, record: EvaluationRecord) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key, record);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback;
    use shakmaty::Chess;

    #[test]
    fn test_key_includes_search_parameters() {
        let cache = EvalCache::new();
        let record = fallback::evaluate(&Chess::default());
        let fen = record.fen.clone();

        cache.insert(CacheKey::new(&fen, 3, 15), record.clone());

        assert_eq!(cache.get(&CacheKey::new(&fen, 3, 15)), Some(record));
        assert!(cache.get(&CacheKey::new(&fen, 1, 15)).is_none());
        assert!(cache.get(&CacheKey::new(&fen, 3, 20)).is_none());
        assert_eq!(cache.len(), 1);
    }
}
