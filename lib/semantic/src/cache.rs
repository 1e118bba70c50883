// Embedding and pair-distance caches shared by concurrent requests
use ahash::AHashMap;
use domainmap_core::{PairKey, Vector};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// An embedding together with the version it was stored under.
///
/// Versions are unique per insert, so a pair distance recorded against two
/// versions is stale as soon as either embedding is replaced.
#[derive(Debug, Clone)]
pub struct CachedEmbedding {
    pub version: u64,
    pub vector: Arc<Vector>,
}

struct EmbeddingEntry {
    text: String,
    embedding: CachedEmbedding,
}

/// Embeddings keyed by domain id, valid for the text they were computed from
pub struct EmbeddingCache {
    entries: RwLock<AHashMap<String, EmbeddingEntry>>,
    next_version: AtomicU64,
}

impl EmbeddingCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(AHashMap::new()),
            next_version: AtomicU64::new(1),
        }
    }

    /// Cached embedding for `id`, unless the domain's text has changed since
    pub fn get(&self, id: &str, text: &str) -> Option<CachedEmbedding> {
        self.entries
            .read()
            .get(id)
            .filter(|entry| entry.text == text)
            .map(|entry| entry.embedding.clone())
    }

    /// Store an embedding; a concurrent insert for the same id simply wins
    /// or loses, both results are valid for `text`.
    pub fn insert(&self, id: &str, text: &str, vector: Vector) -> CachedEmbedding {
        let embedding = CachedEmbedding {
            version: self.next_version.fetch_add(1, Ordering::Relaxed),
            vector: Arc::new(vector),
        };
        self.entries.write().insert(
            id.to_string(),
            EmbeddingEntry {
                text: text.to_string(),
                embedding: embedding.clone(),
            },
        );
        embedding
    }

    pub fn remove(&self, id: &str) -> bool {
        self.entries.write().remove(id).is_some()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy)]
struct PairEntry {
    versions: (u64, u64),
    distance: f32,
}

/// Pair distances keyed by canonical pair and the embedding versions used.
///
/// Cleared wholesale once it grows past `capacity`.
pub struct PairCache {
    entries: RwLock<AHashMap<PairKey, PairEntry>>,
    capacity: usize,
}

impl PairCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(AHashMap::new()),
            capacity,
        }
    }

    /// `versions` are the (lo, hi) embedding versions in key order
    pub fn get(&self, key: &PairKey, versions: (u64, u64)) -> Option<f32> {
        self.entries
            .read()
            .get(key)
            .filter(|entry| entry.versions == versions)
            .map(|entry| entry.distance)
    }

    pub fn extend<I>(&self, computed: I)
    where
        I: IntoIterator<Item = (PairKey, (u64, u64), f32)>,
    {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.write();
        for (key, versions, distance) in computed {
            if entries.len() >= self.capacity {
                entries.clear();
            }
            entries.insert(key, PairEntry { versions, distance });
        }
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_cache_text_mismatch() {
        let cache = EmbeddingCache::new();
        let stored = cache.insert("t1", "Tech", Vector::new(vec![1.0, 0.0]));

        let hit = cache.get("t1", "Tech").unwrap();
        assert_eq!(hit.version, stored.version);
        assert!(cache.get("t1", "Tech: gadgets").is_none());
        assert!(cache.get("t2", "Tech").is_none());
    }

    #[test]
    fn test_versions_increase() {
        let cache = EmbeddingCache::new();
        let first = cache.insert("t1", "Tech", Vector::new(vec![1.0]));
        let second = cache.insert("t1", "Tech", Vector::new(vec![1.0]));
        assert!(second.version > first.version);
        assert_eq!(cache.len(), 1);
        assert!(cache.remove("t1"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_pair_cache_versions() {
        let cache = PairCache::new(10);
        let key = PairKey::new("a", "b").unwrap();
        cache.extend([(key.clone(), (1, 2), 0.5)]);

        assert_eq!(cache.get(&key, (1, 2)), Some(0.5));
        assert_eq!(cache.get(&key, (1, 3)), None);
    }

    #[test]
    fn test_pair_cache_capacity() {
        let cache = PairCache::new(2);
        cache.extend([
            (PairKey::new("a", "b").unwrap(), (1, 2), 0.1),
            (PairKey::new("a", "c").unwrap(), (1, 3), 0.2),
            (PairKey::new("b", "c").unwrap(), (2, 3), 0.3),
        ]);
        assert!(cache.len() <= 2);

        let disabled = PairCache::new(0);
        disabled.extend([(PairKey::new("a", "b").unwrap(), (1, 2), 0.1)]);
        assert!(disabled.is_empty());
    }
}
