//! Vector sources: where domain embeddings come from.

use domainmap_core::{EmbeddingError, Vector};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

/// Default dimension of hashed text embeddings
pub const DEFAULT_DIMENSION: usize = 256;

/// Produces a fixed-length embedding for a piece of descriptive text.
///
/// Implementations may block (network calls); the distance engine runs them
/// on worker threads with a deadline.
pub trait VectorSource: Send + Sync + 'static {
    fn embed(&self, text: &str) -> Result<Vector, EmbeddingError>;

    /// Length of every vector this source returns
    fn dimension(&self) -> usize;

    fn name(&self) -> &str;
}

/// Check a freshly produced embedding before it is cached or compared
pub fn check_embedding(vector: &Vector, expected_dim: usize) -> Result<(), EmbeddingError> {
    if vector.is_empty() {
        return Err(EmbeddingError::Empty);
    }
    if vector.dim() != expected_dim {
        return Err(EmbeddingError::Dimension {
            expected: expected_dim,
            actual: vector.dim(),
        });
    }
    if !vector.is_finite() {
        return Err(EmbeddingError::NonFinite);
    }
    Ok(())
}

/// Deterministic feature-hashing embedder.
///
/// Character trigrams and whole words are hashed into `dimension` buckets
/// (words weigh double) and the result is L2-normalized. Texts sharing
/// vocabulary or spelling land close together; no model or network needed.
#[derive(Debug, Clone)]
pub struct HashingVectorSource {
    dimension: usize,
}

impl HashingVectorSource {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for HashingVectorSource {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl VectorSource for HashingVectorSource {
    fn embed(&self, text: &str) -> Result<Vector, EmbeddingError> {
        if self.dimension == 0 {
            return Err(EmbeddingError::Empty);
        }
        let normalized = text.to_lowercase();
        if normalized.trim().is_empty() {
            return Err(EmbeddingError::Failed("no text to embed".to_string()));
        }

        let mut buckets = vec![0.0f32; self.dimension];
        for trigram in trigrams(&normalized) {
            buckets[bucket(&trigram, self.dimension)] += 1.0;
        }
        for word in normalized.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            buckets[bucket(word, self.dimension)] += 2.0;
        }

        let mut vector = Vector::new(buckets);
        vector.normalize();
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

fn bucket(feature: &str, dim: usize) -> usize {
    // DefaultHasher::new() has fixed keys: buckets repeat between runs of one
    // build, but std may change the algorithm, so they can move across Rust
    // releases
    let mut hasher = DefaultHasher::new();
    feature.hash(&mut hasher);
    (hasher.finish() % dim as u64) as usize
}

fn trigrams(s: &str) -> HashSet<String> {
    let padded = format!("  {}  ", s);
    let chars: Vec<char> = padded.chars().collect();
    chars.windows(3).map(|w| w.iter().collect()).collect()
}
