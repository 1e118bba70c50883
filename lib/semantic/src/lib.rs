//! # domainmap-semantic
//!
//! Semantic distances between domains.
//!
//! A [`DistanceEngine`] asks a [`VectorSource`] for one embedding per domain,
//! caches it against the domain's descriptive text and returns cosine
//! distances for every pair (or each domain's nearest neighbours once the
//! set gets large).
//!
//! ```rust
//! use domainmap_core::{pair::lookup, Domain};
//! use domainmap_semantic::{DistanceEngine, EngineConfig, HashingVectorSource};
//! use std::sync::Arc;
//!
//! let engine = DistanceEngine::new(Arc::new(HashingVectorSource::default()), EngineConfig::default()).unwrap();
//! let domains = vec![
//!     Domain::root("tech", "Technology"),
//!     Domain::root("sports", "Sports"),
//! ];
//! let distances = engine.compute_distances(&domains);
//! assert!(lookup(&distances, "sports", "tech").is_some());
//! ```

pub mod cache;
pub mod engine;
pub mod ollama;
pub mod source;

pub use cache::{CachedEmbedding, EmbeddingCache, PairCache};
pub use engine::{DistanceEngine, DistanceReport, EngineConfig, Regime};
pub use ollama::OllamaVectorSource;
pub use source::{check_embedding, HashingVectorSource, VectorSource, DEFAULT_DIMENSION};
