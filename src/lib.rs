//! # domainmap
//!
//! A hierarchical store of news topic domains with a semantic distance
//! engine, served over a small REST API.
//!
//! Each level of the tree can be listed together with the cosine distances
//! between its domains, so a client can lay related topics out close to each
//! other.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! domainmap --http-port 5001 --data-file ./data/domains.json
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use domainmap::prelude::*;
//! use std::sync::Arc;
//!
//! let store = Arc::new(DomainStore::with_default_seed().unwrap());
//! let engine = DistanceEngine::new(Arc::new(HashingVectorSource::default()), EngineConfig::default()).unwrap();
//! let service = DomainService::new(store, Arc::new(engine));
//!
//! let roots = service.list(None).unwrap();
//! let n = roots.domains.len();
//! assert_eq!(roots.distances.len(), n * (n - 1) / 2);
//! ```
//!
//! ## Crate Structure
//!
//! - `domainmap-core` - Domain, Vector, PairKey/DistanceMap, errors
//! - `domainmap-storage` - the domain tree, its store and JSON data file
//! - `domainmap-semantic` - vector sources, caches and the distance engine
//! - `domainmap-api` - the listing service and REST API

// Re-export core types
pub use domainmap_core::{
    DistanceMap, Domain, EmbeddingError, Error, NewDomain, PairKey, Result, Vector,
};

// Re-export storage
pub use domainmap_storage::{DomainStore, DomainTree};

// Re-export the distance engine
pub use domainmap_semantic::{
    DistanceEngine, DistanceReport, EngineConfig, HashingVectorSource, OllamaVectorSource,
    Regime, VectorSource,
};

// Re-export API
pub use domainmap_api::{DomainListing, DomainService, RestApi};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        DistanceEngine, DistanceMap, Domain, DomainListing, DomainService, DomainStore,
        EngineConfig, Error, HashingVectorSource, NewDomain, PairKey, Result, VectorSource,
    };
}
