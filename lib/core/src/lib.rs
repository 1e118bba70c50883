//! # domainmap Core
//!
//! Shared data types for the domainmap topic tree and its distance engine.
//!
//! - [`Domain`] - a topic node (`id`, `name`, optional `parent_id`)
//! - [`Vector`] - a fixed-length embedding with cosine distance
//! - [`PairKey`] / [`DistanceMap`] - canonical unordered pair keys (`"lo|hi"`)
//! - [`Error`] / [`EmbeddingError`] - the error taxonomy
//!
//! ## Example
//!
//! ```rust
//! use domainmap_core::{Domain, DistanceMap, PairKey, Vector};
//!
//! let tech = Domain::root("t1", "Tech");
//! let sports = Domain::root("t2", "Sports");
//!
//! let a = Vector::new(vec![1.0, 0.0]);
//! let b = Vector::new(vec![0.0, 1.0]);
//!
//! let mut distances = DistanceMap::new();
//! distances.insert(PairKey::new(&sports.id, &tech.id).unwrap(), a.cosine_distance(&b));
//! assert_eq!(distances.keys().next().unwrap().to_string(), "t1|t2");
//! ```

pub mod domain;
pub mod error;
pub mod pair;
pub mod vector;

pub use domain::{validate_id, Domain, NewDomain, PAIR_DELIMITER};
pub use error::{EmbeddingError, Error, Result};
pub use pair::{DistanceMap, PairKey};
pub use vector::{Vector, MAX_COSINE_DISTANCE};
