//! Canonical keys for unordered domain pairs.
//!
//! A pair `{a, b}` is stored with its ids in byte-wise lexicographic order and
//! serialized as `"lo|hi"`, so `(a, b)` and `(b, a)` always map to one key.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::domain::{validate_id, PAIR_DELIMITER};
use crate::{Error, Result};

/// Pairwise distances keyed by canonical pair
pub type DistanceMap = BTreeMap<PairKey, f32>;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairKey {
    lo: String,
    hi: String,
}

impl PairKey {
    /// Build the canonical key for two distinct, valid ids
    pub fn new(a: &str, b: &str) -> Result<Self> {
        validate_id(a)?;
        validate_id(b)?;
        if a == b {
            return Err(Error::InvalidId(format!("{a}{PAIR_DELIMITER}{b}")));
        }
        Ok(Self::canonical(a, b))
    }

    /// Build a key from ids already known to be valid and distinct; no checks.
    pub fn canonical(a: &str, b: &str) -> Self {
        if a <= b {
            Self { lo: a.to_string(), hi: b.to_string() }
        } else {
            Self { lo: b.to_string(), hi: a.to_string() }
        }
    }

    #[inline]
    pub fn lo(&self) -> &str {
        &self.lo
    }

    #[inline]
    pub fn hi(&self) -> &str {
        &self.hi
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.lo == id || self.hi == id
    }

    /// The id paired with `id`, if `id` is part of this pair
    pub fn other(&self, id: &str) -> Option<&str> {
        if self.lo == id {
            Some(&self.hi)
        } else if self.hi == id {
            Some(&self.lo)
        } else {
            None
        }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.lo, PAIR_DELIMITER, self.hi)
    }
}

impl FromStr for PairKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (a, b) = s
            .split_once(PAIR_DELIMITER)
            .ok_or_else(|| Error::InvalidId(s.to_string()))?;
        Self::new(a, b)
    }
}

impl Serialize for PairKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PairKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct PairKeyVisitor;

        impl<'de> Visitor<'de> for PairKeyVisitor {
            type Value = PairKey;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a pair key of the form \"id|id\"")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<PairKey, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(PairKeyVisitor)
    }
}

/// Look up the distance of an unordered pair, in either argument order
pub fn lookup(distances: &DistanceMap, a: &str, b: &str) -> Option<f32> {
    if a == b {
        return None;
    }
    distances.get(&PairKey::canonical(a, b)).copied()
}
