use crate::cache::{CachedEmbedding, EmbeddingCache, PairCache};
use crate::source::{check_embedding, VectorSource};
use ahash::{AHashMap, AHashSet};
use domainmap_core::{validate_id, DistanceMap, Domain, EmbeddingError, Error, PairKey, Result, Vector};
use ordered_float::OrderedFloat;
use parking_lot::RwLock;
use rayon::prelude::*;
use serde::Serialize;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Tuning knobs for [`DistanceEngine`]
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Largest set of domains that gets every pair computed
    pub exhaustive_limit: usize,
    /// Neighbours kept per domain above `exhaustive_limit`
    pub nearest_k: usize,
    /// Deadline for one wave of vector source calls
    pub embed_timeout: Duration,
    /// Vector source calls in flight at once
    pub embed_concurrency: usize,
    /// Pair distances kept between requests; 0 disables the pair cache
    pub pair_cache_capacity: usize,
    /// Vector source calls alive at once across the whole engine, counting
    /// calls abandoned after a timeout
    pub max_in_flight: usize,
    /// How long a domain whose embedding timed out is skipped before it is
    /// tried again; zero retries on every call
    pub timeout_backoff: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            exhaustive_limit: 200,
            nearest_k: 8,
            embed_timeout: Duration::from_secs(2),
            embed_concurrency: 16,
            pair_cache_capacity: 100_000,
            max_in_flight: 64,
            timeout_backoff: Duration::from_secs(30),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.nearest_k == 0 {
            return Err(Error::InvalidConfig("nearest_k must be at least 1".to_string()));
        }
        if self.embed_concurrency == 0 {
            return Err(Error::InvalidConfig("embed_concurrency must be at least 1".to_string()));
        }
        if self.max_in_flight == 0 {
            return Err(Error::InvalidConfig("max_in_flight must be at least 1".to_string()));
        }
        if self.embed_timeout.is_zero() {
            return Err(Error::InvalidConfig("embed_timeout must be positive".to_string()));
        }
        Ok(())
    }
}

/// Which pairs a computation covers.
///
/// - `Exhaustive`: every unordered pair, `n(n-1)/2` entries.
/// - `Nearest { k }`: the union of each domain's `k` nearest neighbours
///   (ties broken by id). Values are exact; only the pair set is sparse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Regime {
    Exhaustive,
    Nearest { k: usize },
}

/// Outcome of one distance computation
#[derive(Debug, Clone)]
pub struct DistanceReport {
    pub regime: Regime,
    pub distances: DistanceMap,
    /// Domains left out of `distances` (embedding failed or id unusable)
    pub failed: Vec<String>,
}

/// Pairwise cosine distances between domains, backed by an injected
/// [`VectorSource`] and shared embedding/pair caches.
///
/// Safe to share across request threads. Embedding failures never fail a
/// computation; the affected domain's pairs are just absent.
pub struct DistanceEngine {
    source: Arc<dyn VectorSource>,
    config: EngineConfig,
    embeddings: EmbeddingCache,
    pairs: PairCache,
    in_flight: Arc<AtomicUsize>,
    timed_out: RwLock<AHashMap<String, Instant>>,
}

/// One slot of the engine's in-flight budget, released on drop
struct InFlightPermit(Arc<AtomicUsize>);

impl InFlightPermit {
    fn acquire(counter: &Arc<AtomicUsize>, limit: usize) -> Option<Self> {
        counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < limit).then_some(n + 1))
            .ok()
            .map(|_| Self(Arc::clone(counter)))
    }
}

impl Drop for InFlightPermit {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl DistanceEngine {
    pub fn new(source: Arc<dyn VectorSource>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        if source.dimension() == 0 {
            return Err(Error::InvalidConfig(format!(
                "vector source {} reports dimension 0",
                source.name()
            )));
        }
        let pairs = PairCache::new(config.pair_cache_capacity);
        Ok(Self {
            source,
            config,
            embeddings: EmbeddingCache::new(),
            pairs,
            in_flight: Arc::new(AtomicUsize::new(0)),
            timed_out: RwLock::new(AHashMap::new()),
        })
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Regime used for `n` embedded domains
    pub fn regime_for(&self, n: usize) -> Regime {
        if n <= self.config.exhaustive_limit {
            Regime::Exhaustive
        } else {
            Regime::Nearest { k: self.config.nearest_k }
        }
    }

    pub fn compute_distances(&self, domains: &[Domain]) -> DistanceMap {
        self.compute(domains).distances
    }

    pub fn compute(&self, domains: &[Domain]) -> DistanceReport {
        let mut failed = Vec::new();
        let unique = distinct(domains, &mut failed);

        if unique.len() < 2 {
            return DistanceReport {
                regime: Regime::Exhaustive,
                distances: DistanceMap::new(),
                failed,
            };
        }

        let embedded = self.embed_all(&unique, &mut failed);
        let regime = self.regime_for(embedded.len());
        debug!(
            domains = unique.len(),
            embedded = embedded.len(),
            regime = ?regime,
            "computing distances"
        );

        let distances = match regime {
            Regime::Exhaustive => self.exhaustive(&embedded),
            Regime::Nearest { k } => nearest(&embedded, k),
        };

        DistanceReport {
            regime,
            distances,
            failed,
        }
    }

    /// Forget a domain's embedding; its cached pairs go stale with it
    pub fn invalidate(&self, id: &str) -> bool {
        self.timed_out.write().remove(id);
        self.embeddings.remove(id)
    }

    pub fn clear_cache(&self) {
        self.embeddings.clear();
        self.pairs.clear();
        self.timed_out.write().clear();
    }

    pub fn cached_embeddings(&self) -> usize {
        self.embeddings.len()
    }

    pub fn cached_pairs(&self) -> usize {
        self.pairs.len()
    }

    /// Vector source calls currently running, abandoned ones included
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    fn backing_off(&self, id: &str, now: Instant) -> bool {
        self.timed_out
            .read()
            .get(id)
            .is_some_and(|since| now.duration_since(*since) < self.config.timeout_backoff)
    }

    fn embed_all<'a>(
        &self,
        domains: &[&'a Domain],
        failed: &mut Vec<String>,
    ) -> Vec<(&'a str, CachedEmbedding)> {
        let mut resolved: Vec<Option<CachedEmbedding>> = vec![None; domains.len()];
        let mut missing = Vec::new();

        let now = Instant::now();
        for (idx, domain) in domains.iter().enumerate() {
            let text = domain.descriptive_text();
            match self.embeddings.get(&domain.id, &text) {
                Some(cached) => resolved[idx] = Some(cached),
                None if self.backing_off(&domain.id, now) => {
                    debug!(domain = %domain.id, "embedding timed out recently, skipping");
                }
                None => missing.push((idx, text)),
            }
        }

        for wave in missing.chunks(self.config.embed_concurrency) {
            for (pos, outcome) in self.fetch_wave(wave) {
                let (idx, text) = &wave[pos];
                let domain = domains[*idx];
                match outcome {
                    Ok(vector) => {
                        self.timed_out.write().remove(&domain.id);
                        resolved[*idx] = Some(self.embeddings.insert(&domain.id, text, vector));
                    }
                    Err(e) => {
                        if matches!(e, EmbeddingError::Timeout(_)) && !self.config.timeout_backoff.is_zero() {
                            self.timed_out.write().insert(domain.id.clone(), Instant::now());
                        }
                        warn!(
                            domain = %domain.id,
                            source = self.source.name(),
                            error = %e,
                            "embedding unavailable, omitting domain from distances"
                        );
                    }
                }
            }
        }

        let mut embedded = Vec::with_capacity(domains.len());
        for (&domain, slot) in domains.iter().zip(resolved) {
            match slot {
                Some(embedding) => embedded.push((domain.id.as_str(), embedding)),
                None => failed.push(domain.id.clone()),
            }
        }
        embedded
    }

    /// Run one wave of vector source calls, each on its own thread, all
    /// sharing one deadline. Calls still running at the deadline are
    /// abandoned and reported as timeouts; they keep their in-flight slot
    /// until the source returns. Results are keyed by position in `wave`.
    fn fetch_wave(&self, wave: &[(usize, String)]) -> Vec<(usize, std::result::Result<Vector, EmbeddingError>)> {
        let (tx, rx) = mpsc::channel();
        let mut outcomes = Vec::with_capacity(wave.len());
        let mut pending = AHashSet::new();

        for (idx, (_, text)) in wave.iter().enumerate() {
            let Some(permit) = InFlightPermit::acquire(&self.in_flight, self.config.max_in_flight) else {
                outcomes.push((
                    idx,
                    Err(EmbeddingError::Unavailable(format!(
                        "{} vector source calls already in flight",
                        self.config.max_in_flight
                    ))),
                ));
                continue;
            };
            let tx = tx.clone();
            let source = Arc::clone(&self.source);
            let text = text.clone();
            let spawned = thread::Builder::new()
                .name("embed-worker".to_string())
                .spawn(move || {
                    let _permit = permit;
                    let _ = tx.send((idx, source.embed(&text)));
                });
            match spawned {
                Ok(_) => {
                    pending.insert(idx);
                }
                Err(e) => outcomes.push((idx, Err(EmbeddingError::Unavailable(e.to_string())))),
            }
        }
        drop(tx);

        let expected_dim = self.source.dimension();
        let deadline = Instant::now().checked_add(self.config.embed_timeout);
        let mut disconnected = false;
        while !pending.is_empty() {
            let remaining = deadline.map_or(Duration::MAX, |d| d.saturating_duration_since(Instant::now()));
            match rx.recv_timeout(remaining) {
                Ok((idx, result)) => {
                    if pending.remove(&idx) {
                        let checked = result.and_then(|v| check_embedding(&v, expected_dim).map(|()| v));
                        outcomes.push((idx, checked));
                    }
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        let timeout_ms = saturating_millis(self.config.embed_timeout);
        for idx in pending {
            let err = if disconnected {
                EmbeddingError::Failed("embedding worker exited without a result".to_string())
            } else {
                EmbeddingError::Timeout(timeout_ms)
            };
            outcomes.push((idx, Err(err)));
        }

        outcomes.sort_by_key(|(idx, _)| *idx);
        outcomes
    }

    fn exhaustive(&self, embedded: &[(&str, CachedEmbedding)]) -> DistanceMap {
        let n = embedded.len();
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .collect();

        let results: Vec<(PairKey, (u64, u64), f32, bool)> = pairs
            .par_iter()
            .map(|&(i, j)| {
                let (a, ea) = &embedded[i];
                let (b, eb) = &embedded[j];
                let key = PairKey::canonical(a, b);
                let versions = if key.lo() == *a {
                    (ea.version, eb.version)
                } else {
                    (eb.version, ea.version)
                };
                match self.pairs.get(&key, versions) {
                    Some(distance) => (key, versions, distance, false),
                    None => (key, versions, ea.vector.cosine_distance(&eb.vector), true),
                }
            })
            .collect();

        self.pairs.extend(
            results
                .iter()
                .filter(|(_, _, _, fresh)| *fresh)
                .map(|(key, versions, distance, _)| (key.clone(), *versions, *distance)),
        );

        results
            .into_iter()
            .map(|(key, _, distance, _)| (key, distance))
            .collect()
    }
}

fn nearest(embedded: &[(&str, CachedEmbedding)], k: usize) -> DistanceMap {
    let rows: Vec<Vec<(PairKey, f32)>> = (0..embedded.len())
        .into_par_iter()
        .map(|i| {
            let (a, ea) = &embedded[i];
            let mut row: Vec<(OrderedFloat<f32>, &str)> = embedded
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, (b, eb))| (OrderedFloat(ea.vector.cosine_distance(&eb.vector)), *b))
                .collect();
            row.sort_unstable();
            row.truncate(k);
            row.into_iter()
                .map(|(distance, b)| (PairKey::canonical(a, b), distance.into_inner()))
                .collect()
        })
        .collect();

    rows.into_iter().flatten().collect()
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// First occurrence of each usable id, in input order
fn distinct<'a>(domains: &'a [Domain], rejected: &mut Vec<String>) -> Vec<&'a Domain> {
    let mut seen = AHashSet::new();
    let mut unique = Vec::with_capacity(domains.len());
    for domain in domains {
        if let Err(e) = validate_id(&domain.id) {
            warn!(domain = %domain.id, error = %e, "cannot key distances for domain");
            rejected.push(domain.id.clone());
            continue;
        }
        if seen.insert(domain.id.as_str()) {
            unique.push(domain);
        }
    }
    unique
}
