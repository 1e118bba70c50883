use domainmap_core::{DistanceMap, Domain, Error, NewDomain, Result};
use domainmap_semantic::DistanceEngine;
use domainmap_storage::DomainStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Domains at one tree level together with their pairwise distances
#[derive(Debug, Clone, Default, Serialize)]
pub struct DomainListing {
    pub domains: Vec<Domain>,
    pub distances: DistanceMap,
}

/// Two-step listing pipeline shared by every transport: resolve the
/// domains at a level, then enrich them with semantic distances.
pub struct DomainService {
    store: Arc<DomainStore>,
    engine: Arc<DistanceEngine>,
}

impl DomainService {
    pub fn new(store: Arc<DomainStore>, engine: Arc<DistanceEngine>) -> Self {
        Self { store, engine }
    }

    pub fn store(&self) -> &Arc<DomainStore> {
        &self.store
    }

    pub fn engine(&self) -> &Arc<DistanceEngine> {
        &self.engine
    }

    /// Children of `parent_id`, or the roots when `None`
    pub fn resolve(&self, parent_id: Option<&str>) -> Result<Vec<Domain>> {
        self.store.get_domains(parent_id)
    }

    /// Attach distances; a single domain (or none) has no pairs to compute
    pub fn enrich(&self, domains: Vec<Domain>) -> DomainListing {
        let distances = if domains.len() > 1 {
            self.engine.compute_distances(&domains)
        } else {
            DistanceMap::new()
        };
        DomainListing { domains, distances }
    }

    pub fn list(&self, parent_id: Option<&str>) -> Result<DomainListing> {
        let domains = self.resolve(parent_id)?;
        debug!(parent = parent_id.unwrap_or("-"), domains = domains.len(), "listing domains");
        Ok(self.enrich(domains))
    }

    pub fn domain(&self, id: &str) -> Result<Domain> {
        self.store
            .get_domain(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    pub fn path(&self, id: &str) -> Result<Vec<Domain>> {
        self.store.get_domain_path(id)
    }

    pub fn register(&self, request: NewDomain) -> Result<Domain> {
        self.store.register(request)
    }

    /// Acknowledge client-side layout positions.
    ///
    /// Positions are not stored and never touch the domains themselves.
    pub fn update_positions(&self, count: usize) -> Result<usize> {
        if count == 0 {
            return Err(Error::InvalidDomain("no positions provided".to_string()));
        }
        info!(count, "received domain positions");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domainmap_semantic::{EngineConfig, HashingVectorSource};

    fn service() -> DomainService {
        let store = DomainStore::new(vec![
            Domain::root("t1", "Tech"),
            Domain::child("t2", "AI", "t1"),
            Domain::root("s1", "Sports"),
        ])
        .unwrap();
        let engine = DistanceEngine::new(Arc::new(HashingVectorSource::default()), EngineConfig::default()).unwrap();
        DomainService::new(Arc::new(store), Arc::new(engine))
    }

    #[test]
    fn test_list_roots() {
        let listing = service().list(None).unwrap();
        assert_eq!(listing.domains.len(), 2);
        assert_eq!(listing.distances.len(), 1);
    }

    #[test]
    fn test_single_child_has_no_distances() {
        let listing = service().list(Some("t1")).unwrap();
        assert_eq!(listing.domains, vec![Domain::child("t2", "AI", "t1")]);
        assert!(listing.distances.is_empty());
    }

    #[test]
    fn test_unknown_parent() {
        assert!(matches!(service().list(Some("nope")), Err(Error::NotFound(_))));
        assert!(matches!(service().domain("nope"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_positions() {
        let service = service();
        assert_eq!(service.update_positions(3).unwrap(), 3);
        assert!(service.update_positions(0).is_err());
        assert_eq!(service.store().len(), 3);
    }

    #[test]
    fn test_listing_wire_shape() {
        let listing = service().list(None).unwrap();
        let value = serde_json::to_value(&listing).unwrap();
        assert!(value["distances"]["s1|t1"].is_number());
        assert_eq!(value["domains"][0]["id"], "t1");
    }
}
