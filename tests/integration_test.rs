// Integration tests for domainmap
use domainmap_api::DomainService;
use domainmap_core::pair::lookup;
use domainmap_core::{Domain, EmbeddingError, Error, NewDomain, PairKey, Vector};
use domainmap_semantic::{DistanceEngine, EngineConfig, HashingVectorSource, VectorSource};
use domainmap_storage::DomainStore;
use std::sync::Arc;

fn engine() -> Arc<DistanceEngine> {
    Arc::new(DistanceEngine::new(Arc::new(HashingVectorSource::default()), EngineConfig::default()).unwrap())
}

fn tech_and_sports() -> DomainStore {
    DomainStore::new(vec![Domain::root("t1", "Tech"), Domain::root("t2", "Sports")]).unwrap()
}

#[test]
fn test_roots_in_insertion_order() {
    let store = tech_and_sports();
    let roots = store.get_domains(None).unwrap();
    let ids: Vec<&str> = roots.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["t1", "t2"]);
}

#[test]
fn test_two_roots_one_distance() {
    let store = tech_and_sports();
    let distances = engine().compute_distances(&store.get_domains(None).unwrap());

    assert_eq!(distances.len(), 1);
    let (key, value) = distances.iter().next().unwrap();
    assert_eq!(key.to_string(), "t1|t2");
    assert!((0.0..=2.0).contains(value));

    let json = serde_json::to_value(&distances).unwrap();
    assert!(json["t1|t2"].is_number());
}

#[test]
fn test_root_path_is_itself() {
    let store = tech_and_sports();
    let path = store.get_domain_path("t1").unwrap();
    assert_eq!(path, vec![Domain::root("t1", "Tech")]);
}

#[test]
fn test_unknown_parent_not_found() {
    let store = tech_and_sports();
    assert!(matches!(store.get_domains(Some("nonexistent")), Err(Error::NotFound(_))));
}

#[test]
fn test_paths_over_seed_taxonomy() {
    let store = DomainStore::with_default_seed().unwrap();
    let tree = store.snapshot();

    for domain in tree.iter() {
        let path = store.get_domain_path(&domain.id).unwrap();
        assert_eq!(path.last(), Some(domain));
        assert!(path[0].parent_id.is_none());
        for window in path.windows(2) {
            assert_eq!(window[1].parent_id.as_deref(), Some(window[0].id.as_str()));
        }
    }
}

#[test]
fn test_children_share_parent() {
    let store = DomainStore::with_default_seed().unwrap();
    for root in store.get_domains(None).unwrap() {
        for child in store.get_domains(Some(&root.id)).unwrap() {
            assert_eq!(child.parent_id.as_deref(), Some(root.id.as_str()));
        }
    }
}

#[test]
fn test_two_node_cycle_is_integrity_error() {
    let store = DomainStore::new(vec![
        Domain::child("a", "Alpha", "b"),
        Domain::child("b", "Beta", "a"),
    ])
    .unwrap();

    assert!(matches!(store.get_domain_path("a"), Err(Error::Integrity { .. })));
    assert!(store.check_integrity().is_err());
}

#[test]
fn test_distances_symmetric_and_complete() {
    let store = DomainStore::with_default_seed().unwrap();
    let engine = engine();
    let domains = store.snapshot().iter().cloned().collect::<Vec<_>>();
    let n = domains.len();

    let distances = engine.compute_distances(&domains);
    assert_eq!(distances.len(), n * (n - 1) / 2);

    for a in &domains {
        for b in &domains {
            if a.id == b.id {
                continue;
            }
            let ab = lookup(&distances, &a.id, &b.id).unwrap();
            let ba = lookup(&distances, &b.id, &a.id).unwrap();
            assert_eq!(ab.to_bits(), ba.to_bits());
        }
    }
}

#[test]
fn test_distances_bit_identical_across_calls() {
    let store = DomainStore::with_default_seed().unwrap();
    let engine = engine();
    let roots = store.get_domains(None).unwrap();

    let first = engine.compute_distances(&roots);
    let second = engine.compute_distances(&roots);
    let bits = |m: &domainmap_core::DistanceMap| m.iter().map(|(k, v)| (k.clone(), v.to_bits())).collect::<Vec<_>>();
    assert_eq!(bits(&first), bits(&second));

    engine.clear_cache();
    let fresh = engine.compute_distances(&roots);
    assert_eq!(bits(&first), bits(&fresh));
}

/// Refuses to embed one particular domain name
struct Refusing {
    name: String,
    inner: HashingVectorSource,
}

impl VectorSource for Refusing {
    fn embed(&self, text: &str) -> Result<Vector, EmbeddingError> {
        if text == self.name || text.starts_with(&format!("{}:", self.name)) {
            return Err(EmbeddingError::Unavailable("model offline".to_string()));
        }
        self.inner.embed(text)
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn name(&self) -> &str {
        "refusing"
    }
}

#[test]
fn test_failed_embedding_omits_only_its_pairs() {
    let store = DomainStore::with_default_seed().unwrap();
    let roots = store.get_domains(None).unwrap();
    let n = roots.len();
    let victim = roots[1].clone();

    let source = Arc::new(Refusing {
        name: victim.name.clone(),
        inner: HashingVectorSource::default(),
    });
    let engine = DistanceEngine::new(source, EngineConfig::default()).unwrap();
    let report = engine.compute(&roots);

    assert_eq!(report.failed, vec![victim.id.clone()]);
    assert_eq!(report.distances.len(), (n - 1) * (n - 2) / 2);
    for a in &roots {
        for b in &roots {
            if a.id == b.id {
                continue;
            }
            let touches_victim = a.id == victim.id || b.id == victim.id;
            assert_eq!(lookup(&report.distances, &a.id, &b.id).is_none(), touches_victim);
        }
    }
}

#[test]
fn test_service_pipeline() {
    let service = DomainService::new(Arc::new(DomainStore::with_default_seed().unwrap()), engine());

    let roots = service.list(None).unwrap();
    assert_eq!(roots.domains.len(), 5);
    assert_eq!(roots.distances.len(), 10);

    let enriched = service.enrich(vec![Domain::root("solo", "Solo")]);
    assert!(enriched.distances.is_empty());

    let created = service
        .register(NewDomain::new("Quantum Computing", Some("technology".to_string())))
        .unwrap();
    let children = service.list(Some("technology")).unwrap();
    assert_eq!(children.domains.last(), Some(&created));
    assert!(children
        .distances
        .keys()
        .any(|key: &PairKey| key.contains(&created.id)));
}

#[test]
fn test_persisted_registration_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("domains.json");

    let created = {
        let store = DomainStore::open(&path).unwrap();
        store
            .register(NewDomain::new("Esports", Some("sports".to_string())))
            .unwrap()
    };

    let reopened = DomainStore::open(&path).unwrap();
    assert_eq!(reopened.get_domain(&created.id), Some(created.clone()));
    let path_ids: Vec<String> = reopened
        .get_domain_path(&created.id)
        .unwrap()
        .into_iter()
        .map(|d| d.id)
        .collect();
    assert_eq!(path_ids, vec!["sports".to_string(), created.id]);
}
