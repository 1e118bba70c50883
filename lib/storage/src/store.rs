use crate::file::DomainFile;
use crate::seed;
use crate::tree::DomainTree;
use domainmap_core::{Domain, Error, NewDomain, Result};
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Owns the domain forest and answers tree queries.
///
/// Reads clone the current `Arc<DomainTree>` and never wait on a writer for
/// longer than the pointer swap. Writes are serialized, build a new tree from
/// the current one, persist it when a data file is configured, then publish
/// it with a single swap.
pub struct DomainStore {
    tree: RwLock<Arc<DomainTree>>,
    writer: Mutex<()>,
    data_file: Option<PathBuf>,
}

impl DomainStore {
    /// In-memory store over the given domains
    pub fn new(domains: Vec<Domain>) -> Result<Self> {
        Ok(Self::from_tree(DomainTree::build(domains)?, None))
    }

    /// In-memory store over the built-in news taxonomy
    pub fn with_default_seed() -> Result<Self> {
        Self::new(seed::default_domains())
    }

    /// Store backed by a JSON data file.
    ///
    /// A missing file is created from the built-in taxonomy.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let tree = if path.exists() {
            let file = DomainFile::load(&path)?;
            info!(path = %path.display(), domains = file.domains.len(), "loaded domain data file");
            DomainTree::build(file.domains)?
        } else {
            let domains = seed::default_domains();
            info!(path = %path.display(), domains = domains.len(), "seeding new domain data file");
            let tree = DomainTree::build(domains)?;
            write_tree(&path, &tree)?;
            tree
        };

        Ok(Self::from_tree(tree, Some(path)))
    }

    fn from_tree(tree: DomainTree, data_file: Option<PathBuf>) -> Self {
        Self {
            tree: RwLock::new(Arc::new(tree)),
            writer: Mutex::new(()),
            data_file,
        }
    }

    /// The current tree; stays valid and unchanged while later writes land
    #[inline]
    pub fn snapshot(&self) -> Arc<DomainTree> {
        self.tree.read().clone()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    #[inline]
    pub fn data_file(&self) -> Option<&Path> {
        self.data_file.as_deref()
    }

    /// Domains whose parent is `parent_id` (roots for `None`)
    pub fn get_domains(&self, parent_id: Option<&str>) -> Result<Vec<Domain>> {
        self.snapshot().children(parent_id)
    }

    pub fn get_domain(&self, id: &str) -> Option<Domain> {
        self.snapshot().get(id).cloned()
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.snapshot().contains(id)
    }

    /// Root-first path ending at `id`; empty when `id` does not exist
    pub fn get_domain_path(&self, id: &str) -> Result<Vec<Domain>> {
        self.snapshot().ancestry(id)
    }

    /// Walk every domain's ancestry once and report the first problem.
    ///
    /// All problems are logged, not only the first.
    pub fn check_integrity(&self) -> Result<()> {
        let issues = self.snapshot().integrity_issues();
        for issue in &issues {
            error!(error = %issue, "domain tree integrity problem");
        }
        match issues.into_iter().next() {
            Some(first) => Err(first),
            None => Ok(()),
        }
    }

    /// Register a new domain under an existing parent (or as a root) with a
    /// generated id
    pub fn register(&self, request: NewDomain) -> Result<Domain> {
        if request.name.trim().is_empty() {
            return Err(Error::InvalidDomain("name must not be empty".to_string()));
        }
        let id = Uuid::new_v4().to_string();
        self.insert(request.into_domain(id))
    }

    /// Insert a domain with a caller-chosen id
    pub fn insert(&self, domain: Domain) -> Result<Domain> {
        let _guard = self.writer.lock();

        let next = self.snapshot().with_domain(domain.clone())?;
        if let Some(path) = &self.data_file {
            write_tree(path, &next).map_err(|e| {
                warn!(domain = %domain.id, error = %e, "failed to persist new domain");
                e
            })?;
        }
        *self.tree.write() = Arc::new(next);

        info!(
            domain = %domain.id,
            parent = domain.parent_id.as_deref().unwrap_or("-"),
            "registered domain"
        );
        Ok(domain)
    }

    /// Write the current tree to the data file, if there is one
    pub fn save(&self) -> Result<()> {
        match &self.data_file {
            Some(path) => {
                let _guard = self.writer.lock();
                write_tree(path, &self.snapshot())
            }
            None => Ok(()),
        }
    }
}

fn write_tree(path: &Path, tree: &DomainTree) -> Result<()> {
    let file = DomainFile {
        domains: tree.iter().cloned().collect(),
    };
    file.save(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn store() -> DomainStore {
        DomainStore::new(vec![
            Domain::root("t1", "Tech"),
            Domain::root("t2", "Sports"),
            Domain::child("ai", "AI", "t1"),
        ])
        .unwrap()
    }

    #[test]
    fn test_queries() {
        let store = store();
        assert_eq!(store.get_domains(None).unwrap().len(), 2);
        assert_eq!(store.get_domains(Some("t1")).unwrap()[0].id, "ai");
        assert!(store.get_domains(Some("t2")).unwrap().is_empty());
        assert!(matches!(store.get_domains(Some("nonexistent")), Err(Error::NotFound(_))));

        assert_eq!(store.get_domain("ai").unwrap().name, "AI");
        assert!(store.get_domain("nope").is_none());

        let path = store.get_domain_path("ai").unwrap();
        assert_eq!(path.first().unwrap().id, "t1");
        assert_eq!(path.last().unwrap().id, "ai");
        assert!(store.get_domain_path("nope").unwrap().is_empty());
    }

    #[test]
    fn test_register() {
        let store = store();
        let created = store
            .register(NewDomain::new("Football", Some("t2".to_string())))
            .unwrap();

        assert!(Uuid::parse_str(&created.id).is_ok());
        assert_eq!(created.parent_id.as_deref(), Some("t2"));
        assert_eq!(store.get_domains(Some("t2")).unwrap(), vec![created.clone()]);
        assert_eq!(store.get_domain_path(&created.id).unwrap().len(), 2);
    }

    #[test]
    fn test_register_validation() {
        let store = store();
        assert!(matches!(
            store.register(NewDomain::new("  ", None)),
            Err(Error::InvalidDomain(_))
        ));
        assert!(matches!(
            store.register(NewDomain::new("Orphan", Some("ghost".to_string()))),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            store.insert(Domain::root("t1", "Again")),
            Err(Error::DuplicateId(_))
        ));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_snapshot_isolated_from_writes() {
        let store = store();
        let before = store.snapshot();
        store.insert(Domain::child("f1", "Football", "t2")).unwrap();

        assert_eq!(before.len(), 3);
        assert!(before.get("f1").is_none());
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_concurrent_reads_during_writes() {
        let store = Arc::new(store());

        let writer = {
            let store = store.clone();
            thread::spawn(move || {
                for i in 0..50 {
                    store
                        .insert(Domain::child(format!("c{i}"), format!("Child {i}"), "t1"))
                        .unwrap();
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || {
                    for _ in 0..200 {
                        let children = store.get_domains(Some("t1")).unwrap();
                        assert!(children.iter().all(|d| d.parent_id.as_deref() == Some("t1")));
                        assert_eq!(children[0].id, "ai");
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
        assert_eq!(store.get_domains(Some("t1")).unwrap().len(), 51);
    }

    #[test]
    fn test_open_seeds_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("domains.json");

        let store = DomainStore::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.len(), seed::default_domains().len());
        store.check_integrity().unwrap();

        let created = store
            .register(NewDomain::new("Cricket", Some("sports".to_string())))
            .unwrap();
        drop(store);

        let reopened = DomainStore::open(&path).unwrap();
        assert_eq!(reopened.get_domain(&created.id), Some(created));
        assert_eq!(reopened.data_file(), Some(path.as_path()));
    }

    #[test]
    fn test_check_integrity_reports_cycle() {
        let store = DomainStore::new(vec![
            Domain::child("a", "A", "b"),
            Domain::child("b", "B", "a"),
        ])
        .unwrap();
        assert!(matches!(store.check_integrity(), Err(Error::Integrity { .. })));
    }
}
