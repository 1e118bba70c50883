use ahash::{AHashMap, AHashSet};
use domainmap_core::{Domain, Error, Result};
use tracing::error;

/// Immutable snapshot of the domain forest.
///
/// Built once and never mutated in place: writers derive a new tree with
/// [`DomainTree::with_domain`] and swap it in, so a reader holding an
/// `Arc<DomainTree>` always sees a complete tree.
///
/// Loading is lenient about dangling parents and cycles so that they can be
/// reported; every ancestry walk is guarded against them.
#[derive(Debug, Clone, Default)]
pub struct DomainTree {
    domains: Vec<Domain>,
    index: AHashMap<String, usize>,
    children: AHashMap<String, Vec<usize>>,
    roots: Vec<usize>,
}

impl DomainTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from domains in insertion order
    pub fn build<I>(domains: I) -> Result<Self>
    where
        I: IntoIterator<Item = Domain>,
    {
        let mut tree = Self::new();
        for domain in domains {
            tree.push(domain)?;
        }
        Ok(tree)
    }

    fn push(&mut self, domain: Domain) -> Result<()> {
        domain.validate()?;
        if self.index.contains_key(&domain.id) {
            return Err(Error::DuplicateId(domain.id));
        }

        let idx = self.domains.len();
        self.index.insert(domain.id.clone(), idx);
        match &domain.parent_id {
            Some(parent) => self.children.entry(parent.clone()).or_default().push(idx),
            None => self.roots.push(idx),
        }
        self.domains.push(domain);
        Ok(())
    }

    /// A new tree with `domain` appended.
    ///
    /// Unlike [`DomainTree::build`] this refuses a parent that is not already
    /// present, so a write can never introduce a dangling link or a cycle.
    pub fn with_domain(&self, domain: Domain) -> Result<Self> {
        if let Some(parent) = &domain.parent_id {
            if !self.contains(parent) {
                return Err(Error::NotFound(parent.clone()));
            }
        }
        let mut next = self.clone();
        next.push(domain)?;
        Ok(next)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    #[inline]
    pub fn get(&self, id: &str) -> Option<&Domain> {
        self.index.get(id).map(|&idx| &self.domains[idx])
    }

    /// All domains in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Domain> {
        self.domains.iter()
    }

    /// Children of `parent_id` in insertion order, or the roots for `None`.
    ///
    /// An existing parent without children gives an empty list; an unknown
    /// parent is `Error::NotFound`.
    pub fn children(&self, parent_id: Option<&str>) -> Result<Vec<Domain>> {
        let indices = match parent_id {
            None => &self.roots[..],
            Some(parent) => {
                if !self.contains(parent) {
                    return Err(Error::NotFound(parent.to_string()));
                }
                self.children.get(parent).map(Vec::as_slice).unwrap_or(&[])
            }
        };
        Ok(indices.iter().map(|&idx| self.domains[idx].clone()).collect())
    }

    /// Path from the root down to `id` (inclusive); empty if `id` is unknown.
    pub fn ancestry(&self, id: &str) -> Result<Vec<Domain>> {
        self.walk(id).map_err(|e| {
            error!(domain = %id, error = %e, "ancestry walk failed");
            e
        })
    }

    fn walk(&self, id: &str) -> Result<Vec<Domain>> {
        let Some(&start) = self.index.get(id) else {
            return Ok(Vec::new());
        };

        let mut path = Vec::new();
        let mut visited = AHashSet::new();
        let mut current = start;
        loop {
            let domain = &self.domains[current];
            if !visited.insert(current) {
                return Err(Error::Integrity {
                    id: id.to_string(),
                    reason: format!("cycle in parent links at {}", domain.id),
                });
            }
            path.push(domain.clone());

            let Some(parent) = &domain.parent_id else {
                break;
            };
            current = match self.index.get(parent) {
                Some(&idx) => idx,
                None => {
                    return Err(Error::Integrity {
                        id: domain.id.clone(),
                        reason: format!("parent {parent} does not exist"),
                    })
                }
            };
        }

        path.reverse();
        Ok(path)
    }

    /// Every integrity problem in the tree, one per affected domain
    pub fn integrity_issues(&self) -> Vec<Error> {
        self.domains
            .iter()
            .filter_map(|d| self.walk(&d.id).err())
            .collect()
    }
}
