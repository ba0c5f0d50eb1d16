use std::collections::BTreeMap;

use super::super::domain::Pool;

/// Snapshot of every pool keyed by name.
#[derive(Debug, Clone, Default)]
pub struct PoolRegistry {
    pools: BTreeMap<String, Pool>,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later pools replace earlier pools that share a name.
    pub fn insert(&mut self, pool: Pool) -> Option<Pool> {
        self.pools.insert(pool.name.clone(), pool)
    }

    pub fn get(&self, name: &str) -> Option<&Pool> {
        self.pools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pools.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.pools.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

impl FromIterator<Pool> for PoolRegistry {
    fn from_iter<I: IntoIterator<Item = Pool>>(iter: I) -> Self {
        let mut registry = Self::new();
        for pool in iter {
            registry.insert(pool);
        }
        registry
    }
}
