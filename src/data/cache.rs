use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use super::loader;
use super::model::{IndicatorTable, ReferenceTable};

// ---------------------------------------------------------------------------
// PathCache – one loaded value per source path
// ---------------------------------------------------------------------------

/// Values loaded from files, shared read-only and keyed by path.
#[derive(Debug)]
pub struct PathCache<T> {
    entries: HashMap<PathBuf, Arc<T>>,
}

impl<T> Default for PathCache<T> {
    fn default() -> Self {
        PathCache {
            entries: HashMap::new(),
        }
    }
}

impl<T> PathCache<T> {
    /// Return the cached value for `path`, loading it on first use.
    /// A failed load leaves the cache untouched.
    pub fn get_or_load<F>(&mut self, path: &Path, load: F) -> Result<Arc<T>>
    where
        F: FnOnce(&Path) -> Result<T>,
    {
        if let Some(hit) = self.entries.get(path) {
            log::debug!("cache hit for {}", path.display());
            return Ok(Arc::clone(hit));
        }
        let value = Arc::new(load(path)?);
        self.entries.insert(path.to_path_buf(), Arc::clone(&value));
        Ok(value)
    }

    /// Seed an entry without reading the file, replacing any previous one.
    pub fn insert(&mut self, path: &Path, value: T) -> Arc<T> {
        let value = Arc::new(value);
        self.entries.insert(path.to_path_buf(), Arc::clone(&value));
        value
    }

    pub fn get(&self, path: &Path) -> Option<Arc<T>> {
        self.entries.get(path).cloned()
    }

    /// Drop the entry for `path`; the next load reads the file again.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        let removed = self.entries.remove(path).is_some();
        if removed {
            log::debug!("invalidated cache entry {}", path.display());
        }
        removed
    }
}

// ---------------------------------------------------------------------------
// DataCache – indicator tables and country references
// ---------------------------------------------------------------------------

/// Process-wide store of loaded tables.
///
/// `load_*` initialises an entry from disk (or returns the cached one),
/// `insert_*` seeds one directly, and `table` / `reference` look an entry
/// up without touching the disk.
#[derive(Debug, Default)]
pub struct DataCache {
    tables: PathCache<IndicatorTable>,
    references: PathCache<ReferenceTable>,
}

impl DataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_table(&mut self, path: &Path) -> Result<Arc<IndicatorTable>> {
        self.tables.get_or_load(path, loader::load_table)
    }

    pub fn load_reference(&mut self, path: &Path) -> Result<Arc<ReferenceTable>> {
        self.references.get_or_load(path, loader::load_reference)
    }

    pub fn insert_table(&mut self, path: &Path, table: IndicatorTable) -> Arc<IndicatorTable> {
        self.tables.insert(path, table)
    }

    pub fn insert_reference(
        &mut self,
        path: &Path,
        reference: ReferenceTable,
    ) -> Arc<ReferenceTable> {
        self.references.insert(path, reference)
    }

    pub fn table(&self, path: &Path) -> Option<Arc<IndicatorTable>> {
        self.tables.get(path)
    }

    pub fn reference(&self, path: &Path) -> Option<Arc<ReferenceTable>> {
        self.references.get(path)
    }

    /// Forget everything cached for `path`, whichever kind it was.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        let table = self.tables.invalidate(path);
        let reference = self.references.invalidate(path);
        table || reference
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io::Write;

    use tempfile::Builder;

    #[test]
    fn loads_once_until_invalidated() {
        let calls = Cell::new(0);
        let load = |_: &Path| -> Result<u32> {
            calls.set(calls.get() + 1);
            Ok(7)
        };
        let mut cache = PathCache::default();
        let path = Path::new("data/nexus.parquet");

        assert_eq!(*cache.get_or_load(path, load).unwrap(), 7);
        assert_eq!(*cache.get_or_load(path, load).unwrap(), 7);
        assert_eq!(calls.get(), 1);

        assert!(cache.invalidate(path));
        assert!(cache.get(path).is_none());
        cache.get_or_load(path, load).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn failed_load_is_not_cached() {
        let mut cache: PathCache<u32> = PathCache::default();
        let path = Path::new("missing.csv");

        assert!(cache
            .get_or_load(path, |_| Err(anyhow::anyhow!("boom")))
            .is_err());
        assert!(cache.get(path).is_none());
        assert_eq!(*cache.get_or_load(path, |_| Ok(3)).unwrap(), 3);
    }

    #[test]
    fn data_cache_shares_loaded_tables() {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "country_or_area,indicator_label,year,value").unwrap();
        writeln!(file, "Kenya,Tax,2020,15").unwrap();

        let mut cache = DataCache::new();
        assert!(cache.table(file.path()).is_none());

        let first = cache.load_table(file.path()).unwrap();
        let second = cache.table(file.path()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 1);

        // Changes on disk are only seen after invalidation.
        writeln!(file, "Ghana,Tax,2020,12").unwrap();
        assert_eq!(cache.load_table(file.path()).unwrap().len(), 1);
        assert!(cache.invalidate(file.path()));
        assert_eq!(cache.load_table(file.path()).unwrap().len(), 2);
    }

    #[test]
    fn seeded_entries_satisfy_loads() {
        let mut cache = DataCache::new();
        let path = Path::new("never/on/disk.parquet");
        let seeded = cache.insert_table(path, IndicatorTable::default());

        let loaded = cache.load_table(path).unwrap();
        assert!(Arc::ptr_eq(&seeded, &loaded));
        assert!(cache.reference(path).is_none());
    }
}
