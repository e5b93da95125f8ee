//! Usage-frequency store.
//!
//! Counts how often each surface was committed for a typed segment. Counts
//! only ever grow. The key is `(segment lowercased, surface)`.
//!
//! Two backends:
//! - `InMemory`: thread-safe map, used in tests and when no path is configured
//! - `Redb`: persistent store that survives across sessions
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use ahash::AHashMap;
use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

/// One exported usage row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub segment: String,
    pub surface: String,
    pub count: u64,
}

fn key(segment: &str, surface: &str) -> (String, String) {
    (segment.to_lowercase(), surface.to_string())
}

#[derive(Clone, Debug, Default)]
pub struct InMemoryUsage {
    inner: Arc<RwLock<AHashMap<(String, String), u64>>>,
}

impl InMemoryUsage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_with_count(&self, segment: &str, surface: &str, delta: u64) {
        if delta == 0 {
            return;
        }
        if let Ok(mut map) = self.inner.write() {
            let entry = map.entry(key(segment, surface)).or_insert(0);
            *entry = entry.saturating_add(delta);
        }
    }

    pub fn count(&self, segment: &str, surface: &str) -> u64 {
        match self.inner.read() {
            Ok(map) => map.get(&key(segment, surface)).copied().unwrap_or(0),
            Err(_) => 0,
        }
    }

    pub fn records(&self) -> Vec<UsageRecord> {
        match self.inner.read() {
            Ok(map) => map
                .iter()
                .map(|((segment, surface), count)| UsageRecord {
                    segment: segment.clone(),
                    surface: surface.clone(),
                    count: *count,
                })
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Persistent usage table in a redb database.
pub struct RedbUsage {
    db: Database,
    path: PathBuf,
}

impl std::fmt::Debug for RedbUsage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbUsage").field("path", &self.path).finish()
    }
}

impl RedbUsage {
    const TABLE: TableDefinition<'static, (&'static str, &'static str), u64> =
        TableDefinition::new("usage");

    /// Create or open the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| crate::error::Error::io(parent, e))?;
            }
        }
        let db = Database::create(path)?;
        // make sure the table exists so read transactions never fail on it
        let txn = db.begin_write()?;
        txn.open_table(Self::TABLE)?;
        txn.commit()?;
        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record_with_count(&self, segment: &str, surface: &str, delta: u64) -> Result<()> {
        let (segment, surface) = key(segment, surface);
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(Self::TABLE)?;
            let current = table
                .get((segment.as_str(), surface.as_str()))?
                .map(|v| v.value())
                .unwrap_or(0);
            table.insert((segment.as_str(), surface.as_str()), current.saturating_add(delta))?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn count(&self, segment: &str, surface: &str) -> Result<u64> {
        let (segment, surface) = key(segment, surface);
        let txn = self.db.begin_read()?;
        let table = txn.open_table(Self::TABLE)?;
        Ok(table
            .get((segment.as_str(), surface.as_str()))?
            .map(|v| v.value())
            .unwrap_or(0))
    }

    /// Rows of one segment, read with a key range.
    pub fn counts_for(&self, segment: &str) -> Result<HashMap<String, u64>> {
        let segment = segment.to_lowercase();
        let txn = self.db.begin_read()?;
        let table = txn.open_table(Self::TABLE)?;
        let mut out = HashMap::new();
        for item in table.range((segment.as_str(), "")..)? {
            let (k, v) = item?;
            let (seg, surface) = k.value();
            if seg != segment {
                break;
            }
            out.insert(surface.to_string(), v.value());
        }
        Ok(out)
    }

    pub fn records(&self) -> Result<Vec<UsageRecord>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(Self::TABLE)?;
        let mut out = Vec::new();
        for item in table.iter()? {
            let (k, v) = item?;
            let (segment, surface) = k.value();
            out.push(UsageRecord {
                segment: segment.to_string(),
                surface: surface.to_string(),
                count: v.value(),
            });
        }
        Ok(out)
    }
}

/// Backend switch used by the engine.
#[derive(Clone, Debug)]
pub enum UsageStore {
    InMemory(InMemoryUsage),
    Redb(Arc<RedbUsage>),
}

impl UsageStore {
    pub fn new_in_memory() -> Self {
        UsageStore::InMemory(InMemoryUsage::new())
    }

    pub fn open_redb<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(UsageStore::Redb(Arc::new(RedbUsage::open(path)?)))
    }

    /// Count one commit of `surface` for `segment`.
    pub fn record(&self, segment: &str, surface: &str) {
        self.record_with_count(segment, surface, 1);
    }

    /// Persistence failures are logged; the session keeps going.
    pub fn record_with_count(&self, segment: &str, surface: &str, delta: u64) {
        match self {
            UsageStore::InMemory(m) => m.record_with_count(segment, surface, delta),
            UsageStore::Redb(r) => {
                if let Err(e) = r.record_with_count(segment, surface, delta) {
                    warn!(error = %e, segment, surface, "failed to persist usage");
                }
            }
        }
    }

    pub fn count(&self, segment: &str, surface: &str) -> u64 {
        match self {
            UsageStore::InMemory(m) => m.count(segment, surface),
            UsageStore::Redb(r) => r.count(segment, surface).unwrap_or_else(|e| {
                warn!(error = %e, "failed to read usage");
                0
            }),
        }
    }

    /// All rows, sorted by segment then surface.
    pub fn records(&self) -> Result<Vec<UsageRecord>> {
        let mut rows = match self {
            UsageStore::InMemory(m) => m.records(),
            UsageStore::Redb(r) => r.records()?,
        };
        rows.sort_by(|a, b| (&a.segment, &a.surface).cmp(&(&b.segment, &b.surface)));
        Ok(rows)
    }

    /// Counts for every surface recorded under `segment`.
    pub fn counts_for(&self, segment: &str) -> HashMap<String, u64> {
        match self {
            UsageStore::InMemory(m) => {
                let segment = segment.to_lowercase();
                m.records()
                    .into_iter()
                    .filter(|r| r.segment == segment)
                    .map(|r| (r.surface, r.count))
                    .collect()
            }
            UsageStore::Redb(r) => r.counts_for(segment).unwrap_or_else(|e| {
                warn!(error = %e, "failed to read usage");
                HashMap::new()
            }),
        }
    }

    /// Add every row of `other` into this store.
    pub fn merge_from(&self, other: &UsageStore) -> Result<()> {
        for r in other.records()? {
            self.record_with_count(&r.segment, &r.surface, r.count);
        }
        Ok(())
    }
}

impl Default for UsageStore {
    fn default() -> Self {
        Self::new_in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_counts_by_segment_and_surface() {
        let u = UsageStore::new_in_memory();
        assert_eq!(u.count("ni", "你"), 0);
        u.record("NI", "你");
        u.record("ni", "你");
        u.record("ni", "泥");
        assert_eq!(u.count("ni", "你"), 2);
        assert_eq!(u.count("Ni", "泥"), 1);
        assert_eq!(u.count("nihao", "你"), 0);
    }

    #[test]
    fn counts_never_decrease() {
        let u = InMemoryUsage::new();
        u.record_with_count("a", "x", u64::MAX);
        u.record_with_count("a", "x", 5);
        assert_eq!(u.count("a", "x"), u64::MAX);
        u.record_with_count("a", "y", 0);
        assert_eq!(u.count("a", "y"), 0);
    }

    #[test]
    fn redb_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("usage.redb");
        {
            let u = UsageStore::open_redb(&path).unwrap();
            u.record("hao", "好");
            u.record_with_count("hao", "号", 3);
        }
        let u = UsageStore::open_redb(&path).unwrap();
        assert_eq!(u.count("hao", "好"), 1);
        assert_eq!(u.count("hao", "号"), 3);

        let rows = u.records().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].surface, "号".min("好"));
    }

    #[test]
    fn merge_across_backends() {
        let dir = tempfile::tempdir().unwrap();
        let disk = UsageStore::open_redb(dir.path().join("u.redb")).unwrap();
        let mem = UsageStore::new_in_memory();
        mem.record_with_count("ni", "你", 2);
        disk.record("ni", "你");
        disk.merge_from(&mem).unwrap();
        assert_eq!(disk.count("ni", "你"), 3);
        assert_eq!(disk.counts_for("NI").get("你"), Some(&3));
    }
}
