//! Dictionary registry and background index rebuilds.
//!
//! The registry records which dictionaries exist, their priority and whether
//! they are enabled. Parsed dictionaries are cached as `Arc<Dictionary>` so a
//! rebuild after a toggle or priority change does not fetch them again. Each
//! cache entry remembers the source it was read from; an entry whose source is
//! no longer the registered one is ignored and overwritten.
//!
//! [`IndexLoader`] runs rebuilds on worker threads. Every request gets a new
//! generation number; only the outcome of the newest generation is ever
//! returned, so a rebuild that is overtaken by a later request is dropped.
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use tracing::{debug, info, warn};

use crate::dictionary::{Dictionary, DictionaryKind, DictionarySource};
use crate::merge;
use crate::trie::TrieIndex;

/// One registered dictionary.
#[derive(Clone)]
pub struct DictionarySpec {
    pub id: String,
    pub name: String,
    pub priority: i32,
    pub enabled: bool,
    pub kind: DictionaryKind,
    pub source: Arc<dyn DictionarySource>,
}

impl DictionarySpec {
    pub fn new(id: impl Into<String>, priority: i32, source: Arc<dyn DictionarySource>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            priority,
            enabled: true,
            kind: DictionaryKind::Standard,
            source,
        }
    }

    pub fn with_kind(mut self, kind: DictionaryKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

impl fmt::Debug for DictionarySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DictionarySpec")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("enabled", &self.enabled)
            .field("kind", &self.kind)
            .field("source", &self.source)
            .finish()
    }
}

/// A dictionary that could not be loaded during a rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadWarning {
    pub dictionary: String,
    pub message: String,
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dictionary '{}' skipped: {}", self.dictionary, self.message)
    }
}

/// Result of one rebuild.
#[derive(Debug, Clone)]
pub struct RebuildOutcome {
    pub generation: u64,
    pub index: Arc<TrieIndex>,
    pub warnings: Vec<LoadWarning>,
    /// Ids of the dictionaries merged into `index`, in merge input order.
    pub loaded: Vec<String>,
}

/// A parsed dictionary and the source that produced it.
#[derive(Debug, Clone)]
pub struct CachedDictionary {
    pub source: Arc<dyn DictionarySource>,
    pub dictionary: Arc<Dictionary>,
}

impl CachedDictionary {
    fn matches(&self, spec: &DictionarySpec) -> bool {
        Arc::ptr_eq(&self.source, &spec.source) && self.dictionary.kind == spec.kind
    }
}

/// Parsed dictionaries shared between the registry and rebuild workers.
pub type DictionaryCache = Arc<Mutex<HashMap<String, CachedDictionary>>>;

#[derive(Debug, Default)]
pub struct DictionaryRegistry {
    specs: Vec<DictionarySpec>,
    cache: DictionaryCache,
}

impl DictionaryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dictionary, replacing (and forgetting the cached copy of) any
    /// dictionary with the same id.
    pub fn register(&mut self, spec: DictionarySpec) {
        self.invalidate(&spec.id);
        match self.specs.iter_mut().find(|s| s.id == spec.id) {
            Some(slot) => *slot = spec,
            None => self.specs.push(spec),
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.invalidate(id);
        let before = self.specs.len();
        self.specs.retain(|s| s.id != id);
        before != self.specs.len()
    }

    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> bool {
        match self.specs.iter_mut().find(|s| s.id == id) {
            Some(s) => {
                s.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn set_priority(&mut self, id: &str, priority: i32) -> bool {
        match self.specs.iter_mut().find(|s| s.id == id) {
            Some(s) => {
                s.priority = priority;
                true
            }
            None => false,
        }
    }

    /// Drop the cached copy so the next rebuild fetches it again.
    pub fn invalidate(&self, id: &str) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.remove(id);
        }
    }

    pub fn get(&self, id: &str) -> Option<&DictionarySpec> {
        self.specs.iter().find(|s| s.id == id)
    }

    pub fn specs(&self) -> &[DictionarySpec] {
        &self.specs
    }

    /// Enabled dictionaries in registration order.
    pub fn enabled_specs(&self) -> Vec<DictionarySpec> {
        self.specs.iter().filter(|s| s.enabled).cloned().collect()
    }

    pub fn cache(&self) -> DictionaryCache {
        Arc::clone(&self.cache)
    }

    /// Rebuild on the calling thread.
    pub fn build_index(&self) -> RebuildOutcome {
        rebuild(0, &self.enabled_specs(), &self.cache, None)
    }
}

/// Fetch (or reuse) every spec and merge them. Returns `None` when `current`
/// shows that a newer generation was requested meanwhile.
fn rebuild_checked(
    generation: u64,
    specs: &[DictionarySpec],
    cache: &DictionaryCache,
    current: Option<&AtomicU64>,
) -> Option<RebuildOutcome> {
    let superseded = || current.is_some_and(|c| c.load(Ordering::SeqCst) != generation);

    let mut dictionaries: Vec<Arc<Dictionary>> = Vec::new();
    let mut warnings = Vec::new();

    for spec in specs.iter().filter(|s| s.enabled) {
        if superseded() {
            debug!(generation, "rebuild superseded, stopping early");
            return None;
        }

        let cached = cache.lock().ok().and_then(|c| c.get(&spec.id).cloned());
        let dict = match cached {
            Some(c) if c.matches(spec) => c.dictionary,
            _ => match spec.source.load(&spec.id, spec.kind, spec.priority) {
                Ok(d) => {
                    let d = Arc::new(d);
                    // a superseded worker may hold a source that was replaced
                    // while it was loading
                    if superseded() {
                        debug!(generation, dictionary = %spec.id, "rebuild superseded, not caching");
                        return None;
                    }
                    if let Ok(mut c) = cache.lock() {
                        c.insert(
                            spec.id.clone(),
                            CachedDictionary {
                                source: Arc::clone(&spec.source),
                                dictionary: Arc::clone(&d),
                            },
                        );
                    }
                    d
                }
                Err(e) => {
                    warn!(dictionary = %spec.id, error = %e, "failed to load dictionary");
                    warnings.push(LoadWarning {
                        dictionary: spec.id.clone(),
                        message: e.to_string(),
                    });
                    continue;
                }
            },
        };

        let dict = if dict.priority == spec.priority {
            dict
        } else {
            Arc::new(dict.with_priority(spec.priority))
        };
        dictionaries.push(dict);
    }

    if superseded() {
        return None;
    }

    let index = merge::build_index(dictionaries.iter().map(Arc::as_ref));
    let loaded: Vec<String> = dictionaries.iter().map(|d| d.id.clone()).collect();
    info!(
        generation,
        dictionaries = loaded.len(),
        entries = index.entry_count(),
        warnings = warnings.len(),
        "index rebuilt"
    );
    Some(RebuildOutcome {
        generation,
        index: Arc::new(index),
        warnings,
        loaded,
    })
}

fn rebuild(
    generation: u64,
    specs: &[DictionarySpec],
    cache: &DictionaryCache,
    current: Option<&AtomicU64>,
) -> RebuildOutcome {
    rebuild_checked(generation, specs, cache, current).unwrap_or_else(|| RebuildOutcome {
        generation,
        index: Arc::new(TrieIndex::new()),
        warnings: Vec::new(),
        loaded: Vec::new(),
    })
}

/// Runs rebuilds off the keystroke path.
pub struct IndexLoader {
    cache: DictionaryCache,
    latest: Arc<AtomicU64>,
    tx: Sender<RebuildOutcome>,
    rx: Receiver<RebuildOutcome>,
    handle: Option<JoinHandle<()>>,
}

impl IndexLoader {
    pub fn new(cache: DictionaryCache) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            cache,
            latest: Arc::new(AtomicU64::new(0)),
            tx,
            rx,
            handle: None,
        }
    }

    pub fn for_registry(registry: &DictionaryRegistry) -> Self {
        Self::new(registry.cache())
    }

    /// Start a rebuild of `specs`. Any rebuild still running becomes stale.
    pub fn request(&mut self, specs: Vec<DictionarySpec>) -> u64 {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let cache = Arc::clone(&self.cache);
        let latest = Arc::clone(&self.latest);
        let tx = self.tx.clone();
        debug!(generation, dictionaries = specs.len(), "rebuild requested");

        self.handle = Some(std::thread::spawn(move || {
            if let Some(outcome) = rebuild_checked(generation, &specs, &cache, Some(&latest)) {
                // the receiver only goes away with the loader
                let _ = tx.send(outcome);
            }
        }));
        generation
    }

    pub fn latest_generation(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// The newest finished outcome, if the latest request has completed.
    /// Outcomes of superseded requests are discarded.
    pub fn poll(&mut self) -> Option<RebuildOutcome> {
        let latest = self.latest_generation();
        let mut found = None;
        while let Ok(outcome) = self.rx.try_recv() {
            if outcome.generation == latest {
                found = Some(outcome);
            } else {
                debug!(generation = outcome.generation, latest, "discarding stale rebuild");
            }
        }
        found
    }

    /// Block until the latest request finishes.
    pub fn wait(&mut self) -> Option<RebuildOutcome> {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("rebuild worker panicked");
                return None;
            }
        }
        self.poll()
    }
}
