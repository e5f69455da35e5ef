//! The durable set of timestamps already relayed.
//!
//! Layout: a single JSON array of strings, rewritten whole at the end of each
//! tick. Identifiers are unique; duplicates in a hand-edited file are dropped
//! on load.

use crate::error::{RelayError, Result};
use crate::io;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// TrackedSet
// ---------------------------------------------------------------------------

/// Insertion-ordered set of relayed identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackedSet {
    order: Vec<String>,
    index: HashSet<String>,
}

impl TrackedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    /// Record `id`. Returns `false` if it was already tracked.
    pub fn commit(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.index.contains(&id) {
            return false;
        }
        self.index.insert(id.clone());
        self.order.push(id);
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for TrackedSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TrackedSet::new();
        for id in iter {
            set.commit(id);
        }
        set
    }
}

impl Serialize for TrackedSet {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> std::result::Result<Ser::Ok, Ser::Error> {
        self.order.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TrackedSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let ids = Vec::<String>::deserialize(deserializer)?;
        Ok(ids.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Port
// ---------------------------------------------------------------------------

pub trait TrackerStore: Send + Sync {
    /// Read the persisted set. Never fails: missing state bootstraps an
    /// empty record, corrupt state degrades to empty.
    fn load(&self) -> TrackedSet;

    /// Side-effect-free read. `Ok(None)` means no record exists yet; corrupt
    /// state is an error rather than an empty set.
    fn read(&self) -> Result<Option<TrackedSet>>;

    /// Replace the persisted set with `set`.
    fn persist(&self, set: &TrackedSet) -> Result<()>;
}

// ---------------------------------------------------------------------------
// JsonFileTracker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct JsonFileTracker {
    path: PathBuf,
}

impl JsonFileTracker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TrackerStore for JsonFileTracker {
    fn load(&self) -> TrackedSet {
        match self.read() {
            Ok(Some(set)) => set,
            Ok(None) => {
                let empty = TrackedSet::new();
                if let Err(e) = self.persist(&empty) {
                    tracing::warn!(path = %self.path.display(), error = %e, "could not bootstrap tracked state");
                }
                empty
            }
            Err(e) => {
                tracing::error!(error = %e, "tracked state unreadable; starting from an empty set");
                TrackedSet::new()
            }
        }
    }

    fn read(&self) -> Result<Option<TrackedSet>> {
        let Some(content) = io::read_if_exists(&self.path)? else {
            return Ok(None);
        };
        if content.trim().is_empty() {
            return Ok(Some(TrackedSet::new()));
        }
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| RelayError::StateCorrupt {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })
    }

    fn persist(&self, set: &TrackedSet) -> Result<()> {
        let content = serde_json::to_string_pretty(set)?;
        io::atomic_write(&self.path, content.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
