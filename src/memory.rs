use crate::context::ContextVariables;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// A durable, timestamped fact independent of any single run.
///
/// Entries are immutable once appended. The `kind` tag is free-form
/// ("fact", "conversation", "tool_result", …) and drives [`MemoryStore::search`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub content: String,

    #[serde(rename = "type")]
    pub kind: String,

    /// Context-variable snapshot at creation time.
    #[serde(default)]
    pub context: ContextVariables,

    pub timestamp: DateTime<Utc>,

    /// Salience in [0, 1]; clamped on append.
    pub importance: f64,
}

impl MemoryEntry {
    /// A new entry stamped with the current time and full importance.
    pub fn new(content: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            content:    content.into(),
            kind:       kind.into(),
            context:    ContextVariables::new(),
            timestamp:  Utc::now(),
            importance: 1.0,
        }
    }

    pub fn with_importance(mut self, importance: f64) -> Self {
        self.importance = importance;
        self
    }

    pub fn with_context(mut self, context: ContextVariables) -> Self {
        self.context = context;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Append-only, queryable log of salient facts and events.
///
/// Safe under concurrent access: tool handlers dispatched within one turn may
/// read and append from blocking threads, so every operation takes the single
/// internal mutex. Growth is unbounded — this is a durable log, and retention
/// is the caller's concern.
///
/// # Example
/// ```
/// use swarmkit::{MemoryEntry, MemoryStore};
///
/// let store = MemoryStore::new();
/// store.add(MemoryEntry::new("favorite color is blue", "fact").with_importance(0.8));
/// assert_eq!(store.recent(10).len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<Vec<MemoryEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self { entries: Mutex::new(Vec::new()) }
    }

    /// Appends an entry, clamping importance into [0, 1]. NaN would pass
    /// through `clamp` and serialize as JSON null, breaking the round trip,
    /// so non-finite scores are normalized to 0.0 instead.
    pub fn add(&self, mut entry: MemoryEntry) {
        entry.importance = if entry.importance.is_finite() {
            entry.importance.clamp(0.0, 1.0)
        } else {
            0.0
        };
        tracing::debug!(kind = %entry.kind, importance = entry.importance, "memory appended");
        self.entries.lock().unwrap().push(entry);
    }

    /// The `n` most recently appended entries, oldest first.
    pub fn recent(&self, n: usize) -> Vec<MemoryEntry> {
        let entries = self.entries.lock().unwrap();
        let start = entries.len().saturating_sub(n);
        entries[start..].to_vec()
    }

    /// Entries of the given kind, in append order, optionally narrowed by a
    /// predicate over content and context.
    pub fn search(
        &self,
        kind: &str,
        predicate: Option<&dyn Fn(&MemoryEntry) -> bool>,
    ) -> Vec<MemoryEntry> {
        let entries = self.entries.lock().unwrap();
        entries
            .iter()
            .filter(|e| e.kind == kind)
            .filter(|e| predicate.map_or(true, |p| p(e)))
            .cloned()
            .collect()
    }

    /// The `n` highest-importance entries, most important first. Ties keep
    /// append order.
    pub fn most_important(&self, n: usize) -> Vec<MemoryEntry> {
        let entries = self.entries.lock().unwrap();
        let mut ranked: Vec<MemoryEntry> = entries.clone();
        ranked.sort_by(|a, b| {
            b.importance.partial_cmp(&a.importance).unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(n);
        ranked
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    /// A copy of the full ordered entry list.
    pub fn snapshot(&self) -> Vec<MemoryEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Serializes the full ordered entry list to JSON. The round trip through
    /// [`MemoryStore::deserialize`] is lossless for content, type, timestamp,
    /// importance, and context.
    pub fn serialize(&self) -> Result<String, serde_json::Error> {
        let entries = self.entries.lock().unwrap();
        serde_json::to_string_pretty(&*entries)
    }

    /// Rebuilds a store from a previously serialized entry list, preserving
    /// order and every field exactly.
    pub fn deserialize(data: &str) -> Result<Self, serde_json::Error> {
        let entries: Vec<MemoryEntry> = serde_json::from_str(data)?;
        Ok(Self { entries: Mutex::new(entries) })
    }
}
