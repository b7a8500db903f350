//! Layered property store
//!
//! Holds one configuration load in three layers:
//! - boot: an earlier-loaded, read-only fallback layer
//! - resolved: values with no outstanding placeholders
//! - pending: values still waiting on at least one placeholder
//!
//! A key lives in at most one of resolved/pending. Every pending entry
//! carries a non-empty list of the placeholders still to be replaced.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::error::Result;
use crate::interpolation::{self, Placeholder};

/// The layers of a [`PropertyStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Boot,
    Resolved,
    Pending,
}

/// A value waiting on placeholder substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEntry {
    /// The current, possibly partially substituted, value
    pub raw: String,
    /// Outstanding placeholders in order of appearance
    pub placeholders: Vec<Placeholder>,
    /// Every value this entry has held, to stop substitution cycles
    history: HashSet<String>,
}

impl PendingEntry {
    fn new(raw: String, placeholders: Vec<Placeholder>) -> Self {
        let history = HashSet::from([raw.clone()]);
        Self {
            raw,
            placeholders,
            history,
        }
    }
}

/// How many occurrences of a token a substitution replaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Replace {
    All,
    First,
}

/// Outcome of substituting one placeholder of a pending key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Substitution {
    /// The key is not pending or the placeholder is no longer outstanding
    Skipped,
    /// The key still has outstanding placeholders
    Partial,
    /// The last placeholder was replaced and the key moved to the resolved layer
    Promoted,
}

/// The layered container for one configuration load
#[derive(Debug, Clone, Default)]
pub struct PropertyStore {
    boot: IndexMap<String, String>,
    resolved: IndexMap<String, String>,
    pending: IndexMap<String, PendingEntry>,
    /// Name of the source that last wrote each key
    sources: IndexMap<String, String>,
}

impl PropertyStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest a raw value
    ///
    /// Key and value are trimmed and an empty key is ignored. Values with
    /// placeholders go to the pending layer, everything else to the resolved
    /// layer. Either way any earlier entry for the key is replaced.
    ///
    /// No source is recorded, and any source recorded by an earlier
    /// [`put_from`](Self::put_from) for the key is cleared, so
    /// [`source_of`](Self::source_of) returns `None` for it.
    pub fn put(&mut self, key: &str, raw: &str) -> Result<()> {
        self.insert(key, raw, None)
    }

    /// Ingest a raw value and record which source supplied it
    pub fn put_from(&mut self, source: &str, key: &str, raw: &str) -> Result<()> {
        self.insert(key, raw, Some(source))
    }

    fn insert(&mut self, key: &str, raw: &str, source: Option<&str>) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            return Ok(());
        }
        let raw = raw.trim();

        if interpolation::contains_placeholder(raw) {
            let placeholders = interpolation::extract(raw).map_err(|e| e.with_path(key))?;
            self.resolved.shift_remove(key);
            self.pending.insert(
                key.to_string(),
                PendingEntry::new(raw.to_string(), placeholders),
            );
        } else {
            self.pending.shift_remove(key);
            self.resolved.insert(key.to_string(), raw.to_string());
        }

        match source {
            Some(source) => {
                self.sources.insert(key.to_string(), source.to_string());
            }
            None => {
                self.sources.shift_remove(key);
            }
        }
        Ok(())
    }

    /// Resolved value with boot fallback
    ///
    /// Returns the resolved value if present and non-empty, else the boot
    /// value, else the empty string. Pending keys read as "no value yet".
    pub fn get_resolved(&self, key: &str) -> &str {
        match self.resolved.get(key) {
            Some(value) if !value.is_empty() => value,
            _ => self.get_boot(key),
        }
    }

    /// Boot layer value, or the empty string
    pub fn get_boot(&self, key: &str) -> &str {
        self.boot.get(key).map(String::as_str).unwrap_or_default()
    }

    /// Current pending value, or the empty string
    pub fn get_pending(&self, key: &str) -> &str {
        self.pending
            .get(key)
            .map(|e| e.raw.as_str())
            .unwrap_or_default()
    }

    /// Outstanding placeholders of a pending key (empty when not pending)
    pub fn placeholders(&self, key: &str) -> &[Placeholder] {
        self.pending
            .get(key)
            .map(|e| e.placeholders.as_slice())
            .unwrap_or_default()
    }

    /// Check if a key is waiting on substitution
    pub fn is_pending(&self, key: &str) -> bool {
        self.pending.contains_key(key)
    }

    /// Keys present in a layer, in insertion order
    pub fn keys(&self, layer: Layer) -> Vec<&str> {
        match layer {
            Layer::Boot => self.boot.keys().map(String::as_str).collect(),
            Layer::Resolved => self.resolved.keys().map(String::as_str).collect(),
            Layer::Pending => self.pending.keys().map(String::as_str).collect(),
        }
    }

    /// Number of keys in a layer
    pub fn len(&self, layer: Layer) -> usize {
        match layer {
            Layer::Boot => self.boot.len(),
            Layer::Resolved => self.resolved.len(),
            Layer::Pending => self.pending.len(),
        }
    }

    /// Check if a layer holds no keys
    pub fn is_empty(&self, layer: Layer) -> bool {
        self.len(layer) == 0
    }

    /// Pending entries in insertion order
    pub fn pending_entries(&self) -> impl Iterator<Item = (&str, &PendingEntry)> {
        self.pending.iter().map(|(k, e)| (k.as_str(), e))
    }

    /// Name of the source that supplied a key, if recorded
    pub fn source_of(&self, key: &str) -> Option<&str> {
        self.sources.get(key).map(String::as_str)
    }

    /// All recorded key -> source mappings
    pub fn sources(&self) -> &IndexMap<String, String> {
        &self.sources
    }

    /// Install a separately loaded store as this store's boot layer
    ///
    /// The other store's resolved layer becomes the boot layer. Its pending
    /// entries still need resolving, so they join this store's pending layer.
    pub fn install_boot(&mut self, other: PropertyStore) {
        let PropertyStore {
            resolved,
            pending,
            sources,
            ..
        } = other;

        self.boot = resolved;
        for (key, entry) in pending {
            self.resolved.shift_remove(&key);
            if let Some(source) = sources.get(&key) {
                self.sources.insert(key.clone(), source.clone());
            }
            self.pending.insert(key, entry);
        }
    }

    /// Replace one outstanding placeholder of a pending key with `value`
    ///
    /// The updated value is scanned again, so a reference assembled by the
    /// substitution (`${a}{b}` with `a=$` becomes `${b}`) is outstanding too.
    /// The key moves to the resolved layer once no placeholder remains. A
    /// substitution that would bring back a value the key already held is
    /// refused and reported as skipped.
    pub(crate) fn substitute(
        &mut self,
        key: &str,
        placeholder: &Placeholder,
        value: &str,
        mode: Replace,
    ) -> Substitution {
        let Some(entry) = self.pending.get_mut(key) else {
            return Substitution::Skipped;
        };
        if !entry.placeholders.contains(placeholder) {
            return Substitution::Skipped;
        }

        let updated = match mode {
            Replace::All => entry.raw.replace(&placeholder.token, value),
            Replace::First => entry.raw.replacen(&placeholder.token, value, 1),
        };
        let placeholders = interpolation::rescan(&updated);

        if !placeholders.is_empty() && !entry.history.insert(updated.clone()) {
            log::debug!(
                "{}: replacing {} repeats an earlier value, leaving it pending",
                key,
                placeholder.token
            );
            return Substitution::Skipped;
        }

        entry.raw = updated;
        entry.placeholders = placeholders;
        if !entry.placeholders.is_empty() {
            return Substitution::Partial;
        }

        if let Some(entry) = self.pending.shift_remove(key) {
            self.resolved.insert(key.to_string(), entry.raw);
        }
        Substitution::Promoted
    }
}
