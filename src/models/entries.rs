//! Directory tree rebuilt from the archive's flat listing stream.

use std::collections::BTreeMap;

use super::archive::{Entry, normalize_name, parent_dir};

/// Entries keyed by normalized path.
///
/// The library only lists files (and the occasional explicit directory), so
/// every insert fills in the missing ancestor directories. A synthesized
/// directory never replaces an existing entry, while a real entry always
/// replaces whatever was there before.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntryTree {
    entries: BTreeMap<String, Entry>,
}

impl EntryTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mut entry: Entry) {
        entry.name = normalize_name(&entry.name);
        if entry.name == "/" {
            return;
        }

        let mut dir = parent_dir(&entry.name).to_string();
        while dir != "/" {
            let next = parent_dir(&dir).to_string();
            self.entries
                .entry(dir.clone())
                .or_insert_with(|| Entry::directory(&dir));
            dir = next;
        }

        self.entries.insert(entry.name.clone(), entry);
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(&normalize_name(name))
    }

    /// Whether `dir` is the root or a known directory.
    pub fn is_dir(&self, dir: &str) -> bool {
        let dir = normalize_name(dir);
        dir == "/" || self.entries.get(&dir).is_some_and(Entry::is_dir)
    }

    /// Direct children of `dir`, directories first, then by name.
    pub fn children(&self, dir: &str) -> Vec<Entry> {
        let dir = normalize_name(dir);
        let mut children: Vec<Entry> = self
            .entries
            .values()
            .filter(|e| parent_dir(&e.name) == dir)
            .cloned()
            .collect();
        children.sort_by(|a, b| {
            b.is_dir()
                .cmp(&a.is_dir())
                .then_with(|| a.base_name().cmp(b.base_name()))
        });
        children
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
