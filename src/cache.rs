use std::collections::HashMap;

/// Session-lifetime store of rendered post bodies, keyed by the post's `file`.
///
/// There is no eviction: entries live until the page is reloaded. An entry is
/// never replaced once set.
#[derive(Clone, Debug, Default)]
pub struct ContentCache {
    entries: HashMap<String, String>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, file: &str) -> Option<&str> {
        self.entries.get(file).map(String::as_str)
    }

    pub fn has(&self, file: &str) -> bool {
        self.entries.contains_key(file)
    }

    /// Stores `content` under `file`. Returns `false` and keeps the existing
    /// entry if the key was already set.
    pub fn set(&mut self, file: impl Into<String>, content: impl Into<String>) -> bool {
        use std::collections::hash_map::Entry;
        match self.entries.entry(file.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(content.into());
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
