//! Localized message lookup

use std::collections::HashMap;
use std::fmt;

/// Source of localized message patterns keyed by raw message
pub trait ResourceBundle: Send + Sync {
    fn name(&self) -> &str;
    fn get(&self, key: &str) -> Option<&str>;
}

/// A bundle backed by an in-memory map
#[derive(Debug, Clone, Default)]
pub struct MapBundle {
    name: String,
    entries: HashMap<String, String>,
}

impl MapBundle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_entry(mut self, key: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.entries.insert(key.into(), pattern.into());
        self
    }
}

impl ResourceBundle for MapBundle {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl fmt::Debug for dyn ResourceBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceBundle")
            .field("name", &self.name())
            .finish()
    }
}
