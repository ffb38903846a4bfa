//! Object-like macro table
//!
//! Macros are substituted in definition order, one linear pass per macro.
//! A replacement that mentions another macro's name is only expanded again
//! if that other macro comes later in the table.

use regex::{NoExpand, Regex};
use tracing::warn;

#[derive(Debug, Clone)]
struct MacroEntry {
    name: String,
    value: String,
    pattern: Regex,
}

/// Ordered macro name -> replacement text table
#[derive(Debug, Clone, Default)]
pub struct MacroTable {
    entries: Vec<MacroEntry>,
}

impl MacroTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Define or redefine a macro.
    ///
    /// Redefinition keeps the macro's original position in the table.
    pub fn define(&mut self, name: &str, value: &str) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.name == name) {
            entry.value = value.to_string();
            return;
        }

        let pattern = match Regex::new(&format!(r"\b{}\b", regex::escape(name))) {
            Ok(pattern) => pattern,
            Err(e) => {
                warn!("Ignoring macro {:?}: {}", name, e);
                return;
            }
        };

        self.entries.push(MacroEntry {
            name: name.to_string(),
            value: value.to_string(),
            pattern,
        });
    }

    /// Look up a macro's replacement text
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.value.as_str())
    }

    /// Iterate `(name, value)` pairs in definition order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|e| (e.name.as_str(), e.value.as_str()))
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

    /// Substitute every whole-word occurrence of each macro name
    pub fn expand(&self, source: &str) -> String {
        let mut text = source.to_string();
        for entry in &self.entries {
            if entry.pattern.is_match(&text) {
                text = entry
                    .pattern
                    .replace_all(&text, NoExpand(&entry.value))
                    .into_owned();
            }
        }
        text
    }
}
