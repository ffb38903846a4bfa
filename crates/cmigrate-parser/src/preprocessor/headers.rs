//! Include search path
//!
//! Resolves the target of an `#include` directive against an ordered list of
//! directories. Only the search path is consulted; the including file's own
//! directory is not searched unless it is on the list.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Ordered list of include directories
#[derive(Debug, Clone, Default)]
pub struct IncludeSearchPath {
    dirs: Vec<PathBuf>,
}

/// A header found on the search path and read successfully
#[derive(Debug, Clone)]
pub struct ResolvedHeader {
    pub path: PathBuf,
    pub content: String,
}

impl IncludeSearchPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a directory. Duplicates are ignored.
    pub fn add(&mut self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        if !self.dirs.contains(&dir) {
            self.dirs.push(dir);
        }
    }

    /// Directories in search order
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    pub fn clear(&mut self) {
        self.dirs.clear();
    }

    /// First `dir/spec` that exists, without reading it
    pub fn resolve(&self, spec: &str) -> Option<PathBuf> {
        self.dirs
            .iter()
            .map(|dir| dir.join(spec))
            .find(|candidate| candidate.is_file())
    }

    /// Find and read `spec`.
    ///
    /// A candidate that exists but cannot be read is logged and the search
    /// continues with the next directory.
    pub fn load(&self, spec: &str) -> Option<ResolvedHeader> {
        for dir in &self.dirs {
            let candidate = dir.join(spec);
            if !candidate.is_file() {
                continue;
            }
            match fs::read_to_string(&candidate) {
                Ok(content) => {
                    debug!("Resolved {} in {:?}", spec, dir);
                    return Some(ResolvedHeader {
                        path: candidate,
                        content,
                    });
                }
                Err(e) => {
                    warn!("Error processing include {}: {}", spec, e);
                }
            }
        }
        None
    }

    /// Resolve relative to `base` first, then the search path.
    ///
    /// Used for dependency discovery, not for text expansion.
    pub fn resolve_from(&self, spec: &str, base: &Path) -> Option<PathBuf> {
        if let Some(parent) = base.parent() {
            let candidate = parent.join(spec);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        self.resolve(spec)
    }
}
