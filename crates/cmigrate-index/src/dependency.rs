//! File dependency mapping
//!
//! Edges are added either directly (`a.c` depends on `b.h`) or inferred from
//! symbols: once a file is known to define a symbol, every later reference to
//! that symbol from another file adds an edge to each defining file.
//!
//! All paths are canonicalized before use, so different spellings of the
//! same file share one node.

use cmigrate_core::canonicalize;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::graph::{FileGraph, NodeId};

/// Directed dependency graph over source files plus a symbol index
#[derive(Debug, Default)]
pub struct DependencyMapper {
    graph: FileGraph,
    file_symbols: HashMap<NodeId, BTreeSet<String>>,
    symbol_files: HashMap<String, BTreeSet<NodeId>>,
}

/// Serializable view of one file in the graph
#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    pub path: PathBuf,
    pub dependencies: Vec<PathBuf>,
    pub dependents: Vec<PathBuf>,
    pub symbols: Vec<String>,
}

impl DependencyMapper {
    pub fn new() -> Self {
        Self::default()
    }

    fn intern(&mut self, file: impl AsRef<Path>) -> NodeId {
        self.graph.intern(canonicalize(file))
    }

    fn lookup(&self, file: impl AsRef<Path>) -> Option<NodeId> {
        self.graph.id(&canonicalize(file))
    }

    fn paths(&self, ids: impl IntoIterator<Item = NodeId>) -> BTreeSet<PathBuf> {
        ids.into_iter()
            .map(|id| self.graph.path(id).to_path_buf())
            .collect()
    }

    /// Register a file with no edges so it takes part in ordering
    pub fn add_file(&mut self, file: impl AsRef<Path>) {
        self.intern(file);
    }

    /// Record that `source` depends on `target`.
    ///
    /// A file never depends on itself; such edges are dropped.
    pub fn add_file_dependency(&mut self, source: impl AsRef<Path>, target: impl AsRef<Path>) {
        let source = canonicalize(source);
        let target = canonicalize(target);
        if source == target {
            return;
        }
        let from = self.graph.intern(source);
        let to = self.graph.intern(target);
        if self.graph.add_edge(from, to) {
            debug!(
                "Dependency {} -> {}",
                self.graph.path(from).display(),
                self.graph.path(to).display()
            );
        }
    }

    /// Record that `file` defines `symbol`
    pub fn add_symbol_definition(&mut self, file: impl AsRef<Path>, symbol: &str) {
        let id = self.intern(file);
        self.file_symbols
            .entry(id)
            .or_default()
            .insert(symbol.to_string());
        self.symbol_files
            .entry(symbol.to_string())
            .or_default()
            .insert(id);
    }

    /// Record that `file` references `symbol`.
    ///
    /// Adds an edge to every file currently known to define it; a symbol
    /// with several definers fans out to all of them.
    pub fn add_symbol_reference(&mut self, file: impl AsRef<Path>, symbol: &str) {
        let Some(definers) = self.symbol_files.get(symbol) else {
            return;
        };
        let definers: Vec<PathBuf> = definers
            .iter()
            .map(|&id| self.graph.path(id).to_path_buf())
            .collect();

        let file = canonicalize(file);
        for definer in definers {
            self.add_file_dependency(&file, definer);
        }
    }

    /// Files that `file` depends on
    pub fn get_file_dependencies(&self, file: impl AsRef<Path>) -> BTreeSet<PathBuf> {
        match self.lookup(file) {
            Some(id) => self.paths(self.graph.successors(id).iter().copied()),
            None => BTreeSet::new(),
        }
    }

    /// Files that depend on `file`
    pub fn get_file_dependents(&self, file: impl AsRef<Path>) -> BTreeSet<PathBuf> {
        match self.lookup(file) {
            Some(id) => self.paths(self.graph.predecessors(id).iter().copied()),
            None => BTreeSet::new(),
        }
    }

    /// Symbols defined in `file`
    pub fn get_file_symbols(&self, file: impl AsRef<Path>) -> BTreeSet<String> {
        self.lookup(file)
            .and_then(|id| self.file_symbols.get(&id))
            .cloned()
            .unwrap_or_default()
    }

    /// Files defining `symbol`
    pub fn get_symbol_files(&self, symbol: &str) -> BTreeSet<PathBuf> {
        match self.symbol_files.get(symbol) {
            Some(ids) => self.paths(ids.iter().copied()),
            None => BTreeSet::new(),
        }
    }

    /// Files ordered so that each appears after the files it depends on.
    ///
    /// Cycles are logged and broken at the edge that closes them; the
    /// result still lists every file exactly once, but ordering along those
    /// edges is not guaranteed.
    pub fn get_dependency_order(&self) -> Vec<PathBuf> {
        let topo = self.graph.topological_order();
        for &(from, to) in &topo.back_edges {
            warn!(
                "Circular dependency detected involving {} (from {})",
                self.graph.path(to).display(),
                self.graph.path(from).display()
            );
        }
        topo.order
            .into_iter()
            .map(|id| self.graph.path(id).to_path_buf())
            .collect()
    }

    /// Edges `(from, to)` that [`Self::get_dependency_order`] treats as
    /// already satisfied because they close a cycle
    pub fn get_cycle_edges(&self) -> Vec<(PathBuf, PathBuf)> {
        self.graph
            .topological_order()
            .back_edges
            .into_iter()
            .map(|(from, to)| {
                (
                    self.graph.path(from).to_path_buf(),
                    self.graph.path(to).to_path_buf(),
                )
            })
            .collect()
    }

    /// Sets of mutually dependent files.
    ///
    /// Every file is in exactly one component; components are listed
    /// dependencies-first.
    pub fn get_strongly_connected_components(&self) -> Vec<BTreeSet<PathBuf>> {
        self.graph
            .strongly_connected_components()
            .into_iter()
            .map(|component| self.paths(component))
            .collect()
    }

    /// Components with more than one file, i.e. dependency cycles
    pub fn find_cycles(&self) -> Vec<BTreeSet<PathBuf>> {
        self.get_strongly_connected_components()
            .into_iter()
            .filter(|component| component.len() > 1)
            .collect()
    }

    /// One-directional reachability clusters over outgoing edges.
    ///
    /// Each not-yet-grouped file, in registration order, collects every
    /// ungrouped file it can reach. Kept for consumers that grouped files
    /// this way; use [`Self::get_strongly_connected_components`] for
    /// mutual reachability.
    pub fn get_reachability_groups(&self) -> Vec<BTreeSet<PathBuf>> {
        self.graph
            .reachability_groups()
            .into_iter()
            .map(|group| self.paths(group))
            .collect()
    }

    /// Per-file view of the graph, in registration order
    pub fn snapshot(&self) -> Vec<FileEntry> {
        self.graph
            .nodes()
            .map(|id| FileEntry {
                path: self.graph.path(id).to_path_buf(),
                dependencies: self.paths(self.graph.successors(id).iter().copied()).into_iter().collect(),
                dependents: self.paths(self.graph.predecessors(id).iter().copied()).into_iter().collect(),
                symbols: self
                    .file_symbols
                    .get(&id)
                    .map(|s| s.iter().cloned().collect())
                    .unwrap_or_default(),
            })
            .collect()
    }

    pub fn file_count(&self) -> usize {
        self.graph.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Forget every file, edge and symbol
    pub fn clear(&mut self) {
        self.graph.clear();
        self.file_symbols.clear();
        self.symbol_files.clear();
    }
}
