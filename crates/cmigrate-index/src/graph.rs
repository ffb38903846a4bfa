//! Directed file graph
//!
//! Files are interned to dense [`NodeId`] handles. Each node keeps sorted
//! outgoing and incoming adjacency lists, which are always mutual inverses:
//! `t ∈ out(s)` exactly when `s ∈ in(t)`. Self-edges are never stored.
//!
//! All traversals use explicit stacks so graph size never translates into
//! call-stack depth.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Interned file handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Result of a depth-first topological sort
#[derive(Debug, Clone, Default)]
pub struct TopoOrder {
    /// Every node exactly once, dependencies before dependents where acyclic
    pub order: Vec<NodeId>,
    /// Edges `(from, to)` that closed a cycle and were treated as satisfied
    pub back_edges: Vec<(NodeId, NodeId)>,
}

/// Directed graph over interned file paths
#[derive(Debug, Clone, Default)]
pub struct FileGraph {
    paths: Vec<PathBuf>,
    ids: HashMap<PathBuf, NodeId>,
    outgoing: Vec<Vec<NodeId>>,
    incoming: Vec<Vec<NodeId>>,
    edges: usize,
}

fn insert_sorted(list: &mut Vec<NodeId>, id: NodeId) -> bool {
    match list.binary_search(&id) {
        Ok(_) => false,
        Err(pos) => {
            list.insert(pos, id);
            true
        }
    }
}

impl FileGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `path`, returning its existing handle if already known
    pub fn intern(&mut self, path: PathBuf) -> NodeId {
        if let Some(&id) = self.ids.get(&path) {
            return id;
        }
        let id = NodeId(self.paths.len() as u32);
        self.ids.insert(path.clone(), id);
        self.paths.push(path);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        id
    }

    pub fn id(&self, path: &Path) -> Option<NodeId> {
        self.ids.get(path).copied()
    }

    pub fn path(&self, id: NodeId) -> &Path {
        &self.paths[id.index()]
    }

    /// Insert `from -> to`. Returns false for self-edges and duplicates.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> bool {
        if from == to {
            return false;
        }
        if !insert_sorted(&mut self.outgoing[from.index()], to) {
            return false;
        }
        insert_sorted(&mut self.incoming[to.index()], from);
        self.edges += 1;
        true
    }

    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.outgoing[from.index()].binary_search(&to).is_ok()
    }

    /// Nodes `id` depends on
    pub fn successors(&self, id: NodeId) -> &[NodeId] {
        &self.outgoing[id.index()]
    }

    /// Nodes that depend on `id`
    pub fn predecessors(&self, id: NodeId) -> &[NodeId] {
        &self.incoming[id.index()]
    }

    /// All handles in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> {
        (0..self.paths.len() as u32).map(NodeId)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Depth-first post-order sort.
    ///
    /// Roots are taken in insertion order. Reaching a node that is still
    /// being visited records a back edge and does not re-enter it.
    pub fn topological_order(&self) -> TopoOrder {
        let n = self.len();
        let mut marks = vec![Mark::Unvisited; n];
        let mut result = TopoOrder {
            order: Vec::with_capacity(n),
            back_edges: Vec::new(),
        };
        let mut stack: Vec<(NodeId, usize)> = Vec::new();

        for root in self.nodes() {
            if marks[root.index()] != Mark::Unvisited {
                continue;
            }
            marks[root.index()] = Mark::InProgress;
            stack.push((root, 0));

            while let Some((node, next)) = stack.last_mut() {
                let node = *node;
                let succ = self.successors(node);

                if *next < succ.len() {
                    let dep = succ[*next];
                    *next += 1;
                    match marks[dep.index()] {
                        Mark::Unvisited => {
                            marks[dep.index()] = Mark::InProgress;
                            stack.push((dep, 0));
                        }
                        Mark::InProgress => result.back_edges.push((node, dep)),
                        Mark::Done => {}
                    }
                } else {
                    stack.pop();
                    marks[node.index()] = Mark::Done;
                    result.order.push(node);
                }
            }
        }

        result
    }

    /// Strongly connected components (Tarjan), iterative.
    ///
    /// Components come out in reverse topological order of the condensed
    /// graph, so a component is emitted after everything it depends on.
    pub fn strongly_connected_components(&self) -> Vec<Vec<NodeId>> {
        let n = self.len();
        let mut counter = 0u32;
        let mut index: Vec<Option<u32>> = vec![None; n];
        let mut lowlink = vec![0u32; n];
        let mut on_stack = vec![false; n];
        let mut scc_stack: Vec<NodeId> = Vec::new();
        let mut call: Vec<(NodeId, usize)> = Vec::new();
        let mut components = Vec::new();

        for root in self.nodes() {
            if index[root.index()].is_some() {
                continue;
            }

            index[root.index()] = Some(counter);
            lowlink[root.index()] = counter;
            counter += 1;
            scc_stack.push(root);
            on_stack[root.index()] = true;
            call.push((root, 0));

            while let Some((v, next)) = call.last_mut() {
                let v = *v;
                let succ = self.successors(v);

                if *next < succ.len() {
                    let w = succ[*next];
                    *next += 1;
                    match index[w.index()] {
                        None => {
                            index[w.index()] = Some(counter);
                            lowlink[w.index()] = counter;
                            counter += 1;
                            scc_stack.push(w);
                            on_stack[w.index()] = true;
                            call.push((w, 0));
                        }
                        Some(w_index) if on_stack[w.index()] => {
                            lowlink[v.index()] = lowlink[v.index()].min(w_index);
                        }
                        Some(_) => {}
                    }
                    continue;
                }

                call.pop();
                if let Some(&(parent, _)) = call.last() {
                    lowlink[parent.index()] = lowlink[parent.index()].min(lowlink[v.index()]);
                }

                if Some(lowlink[v.index()]) == index[v.index()] {
                    let mut component = Vec::new();
                    while let Some(w) = scc_stack.pop() {
                        on_stack[w.index()] = false;
                        component.push(w);
                        if w == v {
                            break;
                        }
                    }
                    component.sort();
                    components.push(component);
                }
            }
        }

        components
    }

    /// One-directional reachability clusters.
    ///
    /// Each unvisited root (insertion order) claims every still-unvisited
    /// node reachable through outgoing edges. Unlike SCCs the result depends
    /// on root order and members need not reach each other.
    pub fn reachability_groups(&self) -> Vec<Vec<NodeId>> {
        let mut visited = vec![false; self.len()];
        let mut groups = Vec::new();

        for root in self.nodes() {
            if visited[root.index()] {
                continue;
            }
            let mut group = Vec::new();
            let mut stack = vec![root];
            visited[root.index()] = true;

            while let Some(node) = stack.pop() {
                group.push(node);
                for &dep in self.successors(node).iter().rev() {
                    if !visited[dep.index()] {
                        visited[dep.index()] = true;
                        stack.push(dep);
                    }
                }
            }

            group.sort();
            groups.push(group);
        }

        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(names: &[&str], edges: &[(usize, usize)]) -> (FileGraph, Vec<NodeId>) {
        let mut g = FileGraph::new();
        let ids: Vec<_> = names
            .iter()
            .map(|n| g.intern(PathBuf::from(format!("/p/{}", n))))
            .collect();
        for &(a, b) in edges {
            g.add_edge(ids[a], ids[b]);
        }
        (g, ids)
    }

    #[test]
    fn test_intern_is_stable() {
        let mut g = FileGraph::new();
        let a = g.intern(PathBuf::from("/p/a.c"));
        let again = g.intern(PathBuf::from("/p/a.c"));
        assert_eq!(a, again);
        assert_eq!(g.len(), 1);
        assert_eq!(g.path(a), Path::new("/p/a.c"));
    }

    #[test]
    fn test_edges_are_mutual_inverses() {
        let (mut g, ids) = graph(&["a", "b", "c"], &[(0, 1), (0, 2), (1, 2)]);
        assert!(!g.add_edge(ids[0], ids[1]));
        assert!(!g.add_edge(ids[2], ids[2]));
        assert_eq!(g.edge_count(), 3);

        for s in g.nodes() {
            for &t in g.successors(s) {
                assert!(g.predecessors(t).contains(&s));
            }
            for &p in g.predecessors(s) {
                assert!(g.has_edge(p, s));
            }
        }
    }

    #[test]
    fn test_topological_chain() {
        // a -> b -> c
        let (g, ids) = graph(&["a", "b", "c"], &[(0, 1), (1, 2)]);
        let topo = g.topological_order();
        assert_eq!(topo.order, vec![ids[2], ids[1], ids[0]]);
        assert!(topo.back_edges.is_empty());
    }

    #[test]
    fn test_topological_cycle_terminates() {
        let (g, ids) = graph(&["a", "b"], &[(0, 1), (1, 0)]);
        let topo = g.topological_order();
        assert_eq!(topo.order, vec![ids[1], ids[0]]);
        assert_eq!(topo.back_edges, vec![(ids[1], ids[0])]);
    }

    #[test]
    fn test_topological_includes_isolated_nodes() {
        let (g, ids) = graph(&["lonely", "a", "b"], &[(1, 2)]);
        let order = g.topological_order().order;
        assert_eq!(order, vec![ids[0], ids[2], ids[1]]);
    }

    #[test]
    fn test_long_chain_does_not_overflow() {
        let names: Vec<String> = (0..100_000).map(|i| format!("f{}.c", i)).collect();
        let refs: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        let edges: Vec<(usize, usize)> = (0..refs.len() - 1).map(|i| (i, i + 1)).collect();
        let (g, ids) = graph(&refs, &edges);

        let order = g.topological_order().order;
        assert_eq!(order.len(), ids.len());
        assert_eq!(order[0], *ids.last().unwrap());
        assert_eq!(g.strongly_connected_components().len(), ids.len());
    }

    #[test]
    fn test_scc_mutual_reachability() {
        // a <-> b, b -> c, c -> d, d -> c
        let (g, ids) = graph(&["a", "b", "c", "d"], &[(0, 1), (1, 0), (1, 2), (2, 3), (3, 2)]);
        let sccs = g.strongly_connected_components();
        assert_eq!(sccs, vec![vec![ids[2], ids[3]], vec![ids[0], ids[1]]]);
    }

    #[test]
    fn test_scc_acyclic_are_singletons() {
        let (g, ids) = graph(&["a", "b", "c"], &[(0, 1), (1, 2)]);
        let sccs = g.strongly_connected_components();
        assert_eq!(sccs, vec![vec![ids[2]], vec![ids[1]], vec![ids[0]]]);
    }

    #[test]
    fn test_reachability_groups_differ_from_scc() {
        // a -> b -> c with no cycles: one reachability group, three SCCs
        let (g, ids) = graph(&["a", "b", "c", "x"], &[(0, 1), (1, 2)]);
        let groups = g.reachability_groups();
        assert_eq!(groups, vec![vec![ids[0], ids[1], ids[2]], vec![ids[3]]]);
    }

    #[test]
    fn test_reachability_depends_on_root_order() {
        // b is interned first, so it claims only c; a then gets itself
        let (g, ids) = graph(&["b", "a", "c"], &[(1, 0), (0, 2)]);
        let groups = g.reachability_groups();
        assert_eq!(groups, vec![vec![ids[0], ids[2]], vec![ids[1]]]);
    }
}
