//! Motion tree: a rooted tree of states joined by motion-primitive edges
//!
//! Nodes live in an arena indexed by their id. Edges are stored per parent,
//! and each node refers to the edge that produced it through an
//! [`EdgeRef`] (parent id + index in the parent's edge list) rather than a
//! pointer, so growing the edge storage never invalidates it.
//!
//! Nearest-node search is a linear scan, O(n) per query. This is fine for
//! the few thousand nodes of an interactive planning run; there is no
//! spatial index.

use std::collections::HashSet;

use crate::common::{HasPose, PlannerError, PlannerResult};

use super::distance_metric::DistanceMetric;

/// Node identifier, equal to the insertion order (root = 0)
pub type NodeId = usize;

/// Location of an edge inside its parent's edge list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeRef {
    pub parent: NodeId,
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct TreeNode<N> {
    pub id: NodeId,
    /// `None` for the root
    pub parent: Option<NodeId>,
    /// `None` for the root
    pub edge_to_parent: Option<EdgeRef>,
    pub data: N,
}

#[derive(Debug, Clone)]
pub struct TreeEdge<E> {
    pub child: NodeId,
    pub data: E,
}

/// Generic rooted tree over node payloads `N` and edge payloads `E`
#[derive(Debug, Clone)]
pub struct MotionTree<N, E> {
    nodes: Vec<TreeNode<N>>,
    /// Indexed by parent id, one entry per node
    edges_to_children: Vec<Vec<TreeEdge<E>>>,
}

impl<N, E> Default for MotionTree<N, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N, E> MotionTree<N, E> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges_to_children: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges_to_children.iter().map(Vec::len).sum()
    }

    /// Id the next inserted node will get
    pub fn next_free_node_id(&self) -> NodeId {
        self.nodes.len()
    }

    /// Creates the root (id 0). The tree must be empty.
    pub fn insert_root(&mut self, data: N) -> PlannerResult<NodeId> {
        if !self.nodes.is_empty() {
            return Err(PlannerError::TreeNotEmpty);
        }
        self.nodes.push(TreeNode {
            id: 0,
            parent: None,
            edge_to_parent: None,
            data,
        });
        self.edges_to_children.push(Vec::new());
        Ok(0)
    }

    /// Appends `edge` to `parent`'s edge list and creates the child node it
    /// leads to. Returns the new node id.
    pub fn insert_node_and_edge(&mut self, parent: NodeId, data: N, edge: E) -> PlannerResult<NodeId> {
        if parent >= self.nodes.len() {
            return Err(PlannerError::NodeNotFound(parent));
        }
        let id = self.next_free_node_id();
        let edges_of_parent = &mut self.edges_to_children[parent];
        edges_of_parent.push(TreeEdge { child: id, data: edge });
        let edge_ref = EdgeRef {
            parent,
            index: edges_of_parent.len() - 1,
        };

        self.nodes.push(TreeNode {
            id,
            parent: Some(parent),
            edge_to_parent: Some(edge_ref),
            data,
        });
        self.edges_to_children.push(Vec::new());
        Ok(id)
    }

    pub fn nodes(&self) -> &[TreeNode<N>] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode<N>> {
        self.nodes.get(id)
    }

    pub fn root(&self) -> Option<&TreeNode<N>> {
        self.nodes.first()
    }

    /// Mutable access to a node payload; topology stays untouched
    pub fn node_data_mut(&mut self, id: NodeId) -> Option<&mut N> {
        self.nodes.get_mut(id).map(|n| &mut n.data)
    }

    pub fn edge(&self, edge_ref: EdgeRef) -> Option<&TreeEdge<E>> {
        self.edges_to_children.get(edge_ref.parent)?.get(edge_ref.index)
    }

    /// The edge that leads into `id`, `None` for the root or unknown ids
    pub fn edge_to_parent(&self, id: NodeId) -> Option<&TreeEdge<E>> {
        self.edge(self.nodes.get(id)?.edge_to_parent?)
    }

    /// Outgoing edges of `parent`
    pub fn edges_of(&self, parent: NodeId) -> &[TreeEdge<E>] {
        self.edges_to_children
            .get(parent)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Outgoing edges of `parent` with mutable payloads. The slice cannot be
    /// resized, so the tree structure stays untouched.
    pub fn edges_of_mut(&mut self, parent: NodeId) -> &mut [TreeEdge<E>] {
        self.edges_to_children
            .get_mut(parent)
            .map(Vec::as_mut_slice)
            .unwrap_or(&mut [])
    }

    /// All edges as `(parent, edge)`
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, &TreeEdge<E>)> {
        self.edges_to_children
            .iter()
            .enumerate()
            .flat_map(|(parent, list)| list.iter().map(move |e| (parent, e)))
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.edges_of(id).iter().map(|e| e.child)
    }

    /// Every node below `id`, breadth first, `id` excluded
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = self.children(id).collect();
        let mut i = 0;
        while i < out.len() {
            let next = out[i];
            out.extend(self.children(next));
            i += 1;
        }
        out
    }

    /// True if `ancestor` lies strictly above `node`
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.nodes.get(node).and_then(|n| n.parent);
        let mut steps = 0;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.nodes.len() {
                return false;
            }
            current = self.nodes.get(id).and_then(|n| n.parent);
        }
        false
    }

    /// Nodes from the root down to `target`, root first
    pub fn backtrack_path(&self, target: NodeId) -> PlannerResult<Vec<&TreeNode<N>>> {
        let mut node = self
            .nodes
            .get(target)
            .ok_or(PlannerError::NodeNotFound(target))?;
        let mut path = vec![node];
        while let Some(parent) = node.parent {
            node = self.nodes.get(parent).ok_or_else(|| {
                PlannerError::BrokenTree(format!(
                    "parent {} of node {} missing during backtracking",
                    parent, node.id
                ))
            })?;
            path.push(node);
            if path.len() > self.nodes.len() {
                return Err(PlannerError::BrokenTree(format!(
                    "cycle found while backtracking from node {}",
                    target
                )));
            }
        }
        path.reverse();
        Ok(path)
    }

    /// Moves `child` under `new_parent` through `edge`, dropping its old
    /// parent edge. Refuses to hang a node below one of its own descendants.
    pub fn reparent(&mut self, child: NodeId, new_parent: NodeId, edge: E) -> PlannerResult<()> {
        if child >= self.nodes.len() {
            return Err(PlannerError::NodeNotFound(child));
        }
        if new_parent >= self.nodes.len() {
            return Err(PlannerError::NodeNotFound(new_parent));
        }
        if child == new_parent || self.is_ancestor(child, new_parent) {
            return Err(PlannerError::WouldCreateCycle { child, new_parent });
        }
        let old = self.nodes[child].edge_to_parent.ok_or_else(|| {
            PlannerError::BrokenTree(format!("non-root node {} has no parent edge", child))
        })?;

        let siblings = &mut self.edges_to_children[old.parent];
        if siblings.get(old.index).map(|e| e.child) != Some(child) {
            return Err(PlannerError::BrokenTree(format!(
                "edge reference of node {} is stale",
                child
            )));
        }
        siblings.swap_remove(old.index);
        // The former last sibling now sits at `old.index`
        if let Some(moved) = siblings.get(old.index) {
            self.nodes[moved.child].edge_to_parent = Some(old);
        }

        let edges_of_parent = &mut self.edges_to_children[new_parent];
        edges_of_parent.push(TreeEdge { child, data: edge });
        let node = &mut self.nodes[child];
        node.parent = Some(new_parent);
        node.edge_to_parent = Some(EdgeRef {
            parent: new_parent,
            index: edges_of_parent.len() - 1,
        });
        Ok(())
    }

    /// Checks the structural invariants: a single parentless root at id 0,
    /// ids matching positions, consistent edge references, no cycles.
    pub fn check_invariants(&self) -> PlannerResult<()> {
        for (pos, node) in self.nodes.iter().enumerate() {
            if node.id != pos {
                return Err(PlannerError::BrokenTree(format!(
                    "node at slot {} has id {}",
                    pos, node.id
                )));
            }
            match (pos, node.parent, node.edge_to_parent) {
                (0, None, None) => {}
                (0, _, _) => {
                    return Err(PlannerError::BrokenTree("root has a parent".to_string()));
                }
                (_, Some(parent), Some(edge_ref)) => {
                    let edge = self.edge(edge_ref).ok_or_else(|| {
                        PlannerError::BrokenTree(format!("dangling edge reference of node {}", pos))
                    })?;
                    if edge_ref.parent != parent || edge.child != pos {
                        return Err(PlannerError::BrokenTree(format!(
                            "edge reference of node {} does not match its parent",
                            pos
                        )));
                    }
                }
                _ => {
                    return Err(PlannerError::BrokenTree(format!(
                        "node {} lacks a parent or a parent edge",
                        pos
                    )));
                }
            }
        }
        if self.edge_count() + usize::from(!self.nodes.is_empty()) != self.nodes.len() {
            return Err(PlannerError::BrokenTree(
                "edge count does not match node count".to_string(),
            ));
        }
        for node in &self.nodes {
            self.backtrack_path(node.id)?;
        }
        Ok(())
    }
}

impl<N: HasPose, E> MotionTree<N, E> {
    /// Nearest node to `query` under `metric`, measured from the node to the
    /// query, skipping `ignored`. Ties go to the lowest id.
    ///
    /// Returns `Ok(None)` when every candidate is ignored or unreachable
    /// (infinite distance), and `Err(EmptyTree)` for an empty tree.
    pub fn get_nearest_node<Q, M>(
        &self,
        query: &Q,
        metric: &M,
        ignored: Option<&HashSet<NodeId>>,
    ) -> PlannerResult<Option<(NodeId, f64)>>
    where
        Q: HasPose + ?Sized,
        M: DistanceMetric + ?Sized,
    {
        if self.nodes.is_empty() {
            return Err(PlannerError::EmptyTree);
        }
        let to = query.pose();
        let mut best: Option<(NodeId, f64)> = None;
        let mut min_d = f64::INFINITY;
        for node in &self.nodes {
            if ignored.map_or(false, |set| set.contains(&node.id)) {
                continue;
            }
            let from = node.data.pose();
            if metric.cannot_be_nearer_than(from, to, min_d) {
                continue;
            }
            let d = metric.distance(from, to);
            if d < min_d {
                min_d = d;
                best = Some((node.id, d));
            }
        }
        Ok(best)
    }

    /// Every node whose distance to `query` is at most `max_distance`, in id
    /// order
    pub fn get_nodes_within<Q, M>(&self, query: &Q, metric: &M, max_distance: f64) -> Vec<NodeId>
    where
        Q: HasPose + ?Sized,
        M: DistanceMetric + ?Sized,
    {
        let to = query.pose();
        self.nodes
            .iter()
            .filter(|node| {
                let from = node.data.pose();
                !metric.cannot_be_nearer_than(from, to, max_distance)
                    && metric.distance(from, to) <= max_distance
            })
            .map(|node| node.id)
            .collect()
    }
}
