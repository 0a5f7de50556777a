//! Flat node storage with a derived hierarchy.
//!
//! `NodeTree` owns one scene's nodes as a single paint-ordered `Vec` and
//! keeps an id → position index beside it. Parent/child structure lives only
//! in each node's `parent_id`; the nested [`TreeNode`] view is computed on
//! demand and never edited directly.

use crate::id::NodeId;
use crate::model::Node;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Where `move_relative` drops a node relative to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    #[default]
    Before,
    After,
}

/// A node together with its children, as seen in the hierarchical view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub node: Node,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

/// Flat, paint-ordered node storage for one scene.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeTree {
    nodes: Vec<Node>,
    /// Index from NodeId → position in `nodes`.
    index: HashMap<NodeId, usize>,
}

impl NodeTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        let mut tree = Self {
            nodes,
            index: HashMap::new(),
        };
        tree.rebuild_index();
        tree
    }

    /// Rebuild the `index` (needed after any reordering or removal).
    /// The first occurrence of a duplicated id wins.
    fn rebuild_index(&mut self) {
        self.index.clear();
        for (pos, node) in self.nodes.iter().enumerate() {
            self.index.entry(node.id).or_insert(pos);
        }
    }

    pub fn as_slice(&self) -> &[Node] {
        &self.nodes
    }

    pub fn to_vec(&self) -> Vec<Node> {
        self.nodes.clone()
    }

    pub fn into_vec(self) -> Vec<Node> {
        self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.nodes.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Node> {
        self.nodes.iter_mut()
    }

    /// Append a node on top of the paint order.
    pub fn push(&mut self, node: Node) {
        self.index.entry(node.id).or_insert(self.nodes.len());
        self.nodes.push(node);
    }

    pub fn extend(&mut self, nodes: impl IntoIterator<Item = Node>) {
        for node in nodes {
            self.push(node);
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.index.get(&id).map(|&pos| &self.nodes[pos])
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.index.get(&id).copied().map(|pos| &mut self.nodes[pos])
    }

    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent_id)
    }

    /// Direct children of `id`, in paint order.
    pub fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.parent_id == Some(id))
            .map(|n| n.id)
            .collect()
    }

    /// Root-level nodes (no parent), in paint order.
    pub fn roots(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_root())
    }

    /// Check if `ancestor` is a parent/grandparent/etc. of `descendant`.
    pub fn is_ancestor_of(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        let mut seen = HashSet::new();
        let mut current = self.parent_of(descendant);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            if !seen.insert(id) {
                break;
            }
            current = self.parent_of(id);
        }
        false
    }

    /// Whether `id` may be moved under `new_parent` (`None` = root level).
    ///
    /// Refuses unknown ids, no-op moves, and any move that would put a node
    /// beneath itself.
    pub fn can_reparent(&self, id: NodeId, new_parent: Option<NodeId>) -> bool {
        let Some(node) = self.get(id) else {
            return false;
        };
        if node.parent_id == new_parent {
            return false;
        }
        match new_parent {
            None => true,
            Some(parent) => {
                self.contains(parent) && parent != id && !self.is_ancestor_of(id, parent)
            }
        }
    }

    /// Reassign `parent_id`. Returns `false` (tree unchanged) when refused.
    pub fn reparent(&mut self, id: NodeId, new_parent: Option<NodeId>) -> bool {
        if !self.can_reparent(id, new_parent) {
            return false;
        }
        if let Some(node) = self.get_mut(id) {
            node.parent_id = new_parent;
        }
        true
    }

    /// Move `id` directly before or after `target` in the paint order.
    /// Parent links are untouched.
    pub fn move_relative(&mut self, id: NodeId, target: NodeId, placement: Placement) -> bool {
        if id == target {
            return false;
        }
        let (Some(from), Some(_)) = (self.position(id), self.position(target)) else {
            return false;
        };
        let moved = self.nodes.remove(from);
        let to = self
            .nodes
            .iter()
            .position(|n| n.id == target)
            .unwrap_or(self.nodes.len());
        let insert_at = match placement {
            Placement::Before => to,
            Placement::After => to + 1,
        };
        self.nodes.insert(insert_at.min(self.nodes.len()), moved);
        self.rebuild_index();
        true
    }

    /// Every id in `ids` plus all of their transitive descendants.
    pub fn descendant_closure(&self, ids: &[NodeId]) -> HashSet<NodeId> {
        let mut graph: DiGraph<NodeId, ()> =
            DiGraph::with_capacity(self.nodes.len(), self.nodes.len());
        let indices: Vec<NodeIndex> = self.nodes.iter().map(|n| graph.add_node(n.id)).collect();
        for (pos, node) in self.nodes.iter().enumerate() {
            if let Some(parent_pos) = node.parent_id.and_then(|p| self.position(p)) {
                graph.add_edge(indices[parent_pos], indices[pos], ());
            }
        }

        let mut closure = HashSet::new();
        for id in ids {
            let Some(pos) = self.position(*id) else {
                continue;
            };
            let mut dfs = Dfs::new(&graph, indices[pos]);
            while let Some(nx) = dfs.next(&graph) {
                closure.insert(graph[nx]);
            }
        }
        closure
    }

    /// Remove every node in `ids`, returning the removed nodes in paint order.
    pub fn remove_all(&mut self, ids: &HashSet<NodeId>) -> Vec<Node> {
        let (removed, kept): (Vec<Node>, Vec<Node>) = std::mem::take(&mut self.nodes)
            .into_iter()
            .partition(|n| ids.contains(&n.id));
        self.nodes = kept;
        self.rebuild_index();
        removed
    }

    /// Break any `parent_id` loop by detaching the node that closes it.
    /// Returns how many links were cut.
    pub fn detach_cycles(&mut self) -> usize {
        let mut detached = 0;
        for pos in 0..self.nodes.len() {
            let start = self.nodes[pos].id;
            let mut seen = HashSet::from([start]);
            let mut current = start;
            while let Some(parent) = self.parent_of(current) {
                if !seen.insert(parent) {
                    if let Some(node) = self.get_mut(current) {
                        log::warn!("detaching {current:?} from {parent:?}: parent cycle");
                        node.parent_id = None;
                    }
                    detached += 1;
                    break;
                }
                current = parent;
            }
        }
        detached
    }

    /// Nested view: roots in paint order, children grouped under parents.
    ///
    /// Nodes whose `parent_id` does not resolve are treated as roots.
    pub fn hierarchy(&self) -> Vec<TreeNode> {
        let mut children: HashMap<NodeId, Vec<usize>> = HashMap::new();
        let mut roots = Vec::new();
        for (pos, node) in self.nodes.iter().enumerate() {
            match node.parent_id.filter(|p| *p != node.id && self.contains(*p)) {
                Some(parent) => children.entry(parent).or_default().push(pos),
                None => roots.push(pos),
            }
        }

        let mut visited = vec![false; self.nodes.len()];
        let mut out: Vec<TreeNode> = Vec::with_capacity(roots.len());
        for pos in roots {
            out.push(self.build_subtree(pos, &children, &mut visited));
        }
        // Nodes caught in a parent loop never hang off a root.
        for pos in 0..self.nodes.len() {
            if !visited[pos] {
                out.push(self.build_subtree(pos, &children, &mut visited));
            }
        }
        out
    }

    fn build_subtree(
        &self,
        pos: usize,
        children: &HashMap<NodeId, Vec<usize>>,
        visited: &mut [bool],
    ) -> TreeNode {
        visited[pos] = true;
        let node = self.nodes[pos].clone();
        let mut kids = Vec::new();
        if let Some(child_positions) = children.get(&node.id) {
            for &child in child_positions {
                if !visited[child] {
                    kids.push(self.build_subtree(child, children, visited));
                }
            }
        }
        TreeNode {
            node,
            children: kids,
        }
    }
}

/// Flatten a nested view back into `parent_id` form (pre-order).
///
/// Each node's `parent_id` is rewritten from the structure it sits in, so
/// the result is consistent regardless of what the tree nodes carried.
pub fn flatten(trees: &[TreeNode]) -> Vec<Node> {
    fn walk(tree: &TreeNode, parent: Option<NodeId>, out: &mut Vec<Node>) {
        let mut node = tree.node.clone();
        node.parent_id = parent;
        let id = node.id;
        out.push(node);
        for child in &tree.children {
            walk(child, Some(id), out);
        }
    }

    let mut out = Vec::new();
    for tree in trees {
        walk(tree, None, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeKind;
    use pretty_assertions::assert_eq;

    fn node(id: &str, parent: Option<&str>) -> Node {
        let mut n = Node::new(NodeId::intern(id), NodeKind::Container);
        n.parent_id = parent.map(NodeId::intern);
        n
    }

    fn ids(tree: &NodeTree) -> Vec<&str> {
        tree.iter().map(|n| n.id.as_str()).collect()
    }

    fn sample() -> NodeTree {
        // a ─ b ─ c
        //   └ d
        // e
        NodeTree::from_nodes(vec![
            node("t_a", None),
            node("t_b", Some("t_a")),
            node("t_c", Some("t_b")),
            node("t_d", Some("t_a")),
            node("t_e", None),
        ])
    }

    #[test]
    fn lookup_and_children() {
        let tree = sample();
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.position(NodeId::intern("t_d")), Some(3));
        assert_eq!(
            tree.children_of(NodeId::intern("t_a")),
            vec![NodeId::intern("t_b"), NodeId::intern("t_d")]
        );
        assert_eq!(tree.roots().count(), 2);
    }

    #[test]
    fn ancestry() {
        let tree = sample();
        assert!(tree.is_ancestor_of(NodeId::intern("t_a"), NodeId::intern("t_c")));
        assert!(!tree.is_ancestor_of(NodeId::intern("t_c"), NodeId::intern("t_a")));
        assert!(!tree.is_ancestor_of(NodeId::intern("t_a"), NodeId::intern("t_a")));
        assert!(!tree.is_ancestor_of(NodeId::intern("t_e"), NodeId::intern("t_c")));
    }

    #[test]
    fn reparent_rejects_cycles() {
        let mut tree = sample();
        // a under its grandchild c
        assert!(!tree.reparent(NodeId::intern("t_a"), Some(NodeId::intern("t_c"))));
        assert_eq!(tree.parent_of(NodeId::intern("t_a")), None);
        // onto itself
        assert!(!tree.reparent(NodeId::intern("t_b"), Some(NodeId::intern("t_b"))));
        // no-op
        assert!(!tree.reparent(NodeId::intern("t_b"), Some(NodeId::intern("t_a"))));
        // unknown parent
        assert!(!tree.reparent(NodeId::intern("t_b"), Some(NodeId::intern("t_missing"))));
        // legal
        assert!(tree.reparent(NodeId::intern("t_c"), Some(NodeId::intern("t_e"))));
        assert_eq!(tree.parent_of(NodeId::intern("t_c")), Some(NodeId::intern("t_e")));
        assert!(tree.reparent(NodeId::intern("t_d"), None));
    }

    #[test]
    fn move_relative_reorders_only() {
        let mut tree = sample();
        assert!(tree.move_relative(NodeId::intern("t_e"), NodeId::intern("t_b"), Placement::Before));
        assert_eq!(ids(&tree), vec!["t_a", "t_e", "t_b", "t_c", "t_d"]);
        assert!(tree.move_relative(NodeId::intern("t_a"), NodeId::intern("t_d"), Placement::After));
        assert_eq!(ids(&tree), vec!["t_e", "t_b", "t_c", "t_d", "t_a"]);
        assert_eq!(tree.position(NodeId::intern("t_a")), Some(4));
        assert_eq!(tree.parent_of(NodeId::intern("t_b")), Some(NodeId::intern("t_a")));
        assert!(!tree.move_relative(NodeId::intern("t_a"), NodeId::intern("t_a"), Placement::Before));
    }

    #[test]
    fn closure_is_transitive() {
        let tree = sample();
        let closure = tree.descendant_closure(&[NodeId::intern("t_b")]);
        assert_eq!(closure.len(), 2);
        assert!(closure.contains(&NodeId::intern("t_c")));

        let closure = tree.descendant_closure(&[NodeId::intern("t_a"), NodeId::intern("t_x")]);
        assert_eq!(closure.len(), 4);
        assert!(!closure.contains(&NodeId::intern("t_e")));
    }

    #[test]
    fn remove_all_keeps_order() {
        let mut tree = sample();
        let closure = tree.descendant_closure(&[NodeId::intern("t_b")]);
        let removed = tree.remove_all(&closure);
        assert_eq!(removed.len(), 2);
        assert_eq!(ids(&tree), vec!["t_a", "t_d", "t_e"]);
        assert_eq!(tree.position(NodeId::intern("t_e")), Some(2));
    }

    #[test]
    fn hierarchy_groups_children() {
        let tree = sample();
        let view = tree.hierarchy();
        assert_eq!(view.len(), 2);
        assert_eq!(view[0].node.id.as_str(), "t_a");
        assert_eq!(view[0].children.len(), 2);
        assert_eq!(view[0].children[0].children[0].node.id.as_str(), "t_c");

        let flat = flatten(&view);
        let flat_ids: Vec<&str> = flat.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(flat_ids, vec!["t_a", "t_b", "t_c", "t_d", "t_e"]);
        assert_eq!(flat[2].parent_id, Some(NodeId::intern("t_b")));
    }

    #[test]
    fn dangling_parent_is_a_root_in_the_view() {
        let tree = NodeTree::from_nodes(vec![node("t_orphan", Some("t_gone"))]);
        let view = tree.hierarchy();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].node.id.as_str(), "t_orphan");
    }

    #[test]
    fn cycles_are_detached() {
        let mut tree = NodeTree::from_nodes(vec![
            node("t_p", Some("t_q")),
            node("t_q", Some("t_p")),
            node("t_self", Some("t_self")),
        ]);
        // The view still shows every node once.
        assert_eq!(flatten(&tree.hierarchy()).len(), 3);

        assert_eq!(tree.detach_cycles(), 2);
        assert_eq!(tree.detach_cycles(), 0);
        assert_eq!(tree.parent_of(NodeId::intern("t_self")), None);
        assert!(!tree.is_ancestor_of(NodeId::intern("t_p"), NodeId::intern("t_p")));
    }
}
