//! Clipboard and duplication with identity remapping.
//!
//! Copies are deep: the clipboard never aliases live nodes. Every paste
//! mints a fresh id per node and rewrites parent links through the
//! old → new table, so repeated pastes never collide.

use crate::project::SCENE_GAP;
use pd_core::geometry::{format_px, style_length};
use pd_core::id::{NodeId, fresh_id};
use pd_core::model::{Node, Scene};
use pd_core::tree::{NodeTree, TreeNode, flatten};
use std::collections::HashMap;

/// Offset applied to pasted root-level nodes so copies don't sit exactly on
/// top of their sources.
pub const PASTE_OFFSET: f64 = 20.0;

#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    nodes: Vec<Node>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the clipboard contents with deep copies of `nodes`.
    /// An empty input leaves the clipboard unchanged.
    pub fn copy<'a>(&mut self, nodes: impl IntoIterator<Item = &'a Node>) -> usize {
        let copied: Vec<Node> = nodes.into_iter().cloned().collect();
        if copied.is_empty() {
            return 0;
        }
        self.nodes = copied;
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Fresh copies of the clipboard contents, ready to append to a scene.
    ///
    /// Parent links to other copied nodes follow the copies; links to
    /// anything outside the clipboard are dropped. Root-level copies are
    /// offset by [`PASTE_OFFSET`] on both axes.
    pub fn instantiate(&self) -> Vec<Node> {
        let remap: HashMap<NodeId, NodeId> =
            self.nodes.iter().map(|n| (n.id, NodeId::fresh())).collect();

        self.nodes
            .iter()
            .map(|source| {
                let mut node = source.clone();
                node.id = remap.get(&source.id).copied().unwrap_or_else(NodeId::fresh);
                node.parent_id = source.parent_id.and_then(|p| remap.get(&p).copied());
                if node.parent_id.is_none() {
                    offset_position(&mut node, PASTE_OFFSET, PASTE_OFFSET);
                }
                node
            })
            .collect()
    }
}

fn offset_position(node: &mut Node, dx: f64, dy: f64) {
    let left = style_length(&node.style, "left") + dx;
    let top = style_length(&node.style, "top") + dy;
    node.style.insert("left".into(), format_px(left).into());
    node.style.insert("top".into(), format_px(top).into());
}

// ─── Scene duplication ───────────────────────────────────────────────────

/// Clone a scene with fresh identities throughout.
///
/// Nodes are remapped over the hierarchical view and flattened back, so
/// parent links always point at the new ids; a link that did not resolve in
/// the source ends up detached. Annotations are copied with new ids. The
/// copy is placed to the right of its source.
pub fn duplicate_scene(source: &Scene) -> Scene {
    let nodes = remap_nodes(&source.nodes);
    let annotations = source
        .annotations
        .iter()
        .map(|a| {
            let mut copy = a.clone();
            copy.id = fresh_id();
            copy
        })
        .collect();

    let scene = Scene {
        id: fresh_id(),
        name: format!("{} (copy)", source.name),
        nodes,
        config: source.config.clone(),
        annotations,
        guides: source.guides.clone(),
        x: Some(source.x.unwrap_or(0.0) + source.config.width + SCENE_GAP),
        y: Some(source.y.unwrap_or(0.0)),
    };
    log::debug!(
        "duplicated scene {} → {} ({} nodes)",
        source.id,
        scene.id,
        scene.nodes.len()
    );
    scene
}

/// Copy a scene's node set with fresh ids, rewriting parent links to match.
pub fn remap_nodes(nodes: &[Node]) -> Vec<Node> {
    let tree = NodeTree::from_nodes(nodes.to_vec());
    let remapped: Vec<TreeNode> = tree.hierarchy().into_iter().map(remap_tree).collect();
    flatten(&remapped)
}

fn remap_tree(mut tree: TreeNode) -> TreeNode {
    tree.node.id = NodeId::fresh();
    tree.children = tree.children.into_iter().map(remap_tree).collect();
    tree
}

#[cfg(test)]
mod tests {
    use super::*;
    use pd_core::model::{Annotation, NodeKind, ProjectConfig};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashSet;

    fn node(id: &str, parent: Option<&str>) -> Node {
        let mut n = Node::new(NodeId::intern(id), NodeKind::Container);
        n.parent_id = parent.map(NodeId::intern);
        n.style = json!({"left": "10px", "top": "30px"}).as_object().unwrap().clone();
        n
    }

    #[test]
    fn empty_copy_keeps_previous_contents() {
        let mut clip = Clipboard::new();
        clip.copy(&[node("cb_keep", None)]);
        assert_eq!(clip.copy(&Vec::<Node>::new()), 0);
        assert_eq!(clip.len(), 1);
    }

    #[test]
    fn instantiate_remaps_internal_links() {
        let mut clip = Clipboard::new();
        let sources = vec![
            node("cb_parent", Some("cb_outside")),
            node("cb_child", Some("cb_parent")),
        ];
        clip.copy(&sources);
        let pasted = clip.instantiate();

        assert_eq!(pasted.len(), 2);
        assert_ne!(pasted[0].id, sources[0].id);
        assert_eq!(pasted[0].parent_id, None);
        assert_eq!(pasted[1].parent_id, Some(pasted[0].id));
        // Only the (now) root copy is offset.
        assert_eq!(pasted[0].style["left"], json!("30px"));
        assert_eq!(pasted[0].style["top"], json!("50px"));
        assert_eq!(pasted[1].style["left"], json!("10px"));

        let again = clip.instantiate();
        assert_ne!(again[0].id, pasted[0].id);
    }

    #[test]
    fn scene_copy_has_disjoint_ids() {
        let mut scene = Scene::new("Home", ProjectConfig::default());
        scene.nodes = vec![
            node("ds_a", None),
            node("ds_b", Some("ds_a")),
            node("ds_c", Some("ds_b")),
            node("ds_d", Some("ds_gone")),
        ];
        scene.annotations.push(Annotation {
            id: "note-1".into(),
            x: 1.0,
            y: 2.0,
            content: "check".into(),
            created_at: 0,
            author: None,
        });

        let copy = duplicate_scene(&scene);
        assert_eq!(copy.name, "Home (copy)");
        assert_ne!(copy.id, scene.id);
        assert_eq!(copy.nodes.len(), 4);
        assert_eq!(copy.x, Some(1920.0 + SCENE_GAP));

        let old: HashSet<NodeId> = scene.nodes.iter().map(|n| n.id).collect();
        let new: HashSet<NodeId> = copy.nodes.iter().map(|n| n.id).collect();
        assert!(old.is_disjoint(&new));
        assert_eq!(new.len(), 4);

        // Every parent link points inside the copy.
        for n in &copy.nodes {
            if let Some(p) = n.parent_id {
                assert!(new.contains(&p));
            }
        }
        let roots = copy.nodes.iter().filter(|n| n.is_root()).count();
        assert_eq!(roots, 2);
        assert_ne!(copy.annotations[0].id, "note-1");
        assert_eq!(copy.annotations[0].content, "check");
    }
}
