//! The editing engine.
//!
//! `Editor` owns the project list and the live working copy of one scene
//! (nodes, config, annotations). UI collaborators call mutation methods on
//! it; every structural mutation that is not batched commits a history
//! snapshot before returning.
//!
//! Invalid requests (unknown ids, cycle-creating moves, empty selections)
//! are absorbed as no-ops and reported through `bool` returns where useful.

use crate::align::{Alignment, align_nodes};
use crate::canvas::{Viewport, apply_expansion, plan_expansion};
use crate::clipboard::{Clipboard, duplicate_scene};
use crate::document::{DesignDocument, DocumentError, ImportedDesign, merge_config, parse_document};
use crate::history::{HistoryLog, Snapshot};
use crate::project::{
    ProjectStore, ProjectTemplate, StoreError, next_scene_position, now_millis,
};
use crate::shortcuts::EditorAction;
use pd_core::codegen::{CodegenOptions, generate_vue_code_with};
use pd_core::geometry::{Bounds, format_px, style_length};
use pd_core::id::{NodeId, fresh_id};
use pd_core::model::{
    Annotation, ComponentSchema, Node, NodeKind, Project, ProjectConfig, PropMap, Scene,
};
use pd_core::tree::{NodeTree, Placement, TreeNode};
use serde::{Deserialize, Serialize};

/// Name of the project created when a design is imported with none open.
const IMPORTED_PROJECT_NAME: &str = "Imported design";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    #[default]
    Edit,
    Preview,
}

/// The editing engine instance.
#[derive(Debug, Clone)]
pub struct Editor {
    nodes: NodeTree,
    config: ProjectConfig,
    annotations: Vec<Annotation>,
    /// Selected ids in selection order.
    selection: Vec<NodeId>,
    history: HistoryLog,
    clipboard: Clipboard,
    viewport: Viewport,
    mode: EditorMode,
    projects: Vec<Project>,
    current_project_id: Option<String>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    /// An empty working copy with the default config and one history entry.
    pub fn new() -> Self {
        let mut editor = Self {
            nodes: NodeTree::new(),
            config: ProjectConfig::default(),
            annotations: Vec::new(),
            selection: Vec::new(),
            history: HistoryLog::new(),
            clipboard: Clipboard::new(),
            viewport: Viewport::default(),
            mode: EditorMode::Edit,
            projects: Vec::new(),
            current_project_id: None,
        };
        editor.init_history();
        editor
    }

    // ─── Read access ─────────────────────────────────────────────────────

    pub fn nodes(&self) -> &[Node] {
        self.nodes.as_slice()
    }

    pub fn tree(&self) -> &NodeTree {
        &self.nodes
    }

    /// Hierarchical view of the live nodes.
    pub fn tree_nodes(&self) -> Vec<TreeNode> {
        self.nodes.hierarchy()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn selection(&self) -> &[NodeId] {
        &self.selection
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn current_project(&self) -> Option<&Project> {
        let id = self.current_project_id.as_deref()?;
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn current_scene_id(&self) -> Option<&str> {
        self.current_project().map(|p| p.current_scene_id.as_str())
    }

    fn current_project_mut(&mut self) -> Option<&mut Project> {
        let id = self.current_project_id.as_deref()?;
        self.projects.iter_mut().find(|p| p.id == id)
    }

    /// Render the live scene as a Vue component.
    pub fn generate_code(&self, options: &CodegenOptions) -> String {
        generate_vue_code_with(self.nodes.as_slice(), &self.config, options)
    }

    // ─── History ─────────────────────────────────────────────────────────

    fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.nodes.to_vec(), self.config.clone())
    }

    /// Commit the live state unless batching or unchanged.
    pub fn save_history(&mut self) {
        let snapshot = self.snapshot();
        self.history.commit(snapshot);
    }

    /// Seed the log with the live state if it is empty.
    pub fn init_history(&mut self) {
        if self.history.is_empty() {
            self.save_history();
        }
    }

    fn reset_history(&mut self) {
        self.history.reset();
        self.save_history();
    }

    /// Suspend (`true`) or resume (`false`) history commits. Resuming
    /// commits the accumulated change as one entry.
    pub fn set_batching(&mut self, batching: bool) {
        self.history.set_batching(batching);
        if !batching {
            self.save_history();
        }
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                self.restore_snapshot(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.restore_snapshot(snapshot);
                true
            }
            None => false,
        }
    }

    fn restore_snapshot(&mut self, snapshot: Snapshot) {
        self.nodes = NodeTree::from_nodes(snapshot.nodes);
        self.config = snapshot.config;
        let nodes = &self.nodes;
        self.selection.retain(|id| nodes.contains(*id));
    }

    // ─── Node mutations ──────────────────────────────────────────────────

    /// Instantiate `schema` as a new node, select it and commit.
    ///
    /// A `parent_id` that is not in the scene is ignored. With a `position`,
    /// the node is absolutely positioned there. Root-level nodes may grow
    /// the canvas.
    pub fn add_node(
        &mut self,
        schema: &ComponentSchema,
        parent_id: Option<NodeId>,
        position: Option<(f64, f64)>,
    ) -> NodeId {
        let mut node = Node::from_schema(schema);
        match parent_id {
            Some(parent) if self.nodes.contains(parent) => node.parent_id = Some(parent),
            Some(parent) => log::warn!("add_node: parent {parent:?} not in scene, adding at root"),
            None => {}
        }
        if let Some((x, y)) = position {
            node.style.insert("position".into(), "absolute".into());
            node.style.insert("left".into(), format_px(x).into());
            node.style.insert("top".into(), format_px(y).into());
        }

        let id = node.id;
        let is_root = node.is_root();
        log::debug!("add_node {id:?} ({})", node.kind.as_str());
        self.nodes.push(node);
        self.selection = vec![id];
        if is_root {
            self.expand_canvas_if_needed(id);
        }
        self.save_history();
        id
    }

    /// Shallow-merge `patch` into the node's style.
    pub fn update_node_style(&mut self, id: NodeId, patch: &PropMap, skip_history: bool) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        merge_into(&mut node.style, patch);
        if !skip_history {
            self.save_history();
        }
    }

    /// Shallow-merge `patch` into the node's props.
    pub fn update_node_props(&mut self, id: NodeId, patch: &PropMap) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        merge_into(&mut node.props, patch);
        self.save_history();
    }

    pub fn update_node_label(&mut self, id: NodeId, label: &str) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        node.label = label.to_string();
        self.save_history();
    }

    pub fn toggle_node_locked(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        node.locked = !node.locked;
        self.save_history();
    }

    /// Flip visibility; a node that becomes hidden leaves the selection.
    pub fn toggle_node_hidden(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        node.hidden = !node.hidden;
        if node.hidden {
            self.selection.retain(|s| *s != id);
        }
        self.save_history();
    }

    /// Reparent `id` under `new_parent` (`None` = root level).
    ///
    /// Rejected (returns `false`, nothing committed) for unknown ids,
    /// unknown parents, no-op moves and moves that would create a cycle.
    pub fn move_node_to_parent(&mut self, id: NodeId, new_parent: Option<NodeId>) -> bool {
        if !self.nodes.reparent(id, new_parent) {
            log::warn!("move_node_to_parent: rejected {id:?} → {new_parent:?}");
            return false;
        }
        log::debug!("moved {id:?} under {new_parent:?}");
        self.save_history();
        true
    }

    /// Move `id` to sit just before `target` in paint order.
    pub fn move_node_to_target(&mut self, id: NodeId, target: NodeId) -> bool {
        self.move_node_relative(id, target, Placement::Before)
    }

    pub fn move_node_relative(&mut self, id: NodeId, target: NodeId, placement: Placement) -> bool {
        if !self.nodes.move_relative(id, target, placement) {
            return false;
        }
        self.save_history();
        true
    }

    /// Delete the selection and everything beneath it.
    pub fn delete_selected_nodes(&mut self) -> usize {
        if self.selection.is_empty() {
            return 0;
        }
        let ids = self.selection.clone();
        self.delete_nodes(&ids)
    }

    /// Delete `ids` and all their descendants; returns how many nodes went.
    pub fn delete_nodes(&mut self, ids: &[NodeId]) -> usize {
        let doomed = self.nodes.descendant_closure(ids);
        if doomed.is_empty() {
            return 0;
        }
        let removed = self.nodes.remove_all(&doomed);
        log::debug!("deleted {} nodes", removed.len());
        self.selection.clear();
        self.save_history();
        removed.len()
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Select `id`. With `multi`, toggle it within the current selection.
    pub fn select_node(&mut self, id: NodeId, multi: bool) {
        if !self.nodes.contains(id) {
            return;
        }
        if multi {
            if let Some(pos) = self.selection.iter().position(|s| *s == id) {
                self.selection.remove(pos);
            } else {
                self.selection.push(id);
            }
        } else {
            self.selection = vec![id];
        }
    }

    /// Replace the selection (e.g. after a marquee); unknown ids are dropped.
    pub fn select_nodes(&mut self, ids: &[NodeId]) {
        self.selection.clear();
        for id in ids {
            if self.nodes.contains(*id) && !self.selection.contains(id) {
                self.selection.push(*id);
            }
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Select every visible node.
    pub fn select_all(&mut self) {
        self.selection = self.nodes.iter().filter(|n| !n.hidden).map(|n| n.id).collect();
    }

    /// Selected nodes in paint order.
    pub fn selected_nodes(&self) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|n| self.selection.contains(&n.id))
            .collect()
    }

    /// The node selected first, shown in the property panel.
    pub fn first_selected_node(&self) -> Option<&Node> {
        self.selection.first().and_then(|id| self.nodes.get(*id))
    }

    // ─── Selection-wide edits ────────────────────────────────────────────

    /// Align the selection (two or more nodes) and commit.
    pub fn align_selected_nodes(&mut self, alignment: Alignment) {
        let selection = &self.selection;
        let mut targets: Vec<&mut Node> = self
            .nodes
            .iter_mut()
            .filter(|n| selection.contains(&n.id))
            .collect();
        if align_nodes(&mut targets, alignment) {
            log::debug!("aligned {} nodes: {alignment:?}", targets.len());
            self.save_history();
        }
    }

    /// Move the selected, unlocked nodes by (`dx`, `dy`) as one history entry.
    /// Children laid out by a flex container stay where the layout puts them.
    pub fn nudge_selected_nodes(&mut self, dx: f64, dy: f64) {
        let movable: Vec<NodeId> = self
            .selection
            .iter()
            .copied()
            .filter(|id| self.is_freely_positioned(*id))
            .collect();
        if movable.is_empty() {
            return;
        }

        let outer_batch = self.history.is_batching();
        if !outer_batch {
            self.set_batching(true);
        }
        for id in movable {
            if let Some(node) = self.nodes.get_mut(id) {
                let left = style_length(&node.style, "left") + dx;
                let top = style_length(&node.style, "top") + dy;
                node.style.insert("left".into(), format_px(left).into());
                node.style.insert("top".into(), format_px(top).into());
            }
        }
        if !outer_batch {
            self.set_batching(false);
        }
    }

    fn is_freely_positioned(&self, id: NodeId) -> bool {
        let Some(node) = self.nodes.get(id) else {
            return false;
        };
        if node.locked {
            return false;
        }
        match node.parent_id.and_then(|p| self.nodes.get(p)) {
            Some(parent) => {
                !(parent.kind == NodeKind::Container && parent.prop_str("display") == Some("flex"))
            }
            None => true,
        }
    }

    /// Lock every selected node if any is unlocked, otherwise unlock all.
    pub fn toggle_selected_locked(&mut self) {
        let selected = self.selected_nodes();
        if selected.is_empty() {
            return;
        }
        let next = selected.iter().any(|n| !n.locked);
        for id in self.selection.clone() {
            if let Some(node) = self.nodes.get_mut(id) {
                node.locked = next;
            }
        }
        self.save_history();
    }

    /// Hide every selected node if any is visible, otherwise show all.
    /// Clears the selection.
    pub fn toggle_selected_hidden(&mut self) {
        let selected = self.selected_nodes();
        if selected.is_empty() {
            return;
        }
        let next = selected.iter().any(|n| !n.hidden);
        for id in std::mem::take(&mut self.selection) {
            if let Some(node) = self.nodes.get_mut(id) {
                node.hidden = next;
            }
        }
        self.save_history();
    }

    // ─── Canvas ──────────────────────────────────────────────────────────

    /// Grow the canvas to fit `rect`, shifting root-level content when it
    /// grows left or up. Does not commit; returns whether anything changed.
    pub fn check_and_expand_canvas(&mut self, rect: &Bounds) -> bool {
        let Some(plan) = plan_expansion(&self.config, rect) else {
            return false;
        };
        log::debug!(
            "canvas expands to {}×{} (shift {}, {})",
            plan.width,
            plan.height,
            plan.shift_x,
            plan.shift_y
        );
        apply_expansion(&plan, &mut self.config, self.nodes.iter_mut(), &mut self.viewport);
        true
    }

    /// Run the expansion check for one node's style bounds.
    pub fn expand_canvas_if_needed(&mut self, id: NodeId) -> bool {
        let Some(rect) = self.nodes.get(id).map(|n| Bounds::of_style(&n.style)) else {
            return false;
        };
        self.check_and_expand_canvas(&rect)
    }

    /// One expansion check over the union of the given root-level nodes,
    /// committing if the canvas changed.
    pub fn expand_canvas_for_nodes(&mut self, ids: &[NodeId]) -> bool {
        let rect = ids
            .iter()
            .filter_map(|id| self.nodes.get(*id))
            .filter(|n| n.is_root())
            .map(|n| Bounds::of_style(&n.style))
            .reduce(|a, b| a.union(&b));
        let Some(rect) = rect else {
            return false;
        };
        let changed = self.check_and_expand_canvas(&rect);
        if changed {
            self.save_history();
        }
        changed
    }

    pub fn set_lock_size(&mut self, locked: bool) {
        self.config.lock_size = locked;
        self.save_history();
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.viewport.set_zoom(zoom);
    }

    pub fn set_offset(&mut self, x: f64, y: f64) {
        self.viewport.set_offset(x, y);
    }

    // ─── Clipboard ───────────────────────────────────────────────────────

    /// Copy the selected nodes; returns how many were copied.
    pub fn copy_nodes(&mut self) -> usize {
        let selected: Vec<Node> = self.selected_nodes().into_iter().cloned().collect();
        self.clipboard.copy(&selected)
    }

    /// Copy, then delete the selection with its descendants.
    pub fn cut_nodes(&mut self) -> usize {
        let copied = self.copy_nodes();
        if copied > 0 {
            self.delete_selected_nodes();
        }
        copied
    }

    /// Append fresh copies of the clipboard and select them.
    pub fn paste_nodes(&mut self) -> Vec<NodeId> {
        if self.clipboard.is_empty() {
            return Vec::new();
        }
        let pasted = self.clipboard.instantiate();
        let ids: Vec<NodeId> = pasted.iter().map(|n| n.id).collect();
        log::debug!("pasted {} nodes", ids.len());
        self.nodes.extend(pasted);
        self.selection = ids.clone();
        self.save_history();
        ids
    }

    pub fn duplicate_selected_nodes(&mut self) -> Vec<NodeId> {
        if self.copy_nodes() == 0 {
            return Vec::new();
        }
        self.paste_nodes()
    }

    // ─── Mode ────────────────────────────────────────────────────────────

    /// Switch mode; entering preview clears the selection.
    pub fn set_mode(&mut self, mode: EditorMode) {
        self.mode = mode;
        if mode == EditorMode::Preview {
            self.selection.clear();
        }
    }

    // ─── Annotations ─────────────────────────────────────────────────────

    pub fn add_annotation(
        &mut self,
        x: f64,
        y: f64,
        content: &str,
        author: Option<String>,
    ) -> String {
        let annotation = Annotation {
            id: fresh_id(),
            x,
            y,
            content: content.to_string(),
            created_at: now_millis(),
            author,
        };
        let id = annotation.id.clone();
        self.annotations.push(annotation);
        id
    }

    pub fn update_annotation(&mut self, id: &str, content: &str) -> bool {
        match self.annotations.iter_mut().find(|a| a.id == id) {
            Some(annotation) => {
                annotation.content = content.to_string();
                true
            }
            None => false,
        }
    }

    pub fn delete_annotation(&mut self, id: &str) -> bool {
        let before = self.annotations.len();
        self.annotations.retain(|a| a.id != id);
        self.annotations.len() != before
    }

    pub fn clear_annotations(&mut self) {
        self.annotations.clear();
    }

    // ─── Working copy ────────────────────────────────────────────────────

    /// Replace the live working copy with `scene`'s contents and reset
    /// history to a single entry.
    fn load_scene(&mut self, scene: &Scene) {
        let mut tree = NodeTree::from_nodes(scene.nodes.clone());
        if tree.detach_cycles() > 0 {
            log::warn!("scene {}: detached cyclic parent links", scene.id);
        }
        self.nodes = tree;
        self.config = scene.config.clone();
        self.annotations = scene.annotations.clone();
        self.selection.clear();
        self.reset_history();
        log::debug!("loaded scene {} ({} nodes)", scene.id, self.nodes.len());
    }

    fn clear_working_copy(&mut self, config: ProjectConfig) {
        self.nodes = NodeTree::new();
        self.config = config;
        self.annotations.clear();
        self.selection.clear();
        self.reset_history();
    }

    /// Start over with an empty scene. `config_patch` is merged over the
    /// default config; an invalid patch leaves everything untouched.
    pub fn new_document(&mut self, config_patch: Option<&PropMap>) -> Result<(), DocumentError> {
        let config = match config_patch {
            Some(patch) => merge_config(&ProjectConfig::default(), patch)?,
            None => ProjectConfig::default(),
        };
        self.clipboard.clear();
        self.mode = EditorMode::Edit;
        self.viewport = Viewport::default();
        self.clear_working_copy(config);
        Ok(())
    }

    // ─── Projects ────────────────────────────────────────────────────────

    /// Write the live working copy into the current scene.
    pub fn sync_current_project(&mut self) {
        let nodes = self.nodes.to_vec();
        let config = self.config.clone();
        let annotations = self.annotations.clone();
        let Some(project) = self.current_project_mut() else {
            return;
        };
        let scene_id = project.current_scene_id.clone();
        let Some(scene) = project.scene_mut(&scene_id) else {
            return;
        };
        scene.nodes = nodes;
        scene.config = config;
        scene.annotations = annotations;
        project.updated_at = now_millis();
    }

    /// Create a project with one empty scene and open it.
    pub fn create_project(&mut self, name: &str, config: Option<ProjectConfig>) -> String {
        let scene = Scene::new("Scene 1", config.unwrap_or_default());
        let project = Project::new(name, vec![scene], now_millis());
        self.insert_and_open(project)
    }

    pub fn create_project_from_template(&mut self, template: &ProjectTemplate) -> String {
        let project = template.instantiate(now_millis());
        self.insert_and_open(project)
    }

    fn insert_and_open(&mut self, project: Project) -> String {
        let id = project.id.clone();
        log::debug!("created project {} ({})", project.name, id);
        self.projects.push(project);
        self.open_project(&id);
        id
    }

    /// Flush the outgoing project and load the incoming one's current scene.
    pub fn open_project(&mut self, id: &str) -> bool {
        if !self.projects.iter().any(|p| p.id == id) {
            log::warn!("open_project: unknown project {id}");
            return false;
        }
        self.sync_current_project();
        self.current_project_id = Some(id.to_string());

        let scene = self.current_project().and_then(|project| {
            project
                .current_scene()
                .or_else(|| project.scenes.first())
                .cloned()
        });
        match scene {
            Some(scene) => {
                if let Some(project) = self.current_project_mut() {
                    project.current_scene_id = scene.id.clone();
                }
                self.load_scene(&scene);
            }
            None => self.clear_working_copy(ProjectConfig::default()),
        }
        true
    }

    /// Remove a project. Deleting the open one closes it.
    pub fn delete_project(&mut self, id: &str) -> bool {
        let before = self.projects.len();
        self.projects.retain(|p| p.id != id);
        if self.projects.len() == before {
            return false;
        }
        if self.current_project_id.as_deref() == Some(id) {
            self.current_project_id = None;
            self.clear_working_copy(ProjectConfig::default());
        }
        true
    }

    pub fn rename_project(&mut self, id: &str, name: &str) -> bool {
        match self.projects.iter_mut().find(|p| p.id == id) {
            Some(project) => {
                project.name = name.to_string();
                project.updated_at = now_millis();
                true
            }
            None => false,
        }
    }

    /// Make `id` the current scene of the open project.
    pub fn switch_scene(&mut self, id: &str) -> bool {
        let exists = self
            .current_project()
            .is_some_and(|p| p.scenes.iter().any(|s| s.id == id));
        if !exists {
            log::warn!("switch_scene: unknown scene {id}");
            return false;
        }
        self.sync_current_project();
        let Some(project) = self.current_project_mut() else {
            return false;
        };
        project.current_scene_id = id.to_string();
        let Some(scene) = project.scene(id).cloned() else {
            return false;
        };
        self.load_scene(&scene);
        true
    }

    /// Append a scene using the current config and switch to it.
    pub fn add_scene(&mut self, name: Option<&str>) -> Option<String> {
        let config = self.config.clone();
        let project = self.current_project_mut()?;
        let name = match name {
            Some(name) => name.to_string(),
            None => format!("Scene {}", project.scenes.len() + 1),
        };
        let (x, y) = next_scene_position(&project.scenes);
        let mut scene = Scene::new(name, config);
        scene.x = Some(x);
        scene.y = Some(y);
        let id = scene.id.clone();
        project.scenes.push(scene);
        self.switch_scene(&id);
        Some(id)
    }

    /// Remove a scene; the last scene of a project cannot be deleted.
    pub fn delete_scene(&mut self, id: &str) -> bool {
        let Some(project) = self.current_project_mut() else {
            return false;
        };
        if project.scenes.len() <= 1 {
            log::warn!("delete_scene: refusing to delete the only scene");
            return false;
        }
        let Some(pos) = project.scenes.iter().position(|s| s.id == id) else {
            return false;
        };
        project.scenes.remove(pos);
        project.updated_at = now_millis();

        if project.current_scene_id == id {
            let next = project.scenes[pos.min(project.scenes.len() - 1)].clone();
            project.current_scene_id = next.id.clone();
            self.load_scene(&next);
        }
        true
    }

    pub fn rename_scene(&mut self, id: &str, name: &str) -> bool {
        let Some(project) = self.current_project_mut() else {
            return false;
        };
        match project.scene_mut(id) {
            Some(scene) => {
                scene.name = name.to_string();
                true
            }
            None => false,
        }
    }

    /// Insert a fresh-identity copy of a scene right after it.
    pub fn duplicate_scene(&mut self, id: &str) -> Option<String> {
        self.sync_current_project();
        let project = self.current_project_mut()?;
        let pos = project.scenes.iter().position(|s| s.id == id)?;
        let copy = duplicate_scene(&project.scenes[pos]);
        let copy_id = copy.id.clone();
        project.scenes.insert(pos + 1, copy);
        project.updated_at = now_millis();
        Some(copy_id)
    }

    /// Sync the working copy and save every project.
    pub fn persist(&mut self, store: &mut dyn ProjectStore) -> Result<(), StoreError> {
        self.sync_current_project();
        store.save(&self.projects)
    }

    /// Replace the project list with the store's. The open project is
    /// reloaded if it still exists, otherwise closed.
    pub fn restore(&mut self, store: &dyn ProjectStore) -> Result<(), StoreError> {
        self.projects = store.load()?;
        log::debug!("restored {} projects", self.projects.len());
        match self.current_project_id.take() {
            Some(id) if self.projects.iter().any(|p| p.id == id) => {
                self.open_project(&id);
            }
            Some(_) => self.clear_working_copy(ProjectConfig::default()),
            None => {}
        }
        Ok(())
    }

    // ─── Import / export ─────────────────────────────────────────────────

    /// Serialize the open project (and live working copy) as a version 2
    /// design document.
    pub fn export_design(&mut self) -> Result<String, serde_json::Error> {
        self.sync_current_project();
        let (scenes, current_scene_id) = match self.current_project() {
            Some(project) => (project.scenes.clone(), project.current_scene_id.clone()),
            None => (Vec::new(), String::new()),
        };
        DesignDocument::new(scenes, current_scene_id, self.config.clone(), self.nodes.to_vec())
            .to_json()
    }

    /// Replace the open project's scenes (or create a project) from a design
    /// document. On error nothing changes.
    pub fn import_design(&mut self, text: &str) -> Result<(), DocumentError> {
        let design = parse_document(text, &self.config)?;
        self.install_design(design);
        Ok(())
    }

    fn install_design(&mut self, design: ImportedDesign) {
        let annotations = design
            .current_scene()
            .map(|s| s.annotations.clone())
            .unwrap_or_default();
        log::debug!(
            "importing {} scene(s){}",
            design.scenes.len(),
            if design.legacy { " from legacy document" } else { "" }
        );

        match self.current_project_mut() {
            Some(project) => {
                project.scenes = design.scenes;
                project.current_scene_id = design.current_scene_id;
                project.updated_at = now_millis();
            }
            None => {
                let mut project = Project::new(IMPORTED_PROJECT_NAME, design.scenes, now_millis());
                project.current_scene_id = design.current_scene_id;
                self.current_project_id = Some(project.id.clone());
                self.projects.push(project);
            }
        }

        self.nodes = NodeTree::from_nodes(design.nodes);
        self.config = design.config;
        self.annotations = annotations;
        self.selection.clear();
        self.reset_history();
    }

    // ─── Shortcuts ───────────────────────────────────────────────────────

    /// Apply a resolved keyboard action.
    pub fn dispatch(&mut self, action: EditorAction) {
        match action {
            EditorAction::Undo => {
                self.undo();
            }
            EditorAction::Redo => {
                self.redo();
            }
            EditorAction::Copy => {
                self.copy_nodes();
            }
            EditorAction::Cut => {
                self.cut_nodes();
            }
            EditorAction::Paste => {
                self.paste_nodes();
            }
            EditorAction::Duplicate => {
                self.duplicate_selected_nodes();
            }
            EditorAction::SelectAll => self.select_all(),
            EditorAction::Deselect => self.clear_selection(),
            EditorAction::Delete => {
                self.delete_selected_nodes();
            }
            EditorAction::Nudge { dx, dy } => self.nudge_selected_nodes(dx, dy),
            EditorAction::ToggleLock => self.toggle_selected_locked(),
            EditorAction::ToggleHidden => self.toggle_selected_hidden(),
        }
    }
}

fn merge_into(target: &mut PropMap, patch: &PropMap) {
    for (key, value) in patch {
        target.insert(key.clone(), value.clone());
    }
}
