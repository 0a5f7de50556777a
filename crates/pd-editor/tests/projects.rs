//! Integration tests: projects, scenes, persistence and keyboard dispatch.

use pd_core::id::NodeId;
use pd_core::model::ComponentSchema;
use pd_editor::project::SCENE_GAP;
use pd_editor::{Alignment, Editor, EditorMode, MemoryStore, ProjectTemplate, ShortcutMap};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashSet;

fn button() -> ComponentSchema {
    let mut schema = ComponentSchema::new("button", "Go");
    schema.default_style.insert("width".into(), json!("100px"));
    schema.default_style.insert("height".into(), json!("40px"));
    schema
}

// ─── Projects ───────────────────────────────────────────────────────────

#[test]
fn create_project_opens_a_single_empty_scene() {
    let mut editor = Editor::new();
    let id = editor.create_project("Landing", None);

    let project = editor.current_project().unwrap();
    assert_eq!(project.id, id);
    assert_eq!(project.name, "Landing");
    assert_eq!(project.scenes.len(), 1);
    assert_eq!(editor.current_scene_id(), Some(project.scenes[0].id.as_str()));
    assert!(editor.nodes().is_empty());
    assert_eq!(editor.history().len(), 1);
}

#[test]
fn blank_template_uses_mobile_canvas() {
    let mut editor = Editor::new();
    editor.create_project_from_template(&ProjectTemplate::blank());
    assert_eq!(editor.config().width, 750.0);
    assert_eq!(editor.config().height, 1334.0);
    assert_eq!(editor.current_project().unwrap().scenes[0].name, "主画布");
}

#[test]
fn switching_projects_keeps_each_working_copy() {
    let mut editor = Editor::new();
    let first = editor.create_project("First", None);
    let node = editor.add_node(&button(), None, Some((100.0, 100.0)));

    let second = editor.create_project("Second", None);
    assert!(editor.nodes().is_empty());
    assert_eq!(editor.current_project().map(|p| p.id.as_str()), Some(second.as_str()));

    assert!(editor.open_project(&first));
    assert!(editor.node(node).is_some());
    assert!(!editor.open_project("no-such-project"));
}

#[test]
fn deleting_the_open_project_closes_it() {
    let mut editor = Editor::new();
    let keep = editor.create_project("Keep", None);
    let doomed = editor.create_project("Doomed", None);
    editor.add_node(&button(), None, Some((100.0, 100.0)));

    assert!(editor.delete_project(&doomed));
    assert!(editor.current_project().is_none());
    assert!(editor.nodes().is_empty());
    assert_eq!(editor.projects().len(), 1);
    assert!(!editor.delete_project(&doomed));

    assert!(editor.rename_project(&keep, "Kept"));
    assert_eq!(editor.projects()[0].name, "Kept");
}

// ─── Scenes ─────────────────────────────────────────────────────────────

#[test]
fn scene_switch_round_trip() {
    let mut editor = Editor::new();
    editor.create_project("Scenes", None);
    let first = editor.current_scene_id().unwrap().to_string();
    let node = editor.add_node(&button(), None, Some((100.0, 100.0)));
    editor.add_annotation(5.0, 5.0, "hero goes here", Some("ana".into()));

    let second = editor.add_scene(None).unwrap();
    assert_eq!(editor.current_scene_id(), Some(second.as_str()));
    assert!(editor.nodes().is_empty());
    assert!(editor.annotations().is_empty());
    assert_eq!(editor.current_project().unwrap().scenes[1].name, "Scene 2");

    assert!(editor.switch_scene(&first));
    assert!(editor.node(node).is_some());
    assert_eq!(editor.annotations().len(), 1);
    assert_eq!(editor.history().len(), 1);
    assert!(!editor.history().can_undo());

    assert!(!editor.switch_scene("missing"));
    assert_eq!(editor.current_scene_id(), Some(first.as_str()));
}

#[test]
fn new_scene_lands_right_of_the_rightmost() {
    let mut editor = Editor::new();
    editor.create_project("Layout", None);
    let width = editor.config().width;
    let second = editor.add_scene(Some("Next")).unwrap();

    let project = editor.current_project().unwrap();
    let scene = project.scene(&second).unwrap();
    assert_eq!(scene.name, "Next");
    assert_eq!(scene.x, Some(width + SCENE_GAP));
    assert_eq!(scene.config, project.scenes[0].config);
}

#[test]
fn last_scene_cannot_be_deleted() {
    let mut editor = Editor::new();
    editor.create_project("Solo", None);
    let only = editor.current_scene_id().unwrap().to_string();
    assert!(!editor.delete_scene(&only));

    let second = editor.add_scene(None).unwrap();
    assert!(editor.delete_scene(&second));
    assert_eq!(editor.current_scene_id(), Some(only.as_str()));
    assert!(!editor.delete_scene("missing"));
}

#[test]
fn rename_scene() {
    let mut editor = Editor::new();
    editor.create_project("Names", None);
    let id = editor.current_scene_id().unwrap().to_string();
    assert!(editor.rename_scene(&id, "Home"));
    assert_eq!(editor.current_project().unwrap().scenes[0].name, "Home");
    assert!(!editor.rename_scene("missing", "Nope"));
}

#[test]
fn duplicated_scene_has_disjoint_identity() {
    let mut editor = Editor::new();
    editor.create_project("Dup", None);
    let source_id = editor.current_scene_id().unwrap().to_string();
    let parent = editor.add_node(&ComponentSchema::new("container", "Card"), None, Some((100.0, 100.0)));
    editor.add_node(&ComponentSchema::new("text", "Body"), Some(parent), None);
    editor.add_annotation(1.0, 2.0, "note", None);

    let copy_id = editor.duplicate_scene(&source_id).unwrap();
    assert_eq!(editor.current_scene_id(), Some(source_id.as_str()));

    let project = editor.current_project().unwrap();
    assert_eq!(project.scenes[1].id, copy_id);
    let source = project.scene(&source_id).unwrap();
    let copy = project.scene(&copy_id).unwrap();
    assert_eq!(copy.name, format!("{} (copy)", source.name));
    assert_eq!(copy.nodes.len(), 2);

    let source_ids: HashSet<NodeId> = source.nodes.iter().map(|n| n.id).collect();
    assert!(copy.nodes.iter().all(|n| !source_ids.contains(&n.id)));
    let copy_ids: HashSet<NodeId> = copy.nodes.iter().map(|n| n.id).collect();
    assert!(copy.nodes.iter().filter_map(|n| n.parent_id).all(|p| copy_ids.contains(&p)));
    assert!(copy.annotations[0].id != source.annotations[0].id);
    assert_eq!(copy.annotations[0].content, "note");

    assert!(editor.duplicate_scene("missing").is_none());
}

// ─── Persistence ────────────────────────────────────────────────────────

#[test]
fn persist_and_restore() {
    let mut editor = Editor::new();
    let project = editor.create_project("Saved", None);
    let node = editor.add_node(&button(), None, Some((100.0, 100.0)));

    let mut store = MemoryStore::new();
    editor.persist(&mut store).unwrap();
    assert!(store.raw().is_some_and(|raw| raw.contains("Saved")));

    let mut restored = Editor::new();
    restored.restore(&store).unwrap();
    assert_eq!(restored.projects(), editor.projects());
    assert!(restored.current_project().is_none());

    assert!(restored.open_project(&project));
    assert!(restored.node(node).is_some());
}

#[test]
fn restore_reports_malformed_storage() {
    let store = MemoryStore::with_json("{ not projects");
    let mut editor = Editor::new();
    editor.create_project("Untouched", None);
    assert!(editor.restore(&store).is_err());
    assert_eq!(editor.projects().len(), 1);
}

// ─── Mode, alignment, shortcuts ─────────────────────────────────────────

#[test]
fn preview_mode_clears_selection() {
    let mut editor = Editor::new();
    editor.add_node(&button(), None, Some((100.0, 100.0)));
    assert_eq!(editor.selection().len(), 1);

    editor.set_mode(EditorMode::Preview);
    assert_eq!(editor.mode(), EditorMode::Preview);
    assert!(editor.selection().is_empty());
}

#[test]
fn align_selection_to_left_edge() {
    let mut editor = Editor::new();
    let a = editor.add_node(&button(), None, Some((100.0, 100.0)));
    let b = editor.add_node(&button(), None, Some((400.0, 200.0)));
    let len = editor.history().len();

    editor.select_node(a, false);
    editor.align_selected_nodes(Alignment::Left);
    assert_eq!(editor.history().len(), len);

    editor.select_node(b, true);
    editor.align_selected_nodes(Alignment::Left);
    assert_eq!(editor.node(b).unwrap().style["left"], json!("100px"));
    assert_eq!(editor.history().len(), len + 1);
}

#[test]
fn shortcuts_drive_the_editor() {
    let mut editor = Editor::new();
    let node = editor.add_node(&button(), None, Some((100.0, 100.0)));

    let press = |editor: &mut Editor, key: &str, cmd: bool, shift: bool| {
        if let Some(action) = ShortcutMap::resolve(key, false, shift, false, cmd) {
            editor.dispatch(action);
        }
    };

    press(&mut editor, "ArrowRight", false, true);
    assert_eq!(editor.node(node).unwrap().style["left"], json!("110px"));

    press(&mut editor, "d", true, false);
    assert_eq!(editor.nodes().len(), 2);

    press(&mut editor, "a", true, false);
    assert_eq!(editor.selection().len(), 2);
    press(&mut editor, "Backspace", false, false);
    assert!(editor.nodes().is_empty());

    press(&mut editor, "z", true, false);
    assert_eq!(editor.nodes().len(), 2);
    press(&mut editor, "z", true, true);
    assert!(editor.nodes().is_empty());
}

// ─── Annotations ────────────────────────────────────────────────────────

#[test]
fn annotations_live_outside_history() {
    let mut editor = Editor::new();
    let len = editor.history().len();
    let note = editor.add_annotation(40.0, 60.0, "first draft", None);
    let other = editor.add_annotation(0.0, 0.0, "second", Some("lee".into()));
    assert_eq!(editor.history().len(), len);
    assert!(editor.annotations()[0].created_at > 0);

    assert!(editor.update_annotation(&note, "revised"));
    assert_eq!(editor.annotations()[0].content, "revised");
    assert!(!editor.update_annotation("missing", "x"));

    assert!(editor.delete_annotation(&other));
    assert!(!editor.delete_annotation(&other));
    assert_eq!(editor.annotations().len(), 1);

    editor.clear_annotations();
    assert!(editor.annotations().is_empty());
}
