//! Design document import/export.
//!
//! Version 2 documents carry every scene of a project plus the live working
//! copy of the current one:
//!
//! ```json
//! { "version": 2, "scenes": [...], "currentSceneId": "...", "config": {...}, "nodes": [...] }
//! ```
//!
//! Older unversioned exports are still accepted: a bare node array, or
//! `{ "nodes": [...], "config": {...} }`. Those become a single new scene.

use pd_core::model::{Node, ProjectConfig, PropMap, Scene};
use pd_core::tree::NodeTree;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const DOCUMENT_VERSION: u32 = 2;

/// Name given to the scene synthesized from a legacy document.
pub const LEGACY_SCENE_NAME: &str = "Imported";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("document nodes are not an array")]
    NodesNotArray,

    #[error("document does not match the expected shape: {0}")]
    InvalidShape(#[source] serde_json::Error),
}

/// Serialized form of a version 2 document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignDocument {
    pub version: u32,
    #[serde(default)]
    pub scenes: Vec<Scene>,
    #[serde(default)]
    pub current_scene_id: String,
    #[serde(default)]
    pub config: ProjectConfig,
    #[serde(default)]
    pub nodes: Vec<Node>,
}

impl DesignDocument {
    pub fn new(
        scenes: Vec<Scene>,
        current_scene_id: String,
        config: ProjectConfig,
        nodes: Vec<Node>,
    ) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            scenes,
            current_scene_id,
            config,
            nodes,
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// A fully decoded and sanitized import, ready to install.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedDesign {
    pub scenes: Vec<Scene>,
    pub current_scene_id: String,
    pub config: ProjectConfig,
    pub nodes: Vec<Node>,
    /// Whether the input was an unversioned document.
    pub legacy: bool,
}

impl ImportedDesign {
    pub fn current_scene(&self) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == self.current_scene_id)
    }
}

/// Decode a design document. `base` is the config legacy documents are
/// merged over. Nothing is mutated; callers install the result only on `Ok`.
pub fn parse_document(text: &str, base: &ProjectConfig) -> Result<ImportedDesign, DocumentError> {
    let parsed: Value = serde_json::from_str(text).map_err(DocumentError::InvalidJson)?;

    let versioned = parsed
        .as_object()
        .is_some_and(|obj| obj.contains_key("version"));
    if versioned {
        parse_versioned(parsed)
    } else {
        parse_legacy(parsed, base)
    }
}

/// A version 2 document without top-level `nodes` or `config` takes the
/// missing working copy from its current scene.
fn parse_versioned(parsed: Value) -> Result<ImportedDesign, DocumentError> {
    if parsed.get("nodes").is_some_and(|n| !n.is_array()) {
        return Err(DocumentError::NodesNotArray);
    }
    let has_nodes = parsed.get("nodes").is_some();
    let has_config = parsed.get("config").is_some();
    let doc: DesignDocument =
        serde_json::from_value(parsed).map_err(DocumentError::InvalidShape)?;
    if doc.version != DOCUMENT_VERSION {
        log::warn!("importing document version {} as version {DOCUMENT_VERSION}", doc.version);
    }

    let mut nodes = sanitize(doc.nodes);
    let mut config = doc.config;
    let mut scenes: Vec<Scene> = doc
        .scenes
        .into_iter()
        .map(|mut scene| {
            scene.nodes = sanitize(std::mem::take(&mut scene.nodes));
            scene
        })
        .collect();

    if scenes.is_empty() {
        let mut scene = Scene::new(LEGACY_SCENE_NAME, config.clone());
        scene.nodes = nodes.clone();
        scenes.push(scene);
    }
    let current_scene_id = if scenes.iter().any(|s| s.id == doc.current_scene_id) {
        doc.current_scene_id
    } else {
        scenes[0].id.clone()
    };

    if let Some(scene) = scenes.iter().find(|s| s.id == current_scene_id) {
        if !has_nodes {
            log::debug!("document has no working copy nodes, using scene {}", scene.id);
            nodes = scene.nodes.clone();
        }
        if !has_config {
            config = scene.config.clone();
        }
    }

    Ok(ImportedDesign {
        scenes,
        current_scene_id,
        config,
        nodes,
        legacy: false,
    })
}

fn parse_legacy(parsed: Value, base: &ProjectConfig) -> Result<ImportedDesign, DocumentError> {
    let (nodes_value, config_patch) = match parsed {
        Value::Array(_) => (parsed, None),
        Value::Object(mut obj) => {
            let nodes = obj.remove("nodes").unwrap_or(Value::Null);
            let patch = match obj.remove("config") {
                Some(Value::Object(patch)) => Some(patch),
                _ => None,
            };
            (nodes, patch)
        }
        _ => return Err(DocumentError::NodesNotArray),
    };
    if !nodes_value.is_array() {
        return Err(DocumentError::NodesNotArray);
    }

    let nodes: Vec<Node> =
        serde_json::from_value(nodes_value).map_err(DocumentError::InvalidShape)?;
    let nodes = sanitize(nodes);
    let config = match &config_patch {
        Some(patch) => merge_config(base, patch)?,
        None => base.clone(),
    };

    let mut scene = Scene::new(LEGACY_SCENE_NAME, config.clone());
    scene.nodes = nodes.clone();
    Ok(ImportedDesign {
        current_scene_id: scene.id.clone(),
        scenes: vec![scene],
        config,
        nodes,
        legacy: true,
    })
}

/// Shallow-merge `patch` over `base`. `tokens` is only taken from the patch
/// when it is an array.
pub fn merge_config(base: &ProjectConfig, patch: &PropMap) -> Result<ProjectConfig, DocumentError> {
    let mut merged = match serde_json::to_value(base).map_err(DocumentError::InvalidShape)? {
        Value::Object(map) => map,
        _ => PropMap::new(),
    };
    for (key, value) in patch {
        if key == "tokens" && !value.is_array() {
            continue;
        }
        merged.insert(key.clone(), value.clone());
    }
    serde_json::from_value(Value::Object(merged)).map_err(DocumentError::InvalidShape)
}

fn sanitize(nodes: Vec<Node>) -> Vec<Node> {
    let mut tree = NodeTree::from_nodes(nodes);
    let cut = tree.detach_cycles();
    if cut > 0 {
        log::warn!("import: detached {cut} cyclic parent links");
    }
    tree.into_vec()
}
