//! Projects, templates and the persistence seam.

use crate::clipboard::remap_nodes;
use pd_core::model::{Annotation, Node, Project, ProjectConfig, Scene};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Horizontal gap between scenes laid out on the workspace.
pub const SCENE_GAP: f64 = 100.0;

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Workspace position for a new scene: right of the rightmost existing one.
pub fn next_scene_position(scenes: &[Scene]) -> (f64, f64) {
    let rightmost = scenes
        .iter()
        .map(|s| s.x.unwrap_or(0.0) + s.config.width)
        .reduce(f64::max);
    match rightmost {
        Some(edge) => (edge + SCENE_GAP, 0.0),
        None => (0.0, 0.0),
    }
}

// ─── Templates ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateScene {
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
    pub config: ProjectConfig,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// Blueprint for new projects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectTemplate {
    pub name: String,
    pub scenes: Vec<TemplateScene>,
}

impl ProjectTemplate {
    /// The built-in blank mobile project: one 750 × 1334 scene.
    pub fn blank() -> Self {
        Self {
            name: "空白基础项目".to_string(),
            scenes: vec![TemplateScene {
                name: "主画布".to_string(),
                nodes: Vec::new(),
                config: ProjectConfig {
                    width: 750.0,
                    height: 1334.0,
                    background_color: "#f5f7fa".to_string(),
                    tokens: Vec::new(),
                    lock_size: false,
                },
                annotations: Vec::new(),
                x: 0.0,
                y: 0.0,
            }],
        }
    }

    /// Build a project from this template. Every scene and node gets a
    /// fresh identity, so one template can seed many projects.
    pub fn instantiate(&self, updated_at: i64) -> Project {
        let mut scenes: Vec<Scene> = self
            .scenes
            .iter()
            .map(|t| {
                let mut scene = Scene::new(t.name.clone(), t.config.clone());
                scene.nodes = remap_nodes(&t.nodes);
                scene.annotations = t.annotations.clone();
                scene.x = Some(t.x);
                scene.y = Some(t.y);
                scene
            })
            .collect();
        if scenes.is_empty() {
            scenes.push(Scene::new("Scene 1", ProjectConfig::default()));
        }
        Project::new(self.name.clone(), scenes, updated_at)
    }
}

// ─── Store ────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("project store unavailable: {0}")]
    Unavailable(String),

    #[error("stored projects are malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Where the project list is persisted.
///
/// Implemented per host: browser local storage, a file on disk, or memory
/// for tests and the CLI.
pub trait ProjectStore {
    fn load(&self) -> Result<Vec<Project>, StoreError>;
    fn save(&mut self, projects: &[Project]) -> Result<(), StoreError>;
}

/// Keeps the serialized project list in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with raw JSON, as if written by an earlier session.
    pub fn with_json(json: impl Into<String>) -> Self {
        Self {
            data: Some(json.into()),
        }
    }

    pub fn raw(&self) -> Option<&str> {
        self.data.as_deref()
    }
}

impl ProjectStore for MemoryStore {
    fn load(&self) -> Result<Vec<Project>, StoreError> {
        match &self.data {
            Some(json) => Ok(serde_json::from_str(json)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&mut self, projects: &[Project]) -> Result<(), StoreError> {
        self.data = Some(serde_json::to_string(projects)?);
        Ok(())
    }
}
