//! Core document model for Page Draft.
//!
//! A project holds scenes; a scene holds a flat, paint-ordered list of
//! `Node`s plus the `ProjectConfig` describing its coordinate space. Node
//! hierarchy is expressed with `parent_id` back-references, never by nesting.
//! Props and styles stay open JSON maps because the component catalog that
//! defines them is data, not code.

use crate::id::{NodeId, fresh_id};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open key → value map used for node props and styles.
pub type PropMap = Map<String, Value>;

fn is_false(b: &bool) -> bool {
    !*b
}

// ─── Node kinds ──────────────────────────────────────────────────────────

/// The node `type` discriminator.
///
/// Known kinds get their own rendering rule in the code generator; anything
/// else is kept verbatim in `Library` (an `el-*` tag) or `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    Container,
    Text,
    Button,
    Image,
    Icon,
    Select,
    RadioGroup,
    CheckboxGroup,
    Menu,
    Tabs,
    Breadcrumb,
    Steps,
    Upload,
    Table,
    Descriptions,
    Timeline,
    Carousel,
    Collapse,
    /// Any other component-library tag, e.g. `el-input`.
    Library(String),
    /// A project-specific component, e.g. `TeamCard`.
    Custom(String),
}

impl NodeKind {
    pub fn parse(tag: &str) -> Self {
        match tag {
            "container" => NodeKind::Container,
            "text" => NodeKind::Text,
            "button" => NodeKind::Button,
            "image" => NodeKind::Image,
            "el-icon" => NodeKind::Icon,
            "el-select" => NodeKind::Select,
            "el-radio-group" => NodeKind::RadioGroup,
            "el-checkbox-group" => NodeKind::CheckboxGroup,
            "el-menu" => NodeKind::Menu,
            "el-tabs" => NodeKind::Tabs,
            "el-breadcrumb" => NodeKind::Breadcrumb,
            "el-steps" => NodeKind::Steps,
            "el-upload" => NodeKind::Upload,
            "el-table" => NodeKind::Table,
            "el-descriptions" => NodeKind::Descriptions,
            "el-timeline" => NodeKind::Timeline,
            "el-carousel" => NodeKind::Carousel,
            "el-collapse" => NodeKind::Collapse,
            other if other.starts_with("el-") => NodeKind::Library(other.to_string()),
            other => NodeKind::Custom(other.to_string()),
        }
    }

    /// The `type` string this kind serializes to.
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Container => "container",
            NodeKind::Text => "text",
            NodeKind::Button => "button",
            NodeKind::Image => "image",
            NodeKind::Icon => "el-icon",
            NodeKind::Select => "el-select",
            NodeKind::RadioGroup => "el-radio-group",
            NodeKind::CheckboxGroup => "el-checkbox-group",
            NodeKind::Menu => "el-menu",
            NodeKind::Tabs => "el-tabs",
            NodeKind::Breadcrumb => "el-breadcrumb",
            NodeKind::Steps => "el-steps",
            NodeKind::Upload => "el-upload",
            NodeKind::Table => "el-table",
            NodeKind::Descriptions => "el-descriptions",
            NodeKind::Timeline => "el-timeline",
            NodeKind::Carousel => "el-carousel",
            NodeKind::Collapse => "el-collapse",
            NodeKind::Library(tag) | NodeKind::Custom(tag) => tag,
        }
    }
}

impl From<String> for NodeKind {
    fn from(tag: String) -> Self {
        NodeKind::parse(&tag)
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        kind.as_str().to_string()
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// One visual element instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,

    #[serde(rename = "type")]
    pub kind: NodeKind,

    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub props: PropMap,

    /// CSS-like presentation attributes with camelCase keys.
    #[serde(default)]
    pub style: PropMap,

    /// Containing node. `None` means root-level within the scene.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,

    /// Locked nodes ignore geometry mutations.
    #[serde(default, skip_serializing_if = "is_false")]
    pub locked: bool,

    /// Hidden nodes are skipped by selection and by default export.
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
}

impl Node {
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            label: String::new(),
            props: PropMap::new(),
            style: PropMap::new(),
            parent_id: None,
            locked: false,
            hidden: false,
        }
    }

    /// Instantiate a catalog schema with a fresh identity.
    pub fn from_schema(schema: &ComponentSchema) -> Self {
        Self {
            id: NodeId::fresh(),
            kind: NodeKind::parse(&schema.kind),
            label: schema.label.clone(),
            props: schema.default_props.clone(),
            style: schema.default_style.clone(),
            parent_id: None,
            locked: false,
            hidden: false,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// String prop, if present and actually a string.
    pub fn prop_str(&self, key: &str) -> Option<&str> {
        self.props.get(key).and_then(Value::as_str)
    }
}

// ─── Scene configuration ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenKind {
    Color,
    FontSize,
    Spacing,
    BorderRadius,
}

/// A named, reusable design value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignToken {
    pub name: String,
    pub value: String,
    #[serde(rename = "type")]
    pub kind: TokenKind,
}

/// A scene's coordinate space and page-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    pub width: f64,
    pub height: f64,
    pub background_color: String,
    #[serde(default)]
    pub tokens: Vec<DesignToken>,
    /// Suppresses canvas auto-expansion.
    #[serde(default, skip_serializing_if = "is_false")]
    pub lock_size: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
            background_color: "#ffffff".to_string(),
            tokens: Vec::new(),
            lock_size: false,
        }
    }
}

// ─── Annotations ─────────────────────────────────────────────────────────

/// A free-floating review note pinned to a canvas position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub content: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Ruler guides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Guides {
    #[serde(default)]
    pub vertical: Vec<f64>,
    #[serde(default)]
    pub horizontal: Vec<f64>,
}

// ─── Scenes & projects ───────────────────────────────────────────────────

/// One independent canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub config: ProjectConfig,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guides: Option<Guides>,
    /// Placement on the multi-scene workspace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl Scene {
    pub fn new(name: impl Into<String>, config: ProjectConfig) -> Self {
        Self {
            id: fresh_id(),
            name: name.into(),
            nodes: Vec::new(),
            config,
            annotations: Vec::new(),
            guides: None,
            x: Some(0.0),
            y: Some(0.0),
        }
    }
}

/// A named collection of scenes; the unit of persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub scenes: Vec<Scene>,
    pub current_scene_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub updated_at: i64,
}

impl Project {
    /// Build a project around its scenes; the first scene becomes current.
    pub fn new(name: impl Into<String>, scenes: Vec<Scene>, updated_at: i64) -> Self {
        let current_scene_id = scenes.first().map(|s| s.id.clone()).unwrap_or_default();
        Self {
            id: fresh_id(),
            name: name.into(),
            scenes,
            current_scene_id,
            thumbnail: None,
            updated_at,
        }
    }

    pub fn scene(&self, id: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    pub fn scene_mut(&mut self, id: &str) -> Option<&mut Scene> {
        self.scenes.iter_mut().find(|s| s.id == id)
    }

    pub fn current_scene(&self) -> Option<&Scene> {
        self.scene(&self.current_scene_id)
    }
}

// ─── Component catalog input ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Basic,
    Layout,
    Form,
    Data,
    Navigation,
    Feedback,
    Custom,
    Team,
}

/// A catalog entry. The engine only reads `kind`, `label` and the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSchema {
    #[serde(rename = "type")]
    pub kind: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub default_props: PropMap,
    /// Editable-property metadata for the property panel; opaque here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props_meta: Option<PropMap>,
    #[serde(default)]
    pub default_style: PropMap,
    #[serde(default)]
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<u32>,
}

impl ComponentSchema {
    pub fn new(kind: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            label: label.into(),
            icon: None,
            default_props: PropMap::new(),
            props_meta: None,
            default_style: PropMap::new(),
            category: Category::default(),
            span: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn node_kind_string_roundtrip() {
        for tag in ["container", "el-select", "el-input", "TeamCard", "button"] {
            assert_eq!(NodeKind::parse(tag).as_str(), tag);
        }
        assert_eq!(NodeKind::parse("el-input"), NodeKind::Library("el-input".into()));
        assert_eq!(NodeKind::parse("TeamCard"), NodeKind::Custom("TeamCard".into()));
    }

    #[test]
    fn node_json_shape() {
        let mut node = Node::new(NodeId::intern("n1"), NodeKind::Container);
        node.parent_id = Some(NodeId::intern("root_box"));
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "n1",
                "type": "container",
                "label": "",
                "props": {},
                "style": {},
                "parentId": "root_box"
            })
        );
    }

    #[test]
    fn node_decodes_with_missing_optional_fields() {
        let node: Node = serde_json::from_value(json!({
            "id": "a",
            "type": "container",
            "props": {},
            "style": {"left": "0px"}
        }))
        .unwrap();
        assert_eq!(node.label, "");
        assert!(node.is_root());
        assert!(!node.locked && !node.hidden);
    }

    #[test]
    fn config_json_shape() {
        let config: ProjectConfig = serde_json::from_value(json!({
            "width": 200,
            "height": 200,
            "backgroundColor": "#fff",
            "tokens": [{"name": "primary", "value": "#409eff", "type": "color"}]
        }))
        .unwrap();
        assert_eq!(config.width, 200.0);
        assert_eq!(config.tokens[0].kind, TokenKind::Color);
        assert!(!config.lock_size);
    }

    #[test]
    fn from_schema_copies_defaults() {
        let mut schema = ComponentSchema::new("el-button", "Button");
        schema.default_props.insert("label".into(), json!("OK"));
        schema.default_style.insert("width".into(), json!("80px"));

        let a = Node::from_schema(&schema);
        let b = Node::from_schema(&schema);
        assert_ne!(a.id, b.id);
        assert_eq!(a.kind, NodeKind::Library("el-button".into()));
        assert_eq!(a.prop_str("label"), Some("OK"));
        assert_eq!(a.style.get("width"), Some(&json!("80px")));
    }
}
