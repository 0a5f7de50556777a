//! Code generator: scene nodes → Vue single-file component.
//!
//! The flat node list is turned into its hierarchical view and rendered
//! depth-first. Each rendered node contributes one template fragment, one
//! scoped style rule and, for icons, an entry in the import manifest.

use crate::geometry::{format_number, format_px};
use crate::model::{Node, NodeKind, ProjectConfig, PropMap};
use crate::tree::{NodeTree, TreeNode};
use serde_json::{Number, Value, json};
use smallvec::SmallVec;
use std::collections::BTreeSet;
use std::fmt::Write;

/// Template indentation depth of top-level nodes (inside `<template>` and
/// the page wrapper).
const ROOT_DEPTH: usize = 2;

const ICON_PACKAGE: &str = "@element-plus/icons-vue";

const UPLOAD_FALLBACK_TEXT: &str = "点击上传";

// ─── Config ───────────────────────────────────────────────────────────────

/// Options for [`generate_vue_code_with`].
#[derive(Debug, Clone, Default)]
pub struct CodegenOptions {
    /// Render hidden nodes (and their subtrees). Default: **false**.
    pub include_hidden: bool,
}

// ─── Entry points ─────────────────────────────────────────────────────────

/// Generate a Vue SFC for `nodes` on a page described by `config`.
#[must_use]
pub fn generate_vue_code(nodes: &[Node], config: &ProjectConfig) -> String {
    generate_vue_code_with(nodes, config, &CodegenOptions::default())
}

#[must_use]
pub fn generate_vue_code_with(
    nodes: &[Node],
    config: &ProjectConfig,
    options: &CodegenOptions,
) -> String {
    let tree = NodeTree::from_nodes(nodes.to_vec());
    let mut generator = Generator::new(options);
    let fragments: Vec<String> = tree
        .hierarchy()
        .iter()
        .filter_map(|root| generator.render(root, ROOT_DEPTH))
        .collect();
    log::debug!(
        "generated {} top-level fragments, {} style rules, {} icons",
        fragments.len(),
        generator.styles.len(),
        generator.icons.len()
    );

    let mut out = String::with_capacity(2048);
    out.push_str("<template>\n  <div class=\"page-container\">\n");
    out.push_str(&fragments.join("\n"));
    out.push_str("\n  </div>\n</template>\n\n");

    out.push_str("<script setup lang=\"ts\">\n");
    if !generator.icons.is_empty() {
        let names: Vec<&str> = generator.icons.iter().map(String::as_str).collect();
        let _ = writeln!(out, "import {{ {} }} from '{ICON_PACKAGE}';", names.join(", "));
    }
    out.push_str("</script>\n\n");

    out.push_str("<style scoped>\n.page-container {\n  position: relative;\n");
    let _ = writeln!(out, "  width: {};", format_px(config.width));
    let _ = writeln!(out, "  height: {};", format_px(config.height));
    let _ = writeln!(out, "  background-color: {};", config.background_color);
    out.push_str("  overflow: hidden;\n}\n\n");
    out.push_str(&generator.styles.join("\n\n"));
    out.push_str("\n</style>\n");
    out
}

// ─── Generator ────────────────────────────────────────────────────────────

struct Generator<'a> {
    options: &'a CodegenOptions,
    styles: Vec<String>,
    icons: BTreeSet<String>,
}

impl<'a> Generator<'a> {
    fn new(options: &'a CodegenOptions) -> Self {
        Self {
            options,
            styles: Vec::new(),
            icons: BTreeSet::new(),
        }
    }

    /// Render one subtree; `None` when it is hidden and hidden output is off.
    fn render(&mut self, tree: &TreeNode, depth: usize) -> Option<String> {
        let node = &tree.node;
        if node.hidden && !self.options.include_hidden {
            return None;
        }

        let indent = "  ".repeat(depth);
        let class = class_name(node);
        self.styles.push(format!(".{class} {{\n{}\n}}", style_to_css(&node.style)));

        let fragment = match &node.kind {
            NodeKind::Container => {
                let children: Vec<String> = tree
                    .children
                    .iter()
                    .filter_map(|child| self.render(child, depth + 1))
                    .collect();
                if children.is_empty() {
                    format!("{indent}<div class=\"{class}\"></div>")
                } else {
                    format!(
                        "{indent}<div class=\"{class}\">\n{}\n{indent}</div>",
                        children.join("\n")
                    )
                }
            }
            NodeKind::Text => {
                let text = node.prop_str("text").unwrap_or_default();
                format!("{indent}<div class=\"{class}\">{}</div>", escape_text(text))
            }
            NodeKind::Button => {
                let text = node
                    .prop_str("text")
                    .or_else(|| node.prop_str("label"))
                    .unwrap_or_default();
                let attrs = common_attrs(&node.props, &["text", "label"]);
                format!(
                    "{indent}<el-button class=\"{class}\"{attrs}>{}</el-button>",
                    escape_text(text)
                )
            }
            NodeKind::Image => {
                let attrs = common_attrs(&node.props, &[]);
                format!("{indent}<img class=\"{class}\"{attrs} />")
            }
            NodeKind::Icon => {
                let attrs = common_attrs(&node.props, &["name"]);
                let name = node.prop_str("name").map(str::trim).unwrap_or_default();
                if is_identifier(name) {
                    self.icons.insert(name.to_string());
                    format!("{indent}<el-icon class=\"{class}\"{attrs}><{name} /></el-icon>")
                } else {
                    format!("{indent}<el-icon class=\"{class}\"{attrs} />")
                }
            }
            NodeKind::Upload => {
                let attrs = common_attrs(&node.props, &["label", "text"]);
                let text = match slot_text(node) {
                    "" => UPLOAD_FALLBACK_TEXT,
                    text => text,
                };
                format!(
                    "{indent}<el-upload class=\"{class}\"{attrs}>\n\
                     {indent}  <el-button type=\"primary\">{}</el-button>\n\
                     {indent}</el-upload>",
                    escape_text(text)
                )
            }
            NodeKind::Table => {
                let attrs = common_attrs(&node.props, &["columns"]);
                let columns = table_columns(&node.props);
                wrap_list(
                    &indent,
                    "el-table",
                    &class,
                    &attrs,
                    &format!(
                        "<el-table-column v-for='col in {}' :key=\"col.prop\" :prop=\"col.prop\" :label=\"col.label\" />",
                        js_literal(&columns)
                    ),
                )
            }
            kind => match list_template(kind) {
                Some((source, item_template)) => {
                    let attrs = common_attrs(&node.props, &[source]);
                    let items = array_prop(&node.props, source);
                    let child = item_template.replace("{items}", &js_literal(&items));
                    wrap_list(&indent, kind.as_str(), &class, &attrs, &child)
                }
                None => {
                    let tag = kind.as_str();
                    let attrs = common_attrs(&node.props, &["label", "text"]);
                    match slot_text(node) {
                        "" => format!("{indent}<{tag} class=\"{class}\"{attrs} />"),
                        text => format!(
                            "{indent}<{tag} class=\"{class}\"{attrs}>{}</{tag}>",
                            escape_text(text)
                        ),
                    }
                }
            },
        };

        // Only containers emit child markup, but every descendant still
        // gets its class rule.
        if node.kind != NodeKind::Container {
            for child in &tree.children {
                let _ = self.render(child, depth + 1);
            }
        }
        Some(fragment)
    }
}

/// The prop driving a list-like component and its `v-for` child template.
/// `{items}` is replaced by the JSON literal.
fn list_template(kind: &NodeKind) -> Option<(&'static str, &'static str)> {
    let entry = match kind {
        NodeKind::Select => (
            "options",
            "<el-option v-for='opt in {items}' :key=\"opt.value\" :label=\"opt.label\" :value=\"opt.value\" />",
        ),
        NodeKind::RadioGroup => (
            "options",
            "<el-radio v-for='opt in {items}' :key=\"opt.value\" :value=\"opt.value\">{{ opt.label }}</el-radio>",
        ),
        NodeKind::CheckboxGroup => (
            "options",
            "<el-checkbox v-for='opt in {items}' :key=\"opt.value\" :value=\"opt.value\">{{ opt.label }}</el-checkbox>",
        ),
        NodeKind::Menu => (
            "items",
            "<el-menu-item v-for='item in {items}' :key=\"item.index\" :index=\"item.index\">{{ item.label }}</el-menu-item>",
        ),
        NodeKind::Tabs => (
            "items",
            "<el-tab-pane v-for='item in {items}' :key=\"item.name\" :label=\"item.label\" :name=\"item.name\">{{ item.content }}</el-tab-pane>",
        ),
        NodeKind::Breadcrumb => (
            "items",
            "<el-breadcrumb-item v-for='(item, idx) in {items}' :key=\"idx\" :to=\"item.to\">{{ item.label }}</el-breadcrumb-item>",
        ),
        NodeKind::Steps => (
            "items",
            "<el-step v-for='(item, idx) in {items}' :key=\"idx\" :title=\"item.title\" :description=\"item.description\" />",
        ),
        NodeKind::Descriptions => (
            "items",
            "<el-descriptions-item v-for='(item, idx) in {items}' :key=\"idx\" :label=\"item.label\">{{ item.value }}</el-descriptions-item>",
        ),
        NodeKind::Timeline => (
            "items",
            "<el-timeline-item v-for='(item, idx) in {items}' :key=\"idx\" :timestamp=\"item.timestamp\" :type=\"item.type\" :hollow=\"item.hollow\" :center=\"item.center\">{{ item.content }}</el-timeline-item>",
        ),
        NodeKind::Carousel => (
            "items",
            "<el-carousel-item v-for='(item, idx) in {items}' :key=\"idx\">{{ item }}</el-carousel-item>",
        ),
        NodeKind::Collapse => (
            "items",
            "<el-collapse-item v-for='(item, idx) in {items}' :key=\"item.name ?? idx\" :name=\"item.name\" :title=\"item.title\">{{ item.content }}</el-collapse-item>",
        ),
        _ => return None,
    };
    Some(entry)
}

fn wrap_list(indent: &str, tag: &str, class: &str, attrs: &str, child: &str) -> String {
    format!("{indent}<{tag} class=\"{class}\"{attrs}>\n{indent}  {child}\n{indent}</{tag}>")
}

/// `props.label`, else `props.text`, else empty.
fn slot_text(node: &Node) -> &str {
    node.prop_str("label")
        .or_else(|| node.prop_str("text"))
        .unwrap_or_default()
}

fn array_prop(props: &PropMap, key: &str) -> Value {
    match props.get(key) {
        Some(Value::Array(items)) => Value::Array(items.clone()),
        _ => Value::Array(Vec::new()),
    }
}

/// Explicit `columns`, or keys of the first `data` row; normalized to
/// `{prop, label}` and stripped of entries without a `prop`.
fn table_columns(props: &PropMap) -> Value {
    let explicit: Vec<Value> = match props.get("columns") {
        Some(Value::Array(cols)) => cols.clone(),
        _ => Vec::new(),
    };
    let source = if explicit.is_empty() {
        match props.get("data").and_then(Value::as_array).and_then(|rows| rows.first()) {
            Some(Value::Object(row)) => row
                .keys()
                .map(|key| json!({ "prop": key, "label": key }))
                .collect(),
            _ => Vec::new(),
        }
    } else {
        explicit
    };

    let columns = source
        .iter()
        .filter_map(|col| {
            let prop = col.get("prop").and_then(Value::as_str).unwrap_or_default();
            if prop.is_empty() {
                return None;
            }
            let label = col.get("label").and_then(Value::as_str).unwrap_or(prop);
            Some(json!({ "prop": prop, "label": label }))
        })
        .collect();
    Value::Array(columns)
}

// ─── Attributes & escaping ────────────────────────────────────────────────

/// Render props as attributes, skipping `omit`. Leading space included when
/// non-empty.
fn common_attrs(props: &PropMap, omit: &[&str]) -> String {
    let attrs: SmallVec<[String; 4]> = props
        .iter()
        .filter(|(key, _)| !omit.contains(&key.as_str()))
        .filter_map(|(key, value)| prop_attr(key, value))
        .collect();
    if attrs.is_empty() {
        String::new()
    } else {
        format!(" {}", attrs.join(" "))
    }
}

fn prop_attr(key: &str, value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(format!("{key}=\"{}\"", escape_attr(s))),
        Value::Number(n) => Some(format!(":{key}=\"{}\"", number_text(n))),
        Value::Bool(b) => Some(format!(":{key}=\"{b}\"")),
        structured => Some(format!(":{key}='{}'", js_literal(structured))),
    }
}

/// JSON text safe to embed inside a single-quoted attribute.
fn js_literal(value: &Value) -> String {
    value.to_string().replace('\'', "\\u0027")
}

fn number_text(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        n.to_string()
    } else {
        format_number(n.as_f64().unwrap_or_default())
    }
}

pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

/// Scoped CSS class for a node: `node-` + id, with anything outside
/// `[A-Za-z0-9_-]` replaced by `-`.
pub fn class_name(node: &Node) -> String {
    let sanitized: String = node
        .id
        .as_str()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();
    format!("node-{sanitized}")
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

// ─── Styles ───────────────────────────────────────────────────────────────

/// Declarations for one rule body: `  kebab-key: value;` per line, skipping
/// null and empty values.
pub fn style_to_css(style: &PropMap) -> String {
    style
        .iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::Null => return None,
                Value::String(s) if s.is_empty() => return None,
                Value::String(s) => s.clone(),
                Value::Number(n) => number_text(n),
                Value::Bool(b) => b.to_string(),
                other => other.to_string(),
            };
            Some(format!("  {}: {text};", kebab_case(key)))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn kebab_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
