//! `pd`: command-line access to Page Draft design documents.
//!
//! ```text
//! pd codegen design.json --scene Home -o Home.vue
//! pd inspect design.json
//! ```

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use pd_core::codegen::CodegenOptions;
use pd_core::model::Project;
use pd_core::tree::TreeNode;
use pd_editor::Editor;
use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};

/// Page Draft CLI - generate code from exported design documents
#[derive(Parser, Debug)]
#[command(name = "pd")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a Vue single-file component from a design document
    Codegen {
        /// Exported design document (version 2 or legacy JSON)
        file: PathBuf,

        /// Scene to render, by id or name (defaults to the document's current scene)
        #[arg(short, long)]
        scene: Option<String>,

        /// Also render hidden nodes
        #[arg(long)]
        include_hidden: bool,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Summarize the scenes and node tree of a design document
    Inspect {
        /// Exported design document (version 2 or legacy JSON)
        file: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Codegen {
            file,
            scene,
            include_hidden,
            output,
        } => codegen(&file, scene.as_deref(), include_hidden, output.as_deref()),
        Command::Inspect { file, json } => inspect(&file, json),
    };

    if let Err(err) = result {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn load(path: &Path) -> Result<Editor> {
    let text =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    let mut editor = Editor::new();
    editor
        .import_design(&text)
        .with_context(|| format!("cannot import {}", path.display()))?;
    log::debug!("loaded {} ({} nodes)", path.display(), editor.nodes().len());
    Ok(editor)
}

// ─── codegen ─────────────────────────────────────────────────────────────

fn codegen(
    path: &Path,
    scene: Option<&str>,
    include_hidden: bool,
    output: Option<&Path>,
) -> Result<()> {
    let mut editor = load(path)?;

    if let Some(key) = scene {
        let Some(id) = editor.current_project().and_then(|p| resolve_scene(p, key)) else {
            bail!("no scene named or identified by '{key}' in {}", path.display());
        };
        editor.switch_scene(&id);
    }

    let code = editor.generate_code(&CodegenOptions { include_hidden });
    match output {
        Some(out) => {
            fs::write(out, &code).with_context(|| format!("cannot write {}", out.display()))?;
            log::info!("wrote {}", out.display());
        }
        None => print!("{code}"),
    }
    Ok(())
}

/// Match a scene by id first, then by name.
fn resolve_scene(project: &Project, key: &str) -> Option<String> {
    project
        .scene(key)
        .or_else(|| project.scenes.iter().find(|s| s.name == key))
        .map(|s| s.id.clone())
}

// ─── inspect ─────────────────────────────────────────────────────────────

fn inspect(path: &Path, json: bool) -> Result<()> {
    let editor = load(path)?;
    let Some(project) = editor.current_project() else {
        bail!("{} produced no project", path.display());
    };

    if json {
        let scenes: Vec<serde_json::Value> = project
            .scenes
            .iter()
            .map(|s| {
                serde_json::json!({
                    "id": s.id,
                    "name": s.name,
                    "width": s.config.width,
                    "height": s.config.height,
                    "nodes": s.nodes.len(),
                    "annotations": s.annotations.len(),
                })
            })
            .collect();
        let summary = serde_json::json!({
            "currentSceneId": project.current_scene_id,
            "scenes": scenes,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    print!("{}", summary(project, &editor.tree_nodes()));
    Ok(())
}

fn summary(project: &Project, current: &[TreeNode]) -> String {
    let mut out = String::new();
    for scene in &project.scenes {
        let marker = if scene.id == project.current_scene_id { "*" } else { " " };
        let _ = writeln!(
            out,
            "{marker} {} [{}] {}×{}, {} nodes",
            scene.name,
            scene.id,
            scene.config.width,
            scene.config.height,
            scene.nodes.len()
        );
    }
    if !current.is_empty() {
        out.push('\n');
        outline(current, 0, &mut out);
    }
    out
}

fn outline(trees: &[TreeNode], depth: usize, out: &mut String) {
    for tree in trees {
        let node = &tree.node;
        let _ = write!(out, "{}- {} ({})", "  ".repeat(depth), node.kind.as_str(), node.id);
        if !node.label.is_empty() {
            let _ = write!(out, " \"{}\"", node.label);
        }
        if node.hidden {
            out.push_str(" [hidden]");
        }
        if node.locked {
            out.push_str(" [locked]");
        }
        out.push('\n');
        outline(&tree.children, depth + 1, out);
    }
}
