pub mod codegen;
pub mod geometry;
pub mod id;
pub mod model;
pub mod tree;

pub use codegen::{CodegenOptions, generate_vue_code, generate_vue_code_with};
pub use geometry::{Bounds, format_px, parse_length};
pub use id::{NodeId, fresh_id};
pub use model::*;
pub use tree::{NodeTree, Placement, TreeNode, flatten};
