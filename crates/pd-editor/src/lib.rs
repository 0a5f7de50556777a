pub mod align;
pub mod canvas;
pub mod clipboard;
pub mod document;
pub mod editor;
pub mod history;
pub mod project;
pub mod shortcuts;

pub use align::Alignment;
pub use canvas::{Offset, Viewport};
pub use clipboard::Clipboard;
pub use document::{DesignDocument, DocumentError};
pub use editor::{Editor, EditorMode};
pub use history::{HistoryLog, Snapshot};
pub use project::{MemoryStore, ProjectStore, ProjectTemplate, StoreError};
pub use shortcuts::{EditorAction, ShortcutMap};
