//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `EditorAction`s, which
//! [`Editor::dispatch`](crate::editor::Editor::dispatch) applies.

/// Nudge distance for a plain arrow key.
pub const NUDGE_STEP: f64 = 1.0;
/// Nudge distance with Shift held.
pub const NUDGE_STEP_LARGE: f64 = 10.0;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditorAction {
    // ── History ──
    Undo,
    Redo,

    // ── Clipboard ──
    Copy,
    Cut,
    Paste,
    Duplicate,

    // ── Selection ──
    SelectAll,
    Deselect,
    Delete,

    // ── Geometry ──
    Nudge { dx: f64, dy: f64 },

    // ── Flags ──
    ToggleLock,
    ToggleHidden,
}

/// Resolves key events into editor actions.
///
/// Uses platform-aware modifier detection: on macOS `meta` is ⌘,
/// on other platforms `ctrl` serves the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(
        key: &str,
        ctrl: bool,
        shift: bool,
        _alt: bool,
        meta: bool,
    ) -> Option<EditorAction> {
        let cmd = ctrl || meta;

        if let Some((dx, dy)) = arrow_direction(key) {
            if cmd {
                return None;
            }
            let step = if shift { NUDGE_STEP_LARGE } else { NUDGE_STEP };
            return Some(EditorAction::Nudge {
                dx: dx * step,
                dy: dy * step,
            });
        }

        // ── Modifier combos first (most specific) ──
        if cmd && shift {
            return match key {
                "z" | "Z" => Some(EditorAction::Redo),
                "h" | "H" => Some(EditorAction::ToggleHidden),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(EditorAction::Undo),
                "y" | "Y" => Some(EditorAction::Redo),
                "a" | "A" => Some(EditorAction::SelectAll),
                "d" | "D" => Some(EditorAction::Duplicate),
                "c" | "C" => Some(EditorAction::Copy),
                "x" | "X" => Some(EditorAction::Cut),
                "v" | "V" => Some(EditorAction::Paste),
                "l" | "L" => Some(EditorAction::ToggleLock),
                _ => None,
            };
        }

        match key {
            "Delete" | "Backspace" => Some(EditorAction::Delete),
            "Escape" => Some(EditorAction::Deselect),
            _ => None,
        }
    }
}

fn arrow_direction(key: &str) -> Option<(f64, f64)> {
    match key {
        "ArrowLeft" => Some((-1.0, 0.0)),
        "ArrowRight" => Some((1.0, 0.0)),
        "ArrowUp" => Some((0.0, -1.0)),
        "ArrowDown" => Some((0.0, 1.0)),
        _ => None,
    }
}
