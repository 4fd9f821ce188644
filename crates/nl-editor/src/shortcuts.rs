//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. The engine
//! applies them to the current drag, menu or connection selection.

use crate::input::Modifiers;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    /// Delete the selected connection.
    DeleteSelection,
    /// Cancel the drag, else close the menu, else clear the selection.
    Cancel,
}

/// Resolves key events into shortcut actions.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event. Deletion is suppressed while a text input has
    /// focus so typing in a node never removes a link.
    pub fn resolve(
        key: &str,
        modifiers: Modifiers,
        text_entry_focused: bool,
    ) -> Option<ShortcutAction> {
        // ⌘Delete and friends belong to the host.
        if modifiers.ctrl || modifiers.meta || modifiers.alt {
            return None;
        }

        match key {
            "Delete" | "Backspace" if !text_entry_focused => Some(ShortcutAction::DeleteSelection),
            "Escape" => Some(ShortcutAction::Cancel),
            _ => None,
        }
    }
}
