//! Connection selection, deletion and keyboard handling.

use crate::bus::Signal;
use crate::drag::AbortReason;
use crate::engine::ConnectionEngine;
use crate::input::Modifiers;
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use nl_core::id::{ConnectionId, NodeId};

/// At most one connection is selected at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    selected: Option<ConnectionId>,
}

impl Selection {
    pub fn selected(&self) -> Option<ConnectionId> {
        self.selected
    }

    pub fn is_selected(&self, id: ConnectionId) -> bool {
        self.selected == Some(id)
    }

    /// Select `id`, or deselect it if it already is. Returns the new state.
    pub fn toggle(&mut self, id: ConnectionId) -> Option<ConnectionId> {
        self.selected = if self.is_selected(id) { None } else { Some(id) };
        self.selected
    }

    /// Returns `true` if something was selected.
    pub fn clear(&mut self) -> bool {
        self.selected.take().is_some()
    }
}

impl ConnectionEngine {
    /// A connection path was clicked: toggle its selection.
    pub fn click_connection(&mut self, id: ConnectionId) {
        if !self.store.contains(id) {
            log::trace!("click on unknown connection {id}");
            return;
        }
        let selected = self.selection.toggle(id);
        self.emit(Signal::SelectionChanged { selected });
    }

    /// An endpoint handle was clicked: delete the connection.
    pub fn click_endpoint(&mut self, id: ConnectionId) -> bool {
        self.delete_connection(id)
    }

    /// Delete a connection. Returns `false` for an unknown id.
    pub fn delete_connection(&mut self, id: ConnectionId) -> bool {
        if !self.store.delete(id) {
            return false;
        }
        self.connection_removed(id);
        true
    }

    pub fn delete_selected(&mut self) -> bool {
        match self.selection.selected() {
            Some(id) => self.delete_connection(id),
            None => false,
        }
    }

    pub fn clear_selection(&mut self) -> bool {
        if !self.selection.clear() {
            return false;
        }
        self.emit(Signal::SelectionChanged { selected: None });
        true
    }

    /// Apply a key press. Returns the action if it changed anything.
    pub fn key_down(
        &mut self,
        key: &str,
        modifiers: Modifiers,
        text_entry_focused: bool,
    ) -> Option<ShortcutAction> {
        let action = ShortcutMap::resolve(key, modifiers, text_entry_focused)?;
        let applied = match action {
            ShortcutAction::DeleteSelection => self.delete_selected(),
            ShortcutAction::Cancel => {
                if self.drag.is_some() {
                    self.abort(AbortReason::Cancelled);
                    true
                } else if self.menu.is_some() {
                    self.close_menu()
                } else {
                    self.clear_selection()
                }
            }
        };
        applied.then_some(action)
    }

    /// The host removed a node: drop its connections and any interaction
    /// that involves it.
    pub fn remove_node(&mut self, node: NodeId) -> Vec<ConnectionId> {
        let commit_target = self.commit.as_ref().is_some_and(|c| c.to == node);
        if commit_target || self.drag.as_ref().is_some_and(|d| d.from == node) {
            self.abort(AbortReason::Cancelled);
        }
        if self.menu.as_ref().is_some_and(|m| m.source == node) {
            self.close_menu();
        }
        let removed = self.store.remove_node(node);
        for id in &removed {
            self.connection_removed(*id);
        }
        removed
    }

    fn connection_removed(&mut self, id: ConnectionId) {
        if self.selection.is_selected(id) {
            self.selection.clear();
            self.emit(Signal::SelectionChanged { selected: None });
        }
        log::debug!("connection {id} deleted");
        self.emit(Signal::ConnectionDeleted { id });
    }
}
