//! Creation menu.
//!
//! Opened when a drag is released over empty canvas. Picking an entry asks
//! the host to create a node of that kind at the release point and links
//! the drag source to it.

use crate::bus::Signal;
use crate::drag::{AbortReason, DragOutcome};
use crate::engine::ConnectionEngine;
use crate::view::{CanvasSnapshot, CanvasView, GeometryProvider};
use nl_core::classify::classify;
use nl_core::id::NodeId;
use nl_core::model::{Color, Connection, NodeKind};
use nl_core::registry::NodeRecord;
use nl_core::rules::{menu_anchor, menu_targets};
use nl_core::{Point, Size};
use smallvec::SmallVec;

/// Size of nodes the snapshot factory creates, in canvas units.
const CREATED_NODE_SIZE: Size = Size::new(200.0, 120.0);

/// An open creation menu.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentMenu {
    pub source: NodeId,
    pub source_kind: NodeKind,
    pub color: Color,
    /// Where the pointer was released.
    pub screen_point: Point,
    /// Same point in canvas space; new nodes are placed here.
    pub canvas_point: Point,
    pub entries: SmallVec<[NodeKind; 8]>,
}

impl ComponentMenu {
    pub fn offers(&self, kind: NodeKind) -> bool {
        self.entries.contains(&kind)
    }
}

/// Creates nodes on behalf of the menu.
pub trait NodeFactory {
    /// Create a node of `kind` at `canvas_point`. `None` if the host
    /// declined or failed.
    fn create_node(&mut self, kind: NodeKind, canvas_point: Point) -> Option<NodeId>;
}

impl<F> NodeFactory for F
where
    F: FnMut(NodeKind, Point) -> Option<NodeId>,
{
    fn create_node(&mut self, kind: NodeKind, canvas_point: Point) -> Option<NodeId> {
        self(kind, canvas_point)
    }
}

impl NodeFactory for CanvasSnapshot {
    fn create_node(&mut self, kind: NodeKind, canvas_point: Point) -> Option<NodeId> {
        let id = NodeId::with_prefix(kind.as_str());
        self.add_node(id, NodeRecord::new(kind, canvas_point, CREATED_NODE_SIZE));
        Some(id)
    }
}

impl ConnectionEngine {
    /// Turn the active drag into an open menu at `point`.
    pub(crate) fn open_menu(&mut self, view: &dyn CanvasView, point: Point) -> DragOutcome {
        let Some(drag) = self.drag.as_ref() else {
            return DragOutcome::Ignored;
        };
        let (source, color) = (drag.from, drag.color);
        let source_kind = classify(view, source);
        let entries: SmallVec<[NodeKind; 8]> = menu_targets(source_kind).iter().copied().collect();
        if entries.is_empty() {
            return self.abort(AbortReason::NoMenuEntries(source_kind));
        }

        let canvas_point = view.viewport().to_canvas(point);
        self.finish_drag();
        log::debug!("creation menu for {source} ({source_kind}): {entries:?}");
        self.menu = Some(ComponentMenu {
            source,
            source_kind,
            color,
            screen_point: point,
            canvas_point,
            entries,
        });
        self.emit(Signal::MenuOpened {
            source,
            canvas_point,
        });
        DragOutcome::MenuOpened
    }

    /// Create a node of `kind` and link the menu's source to it. The menu
    /// closes whether or not the factory succeeds. Kinds the menu does not
    /// offer leave it open and do nothing.
    pub fn select_menu_entry(
        &mut self,
        kind: NodeKind,
        factory: &mut dyn NodeFactory,
    ) -> Option<Connection> {
        if !self.menu.as_ref()?.offers(kind) {
            log::debug!("{kind} is not offered by the open menu");
            return None;
        }
        let menu = self.menu.take()?;
        self.emit(Signal::MenuClosed);

        let Some(target) = factory.create_node(kind, menu.canvas_point) else {
            log::warn!("node factory declined to create a {kind}");
            return None;
        };
        let anchor = menu_anchor(menu.source_kind, kind);
        let connection = Connection::new(menu.source, target, anchor, menu.color);
        if !self.store.create(connection.clone()) {
            return None;
        }
        log::debug!("menu created {target} ({kind}) linked from {}", menu.source);
        self.emit(Signal::ConnectionCreated {
            connection: connection.clone(),
            endpoints: None,
        });
        Some(connection)
    }

    /// Dismiss the menu. Returns `false` if none was open.
    pub fn close_menu(&mut self) -> bool {
        if self.menu.take().is_none() {
            return false;
        }
        self.emit(Signal::MenuClosed);
        true
    }
}
