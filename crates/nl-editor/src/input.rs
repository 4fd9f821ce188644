//! Input abstraction layer.
//!
//! Normalizes the host's pointer, anchor and keyboard callbacks into a
//! single `InputEvent` enum consumed by
//! [`ConnectionEngine::handle`](crate::engine::ConnectionEngine::handle).

use nl_core::id::{ConnectionId, NodeId};
use nl_core::model::{Anchor, AnchorSide, Color};
use nl_core::Point;
use std::time::Duration;

/// Keyboard modifier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
        alt: false,
        meta: false,
    };
}

/// A normalized input event from the host canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// The user pressed on an anchor. Only `send` anchors start a drag.
    DragStarted {
        node: NodeId,
        side: AnchorSide,
        color: Color,
        x: f64,
        y: f64,
    },

    /// A drag ended on top of a receive anchor, reported by that anchor.
    DragCompleted {
        node: NodeId,
        anchor: Anchor,
        /// Drop point if the anchor knows it; the last pointer position
        /// is used otherwise.
        at: Option<Point>,
    },

    /// Pointer moved anywhere on the page.
    PointerMove { x: f64, y: f64 },

    /// Pointer released anywhere on the page.
    PointerUp { x: f64, y: f64 },

    /// The platform cancelled the pointer (focus loss, touch interrupt).
    PointerCancel,

    /// Key pressed.
    Key {
        key: String,
        modifiers: Modifiers,
        /// A text input or editable element has focus.
        text_entry_focused: bool,
    },

    /// Click on a rendered connection path.
    ConnectionClicked { id: ConnectionId },

    /// Click on a connection's endpoint handle.
    EndpointClicked { id: ConnectionId },

    /// Time passed since the previous tick.
    Tick { elapsed: Duration },
}

impl InputEvent {
    /// Bridge an anchor's `drag-completed` callback, which names the anchor
    /// as a string. Returns `None` for unknown anchor names.
    pub fn drag_completed(node: &str, anchor: &str, at: Option<Point>) -> Option<Self> {
        Some(Self::DragCompleted {
            node: NodeId::intern(node),
            anchor: Anchor::parse(anchor)?,
            at,
        })
    }

    /// Bridge an anchor's `drag-started` callback.
    pub fn drag_started(node: &str, anchor: &str, color: Color, x: f64, y: f64) -> Option<Self> {
        Some(Self::DragStarted {
            node: NodeId::intern(node),
            side: Anchor::parse(anchor)?.side(),
            color,
            x,
            y,
        })
    }

    pub fn key(key: &str, text_entry_focused: bool) -> Self {
        Self::Key {
            key: key.to_string(),
            modifiers: Modifiers::NONE,
            text_entry_focused,
        }
    }

    pub fn tick_ms(ms: u64) -> Self {
        Self::Tick {
            elapsed: Duration::from_millis(ms),
        }
    }

    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::DragStarted { x, y, .. } | Self::PointerMove { x, y } | Self::PointerUp { x, y } => {
                Some(Point::new(*x, *y))
            }
            Self::DragCompleted { at, .. } => *at,
            _ => None,
        }
    }
}
