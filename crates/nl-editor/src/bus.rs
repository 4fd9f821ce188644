//! In-process publish/subscribe bus.
//!
//! The engine owns one [`EventBus<Signal>`] and publishes UI feedback on it.
//! Node chrome subscribes when it mounts and unsubscribes when it unmounts,
//! so listener lifetime is explicit instead of hanging off global handlers.

use nl_core::id::{ConnectionId, NodeId};
use nl_core::model::{Anchor, Connection};
use nl_core::Point;
use std::cell::RefCell;
use std::rc::Rc;

/// Pointer feedback while a drag hovers a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorFeedback {
    #[default]
    Default,
    Valid,
    Invalid,
}

/// Signals produced by the engine for node UI collaborators.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// A drag started or ended. Node chrome stays visible while active.
    DragActive { active: bool, from: Option<NodeId> },
    /// Whether a hovered target frame should render as refused.
    FrameDim { frame: NodeId, dimmed: bool },
    Hover { node: NodeId, anchor: Anchor },
    Leave { node: NodeId },
    Cursor(CursorFeedback),
    MenuOpened { source: NodeId, canvas_point: Point },
    MenuClosed,
    /// Endpoint points are screen space; absent for menu-created links.
    ConnectionCreated {
        connection: Connection,
        endpoints: Option<(Point, Point)>,
    },
    ConnectionDeleted { id: ConnectionId },
    SelectionChanged { selected: Option<ConnectionId> },
}

pub type SubscriptionId = u64;

type Handler<E> = Box<dyn FnMut(&E)>;

/// Single-threaded event dispatcher.
pub struct EventBus<E> {
    next_id: SubscriptionId,
    handlers: Vec<(SubscriptionId, Handler<E>)>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            handlers: Vec::new(),
        }
    }

    /// Register a handler. Handlers run in subscription order.
    pub fn subscribe(&mut self, handler: impl FnMut(&E) + 'static) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Remove a handler. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sid, _)| *sid != id);
        self.handlers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn emit(&mut self, event: E) {
        for (_, handler) in &mut self.handlers {
            handler(&event);
        }
    }
}

impl<E: Clone + 'static> EventBus<E> {
    /// Subscribe a handler that appends every event to a shared log.
    pub fn record(&mut self) -> (SubscriptionId, Rc<RefCell<Vec<E>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let id = self.subscribe(move |e: &E| sink.borrow_mut().push(e.clone()));
        (id, log)
    }
}
