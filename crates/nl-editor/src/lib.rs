//! Interactive side of NodeLink: the drag-to-connect engine, the connection
//! store, the creation menu, selection and shortcuts.

pub mod bus;
pub mod drag;
pub mod engine;
pub mod input;
pub mod menu;
pub mod resolver;
pub mod selection;
pub mod shortcuts;
pub mod store;
pub mod timers;
pub mod view;

pub use bus::{CursorFeedback, EventBus, Signal, SubscriptionId};
pub use drag::{AbortReason, ActiveDrag, DragOutcome, Hover};
pub use engine::ConnectionEngine;
pub use input::{InputEvent, Modifiers};
pub use menu::{ComponentMenu, NodeFactory};
pub use resolver::{ResolveTier, nearest_receive_anchor, resolve_anchor, resolve_anchor_point};
pub use selection::Selection;
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use store::{ConnectionList, ConnectionPersistence, ConnectionStore, PersistError, SnapshotError};
pub use view::{CanvasSnapshot, CanvasView, GeometryProvider, RenderedAnchor};
