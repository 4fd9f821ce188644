//! The connection engine.
//!
//! Owns the store, the signal bus and all transient interaction state: the
//! active drag, hover feedback, the creation menu, the selected connection
//! and pending timers. Drag transitions live in [`crate::drag`], the menu in
//! [`crate::menu`], selection and keyboard handling in [`crate::selection`].
//!
//! Everything runs on the caller's thread. Timers fire only from
//! [`ConnectionEngine::tick`], so a host drives the engine with input
//! events plus periodic ticks.

use crate::bus::{CursorFeedback, EventBus, Signal, SubscriptionId};
use crate::drag::{AbortReason, ActiveDrag, DragOutcome, Hover, PendingCommit};
use crate::input::InputEvent;
use crate::menu::ComponentMenu;
use crate::selection::Selection;
use crate::shortcuts::ShortcutAction;
use crate::store::ConnectionStore;
use crate::timers::TimerQueue;
use crate::view::CanvasView;
use nl_core::config::{ConfigError, EngineConfig};
use nl_core::id::NodeId;
use nl_core::model::Anchor;
use nl_core::rules::Validator;
use nl_core::Point;
use std::time::Duration;

/// Deferred work, tagged with the drag generation that scheduled it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Task {
    /// Release fallback: commit to `node`/`anchor` unless the anchor's own
    /// drop handler got there first.
    Settle {
        generation: u64,
        node: NodeId,
        anchor: Anchor,
        point: Point,
    },
    /// Re-resolve endpoint geometry for the pending commit.
    RetryCommit { generation: u64 },
}

pub struct ConnectionEngine {
    pub(crate) config: EngineConfig,
    pub(crate) validator: Validator,
    pub(crate) store: ConnectionStore,
    pub(crate) bus: EventBus<Signal>,
    pub(crate) drag: Option<ActiveDrag>,
    /// Commit ownership guard. Set while a commit for the active drag is in
    /// flight; whichever completion path sets it owns the commit.
    pub(crate) commit: Option<PendingCommit>,
    pub(crate) hover: Option<Hover>,
    pub(crate) cursor: CursorFeedback,
    pub(crate) menu: Option<ComponentMenu>,
    pub(crate) selection: Selection,
    pub(crate) timers: TimerQueue<Task>,
    pub(crate) next_generation: u64,
}

impl ConnectionEngine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        Self::with_store(config, ConnectionStore::new())
    }

    /// Engine over an existing store, e.g. one in controlled mode or with
    /// persistence hooks attached.
    pub fn with_store(config: EngineConfig, store: ConnectionStore) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            validator: Validator::new(config.media.clone()),
            config,
            store,
            bus: EventBus::new(),
            drag: None,
            commit: None,
            hover: None,
            cursor: CursorFeedback::Default,
            menu: None,
            selection: Selection::default(),
            timers: TimerQueue::new(),
            next_generation: 0,
        })
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn store(&self) -> &ConnectionStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ConnectionStore {
        &mut self.store
    }

    pub fn active_drag(&self) -> Option<&ActiveDrag> {
        self.drag.as_ref()
    }

    /// Whether a commit for the active drag is in flight.
    pub fn is_committing(&self) -> bool {
        self.commit.is_some()
    }

    pub fn hover(&self) -> Option<&Hover> {
        self.hover.as_ref()
    }

    pub fn cursor(&self) -> CursorFeedback {
        self.cursor
    }

    pub fn menu(&self) -> Option<&ComponentMenu> {
        self.menu.as_ref()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Number of timers waiting to fire, including self-cancelled ones.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    // ─── Signals ─────────────────────────────────────────────────────────

    pub fn subscribe(&mut self, handler: impl FnMut(&Signal) + 'static) -> SubscriptionId {
        self.bus.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn bus_mut(&mut self) -> &mut EventBus<Signal> {
        &mut self.bus
    }

    pub(crate) fn emit(&mut self, signal: Signal) {
        log::trace!("signal {signal:?}");
        self.bus.emit(signal);
    }

    // ─── Time ────────────────────────────────────────────────────────────

    /// Advance time and run every timer that comes due, in order.
    pub fn tick(&mut self, view: &dyn CanvasView, elapsed: Duration) -> Vec<DragOutcome> {
        let target = self.timers.now().saturating_add(elapsed);
        let mut outcomes = Vec::new();
        while let Some(task) = self.timers.pop_due(target) {
            let outcome = self.run_task(view, task);
            if outcome != DragOutcome::Ignored {
                outcomes.push(outcome);
            }
        }
        self.timers.advance_to(target);
        outcomes
    }

    fn run_task(&mut self, view: &dyn CanvasView, task: Task) -> DragOutcome {
        match task {
            Task::Settle {
                generation,
                node,
                anchor,
                point,
            } => self.settle(view, generation, node, anchor, point),
            Task::RetryCommit { generation } => self.retry_commit(view, generation),
        }
    }

    // ─── Dispatch ────────────────────────────────────────────────────────

    /// Route a normalized input event. Returns the drag outcomes it caused;
    /// selection, menu and keyboard effects are reported through signals.
    pub fn handle(&mut self, view: &dyn CanvasView, event: InputEvent) -> Vec<DragOutcome> {
        let outcome = match event {
            InputEvent::DragStarted {
                node,
                side,
                color,
                x,
                y,
            } => self.drag_started(node, side, color, Point::new(x, y)),
            InputEvent::DragCompleted { node, anchor, at } => {
                self.drag_completed(view, node, anchor, at)
            }
            InputEvent::PointerMove { x, y } => {
                self.pointer_move(view, Point::new(x, y));
                DragOutcome::Ignored
            }
            InputEvent::PointerUp { x, y } => self.pointer_up(view, Point::new(x, y)),
            InputEvent::PointerCancel => self.pointer_cancel(),
            InputEvent::Key {
                key,
                modifiers,
                text_entry_focused,
            } => {
                let dragging = self.drag.is_some();
                match self.key_down(&key, modifiers, text_entry_focused) {
                    Some(ShortcutAction::Cancel) if dragging => {
                        DragOutcome::Aborted(AbortReason::Cancelled)
                    }
                    _ => DragOutcome::Ignored,
                }
            }
            InputEvent::ConnectionClicked { id } => {
                self.click_connection(id);
                DragOutcome::Ignored
            }
            InputEvent::EndpointClicked { id } => {
                self.click_endpoint(id);
                DragOutcome::Ignored
            }
            InputEvent::Tick { elapsed } => return self.tick(view, elapsed),
        };
        match outcome {
            DragOutcome::Ignored => Vec::new(),
            other => vec![other],
        }
    }
}

impl std::fmt::Debug for ConnectionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionEngine")
            .field("store", &self.store)
            .field("drag", &self.drag)
            .field("commit", &self.commit)
            .field("hover", &self.hover)
            .field("menu", &self.menu)
            .field("selection", &self.selection)
            .field("timers", &self.timers.len())
            .finish()
    }
}
