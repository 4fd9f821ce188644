//! Drag-to-connect transitions.
//!
//! ```text
//!   idle ──drag_started(send)──▶ dragging ──pointer_move──▶ dragging (hover feedback)
//!                                  │
//!        drag_completed(receive) ──┼──▶ committing ──▶ created | duplicate
//!                                  │        │  └─ unresolved ─▶ retry (once) ─▶ abort
//!        pointer_up near anchor ───┼──▶ settle timer ──▶ drag_completed
//!        pointer_up elsewhere ─────┼──▶ creation menu
//!        cancel / Escape ──────────┴──▶ idle
//! ```
//!
//! A drop can be reported twice: by the anchor under the pointer and by the
//! release fallback. The first path to claim the commit guard owns the
//! commit; the other only clears feedback. Timers carry the generation of
//! the drag that scheduled them and do nothing once that drag is gone.

use crate::bus::{CursorFeedback, Signal};
use crate::engine::{ConnectionEngine, Task};
use crate::resolver::{nearest_receive_anchor, resolve_anchor_point};
use crate::view::{CanvasView, GeometryProvider};
use nl_core::classify::{KindSource, classify};
use nl_core::id::NodeId;
use nl_core::model::{Anchor, AnchorSide, Color, Connection, NodeKind};
use nl_core::rules::{LinkEnd, Rejection};
use nl_core::Point;
use thiserror::Error;

/// The drag in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveDrag {
    pub from: NodeId,
    pub color: Color,
    pub start_point: Point,
    pub current_point: Point,
    /// Pointer was released and a settle timer is pending.
    pub released: bool,
    pub generation: u64,
}

/// Receive anchor currently under the drag.
#[derive(Debug, Clone, PartialEq)]
pub struct Hover {
    pub node: NodeId,
    pub anchor: Anchor,
    pub valid: bool,
}

/// A commit that owns the guard, waiting for endpoint geometry.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PendingCommit {
    pub(crate) to: NodeId,
    pub(crate) anchor: Anchor,
    pub(crate) attempt: u32,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AbortReason {
    #[error("link refused: {0}")]
    Rejected(#[from] Rejection),
    #[error("endpoint geometry could not be resolved")]
    Unresolved,
    #[error("drag cancelled")]
    Cancelled,
    #[error("released over the chrome of {0}")]
    OverChrome(NodeId),
    #[error("{0} has nothing to offer in the creation menu")]
    NoMenuEntries(NodeKind),
}

/// Result of a drag transition.
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// No drag, wrong anchor, or another path owns the commit.
    Ignored,
    Started,
    /// Waiting on a settle or retry timer.
    Pending,
    Created(Connection),
    /// The link already existed; nothing changed.
    Duplicate,
    MenuOpened,
    Aborted(AbortReason),
}

impl ConnectionEngine {
    /// A node's anchor was pressed. Only `send` anchors start a drag.
    pub fn drag_started(
        &mut self,
        node: NodeId,
        side: AnchorSide,
        color: Color,
        point: Point,
    ) -> DragOutcome {
        if side != AnchorSide::Send {
            log::trace!("ignoring drag from an input anchor of {node}");
            return DragOutcome::Ignored;
        }
        if let Some(stale) = self.drag.as_ref() {
            log::debug!("replacing unfinished drag from {}", stale.from);
            self.finish_drag();
        }
        if self.menu.is_some() {
            self.close_menu();
        }

        self.next_generation += 1;
        self.drag = Some(ActiveDrag {
            from: node,
            color,
            start_point: point,
            current_point: point,
            released: false,
            generation: self.next_generation,
        });
        log::debug!("drag started from {node}");
        self.emit(Signal::DragActive {
            active: true,
            from: Some(node),
        });
        DragOutcome::Started
    }

    /// Track the pointer and update hover feedback for the nearest receive
    /// anchor within the hover radius.
    pub fn pointer_move(&mut self, view: &dyn CanvasView, point: Point) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        drag.current_point = point;
        let from = drag.from;
        if self.commit.is_some() {
            return;
        }

        let next = nearest_receive_anchor(view, point, self.config.hover_radius, |_| true).map(
            |(target, _)| {
                let valid = self
                    .check_link(view, from, target.node, &target.anchor)
                    .is_ok();
                Hover {
                    node: target.node,
                    anchor: target.anchor,
                    valid,
                }
            },
        );
        self.set_hover(next);
    }

    /// A receive anchor reported a drop on itself.
    pub fn drag_completed(
        &mut self,
        view: &dyn CanvasView,
        node: NodeId,
        anchor: Anchor,
        at: Option<Point>,
    ) -> DragOutcome {
        if !anchor.is_receive() {
            return DragOutcome::Ignored;
        }
        let Some(drag) = self.drag.as_ref() else {
            return DragOutcome::Ignored;
        };
        if self.commit.is_some() {
            log::trace!("drop on {node} ignored: commit already in flight");
            return DragOutcome::Ignored;
        }
        let from = drag.from;
        if node == from {
            return self.abort(AbortReason::Rejected(Rejection::SelfLoop));
        }

        // The reporting anchor may not be the input closest to the drop.
        let drop_point = at.unwrap_or(drag.current_point);
        let anchor = nearest_receive_anchor(view, drop_point, self.config.anchor_refine_radius, |a| {
            a.node == node
        })
        .map(|(target, _)| target.anchor)
        .unwrap_or(anchor);

        if let Err(rejection) = self.check_link(view, from, node, &anchor) {
            return self.abort(rejection.into());
        }

        self.commit = Some(PendingCommit {
            to: node,
            anchor,
            attempt: 0,
        });
        self.try_commit(view)
    }

    /// The pointer was released anywhere.
    ///
    /// Near a receive anchor the commit is deferred so the anchor's own drop
    /// report can win; over empty canvas the creation menu opens; over node
    /// chrome the drag is dropped.
    pub fn pointer_up(&mut self, view: &dyn CanvasView, point: Point) -> DragOutcome {
        let Some(drag) = self.drag.as_mut() else {
            return DragOutcome::Ignored;
        };
        if drag.released || self.commit.is_some() {
            return DragOutcome::Ignored;
        }
        drag.current_point = point;
        let (from, generation) = (drag.from, drag.generation);

        if let Some((target, _)) =
            nearest_receive_anchor(view, point, self.config.release_radius, |a| a.node != from)
        {
            if let Err(rejection) = self.check_link(view, from, target.node, &target.anchor) {
                return self.abort(rejection.into());
            }
            if let Some(drag) = self.drag.as_mut() {
                drag.released = true;
            }
            self.timers.schedule(
                self.config.settle_delay(),
                Task::Settle {
                    generation,
                    node: target.node,
                    anchor: target.anchor,
                    point,
                },
            );
            return DragOutcome::Pending;
        }

        if let Some(node) = view.chrome_at(point) {
            return self.abort(AbortReason::OverChrome(node));
        }
        self.open_menu(view, point)
    }

    pub fn pointer_cancel(&mut self) -> DragOutcome {
        if self.drag.is_none() {
            return DragOutcome::Ignored;
        }
        self.abort(AbortReason::Cancelled)
    }

    // ─── Timers ──────────────────────────────────────────────────────────

    pub(crate) fn settle(
        &mut self,
        view: &dyn CanvasView,
        generation: u64,
        node: NodeId,
        anchor: Anchor,
        point: Point,
    ) -> DragOutcome {
        if !self.owns_generation(generation) {
            return DragOutcome::Ignored;
        }
        if self.commit.is_some() {
            self.set_hover(None);
            return DragOutcome::Ignored;
        }
        self.drag_completed(view, node, anchor, Some(point))
    }

    pub(crate) fn retry_commit(&mut self, view: &dyn CanvasView, generation: u64) -> DragOutcome {
        if !self.owns_generation(generation) || self.commit.is_none() {
            return DragOutcome::Ignored;
        }
        self.try_commit(view)
    }

    fn owns_generation(&self, generation: u64) -> bool {
        self.drag.as_ref().is_some_and(|d| d.generation == generation)
    }

    // ─── Commit ──────────────────────────────────────────────────────────

    fn try_commit(&mut self, view: &dyn CanvasView) -> DragOutcome {
        let (Some(drag), Some(pending)) = (self.drag.as_ref(), self.commit.as_ref()) else {
            return DragOutcome::Ignored;
        };
        let (from, color, generation) = (drag.from, drag.color, drag.generation);
        let (to, anchor, attempt) = (pending.to, pending.anchor.clone(), pending.attempt);

        let from_point = resolve_anchor_point(view, from, &Anchor::Send);
        let to_point = resolve_anchor_point(view, to, &anchor);
        if let (Some(a), Some(b)) = (from_point, to_point) {
            self.finish_drag();
            // minted ids stay interned; only mint for a new link
            if self.store.find(from, to, &anchor).is_some() {
                return DragOutcome::Duplicate;
            }
            let connection = Connection::new(from, to, anchor, color);
            if !self.store.create(connection.clone()) {
                return DragOutcome::Duplicate;
            }
            log::debug!("connected {from} → {to}/{}", connection.to_anchor);
            self.emit(Signal::ConnectionCreated {
                connection: connection.clone(),
                endpoints: Some((a, b)),
            });
            return DragOutcome::Created(connection);
        }

        if attempt < self.config.max_geometry_retries {
            if let Some(pending) = self.commit.as_mut() {
                pending.attempt += 1;
            }
            log::debug!("endpoint geometry for {from} → {to} missing, retrying");
            self.timers
                .schedule(self.config.retry_delay(), Task::RetryCommit { generation });
            return DragOutcome::Pending;
        }
        self.abort(AbortReason::Unresolved)
    }

    // ─── Helpers ─────────────────────────────────────────────────────────

    pub(crate) fn check_link(
        &self,
        view: &dyn CanvasView,
        from: NodeId,
        to: NodeId,
        anchor: &Anchor,
    ) -> Result<(), Rejection> {
        let from_facts = view.image_facts(from);
        let to_facts = view.image_facts(to);
        let source = LinkEnd::new(from, classify(view, from)).with_facts(from_facts.as_ref());
        let target = LinkEnd::new(to, classify(view, to)).with_facts(to_facts.as_ref());
        self.validator.validate(&source, &target, anchor)
    }

    pub(crate) fn abort(&mut self, reason: AbortReason) -> DragOutcome {
        log::debug!("drag aborted: {reason}");
        self.finish_drag();
        DragOutcome::Aborted(reason)
    }

    /// Back to idle: clear feedback, release the guard, end the drag.
    pub(crate) fn finish_drag(&mut self) {
        self.set_hover(None);
        self.commit = None;
        if self.drag.take().is_some() {
            self.emit(Signal::DragActive {
                active: false,
                from: None,
            });
        }
    }

    fn set_hover(&mut self, next: Option<Hover>) {
        if self.hover == next {
            return;
        }
        if let Some(prev) = self.hover.take() {
            if !prev.valid {
                self.emit(Signal::FrameDim {
                    frame: prev.node,
                    dimmed: false,
                });
            }
            self.emit(Signal::Leave { node: prev.node });
        }
        let cursor = match &next {
            None => CursorFeedback::Default,
            Some(h) if h.valid => CursorFeedback::Valid,
            Some(_) => CursorFeedback::Invalid,
        };
        if let Some(h) = &next {
            self.emit(Signal::Hover {
                node: h.node,
                anchor: h.anchor.clone(),
            });
            if !h.valid {
                self.emit(Signal::FrameDim {
                    frame: h.node,
                    dimmed: true,
                });
            }
        }
        self.hover = next;
        if self.cursor != cursor {
            self.cursor = cursor;
            self.emit(Signal::Cursor(cursor));
        }
    }
}
