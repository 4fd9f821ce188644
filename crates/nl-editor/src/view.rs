//! What the engine can ask the host canvas.
//!
//! [`GeometryProvider`] replaces layout queries against rendered chrome.
//! Together with [`KindSource`] it forms a [`CanvasView`], passed into every
//! engine call. [`CanvasSnapshot`] is a ready-made view built from a
//! [`NodeRegistry`] for hosts that lay nodes out themselves.

use nl_core::classify::KindSource;
use nl_core::geometry::{left_center, right_center};
use nl_core::id::NodeId;
use nl_core::media::ImageFacts;
use nl_core::model::{Anchor, NodeKind};
use nl_core::registry::{NodeRecord, NodeRegistry};
use nl_core::{Point, Rect, Size, Viewport};

/// Side length of an anchor's hit square, in screen pixels.
pub const ANCHOR_SIZE: f64 = 12.0;

/// A receive anchor as currently rendered, in screen space.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedAnchor {
    pub node: NodeId,
    pub anchor: Anchor,
    pub rect: Rect,
}

impl RenderedAnchor {
    pub fn center(&self) -> Point {
        self.rect.center()
    }
}

/// Read-only geometry queries. Screen space unless noted.
pub trait GeometryProvider {
    fn viewport(&self) -> Viewport;

    /// Rendered anchor element of a node.
    fn anchor_rect(&self, _node: NodeId, _anchor: &Anchor) -> Option<Rect> {
        None
    }

    /// The node's outer frame.
    fn frame_rect(&self, _node: NodeId) -> Option<Rect> {
        None
    }

    /// The node's overlay container (toolbars, selection chrome).
    fn overlay_rect(&self, _node: NodeId) -> Option<Rect> {
        None
    }

    /// Last known bounds in **canvas** space, independent of pan/zoom.
    fn canvas_rect(&self, node: NodeId) -> Option<Rect>;

    /// Every receive anchor currently rendered.
    fn receive_anchors(&self) -> Vec<RenderedAnchor>;

    /// Node whose chrome covers `point`, if any.
    fn chrome_at(&self, _point: Point) -> Option<NodeId> {
        None
    }
}

/// Everything the engine reads from the host.
pub trait CanvasView: KindSource + GeometryProvider {}

impl<T: KindSource + GeometryProvider> CanvasView for T {}

// ─── Snapshot view ───────────────────────────────────────────────────────

/// A laid-out view of a [`NodeRegistry`] under a viewport.
///
/// Call [`CanvasSnapshot::layout`] after changing nodes or the viewport.
/// Nodes can be hidden from the rendered tiers to model chrome that has not
/// been laid out yet; the registry tier still answers for them.
#[derive(Debug, Clone, Default)]
pub struct CanvasSnapshot {
    pub registry: NodeRegistry,
    pub viewport: Viewport,
    frames: Vec<(NodeId, Rect)>,
    overlays: Vec<(NodeId, Rect)>,
    anchors: Vec<RenderedAnchor>,
    send_anchors: Vec<(NodeId, Rect)>,
    hidden: Vec<NodeId>,
}

impl CanvasSnapshot {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    /// Register a node and lay it out.
    pub fn add_node(&mut self, id: NodeId, record: NodeRecord) {
        self.registry.insert(id, record);
        self.layout();
    }

    /// Convenience for tests and demos: a node of `kind` centered at
    /// `center` (canvas space) with a default 200 × 120 size.
    pub fn add(&mut self, id: &str, kind: NodeKind, center: Point) -> NodeId {
        let id = NodeId::intern(id);
        self.add_node(id, NodeRecord::new(kind, center, Size::new(200.0, 120.0)));
        id
    }

    pub fn add_image(&mut self, id: &str, center: Point, facts: ImageFacts) -> NodeId {
        let id = NodeId::intern(id);
        self.add_node(
            id,
            NodeRecord::new(NodeKind::Image, center, Size::new(200.0, 120.0)).with_facts(facts),
        );
        id
    }

    pub fn remove_node(&mut self, id: NodeId) {
        self.registry.remove(id);
        self.layout();
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.layout();
    }

    /// Exclude a node from the rendered tiers (frame, overlay, anchors).
    pub fn hide(&mut self, id: NodeId) {
        if !self.hidden.contains(&id) {
            self.hidden.push(id);
        }
        self.layout();
    }

    pub fn show(&mut self, id: NodeId) {
        self.hidden.retain(|h| *h != id);
        self.layout();
    }

    pub fn set_overlay(&mut self, id: NodeId, rect: Rect) {
        self.overlays.retain(|(n, _)| *n != id);
        self.overlays.push((id, rect));
    }

    /// Recompute screen-space frames and anchors from the registry.
    pub fn layout(&mut self) {
        self.frames.clear();
        self.anchors.clear();
        self.send_anchors.clear();

        let mut nodes: Vec<_> = self.registry.iter().collect();
        nodes.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));

        for (id, record) in nodes {
            if self.hidden.contains(&id) {
                continue;
            }
            let frame = self.viewport.rect_to_screen(record.rect());
            self.frames.push((id, frame));
            self.send_anchors
                .push((id, Rect::from_center_size(right_center(frame), anchor_size())));

            let n = record.inputs.len() as f64;
            for (i, anchor) in record.inputs.iter().enumerate() {
                let y = frame.y0 + frame.height() * (i as f64 + 1.0) / (n + 1.0);
                let center = Point::new(left_center(frame).x, y);
                self.anchors.push(RenderedAnchor {
                    node: id,
                    anchor: anchor.clone(),
                    rect: Rect::from_center_size(center, anchor_size()),
                });
            }
        }
    }
}

fn anchor_size() -> Size {
    Size::new(ANCHOR_SIZE, ANCHOR_SIZE)
}

impl KindSource for CanvasSnapshot {
    fn container_kind(&self, id: NodeId) -> Option<NodeKind> {
        self.registry.container_kind(id)
    }

    fn ancestor_kind(&self, id: NodeId) -> Option<NodeKind> {
        self.registry.ancestor_kind(id)
    }

    fn anchor_kind(&self, id: NodeId) -> Option<NodeKind> {
        self.registry.anchor_kind(id)
    }

    fn image_facts(&self, id: NodeId) -> Option<ImageFacts> {
        self.registry.image_facts(id)
    }
}

impl GeometryProvider for CanvasSnapshot {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn anchor_rect(&self, node: NodeId, anchor: &Anchor) -> Option<Rect> {
        match anchor {
            Anchor::Send => self
                .send_anchors
                .iter()
                .find(|(n, _)| *n == node)
                .map(|(_, r)| *r),
            _ => self
                .anchors
                .iter()
                .find(|a| a.node == node && &a.anchor == anchor)
                .map(|a| a.rect),
        }
    }

    fn frame_rect(&self, node: NodeId) -> Option<Rect> {
        self.frames.iter().find(|(n, _)| *n == node).map(|(_, r)| *r)
    }

    fn overlay_rect(&self, node: NodeId) -> Option<Rect> {
        self.overlays.iter().find(|(n, _)| *n == node).map(|(_, r)| *r)
    }

    fn canvas_rect(&self, node: NodeId) -> Option<Rect> {
        self.registry.canvas_rect(node)
    }

    fn receive_anchors(&self) -> Vec<RenderedAnchor> {
        self.anchors.clone()
    }

    fn chrome_at(&self, point: Point) -> Option<NodeId> {
        self.frames
            .iter()
            .chain(self.overlays.iter())
            .rev()
            .find(|(_, r)| r.contains(point))
            .map(|(n, _)| *n)
    }
}
