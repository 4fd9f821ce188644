//! Anchor geometry resolution and proximity search.
//!
//! Resolves a `(node, anchor)` pair to a screen-space point, falling back
//! through progressively coarser sources when exact rendered geometry is not
//! available yet (e.g. a node created on the previous frame).

use crate::view::{GeometryProvider, RenderedAnchor};
use nl_core::geometry::{left_center, right_center};
use nl_core::id::NodeId;
use nl_core::model::{Anchor, AnchorSide};
use nl_core::{Point, Vec2};

/// Which source produced a resolved point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveTier {
    /// The rendered anchor element itself.
    Anchor,
    /// The node's outer frame.
    Frame,
    /// The node's overlay container.
    Overlay,
    /// Reconstructed from canvas-space registry data.
    Canvas,
}

/// Resolve with tier information.
pub fn resolve_anchor(
    view: &(impl GeometryProvider + ?Sized),
    node: NodeId,
    anchor: &Anchor,
) -> Option<(Point, ResolveTier)> {
    let edge_point = |rect| match anchor.side() {
        AnchorSide::Send => right_center(rect),
        AnchorSide::Receive => left_center(rect),
    };

    if let Some(rect) = view.anchor_rect(node, anchor) {
        return Some((rect.center(), ResolveTier::Anchor));
    }
    if let Some(rect) = view.frame_rect(node) {
        return Some((edge_point(rect), ResolveTier::Frame));
    }
    if let Some(rect) = view.overlay_rect(node) {
        return Some((edge_point(rect), ResolveTier::Overlay));
    }

    let rect = view.canvas_rect(node)?;
    let viewport = view.viewport();
    let center = viewport.to_screen(rect.center());
    let half = rect.width() / 2.0 * viewport.scale;
    let offset = match anchor.side() {
        AnchorSide::Send => half,
        AnchorSide::Receive => -half,
    };
    Some((center + Vec2::new(offset, 0.0), ResolveTier::Canvas))
}

/// Screen-space point of `anchor` on `node`, or `None` when no tier knows
/// the node.
pub fn resolve_anchor_point(
    view: &(impl GeometryProvider + ?Sized),
    node: NodeId,
    anchor: &Anchor,
) -> Option<Point> {
    let resolved = resolve_anchor(view, node, anchor);
    match resolved {
        Some((point, tier)) => {
            log::trace!(
                "resolved {node}/{anchor} via {tier:?} at ({:.1}, {:.1})",
                point.x,
                point.y
            );
            Some(point)
        }
        None => {
            log::trace!("unresolved {node}/{anchor}");
            None
        }
    }
}

/// Nearest rendered receive anchor strictly within `radius` of `point`
/// that satisfies `filter`.
pub fn nearest_receive_anchor(
    view: &(impl GeometryProvider + ?Sized),
    point: Point,
    radius: f64,
    mut filter: impl FnMut(&RenderedAnchor) -> bool,
) -> Option<(RenderedAnchor, f64)> {
    view.receive_anchors()
        .into_iter()
        .filter(|a| filter(a))
        .map(|a| {
            let d = a.center().distance(point);
            (a, d)
        })
        .filter(|(_, d)| *d < radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
}
