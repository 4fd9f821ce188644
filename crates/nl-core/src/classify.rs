//! Node kind classification.
//!
//! The host answers kind questions from whatever it has rendered: tags on a
//! node's container, on an enclosing container, or on its anchor elements.
//! [`classify`] walks those in order and falls back to the id naming scheme.

use crate::id::NodeId;
use crate::media::ImageFacts;
use crate::model::NodeKind;

/// Read-only kind lookup against the host's node chrome.
pub trait KindSource {
    /// Kind tag on the node's own rendered container.
    fn container_kind(&self, id: NodeId) -> Option<NodeKind>;

    /// Kind tag on an ancestor container.
    fn ancestor_kind(&self, _id: NodeId) -> Option<NodeKind> {
        None
    }

    /// Kind tag on one of the node's anchor elements.
    fn anchor_kind(&self, _id: NodeId) -> Option<NodeKind> {
        None
    }

    /// Content facts for image-like nodes.
    fn image_facts(&self, _id: NodeId) -> Option<ImageFacts> {
        None
    }
}

/// Resolve the kind of `id`. First match wins:
/// container tag, ancestor tag, anchor tag, id prefix. `Unknown` otherwise.
pub fn classify(source: &(impl KindSource + ?Sized), id: NodeId) -> NodeKind {
    let known = |k: Option<NodeKind>| k.filter(|k| *k != NodeKind::Unknown);
    known(source.container_kind(id))
        .or_else(|| known(source.ancestor_kind(id)))
        .or_else(|| known(source.anchor_kind(id)))
        .or_else(|| id.has_image_prefix().then_some(NodeKind::Image))
        .unwrap_or(NodeKind::Unknown)
}
