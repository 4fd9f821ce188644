//! In-memory registry of canvas nodes.
//!
//! Holds the last known canvas-space placement, kind tags and image facts of
//! each node. Hosts feed it from their own node lists; the engine reads it
//! through [`KindSource`] and as the last-resort geometry source.

use crate::classify::KindSource;
use crate::id::NodeId;
use crate::media::ImageFacts;
use crate::model::{Anchor, NodeKind};
use kurbo::{Point, Rect, Size};
use smallvec::{SmallVec, smallvec};
use std::collections::HashMap;

/// What the registry knows about one node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub kind: NodeKind,
    /// Kind tag inherited from an enclosing container, if any.
    pub ancestor_kind: Option<NodeKind>,
    /// Kind tag carried by the node's anchor elements, if any.
    pub anchor_kind: Option<NodeKind>,
    /// Canvas-space center of the node.
    pub center: Point,
    pub size: Size,
    /// Input anchors, top to bottom. Defaults to the generic `receive`.
    pub inputs: SmallVec<[Anchor; 2]>,
    pub facts: Option<ImageFacts>,
}

impl NodeRecord {
    pub fn new(kind: NodeKind, center: Point, size: Size) -> Self {
        Self {
            kind,
            ancestor_kind: None,
            anchor_kind: None,
            center,
            size,
            inputs: smallvec![Anchor::Receive],
            facts: None,
        }
    }

    /// Replace the input anchors. Non-input anchors are dropped.
    pub fn with_inputs(mut self, inputs: impl IntoIterator<Item = Anchor>) -> Self {
        self.inputs = inputs.into_iter().filter(Anchor::is_receive).collect();
        self
    }

    pub fn with_facts(mut self, facts: ImageFacts) -> Self {
        self.facts = Some(facts);
        self
    }

    /// Canvas-space bounds.
    pub fn rect(&self) -> Rect {
        Rect::from_center_size(self.center, self.size)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    nodes: HashMap<NodeId, NodeRecord>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a node. Returns the previous record.
    pub fn insert(&mut self, id: NodeId, record: NodeRecord) -> Option<NodeRecord> {
        self.nodes.insert(id, record)
    }

    pub fn remove(&mut self, id: NodeId) -> Option<NodeRecord> {
        self.nodes.remove(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeRecord> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeRecord> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Move a node's center. No-op for unknown ids.
    pub fn move_to(&mut self, id: NodeId, center: Point) {
        if let Some(record) = self.nodes.get_mut(&id) {
            record.center = center;
        }
    }

    pub fn canvas_rect(&self, id: NodeId) -> Option<Rect> {
        self.nodes.get(&id).map(NodeRecord::rect)
    }

    /// All nodes of one kind.
    pub fn of_kind(&self, kind: NodeKind) -> impl Iterator<Item = (NodeId, &NodeRecord)> {
        self.nodes
            .iter()
            .filter(move |(_, r)| r.kind == kind)
            .map(|(id, r)| (*id, r))
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &NodeRecord)> {
        self.nodes.iter().map(|(id, r)| (*id, r))
    }
}

impl KindSource for NodeRegistry {
    fn container_kind(&self, id: NodeId) -> Option<NodeKind> {
        self.nodes.get(&id).map(|r| r.kind)
    }

    fn ancestor_kind(&self, id: NodeId) -> Option<NodeKind> {
        self.nodes.get(&id).and_then(|r| r.ancestor_kind)
    }

    fn anchor_kind(&self, id: NodeId) -> Option<NodeKind> {
        self.nodes.get(&id).and_then(|r| r.anchor_kind)
    }

    fn image_facts(&self, id: NodeId) -> Option<ImageFacts> {
        self.nodes.get(&id).and_then(|r| r.facts.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;

    #[test]
    fn records_expose_canvas_bounds() {
        let mut reg = NodeRegistry::new();
        let id = NodeId::intern("reg-video");
        reg.insert(
            id,
            NodeRecord::new(NodeKind::Video, Point::new(100.0, 50.0), Size::new(40.0, 20.0)),
        );
        assert_eq!(reg.canvas_rect(id), Some(Rect::new(80.0, 40.0, 120.0, 60.0)));

        reg.move_to(id, Point::new(0.0, 0.0));
        assert_eq!(reg.canvas_rect(id), Some(Rect::new(-20.0, -10.0, 20.0, 10.0)));
        assert_eq!(reg.canvas_rect(NodeId::intern("reg-missing")), None);
    }

    #[test]
    fn registry_is_a_kind_source() {
        let mut reg = NodeRegistry::new();
        let id = NodeId::intern("reg-erase");
        let mut record = NodeRecord::new(NodeKind::Unknown, Point::ORIGIN, Size::new(1.0, 1.0));
        record.ancestor_kind = Some(NodeKind::Erase);
        reg.insert(id, record);
        assert_eq!(classify(&reg, id), NodeKind::Erase);
        assert_eq!(reg.of_kind(NodeKind::Unknown).count(), 1);
    }

    #[test]
    fn inputs_keep_only_receive_anchors() {
        let record = NodeRecord::new(NodeKind::Storyboard, Point::ORIGIN, Size::new(10.0, 10.0))
            .with_inputs([Anchor::Receive, Anchor::Send, Anchor::slot("character")]);
        assert_eq!(
            record.inputs.as_slice(),
            &[Anchor::Receive, Anchor::slot("character")]
        );
    }
}
