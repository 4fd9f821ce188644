//! Link validation: which node kinds may connect to which.
//!
//! Validation runs in three layers, cheapest first:
//!
//! 1. id level: a node never links to itself;
//! 2. kind level: storyboard input rules, then the adjacency table;
//! 3. content level: the media/generation refinement for image → image.
//!
//! Everything here is pure and total. A rejection is a value, never a panic.

use crate::id::NodeId;
use crate::media::{ImageFacts, ImageRole, MediaPolicy};
use crate::model::{Anchor, NodeKind};
use thiserror::Error;

/// Targets every image-producing source may feed.
const IMAGE_TARGETS: &[NodeKind] = &[
    NodeKind::Image,
    NodeKind::Video,
    NodeKind::Upscale,
    NodeKind::MultiAngleCamera,
    NodeKind::RemoveBg,
    NodeKind::Erase,
    NodeKind::Expand,
    NodeKind::Vectorize,
    NodeKind::NextScene,
    NodeKind::Storyboard,
];

const TEXT_TARGETS: &[NodeKind] = &[NodeKind::Image, NodeKind::Music, NodeKind::Storyboard];

const VIDEO_ONLY: &[NodeKind] = &[NodeKind::Video];

/// Menu entries for a nextscene source. The storyboard rule refuses
/// nextscene on every storyboard input, so it is not offered.
const NEXTSCENE_MENU: &[NodeKind] = &[
    NodeKind::Image,
    NodeKind::Video,
    NodeKind::Upscale,
    NodeKind::MultiAngleCamera,
    NodeKind::RemoveBg,
    NodeKind::Erase,
    NodeKind::Expand,
    NodeKind::Vectorize,
    NodeKind::NextScene,
];

/// Storyboard slot filled by an image dropped from the creation menu.
pub const STORYBOARD_IMAGE_SLOT: &str = "character";

/// Why a link was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("a node cannot connect to itself")]
    SelfLoop,
    #[error("`{0}` is not an input anchor")]
    NotAnInput(Anchor),
    #[error("storyboard slot inputs accept images, not {0}")]
    StoryboardSlot(NodeKind),
    #[error("the storyboard prompt input accepts text, not {0}")]
    StoryboardPrompt(NodeKind),
    #[error("{from} cannot feed {to}")]
    NotInTable { from: NodeKind, to: NodeKind },
    #[error("only media images can feed another image")]
    GenerationSource,
    #[error("media would overwrite a produced generation")]
    ProducedGeneration,
}

/// Adjacency table: kinds a source may link to. Empty for kinds with no entry.
pub fn allowed_targets(from: NodeKind) -> &'static [NodeKind] {
    match from {
        NodeKind::Text => TEXT_TARGETS,
        NodeKind::Image | NodeKind::NextScene => IMAGE_TARGETS,
        NodeKind::Video | NodeKind::Music => VIDEO_ONLY,
        _ => &[],
    }
}

/// Kind-level rules (storyboard inputs, then the adjacency table).
pub fn check_kinds(from: NodeKind, to: NodeKind, to_anchor: &Anchor) -> Result<(), Rejection> {
    if !to_anchor.is_receive() {
        return Err(Rejection::NotAnInput(to_anchor.clone()));
    }

    if to == NodeKind::Storyboard {
        return match (to_anchor, from) {
            (Anchor::ReceiveSlot(_), NodeKind::Image) => Ok(()),
            (Anchor::ReceiveSlot(_), other) => Err(Rejection::StoryboardSlot(other)),
            (_, NodeKind::Text) => Ok(()),
            (_, other) => Err(Rejection::StoryboardPrompt(other)),
        };
    }

    if allowed_targets(from).contains(&to) {
        Ok(())
    } else {
        Err(Rejection::NotInTable { from, to })
    }
}

/// Whether a `from_kind` node may link into `to_anchor` of a `to_kind` node.
pub fn is_allowed(from_kind: NodeKind, to_kind: NodeKind, to_anchor: &Anchor) -> bool {
    check_kinds(from_kind, to_kind, to_anchor).is_ok()
}

/// One end of a proposed link.
#[derive(Debug, Clone, Copy)]
pub struct LinkEnd<'a> {
    pub id: NodeId,
    pub kind: NodeKind,
    pub facts: Option<&'a ImageFacts>,
}

impl<'a> LinkEnd<'a> {
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            facts: None,
        }
    }

    pub fn with_facts(mut self, facts: Option<&'a ImageFacts>) -> Self {
        self.facts = facts;
        self
    }
}

/// Full validator: id, kind and content rules under a [`MediaPolicy`].
#[derive(Debug, Clone, Default)]
pub struct Validator {
    pub policy: MediaPolicy,
}

impl Validator {
    pub fn new(policy: MediaPolicy) -> Self {
        Self { policy }
    }

    pub fn validate(
        &self,
        from: &LinkEnd<'_>,
        to: &LinkEnd<'_>,
        to_anchor: &Anchor,
    ) -> Result<(), Rejection> {
        if from.id == to.id {
            return Err(Rejection::SelfLoop);
        }
        check_kinds(from.kind, to.kind, to_anchor)?;
        if from.kind == NodeKind::Image && to.kind == NodeKind::Image {
            self.check_images(from, to)?;
        }
        Ok(())
    }

    pub fn allows(&self, from: &LinkEnd<'_>, to: &LinkEnd<'_>, to_anchor: &Anchor) -> bool {
        self.validate(from, to, to_anchor).is_ok()
    }

    fn check_images(&self, from: &LinkEnd<'_>, to: &LinkEnd<'_>) -> Result<(), Rejection> {
        let source = self.policy.classify(from.kind, from.facts);
        let target = self.policy.classify(to.kind, to.facts);
        if target == ImageRole::PluginTarget {
            return Ok(());
        }
        if self.policy.reject_generation_source && source != ImageRole::Media {
            return Err(Rejection::GenerationSource);
        }
        let target_has_output = to.facts.is_some_and(|f| f.has_output);
        if self.policy.protect_produced_generation
            && source == ImageRole::Media
            && target == ImageRole::Generation
            && target_has_output
        {
            return Err(Rejection::ProducedGeneration);
        }
        Ok(())
    }
}

// ─── Creation menu table ─────────────────────────────────────────────────

/// Kinds offered in the creation menu for a drag from `source`.
///
/// Keyed by source kind alone; anchors and image roles play no part.
pub fn menu_targets(source: NodeKind) -> &'static [NodeKind] {
    match source {
        NodeKind::Text => TEXT_TARGETS,
        NodeKind::Image => IMAGE_TARGETS,
        NodeKind::NextScene => NEXTSCENE_MENU,
        NodeKind::Video | NodeKind::Music => VIDEO_ONLY,
        _ => &[],
    }
}

/// Input anchor used when the menu creates a `target` for a `source`.
pub fn menu_anchor(source: NodeKind, target: NodeKind) -> Anchor {
    match (source, target) {
        (NodeKind::Image, NodeKind::Storyboard) => Anchor::slot(STORYBOARD_IMAGE_SLOT),
        _ => Anchor::Receive,
    }
}
