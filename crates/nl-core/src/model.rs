//! Core data model for the connection graph.
//!
//! Nodes are owned by the host canvas and only referenced here by id. This
//! module defines what the engine knows about them: their semantic kind,
//! the anchors connections attach to, and the connection records themselves.

use crate::id::{ConnectionId, NodeId};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ─── Node kinds ──────────────────────────────────────────────────────────

/// Semantic category of a canvas node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Text,
    Image,
    Video,
    Music,
    Upscale,
    MultiAngleCamera,
    RemoveBg,
    Erase,
    Expand,
    Vectorize,
    NextScene,
    Storyboard,
    #[default]
    Unknown,
}

impl NodeKind {
    /// Every kind, in declaration order.
    pub const ALL: [NodeKind; 13] = [
        NodeKind::Text,
        NodeKind::Image,
        NodeKind::Video,
        NodeKind::Music,
        NodeKind::Upscale,
        NodeKind::MultiAngleCamera,
        NodeKind::RemoveBg,
        NodeKind::Erase,
        NodeKind::Expand,
        NodeKind::Vectorize,
        NodeKind::NextScene,
        NodeKind::Storyboard,
        NodeKind::Unknown,
    ];

    /// The lowercase tag used on rendered node containers.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Text => "text",
            NodeKind::Image => "image",
            NodeKind::Video => "video",
            NodeKind::Music => "music",
            NodeKind::Upscale => "upscale",
            NodeKind::MultiAngleCamera => "multianglecamera",
            NodeKind::RemoveBg => "removebg",
            NodeKind::Erase => "erase",
            NodeKind::Expand => "expand",
            NodeKind::Vectorize => "vectorize",
            NodeKind::NextScene => "nextscene",
            NodeKind::Storyboard => "storyboard",
            NodeKind::Unknown => "unknown",
        }
    }

    /// Parse a kind tag. Case-insensitive; unrecognized tags yield `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(tag))
    }

    /// Single-purpose finishing plugins. These accept any image.
    pub fn is_finishing_plugin(self) -> bool {
        matches!(
            self,
            NodeKind::Upscale
                | NodeKind::MultiAngleCamera
                | NodeKind::RemoveBg
                | NodeKind::Erase
                | NodeKind::Expand
                | NodeKind::Vectorize
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Anchors ─────────────────────────────────────────────────────────────

/// Which side of a node an anchor sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchorSide {
    /// Output, drawn on the right edge.
    Send,
    /// Input, drawn on the left edge.
    Receive,
}

/// A named attachment point on a node.
///
/// Every node has exactly one `send` anchor and one or more inputs: either
/// the generic `receive` or named sub-anchors such as `receive-character`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Anchor {
    Send,
    Receive,
    /// `receive-<slot>`; holds the slot name only.
    ReceiveSlot(String),
}

impl Anchor {
    /// Build a named input anchor, e.g. `Anchor::slot("character")`.
    pub fn slot(name: &str) -> Self {
        Anchor::ReceiveSlot(name.to_string())
    }

    /// Parse an anchor name. Returns `None` for anything that is not
    /// `send`, `receive`, or `receive-<slot>`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "send" => Some(Anchor::Send),
            "receive" => Some(Anchor::Receive),
            _ => name
                .strip_prefix("receive-")
                .filter(|slot| !slot.is_empty())
                .map(|slot| Anchor::ReceiveSlot(slot.to_string())),
        }
    }

    pub fn side(&self) -> AnchorSide {
        match self {
            Anchor::Send => AnchorSide::Send,
            Anchor::Receive | Anchor::ReceiveSlot(_) => AnchorSide::Receive,
        }
    }

    pub fn is_receive(&self) -> bool {
        self.side() == AnchorSide::Receive
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anchor::Send => f.write_str("send"),
            Anchor::Receive => f.write_str("receive"),
            Anchor::ReceiveSlot(slot) => write!(f, "receive-{slot}"),
        }
    }
}

impl Serialize for Anchor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Anchor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Anchor::parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid anchor `{s}`")))
    }
}

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA`. The `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();

        let byte = |i: usize| -> Option<f32> {
            let v = hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?;
            Some(v as f32 / 255.0)
        };

        match bytes.len() {
            3 => {
                let r = hex_val(bytes[0])?;
                let g = hex_val(bytes[1])?;
                let b = hex_val(bytes[2])?;
                Some(Self::rgba(
                    (r * 17) as f32 / 255.0,
                    (g * 17) as f32 / 255.0,
                    (b * 17) as f32 / 255.0,
                    1.0,
                ))
            }
            6 => Some(Self::rgba(byte(0)?, byte(2)?, byte(4)?, 1.0)),
            8 => Some(Self::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    /// Emit `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        if c(self.a) == 255 {
            format!("#{:02X}{:02X}{:02X}", c(self.r), c(self.g), c(self.b))
        } else {
            format!(
                "#{:02X}{:02X}{:02X}{:02X}",
                c(self.r),
                c(self.g),
                c(self.b),
                c(self.a)
            )
        }
    }
}

impl Default for Color {
    /// Neutral slate used when a drag carries no explicit color.
    fn default() -> Self {
        Self::rgba(100.0 / 255.0, 116.0 / 255.0, 139.0 / 255.0, 1.0)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid color `{s}`")))
    }
}

// ─── Connections ─────────────────────────────────────────────────────────

/// A directed link from one node's `send` anchor to another node's input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub from: NodeId,
    pub to: NodeId,
    pub to_anchor: Anchor,
    pub color: Color,
}

impl Connection {
    /// Create a connection with a freshly minted id.
    pub fn new(from: NodeId, to: NodeId, to_anchor: Anchor, color: Color) -> Self {
        Self {
            id: ConnectionId::next(),
            from,
            to,
            to_anchor,
            color,
        }
    }

    /// Whether this connection links the same `(from, to, to_anchor)` triple.
    pub fn same_link(&self, from: NodeId, to: NodeId, to_anchor: &Anchor) -> bool {
        self.from == from && self.to == to && &self.to_anchor == to_anchor
    }

    pub fn touches(&self, node: NodeId) -> bool {
        self.from == node || self.to == node
    }
}
