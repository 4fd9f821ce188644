pub mod classify;
pub mod config;
pub mod geometry;
pub mod id;
pub mod media;
pub mod model;
pub mod registry;
pub mod rules;

pub use classify::{KindSource, classify};
pub use config::{ConfigError, EngineConfig};
pub use geometry::Viewport;
pub use id::{ConnectionId, NodeId};
pub use media::{AssetOrigin, ImageFacts, ImageRole, MediaPolicy};
pub use model::*;
pub use registry::{NodeRecord, NodeRegistry};
pub use rules::{LinkEnd, Rejection, Validator, is_allowed};

// Re-export kurbo geometry so downstream crates share one version.
pub use kurbo::{Point, Rect, Size, Vec2};
