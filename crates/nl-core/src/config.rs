//! Engine configuration.
//!
//! Every field has a default, so a host can pass `{}` or only the fields it
//! wants to change.

use crate::media::MediaPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid engine config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("`{field}` must be a positive number of pixels, got {value}")]
    Radius { field: &'static str, value: f64 },
    #[error("release_radius ({release}) must not be smaller than hover_radius ({hover})")]
    ReleaseInsideHover { release: f64, hover: f64 },
    #[error("settle_delay_ms must be within 100..=150, got {0}")]
    SettleDelay(u64),
}

/// Allowed release settle delays.
const SETTLE_RANGE_MS: std::ops::RangeInclusive<u64> = 100..=150;

/// Thresholds, delays and policy for the connection engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Screen distance within which a receive anchor becomes the hover
    /// candidate while dragging. Default: **60**.
    pub hover_radius: f64,

    /// Screen distance within which a pointer release still targets a
    /// receive anchor. Default: **100**.
    pub release_radius: f64,

    /// Radius used to pick the closest input of the drop node. Default: **150**.
    pub anchor_refine_radius: f64,

    /// Delay before re-resolving unresolved endpoint geometry. Default: **50 ms**.
    pub retry_delay_ms: u64,

    /// How many times geometry resolution is retried. Default: **1**.
    pub max_geometry_retries: u32,

    /// Delay that lets an anchor's own drop handler run before the release
    /// fallback commits. Default: **120 ms**.
    pub settle_delay_ms: u64,

    /// Media/generation heuristic for image → image links.
    pub media: MediaPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hover_radius: 60.0,
            release_radius: 100.0,
            anchor_refine_radius: 150.0,
            retry_delay_ms: 50,
            max_geometry_retries: 1,
            settle_delay_ms: 120,
            media: MediaPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config.
    ///
    /// # Errors
    /// Returns [`ConfigError`] on malformed JSON or out-of-range radii.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(text)?;
        config.validate()?;
        log::debug!(
            "engine config: hover {} px, release {} px, settle {} ms",
            config.hover_radius,
            config.release_radius,
            config.settle_delay_ms
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("hover_radius", self.hover_radius),
            ("release_radius", self.release_radius),
            ("anchor_refine_radius", self.anchor_refine_radius),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Radius { field, value });
            }
        }
        if self.release_radius < self.hover_radius {
            return Err(ConfigError::ReleaseInsideHover {
                release: self.release_radius,
                hover: self.hover_radius,
            });
        }
        if !SETTLE_RANGE_MS.contains(&self.settle_delay_ms) {
            return Err(ConfigError::SettleDelay(self.settle_delay_ms));
        }
        Ok(())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}
