//! Media vs. generation classification of image nodes.
//!
//! An image node either holds a finished asset (uploaded, picked from the
//! library, or produced by a finishing plugin) or is an in-progress
//! generation authored with a prompt. Finishing plugins take any image.
//! There is no ground truth for this split, so the heuristic is driven by
//! [`MediaPolicy`].

use crate::model::NodeKind;
use serde::{Deserialize, Serialize};

/// Where an image node's asset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetOrigin {
    /// Authored on the canvas (prompt and model chosen by the user).
    #[default]
    Authored,
    Uploaded,
    Library,
    /// Output of a finishing plugin (upscale, erase, ...).
    PluginOutput,
}

/// What the host knows about an image node's content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageFacts {
    pub origin: AssetOrigin,
    pub prompt: Option<String>,
    pub model: Option<String>,
    /// Whether the node already shows a produced asset.
    pub has_output: bool,
}

impl ImageFacts {
    pub fn uploaded() -> Self {
        Self {
            origin: AssetOrigin::Uploaded,
            has_output: true,
            ..Self::default()
        }
    }

    pub fn generation(prompt: &str) -> Self {
        Self {
            prompt: Some(prompt.to_string()),
            ..Self::default()
        }
    }

    pub fn with_output(mut self) -> Self {
        self.has_output = true;
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }

    fn has_prompt(&self) -> bool {
        self.prompt.as_deref().is_some_and(|p| !p.trim().is_empty())
    }
}

/// Role an image-like node plays in a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageRole {
    Media,
    Generation,
    PluginTarget,
}

/// Tunable heuristic for the image refinement rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaPolicy {
    /// Reject image → image links whose source is not media.
    pub reject_generation_source: bool,
    /// Reject media into a generation node that already has output.
    pub protect_produced_generation: bool,
    /// Model names (matched case-insensitively as substrings) that mark a
    /// node as a generation even without a prompt.
    pub generation_models: Vec<String>,
    /// Role assumed when the facts do not decide.
    pub unknown_role: ImageRole,
}

impl Default for MediaPolicy {
    fn default() -> Self {
        Self {
            reject_generation_source: true,
            protect_produced_generation: true,
            generation_models: [
                "flux",
                "seedream",
                "nano-banana",
                "imagen",
                "gpt-image",
                "qwen-image",
                "ideogram",
                "recraft",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            unknown_role: ImageRole::Generation,
        }
    }
}

impl MediaPolicy {
    fn is_generation_model(&self, model: &str) -> bool {
        let model = model.to_ascii_lowercase();
        self.generation_models
            .iter()
            .any(|m| !m.is_empty() && model.contains(&m.to_ascii_lowercase()))
    }

    /// Classify a node of `kind` with optional `facts`.
    pub fn classify(&self, kind: NodeKind, facts: Option<&ImageFacts>) -> ImageRole {
        if kind.is_finishing_plugin() {
            return ImageRole::PluginTarget;
        }
        let Some(facts) = facts else {
            return self.unknown_role;
        };
        if matches!(
            facts.origin,
            AssetOrigin::Uploaded | AssetOrigin::Library | AssetOrigin::PluginOutput
        ) {
            return ImageRole::Media;
        }
        if facts.has_prompt() {
            return ImageRole::Generation;
        }
        if facts.model.as_deref().is_some_and(|m| self.is_generation_model(m)) {
            return ImageRole::Generation;
        }
        if facts.has_output {
            return ImageRole::Media;
        }
        self.unknown_role
    }
}
