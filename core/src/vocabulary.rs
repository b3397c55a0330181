//! Fixed reference vocabularies.
//!
//! The layer list is ordered: its order is both the classifier's tie-break
//! and the render order written to the catalog. The animation list carries
//! the direction and frame counts seeded into the `animations` table.
//!
//! # Examples
//!
//! ```
//! use sprite_catalog_core::Vocabulary;
//!
//! let vocab = Vocabulary::default();
//! assert!(vocab.validate().is_empty());
//! assert_eq!(vocab.render_order("body"), Some(0));
//! assert_eq!(vocab.render_order("torso"), Some(3));
//! assert_eq!(vocab.render_order("tail"), None);
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default layer order, lowest drawn first.
pub const DEFAULT_LAYER_ORDER: &[&str] = &[
    "body", "feet", "legs", "torso", "head", "hair", "helmet", "cloak", "weapon", "shield",
];

/// Default animations as `(name, direction_count, frame_count)`.
pub const DEFAULT_ANIMATIONS: &[(&str, u32, u32)] = &[
    ("walk", 4, 9),
    ("thrust", 4, 8),
    ("shoot", 4, 13),
    ("cast", 4, 7),
    ("slash", 4, 6),
    ("spellcast", 4, 7),
    ("hurt", 1, 6),
];

/// A named motion cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationSpec {
    pub name: String,
    /// Number of facing directions rendered.
    pub direction_count: u32,
    /// Frames per direction cycle.
    pub frame_count: u32,
}

impl AnimationSpec {
    pub fn new(name: impl Into<String>, direction_count: u32, frame_count: u32) -> Self {
        Self {
            name: name.into(),
            direction_count,
            frame_count,
        }
    }
}

/// Layer and animation vocabularies.
///
/// A partially specified vocabulary keeps the default for the missing half.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    /// Layer keywords in render order.
    pub layers: Vec<String>,
    /// Animation keywords in match order.
    pub animations: Vec<AnimationSpec>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            layers: DEFAULT_LAYER_ORDER.iter().map(|s| s.to_string()).collect(),
            animations: DEFAULT_ANIMATIONS
                .iter()
                .map(|&(name, dirs, frames)| AnimationSpec::new(name, dirs, frames))
                .collect(),
        }
    }
}

/// Vocabulary validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VocabularyError {
    #[error("layer vocabulary cannot be empty")]
    EmptyLayers,
    #[error("vocabulary keywords cannot be empty")]
    EmptyKeyword,
    /// The same layer appears twice, so render order would not be total.
    #[error("duplicate layer keyword: {0}")]
    DuplicateLayer(String),
    #[error("duplicate animation keyword: {0}")]
    DuplicateAnimation(String),
    #[error("animation '{0}' must have non-zero direction and frame counts")]
    ZeroCount(String),
}

impl Vocabulary {
    /// Returns the 0-based render order of a layer, or `None` when the name
    /// is not in the vocabulary.
    pub fn render_order(&self, layer: &str) -> Option<i64> {
        self.layers
            .iter()
            .position(|l| l == layer)
            .map(|pos| pos as i64)
    }

    /// Looks up an animation by name.
    pub fn animation(&self, name: &str) -> Option<&AnimationSpec> {
        self.animations.iter().find(|a| a.name == name)
    }

    /// Checks that the vocabulary defines a total layer order and usable
    /// animation counts. Keywords are compared case-insensitively because
    /// classification is case-insensitive.
    pub fn validate(&self) -> Vec<VocabularyError> {
        let mut errors = Vec::new();

        if self.layers.is_empty() {
            errors.push(VocabularyError::EmptyLayers);
        }

        let mut seen = HashSet::new();
        for layer in &self.layers {
            if layer.trim().is_empty() {
                errors.push(VocabularyError::EmptyKeyword);
            } else if !seen.insert(layer.to_lowercase()) {
                errors.push(VocabularyError::DuplicateLayer(layer.clone()));
            }
        }

        let mut seen = HashSet::new();
        for anim in &self.animations {
            if anim.name.trim().is_empty() {
                errors.push(VocabularyError::EmptyKeyword);
                continue;
            }
            if !seen.insert(anim.name.to_lowercase()) {
                errors.push(VocabularyError::DuplicateAnimation(anim.name.clone()));
            }
            if anim.direction_count == 0 || anim.frame_count == 0 {
                errors.push(VocabularyError::ZeroCount(anim.name.clone()));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_order_strictly_increases_with_position() {
        let vocab = Vocabulary::default();
        let orders: Vec<i64> = vocab
            .layers
            .iter()
            .map(|l| vocab.render_order(l).unwrap())
            .collect();
        assert!(orders.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(orders.len(), DEFAULT_LAYER_ORDER.len());
    }

    #[test]
    fn test_default_animation_counts() {
        let vocab = Vocabulary::default();
        assert_eq!(vocab.animation("walk"), Some(&AnimationSpec::new("walk", 4, 9)));
        assert_eq!(vocab.animation("hurt").unwrap().direction_count, 1);
        assert!(vocab.animation("jump").is_none());
    }

    #[test]
    fn test_validate_rejects_duplicate_layer_case_insensitive() {
        let mut vocab = Vocabulary::default();
        vocab.layers.push("Torso".to_string());
        assert_eq!(
            vocab.validate(),
            vec![VocabularyError::DuplicateLayer("Torso".to_string())]
        );
    }

    #[test]
    fn test_validate_rejects_empty_layers_and_zero_counts() {
        let vocab = Vocabulary {
            layers: Vec::new(),
            animations: vec![AnimationSpec::new("idle", 0, 1)],
        };
        let errors = vocab.validate();
        assert!(errors.contains(&VocabularyError::EmptyLayers));
        assert!(errors.contains(&VocabularyError::ZeroCount("idle".to_string())));
    }
}
