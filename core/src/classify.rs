//! Path classification against the layer and animation vocabularies.
//!
//! Matching is a case-insensitive substring search over the whole relative
//! path:
//!
//! - **layer**: the first keyword *in vocabulary order* that occurs anywhere
//!   in the path. The vocabulary order is the tie-break, so a path containing
//!   both `legs` and `torso` resolves to whichever is listed first.
//! - **animation**: the first animation keyword, in vocabulary iteration
//!   order, that occurs in the path. Callers must not rely on which one wins
//!   when several occur.
//!
//! Paths that miss either vocabulary are dropped without error.
//!
//! # Examples
//!
//! ```
//! use sprite_catalog_core::{PathClassifier, Vocabulary};
//!
//! let vocab = Vocabulary::default();
//! let classifier = PathClassifier::new(&vocab);
//!
//! let c = classifier.classify("male/torso/walk/leather.png");
//! assert_eq!(c.layer, Some("torso"));
//! assert_eq!(c.animation, Some("walk"));
//!
//! let asset = classifier.classify_file("male/torso/walk/leather.png", "png").unwrap();
//! assert_eq!(asset.name, "leather");
//! assert!(classifier.classify_file("male/torso/walk/readme.txt", "png").is_none());
//! ```

use crate::types::{ClassifiedAsset, Gender};
use crate::vocabulary::Vocabulary;

/// Result of classifying one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification<'a> {
    pub layer: Option<&'a str>,
    pub animation: Option<&'a str>,
}

impl Classification<'_> {
    /// Returns `true` when both a layer and an animation were found.
    pub fn is_complete(&self) -> bool {
        self.layer.is_some() && self.animation.is_some()
    }
}

/// Keyword matcher built once from a [`Vocabulary`].
#[derive(Debug, Clone)]
pub struct PathClassifier {
    /// `(keyword as configured, lowercased keyword)` in vocabulary order.
    layers: Vec<(String, String)>,
    animations: Vec<(String, String)>,
}

impl PathClassifier {
    pub fn new(vocabulary: &Vocabulary) -> Self {
        Self {
            layers: vocabulary
                .layers
                .iter()
                .map(|l| (l.clone(), l.to_lowercase()))
                .collect(),
            animations: vocabulary
                .animations
                .iter()
                .map(|a| (a.name.clone(), a.name.to_lowercase()))
                .collect(),
        }
    }

    /// Classifies a relative path. Backslashes are treated as separators.
    pub fn classify(&self, rel_path: &str) -> Classification<'_> {
        let lowered = normalize_path(rel_path).to_lowercase();

        let layer = first_match(&self.layers, &lowered);
        let animation = first_match(&self.animations, &lowered);

        Classification { layer, animation }
    }

    /// Classifies an image file, returning `None` for files without the
    /// expected extension and for classification misses.
    ///
    /// The extension check is a case-sensitive suffix test on `.{extension}`
    /// and runs before any keyword matching.
    pub fn classify_file(&self, rel_path: &str, extension: &str) -> Option<ClassifiedAsset> {
        let file_path = normalize_path(rel_path);
        let file_name = file_path.rsplit('/').next().unwrap_or(&file_path);
        // A bare ".png" has no stem to strip and keeps its whole name.
        let name = match file_name.strip_suffix(&format!(".{extension}"))? {
            "" => file_name,
            stem => stem,
        };

        let classification = self.classify(&file_path);
        let (Some(layer), Some(animation)) = (classification.layer, classification.animation)
        else {
            return None;
        };

        Some(ClassifiedAsset {
            name: name.to_string(),
            layer: layer.to_string(),
            animation: animation.to_string(),
            gender: Gender::infer(&file_path),
            file_path,
        })
    }
}

fn first_match<'a>(keywords: &'a [(String, String)], haystack: &str) -> Option<&'a str> {
    keywords
        .iter()
        .find(|(_, lowered)| haystack.contains(lowered.as_str()))
        .map(|(keyword, _)| keyword.as_str())
}

/// Converts Windows separators to forward slashes.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}
