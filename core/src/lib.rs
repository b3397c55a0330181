//! Core types for cataloging a sprite-asset tree.
//!
//! This crate holds the pure, in-memory half of the catalog pipeline:
//!
//! - [`Vocabulary`]: the ordered layer list and the animation table that
//!   drive both classification and seeding.
//! - [`PathClassifier`]: maps a relative image path to a
//!   `(layer, animation)` pair by keyword matching.
//! - [`normalize_definition`]: maps a parsed sheet-definition JSON tree to
//!   a [`SheetDefinition`], which [`SheetDefinition::flatten`] expands into
//!   flat [`CharacterLayerRecord`]s.
//!
//! Nothing here touches the filesystem or the store.
//!
//! # Example
//!
//! ```
//! use sprite_catalog_core::*;
//!
//! let vocab = Vocabulary::default();
//! let classifier = PathClassifier::new(&vocab);
//!
//! let asset = classifier
//!     .classify_file("male/torso/walk/leather.png", "png")
//!     .unwrap();
//! assert_eq!(asset.layer, "torso");
//! assert_eq!(asset.animation, "walk");
//! assert_eq!(asset.gender, Gender::Male);
//! ```

mod classify;
mod normalize;
mod types;
mod vocabulary;

pub use classify::{Classification, PathClassifier, normalize_path};
pub use normalize::{DEFAULT_VARIANT, join_variant_path, normalize_definition};
pub use types::*;
pub use vocabulary::{
    AnimationSpec, DEFAULT_ANIMATIONS, DEFAULT_LAYER_ORDER, Vocabulary, VocabularyError,
};
