//! Configuration and on-disk sources for the sprite catalog.
//!
//! This crate is the I/O edge in front of the pure classifier and
//! normalizer: it loads the [`CatalogConfig`], walks the sprite tree, and
//! reads sheet-definition files into a [`DefinitionSet`].
//!
//! # Quick start
//!
//! ```no_run
//! use sprite_catalog_source::{CatalogConfig, load_definitions, scan_tree};
//!
//! let config = CatalogConfig::load("catalog.yml").unwrap();
//! config.validate().unwrap();
//!
//! let files = scan_tree(&config.assets_dir).unwrap();
//! println!("{} files under {}", files.len(), config.assets_dir.display());
//!
//! let defs = load_definitions(&config.definitions_dir).unwrap();
//! println!("{} sheets, {} unparseable", defs.definitions.len(), defs.failed.len());
//! ```

mod config;
mod definitions;
mod error;
mod tree;

pub use config::{CatalogConfig, ListingConfig};
pub use definitions::{DefinitionSet, FailedDefinition, load_definitions};
pub use error::{Result, SourceError};
pub use tree::{list_dirs, list_paths, scan_tree, write_listing};
