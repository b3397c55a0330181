//! Catalog configuration.
//!
//! Every field has a default, so an empty file (or no file at all) yields
//! the stock configuration. Vocabularies are supplied here rather than
//! derived from scanned data.
//!
//! # Example YAML
//!
//! ```yaml
//! database: lpc_character_generator.sqlite
//! table_prefix: lpc_
//! assets_dir: spritesheets
//! definitions_dir: sheet_definitions
//! image_extension: png
//! progress_interval: 500
//! file_batch_size: 1000
//! vocabulary:
//!   layers: [body, feet, legs, torso, head, hair, helmet, cloak, weapon, shield]
//!   animations:
//!     - { name: walk, direction_count: 4, frame_count: 9 }
//!     - { name: hurt, direction_count: 1, frame_count: 6 }
//! listing:
//!   roots: [spritesheets, sheet_definitions]
//!   paths_output: spritesheet_paths.txt
//!   dirs_output: spritesheet_dirs.txt
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sprite_catalog_core::Vocabulary;

use crate::error::{Result, SourceError};

/// Settings for the path-listing utilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Directories to list; missing ones are skipped with a warning.
    pub roots: Vec<PathBuf>,
    /// Output file for `list-paths`.
    pub paths_output: PathBuf,
    /// Output file for `list-dirs`.
    pub dirs_output: PathBuf,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            roots: vec![
                PathBuf::from("spritesheets"),
                PathBuf::from("sheet_definitions"),
            ],
            paths_output: PathBuf::from("spritesheet_paths.txt"),
            dirs_output: PathBuf::from("spritesheet_dirs.txt"),
        }
    }
}

/// Top-level catalog configuration.
///
/// # Examples
///
/// ```
/// use sprite_catalog_source::CatalogConfig;
///
/// let config: CatalogConfig = serde_yaml::from_str("table_prefix: test_").unwrap();
/// assert_eq!(config.table_prefix, "test_");
/// assert_eq!(config.image_extension, "png");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// SQLite database file.
    pub database: PathBuf,
    /// Prefix applied to every catalog table, index, and view.
    pub table_prefix: String,
    /// Root of the sprite image tree.
    pub assets_dir: PathBuf,
    /// Directory of sheet-definition JSON files.
    pub definitions_dir: PathBuf,
    /// Image extension without the dot.
    pub image_extension: String,
    /// Log progress every this many files (0 disables).
    pub progress_interval: usize,
    /// Rows per transaction when linking image files to sheets.
    pub file_batch_size: usize,
    pub vocabulary: Vocabulary,
    pub listing: ListingConfig,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("lpc_character_generator.sqlite"),
            table_prefix: "lpc_".to_string(),
            assets_dir: PathBuf::from("spritesheets"),
            definitions_dir: PathBuf::from("sheet_definitions"),
            image_extension: "png".to_string(),
            progress_interval: 500,
            file_batch_size: 1000,
            vocabulary: Vocabulary::default(),
            listing: ListingConfig::default(),
        }
    }
}

impl CatalogConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](SourceError::IoError) if the file cannot be read,
    /// or [`YamlError`](SourceError::YamlError) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Rejects configurations that would make a run meaningless.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidVocabulary`] when the vocabulary fails
    /// [`Vocabulary::validate`], or [`SourceError::InvalidConfig`] for an
    /// empty extension or a zero batch size.
    pub fn validate(&self) -> Result<()> {
        let errors = self.vocabulary.validate();
        if !errors.is_empty() {
            return Err(SourceError::InvalidVocabulary(errors));
        }
        let extension = self.image_extension.trim_start_matches('.');
        if extension.is_empty() {
            return Err(SourceError::InvalidConfig(
                "image_extension cannot be empty".to_string(),
            ));
        }
        if self.file_batch_size == 0 {
            return Err(SourceError::InvalidConfig(
                "file_batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The image extension with any leading dot removed.
    pub fn extension(&self) -> &str {
        self.image_extension.trim_start_matches('.')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
database: catalog.db
table_prefix: sprites_
assets_dir: art/spritesheets
image_extension: .png
progress_interval: 10
vocabulary:
  layers: [body, torso, weapon]
  animations:
    - { name: walk, direction_count: 4, frame_count: 9 }
    - { name: hurt, direction_count: 1, frame_count: 6 }
"#
    }

    #[test]
    fn test_deserialize_partial_keeps_defaults() {
        let config: CatalogConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.database, PathBuf::from("catalog.db"));
        assert_eq!(config.table_prefix, "sprites_");
        assert_eq!(config.assets_dir, PathBuf::from("art/spritesheets"));
        assert_eq!(config.definitions_dir, PathBuf::from("sheet_definitions"));
        assert_eq!(config.progress_interval, 10);
        assert_eq!(config.file_batch_size, 1000);
        assert_eq!(config.vocabulary.layers, vec!["body", "torso", "weapon"]);
        assert_eq!(config.vocabulary.animations.len(), 2);
        assert_eq!(config.listing.roots.len(), 2);
    }

    #[test]
    fn test_extension_strips_leading_dot() {
        let config: CatalogConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.extension(), "png");
    }

    #[test]
    fn test_defaults_validate() {
        assert!(CatalogConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_duplicate_layers() {
        let mut config = CatalogConfig::default();
        config.vocabulary.layers.push("body".to_string());
        assert!(matches!(
            config.validate(),
            Err(SourceError::InvalidVocabulary(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let config = CatalogConfig {
            file_batch_size: 0,
            ..CatalogConfig::default()
        };
        assert!(matches!(config.validate(), Err(SourceError::InvalidConfig(_))));
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.yml");

        let original: CatalogConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        original.save(&path).unwrap();

        let loaded = CatalogConfig::load(&path).unwrap();
        assert_eq!(loaded.table_prefix, original.table_prefix);
        assert_eq!(loaded.vocabulary, original.vocabulary);
        assert_eq!(loaded.progress_interval, original.progress_interval);
    }
}
