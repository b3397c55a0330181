//! Catalog writer: deduplicated, transactional persistence.
//!
//! [`CatalogWriter`] drives one run through the phases in [`RunPhase`].
//! Records are deduplicated in memory first, then written in transactions
//! ordered so that every cross-reference is inserted only after its parent
//! rows are committed and their ids read back from the store.
//!
//! Row-level failures (a foreign key that does not resolve, a constraint that
//! `INSERT OR IGNORE` does not absorb) are logged, counted, and skipped. Any
//! other store error rolls back the current transaction and ends the run;
//! transactions that already committed stay committed.
//!
//! # Example
//!
//! ```
//! use rusqlite::Connection;
//! use sprite_catalog_core::{PathClassifier, Vocabulary};
//! use sprite_catalog_sqlite::{CatalogWriter, SqliteStore};
//!
//! let vocabulary = Vocabulary::default();
//! let classifier = PathClassifier::new(&vocabulary);
//! let store = SqliteStore::new(Connection::open_in_memory().unwrap(), "lpc_").unwrap();
//!
//! let mut writer = CatalogWriter::new(&store);
//! writer.ensure_schema(&vocabulary).unwrap();
//!
//! let paths = ["male/torso/walk/leather.png", "readme.txt"];
//! let batch = writer.scan(&classifier, paths, "png", 0);
//! let report = writer.write_assets(&batch).unwrap();
//!
//! assert_eq!(report.assets.inserted, 1);
//! assert_eq!(report.links.inserted, 1);
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;

use regex::Regex;
use sprite_catalog_core::{ClassifiedAsset, PathClassifier, SheetDefinition, Vocabulary};
use tracing::{debug, info, warn};

use crate::error::{Result, SqliteError};
use crate::migration::VocabularyReport;
use crate::store::{CatalogStore, Entity, Upsert, VocabularyTable};

/// Phase of a writer run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Init,
    SchemaReady,
    /// Accumulating classified records in memory.
    Scanning,
    /// Writing parent rows.
    WritingEntities,
    /// Reading committed ids back from the store.
    ResolvingIds,
    /// Writing rows that reference resolved ids.
    WritingLinks,
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Init => "init",
            RunPhase::SchemaReady => "schema_ready",
            RunPhase::Scanning => "scanning",
            RunPhase::WritingEntities => "writing_entities",
            RunPhase::ResolvingIds => "resolving_ids",
            RunPhase::WritingLinks => "writing_links",
            RunPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Per-table write outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteCount {
    pub inserted: usize,
    pub already_present: usize,
    pub failed: usize,
}

impl WriteCount {
    pub fn total(&self) -> usize {
        self.inserted + self.already_present + self.failed
    }
}

/// Result of [`CatalogWriter::write_assets`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Paths offered to the scanner.
    pub files_seen: usize,
    /// Paths with the wrong extension or no layer/animation match.
    pub dropped: usize,
    pub assets: WriteCount,
    pub links: WriteCount,
}

/// Result of [`CatalogWriter::write_definitions`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub definitions: usize,
    /// Definitions whose `(name, type_name)` repeated an earlier one.
    pub duplicates: usize,
    pub sheets: WriteCount,
    pub layers: WriteCount,
    pub variants: WriteCount,
    pub sheet_animations: WriteCount,
    pub layer_paths: WriteCount,
}

/// Result of [`CatalogWriter::link_sheet_files`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileLinkReport {
    pub files_seen: usize,
    /// Image files whose path named a known sheet type.
    pub matched: usize,
    pub batches: usize,
    pub files: WriteCount,
}

/// Classified assets and their animation links, deduplicated.
///
/// Assets are keyed on `(name, file_path)`, links on
/// `(name, file_path, animation)`. Insertion order is preserved.
#[derive(Debug, Default)]
pub struct AssetBatch {
    assets: Vec<ClassifiedAsset>,
    asset_keys: HashSet<(String, String)>,
    links: Vec<(String, String, String)>,
    link_keys: HashSet<(String, String, String)>,
    files_seen: usize,
    dropped: usize,
}

impl AssetBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an asset, returning `false` if it was already present.
    pub fn push(&mut self, asset: ClassifiedAsset) -> bool {
        let link = (
            asset.name.clone(),
            asset.file_path.clone(),
            asset.animation.clone(),
        );
        if self.link_keys.insert(link.clone()) {
            self.links.push(link);
        }

        let key = (asset.name.clone(), asset.file_path.clone());
        if self.asset_keys.insert(key) {
            self.assets.push(asset);
            true
        } else {
            false
        }
    }

    pub fn assets(&self) -> &[ClassifiedAsset] {
        &self.assets
    }

    /// `(name, file_path, animation)` triples.
    pub fn links(&self) -> &[(String, String, String)] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn files_seen(&self) -> usize {
        self.files_seen
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

/// Writes classified assets and sheet definitions into a [`CatalogStore`].
pub struct CatalogWriter<'s, S: CatalogStore> {
    store: &'s S,
    phase: RunPhase,
    schema_ready: bool,
}

impl<'s, S: CatalogStore> CatalogWriter<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            phase: RunPhase::Init,
            schema_ready: false,
        }
    }

    /// Current phase of the run.
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Creates missing tables and seeds the vocabulary.
    pub fn ensure_schema(&mut self, vocabulary: &Vocabulary) -> Result<VocabularyReport> {
        let report = self.store.ensure_schema(vocabulary)?;
        self.schema_ready = true;
        self.enter(RunPhase::SchemaReady);
        Ok(report)
    }

    /// Classifies `paths` into a deduplicated batch.
    ///
    /// Logs progress every `progress_interval` paths; `0` disables it.
    pub fn scan<I, P>(
        &mut self,
        classifier: &PathClassifier,
        paths: I,
        extension: &str,
        progress_interval: usize,
    ) -> AssetBatch
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        self.enter(RunPhase::Scanning);
        let mut batch = AssetBatch::new();

        for path in paths {
            batch.files_seen += 1;
            match classifier.classify_file(path.as_ref(), extension) {
                Some(asset) => {
                    batch.push(asset);
                }
                None => batch.dropped += 1,
            }
            if progress_interval > 0 && batch.files_seen % progress_interval == 0 {
                info!(
                    processed = batch.files_seen,
                    assets = batch.len(),
                    "Scanning files"
                );
            }
        }

        info!(
            files = batch.files_seen,
            assets = batch.len(),
            dropped = batch.dropped,
            "Scan complete"
        );
        batch
    }

    /// Writes a scanned batch: assets in one transaction, then their
    /// animation links in a second one.
    pub fn write_assets(&mut self, batch: &AssetBatch) -> Result<ScanReport> {
        self.require_schema()?;
        let mut report = ScanReport {
            files_seen: batch.files_seen,
            dropped: batch.dropped,
            ..ScanReport::default()
        };

        self.enter(RunPhase::WritingEntities);
        let layer_ids = self.store.name_ids(VocabularyTable::RenderLayers)?;
        self.store.within_transaction(|store| {
            for asset in batch.assets() {
                let outcome = match layer_ids.get(&asset.layer) {
                    Some(&layer_id) => store.upsert(&Entity::Asset {
                        name: &asset.name,
                        layer_id,
                        gender: asset.gender,
                        file_path: &asset.file_path,
                    }),
                    None => Err(unresolved("render layer", &asset.layer)),
                };
                record(outcome, &mut report.assets, "asset", &asset.file_path)?;
            }
            Ok(())
        })?;

        self.enter(RunPhase::ResolvingIds);
        let asset_ids = self.store.asset_ids()?;
        let animation_ids = self.store.name_ids(VocabularyTable::Animations)?;

        self.enter(RunPhase::WritingLinks);
        self.store.within_transaction(|store| {
            for (name, file_path, animation) in batch.links() {
                let outcome = match (
                    asset_ids.get(&(name.clone(), file_path.clone())),
                    animation_ids.get(animation),
                ) {
                    (Some(&asset_id), Some(&animation_id)) => store.upsert(&Entity::AssetAnimation {
                        asset_id,
                        animation_id,
                        frame_path_template: file_path,
                    }),
                    (None, _) => Err(unresolved("asset", file_path)),
                    (_, None) => Err(unresolved("animation", animation)),
                };
                record(outcome, &mut report.links, "asset_animation", file_path)?;
            }
            Ok(())
        })?;

        self.enter(RunPhase::Done);
        info!(
            assets_inserted = report.assets.inserted,
            assets_present = report.assets.already_present,
            links_inserted = report.links.inserted,
            failed = report.assets.failed + report.links.failed,
            "Assets written"
        );
        Ok(report)
    }

    /// Writes sheet definitions.
    ///
    /// Sheets go in first; layers, variants, and sheet animations reference
    /// the read-back sheet ids; layer paths reference the read-back layer
    /// ids. Each step is its own transaction.
    pub fn write_definitions(&mut self, definitions: &[SheetDefinition]) -> Result<ImportReport> {
        self.require_schema()?;
        let mut report = ImportReport {
            definitions: definitions.len(),
            ..ImportReport::default()
        };

        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(definitions.len());
        for def in definitions {
            if seen.insert((def.name.as_str(), def.type_name.as_str())) {
                unique.push(def);
            } else {
                debug!(name = %def.name, type_name = %def.type_name, "Duplicate sheet definition");
                report.duplicates += 1;
            }
        }

        self.enter(RunPhase::WritingEntities);
        self.store.within_transaction(|store| {
            for def in &unique {
                let outcome = store.upsert(&Entity::Sheet {
                    name: &def.name,
                    type_name: &def.type_name,
                    match_body_color: def.match_body_color,
                });
                record(outcome, &mut report.sheets, "sheet", &def.type_name)?;
            }
            Ok(())
        })?;

        self.enter(RunPhase::ResolvingIds);
        let sheet_ids = self.store.sheet_ids()?;
        let animation_ids = self.store.name_ids(VocabularyTable::Animations)?;
        let resolved: Vec<(i64, &SheetDefinition)> = unique
            .iter()
            .filter_map(|def| {
                let id = sheet_ids.get(&(def.name.clone(), def.type_name.clone()));
                if id.is_none() {
                    warn!(name = %def.name, type_name = %def.type_name, "Sheet not found, skipping its rows");
                }
                id.map(|&id| (id, *def))
            })
            .collect();

        self.enter(RunPhase::WritingLinks);
        self.store.within_transaction(|store| {
            for &(sheet_id, def) in &resolved {
                for layer in &def.layers {
                    let outcome = store.upsert(&Entity::Layer {
                        sheet_id,
                        layer_name: &layer.name,
                        z_position: layer.z_position,
                    });
                    record(outcome, &mut report.layers, "layer", &layer.name)?;
                }
                for variant in &def.variants {
                    let outcome = store.upsert(&Entity::Variant {
                        sheet_id,
                        variant_name: variant,
                    });
                    record(outcome, &mut report.variants, "variant", variant)?;
                }
                for animation in &def.animations {
                    let outcome = store.upsert(&Entity::SheetAnimation {
                        sheet_id,
                        animation_name: animation,
                        animation_id: animation_ids.get(animation).copied(),
                    });
                    record(outcome, &mut report.sheet_animations, "sheet_animation", animation)?;
                }
            }
            Ok(())
        })?;

        self.enter(RunPhase::ResolvingIds);
        let layer_ids = self.store.layer_ids()?;

        self.enter(RunPhase::WritingLinks);
        self.store.within_transaction(|store| {
            for &(sheet_id, def) in &resolved {
                for layer in &def.layers {
                    let layer_id = layer_ids.get(&(sheet_id, layer.name.clone())).copied();
                    for path in &layer.paths {
                        let outcome = match layer_id {
                            Some(layer_id) => store.upsert(&Entity::LayerPath {
                                layer_id,
                                path_type: &path.path_type,
                                path_value: &path.path_value,
                            }),
                            None => Err(unresolved("layer", &layer.name)),
                        };
                        record(outcome, &mut report.layer_paths, "layer_path", &path.path_value)?;
                    }
                }
            }
            Ok(())
        })?;

        self.enter(RunPhase::Done);
        info!(
            definitions = report.definitions,
            sheets_inserted = report.sheets.inserted,
            layers_inserted = report.layers.inserted,
            layer_paths_inserted = report.layer_paths.inserted,
            "Definitions written"
        );
        Ok(report)
    }

    /// Attributes image files to sheets by the `type_name` appearing as a
    /// directory (or final) segment of their path.
    ///
    /// Each chunk of `batch_size` files is written in its own transaction.
    /// When several sheets share a `type_name`, the lowest `sheet_id` wins.
    pub fn link_sheet_files<I, P>(
        &mut self,
        paths: I,
        extension: &str,
        batch_size: usize,
    ) -> Result<FileLinkReport>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        self.require_schema()?;
        let mut report = FileLinkReport::default();

        self.enter(RunPhase::ResolvingIds);
        let mut by_type: HashMap<String, i64> = HashMap::new();
        for (sheet_id, type_name) in self.store.sheet_types()? {
            by_type.entry(type_name).or_insert(sheet_id);
        }

        let Some(pattern) = sheet_type_pattern(by_type.keys())? else {
            info!("No sheets in catalog, nothing to link");
            self.enter(RunPhase::Done);
            return Ok(report);
        };

        let suffix = format!(".{extension}");
        let mut matches = Vec::new();
        for path in paths {
            let path = path.as_ref();
            if !path.ends_with(&suffix) {
                continue;
            }
            report.files_seen += 1;
            let sheet_id = pattern
                .captures(path)
                .and_then(|caps| caps.get(1))
                .and_then(|m| by_type.get(m.as_str()));
            if let Some(&sheet_id) = sheet_id {
                matches.push((sheet_id, path.to_string()));
            }
        }
        report.matched = matches.len();

        self.enter(RunPhase::WritingLinks);
        for chunk in matches.chunks(batch_size.max(1)) {
            self.store.within_transaction(|store| {
                for (sheet_id, file_path) in chunk {
                    let outcome = store.upsert(&Entity::SheetFile {
                        sheet_id: *sheet_id,
                        file_path: file_path.as_str(),
                    });
                    record(outcome, &mut report.files, "sheet_file", file_path)?;
                }
                Ok(())
            })?;
            report.batches += 1;
            info!(
                batch = report.batches,
                files = report.files.total(),
                "Sheet files committed"
            );
        }

        self.enter(RunPhase::Done);
        Ok(report)
    }

    fn enter(&mut self, phase: RunPhase) {
        debug!(from = %self.phase, to = %phase, "Writer phase");
        self.phase = phase;
    }

    fn require_schema(&self) -> Result<()> {
        if !self.schema_ready {
            return Err(SqliteError::MigrationError(
                "schema must be ensured before writing".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builds `(type_a|type_b|...)(?:/|$)`, longest type first so a type that
/// is a prefix of another never shadows it. Returns `None` for no types.
fn sheet_type_pattern<'a>(types: impl Iterator<Item = &'a String>) -> Result<Option<Regex>> {
    let mut types: Vec<&String> = types.filter(|t| !t.is_empty()).collect();
    if types.is_empty() {
        return Ok(None);
    }
    types.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let alternation = types
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    Ok(Some(Regex::new(&format!("({alternation})(?:/|$)"))?))
}

fn unresolved(what: &str, key: &str) -> SqliteError {
    SqliteError::UnresolvedReference(format!("{what} '{key}'"))
}

fn record(outcome: Result<Upsert>, count: &mut WriteCount, entity: &str, key: &str) -> Result<()> {
    match outcome {
        Ok(Upsert::Inserted) => count.inserted += 1,
        Ok(Upsert::AlreadyPresent) => count.already_present += 1,
        Err(err) if err.is_row_level() => {
            warn!(entity, key, error = %err, "Skipping row");
            count.failed += 1;
        }
        Err(err) => return Err(err),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprite_catalog_core::Gender;

    fn asset(name: &str, path: &str) -> ClassifiedAsset {
        ClassifiedAsset {
            name: name.to_string(),
            file_path: path.to_string(),
            layer: "torso".to_string(),
            animation: "walk".to_string(),
            gender: Gender::Male,
        }
    }

    #[test]
    fn test_batch_deduplicates_assets() {
        let mut batch = AssetBatch::new();
        assert!(batch.push(asset("leather", "male/torso/walk/leather.png")));
        assert!(!batch.push(asset("leather", "male/torso/walk/leather.png")));
        assert!(batch.push(asset("leather", "female/torso/walk/leather.png")));
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.links().len(), 2);
    }

    #[test]
    fn test_sheet_type_pattern_prefers_longer_type() {
        let types = vec!["hat".to_string(), "hat_fancy".to_string()];
        let pattern = sheet_type_pattern(types.iter()).unwrap().unwrap();
        let caps = pattern.captures("hat_fancy/male/red.png").unwrap();
        assert_eq!(&caps[1], "hat_fancy");
        let caps = pattern.captures("head/hat/male.png").unwrap();
        assert_eq!(&caps[1], "hat");
    }

    #[test]
    fn test_sheet_type_pattern_requires_segment_end() {
        let types = vec!["cape".to_string()];
        let pattern = sheet_type_pattern(types.iter()).unwrap().unwrap();
        assert!(!pattern.is_match("capes.png"));
        assert!(pattern.is_match("torso/cape/red.png"));
    }

    #[test]
    fn test_sheet_type_pattern_escapes_metacharacters() {
        let types = vec!["a.b".to_string()];
        let pattern = sheet_type_pattern(types.iter()).unwrap().unwrap();
        assert!(pattern.is_match("x/a.b/y.png"));
        assert!(!pattern.is_match("x/axb/y.png"));
    }

    #[test]
    fn test_empty_types_yield_no_pattern() {
        let types: Vec<String> = Vec::new();
        assert!(sheet_type_pattern(types.iter()).unwrap().is_none());
    }

    #[test]
    fn test_record_counts_outcomes() {
        let mut count = WriteCount::default();
        record(Ok(Upsert::Inserted), &mut count, "asset", "a").unwrap();
        record(Ok(Upsert::AlreadyPresent), &mut count, "asset", "a").unwrap();
        record(Err(unresolved("layer", "x")), &mut count, "asset", "b").unwrap();
        assert_eq!(
            count,
            WriteCount {
                inserted: 1,
                already_present: 1,
                failed: 1
            }
        );
        assert!(record(
            Err(SqliteError::MigrationError("io".into())),
            &mut count,
            "asset",
            "c"
        )
        .is_err());
    }
}
