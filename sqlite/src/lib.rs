//! SQLite catalog for LPC sprite assets.
//!
//! This crate owns the catalog's relational schema and everything that
//! writes to it: schema lifecycle, a store abstraction with insert-if-absent
//! semantics, the transactional catalog writer, and read-only queries.
//!
//! # Architecture
//!
//! - **`schema`**: SQL generation with customizable table prefixes
//! - **`migration`**: Lifecycle operations (up/seed/down/status)
//! - **`store`**: [`CatalogStore`] trait and its SQLite implementation
//! - **`writer`**: Deduplicating, multi-transaction [`CatalogWriter`]
//! - **`query`**: Read-only lookups and the flat reporting view
//!
//! # Quick start
//!
//! ```no_run
//! use sprite_catalog_core::{PathClassifier, Vocabulary};
//! use sprite_catalog_sqlite::{CatalogWriter, SqliteStore};
//!
//! let vocabulary = Vocabulary::default();
//! let store = SqliteStore::open("lpc_character_generator.sqlite", "lpc_").unwrap();
//!
//! let mut writer = CatalogWriter::new(&store);
//! writer.ensure_schema(&vocabulary).unwrap();
//!
//! let classifier = PathClassifier::new(&vocabulary);
//! let batch = writer.scan(&classifier, ["male/torso/walk/leather.png"], "png", 500);
//! let report = writer.write_assets(&batch).unwrap();
//! println!("{} assets inserted", report.assets.inserted);
//! ```
//!
//! # Table prefix customization
//!
//! All table, index, and view names are prefixed with a configurable
//! string, so several catalogs can share one database file. Prefixes must
//! contain only alphanumeric characters and underscores.

mod error;
mod migration;
mod query;
mod schema;
mod store;
mod writer;

pub use error::{Result, SqliteError};
pub use migration::{CatalogStatus, Migration, VocabularyReport};
pub use query::{AssetRecord, CatalogQuery};
pub use schema::{generate_drop_sql, generate_schema_sql};
pub use store::{CatalogStore, Entity, EntityKey, SqliteStore, Upsert, VocabularyTable};
pub use writer::{
    AssetBatch, CatalogWriter, FileLinkReport, ImportReport, RunPhase, ScanReport, WriteCount,
};
