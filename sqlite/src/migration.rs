//! Schema lifecycle operations for the catalog.
//!
//! Provides [`Migration`] for creating and dropping the catalog tables and
//! for seeding the reference vocabularies. Creation is idempotent and
//! seeding is insert-if-absent, so both are safe to run on every
//! invocation.
//!
//! # Example
//!
//! ```no_run
//! use rusqlite::Connection;
//! use sprite_catalog_core::Vocabulary;
//! use sprite_catalog_sqlite::Migration;
//!
//! let conn = Connection::open("catalog.sqlite").unwrap();
//! let mut migration = Migration::new(conn, "lpc_").unwrap();
//!
//! migration.up().unwrap();
//! migration.seed_vocabulary(&Vocabulary::default()).unwrap();
//!
//! let status = migration.status().unwrap();
//! assert!(status.tables_exist);
//! ```

use rusqlite::{Connection, params};
use sprite_catalog_core::Vocabulary;

use crate::error::{Result, SqliteError};
use crate::schema::{generate_drop_sql, generate_schema_sql, validate_prefix};

/// Manages the lifecycle of the catalog tables.
pub struct Migration {
    conn: Connection,
    prefix: String,
}

impl Migration {
    /// Creates a migration manager for the given connection and table prefix.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::InvalidPrefix`] if the prefix contains invalid characters.
    pub fn new(conn: Connection, prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn, prefix })
    }

    /// Creates all tables, indexes, and the reporting view.
    ///
    /// Uses `IF NOT EXISTS` throughout, so it is safe to call multiple times.
    pub fn up(&mut self) -> Result<()> {
        create_tables(&self.conn, &self.prefix)
    }

    /// Seeds the layer and animation vocabularies with insert-if-absent
    /// semantics. Existing rows are never overwritten.
    pub fn seed_vocabulary(&mut self, vocabulary: &Vocabulary) -> Result<VocabularyReport> {
        seed_vocabulary(&self.conn, &self.prefix, vocabulary)
    }

    /// Drops the view and all tables in reverse dependency order.
    pub fn down(&mut self) -> Result<()> {
        let sql = generate_drop_sql(&self.prefix)?;
        let tx = self.conn.transaction()?;
        tx.execute_batch(&sql)
            .map_err(|e| SqliteError::MigrationError(format!("failed to drop tables: {e}")))?;
        tx.commit()?;
        Ok(())
    }

    /// Returns whether the tables exist and how many rows each holds.
    pub fn status(&self) -> Result<CatalogStatus> {
        catalog_status(&self.conn, &self.prefix)
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Consumes the migration and returns the underlying connection.
    pub fn into_connection(self) -> Connection {
        self.conn
    }
}

/// Runs the schema script inside a transaction.
pub(crate) fn create_tables(conn: &Connection, prefix: &str) -> Result<()> {
    let sql = generate_schema_sql(prefix)?;
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(&sql)
        .map_err(|e| SqliteError::MigrationError(format!("failed to create tables: {e}")))?;
    tx.commit()?;
    Ok(())
}

/// Inserts the vocabulary rows that are not yet present.
pub(crate) fn seed_vocabulary(
    conn: &Connection,
    prefix: &str,
    vocabulary: &Vocabulary,
) -> Result<VocabularyReport> {
    let tx = conn.unchecked_transaction()?;
    let mut report = VocabularyReport::default();

    {
        let mut insert_layer = tx.prepare(&format!(
            "INSERT OR IGNORE INTO {prefix}render_layers (name, render_order) VALUES (?1, ?2)"
        ))?;
        for (order, layer) in vocabulary.layers.iter().enumerate() {
            report.layers_inserted += insert_layer.execute(params![layer, order as i64])?;
        }

        let mut insert_animation = tx.prepare(&format!(
            "INSERT OR IGNORE INTO {prefix}animations (name, direction_count, frame_count) \
             VALUES (?1, ?2, ?3)"
        ))?;
        for anim in &vocabulary.animations {
            report.animations_inserted += insert_animation.execute(params![
                anim.name,
                anim.direction_count,
                anim.frame_count
            ])?;
        }
    }

    tx.commit()?;
    Ok(report)
}

pub(crate) fn catalog_status(conn: &Connection, prefix: &str) -> Result<CatalogStatus> {
    let table_name = format!("{prefix}assets");
    let tables_exist: bool = conn
        .prepare("SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1")?
        .query_row([&table_name], |row| Ok(row.get::<_, i64>(0)? > 0))?;

    if !tables_exist {
        return Ok(CatalogStatus::default());
    }

    let count = |table: &str| -> Result<usize> {
        let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {prefix}{table}"), [], |row| {
            row.get(0)
        })?;
        Ok(n as usize)
    };

    Ok(CatalogStatus {
        tables_exist,
        render_layer_count: count("render_layers")?,
        animation_count: count("animations")?,
        sheet_count: count("sheets")?,
        layer_count: count("layers")?,
        layer_path_count: count("layer_paths")?,
        variant_count: count("variants")?,
        sheet_animation_count: count("sheet_animations")?,
        sheet_file_count: count("sheet_files")?,
        asset_count: count("assets")?,
        asset_animation_count: count("asset_animations")?,
    })
}

/// Rows inserted by [`Migration::seed_vocabulary`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VocabularyReport {
    pub layers_inserted: usize,
    pub animations_inserted: usize,
}

/// Snapshot of the catalog returned by [`Migration::status`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogStatus {
    /// Whether the catalog tables exist in the database.
    pub tables_exist: bool,
    pub render_layer_count: usize,
    pub animation_count: usize,
    pub sheet_count: usize,
    pub layer_count: usize,
    pub layer_path_count: usize,
    pub variant_count: usize,
    pub sheet_animation_count: usize,
    pub sheet_file_count: usize,
    pub asset_count: usize,
    pub asset_animation_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_new_validates_prefix() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(Migration::new(conn, "lpc_").is_ok());

        let conn = Connection::open_in_memory().unwrap();
        assert!(Migration::new(conn, "").is_err());

        let conn = Connection::open_in_memory().unwrap();
        assert!(Migration::new(conn, "drop;--").is_err());
    }

    #[test]
    fn test_status_on_empty_database() {
        let conn = Connection::open_in_memory().unwrap();
        let migration = Migration::new(conn, "lpc_").unwrap();
        let status = migration.status().unwrap();
        assert!(!status.tables_exist);
        assert_eq!(status.asset_count, 0);
    }

    #[test]
    fn test_up_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        let mut migration = Migration::new(conn, "lpc_").unwrap();
        migration.up().unwrap();
        migration.up().unwrap();
        assert!(migration.status().unwrap().tables_exist);
    }

    #[test]
    fn test_seed_vocabulary_is_insert_if_absent() {
        let conn = Connection::open_in_memory().unwrap();
        let mut migration = Migration::new(conn, "lpc_").unwrap();
        migration.up().unwrap();

        let vocab = Vocabulary::default();
        let first = migration.seed_vocabulary(&vocab).unwrap();
        assert_eq!(first.layers_inserted, vocab.layers.len());
        assert_eq!(first.animations_inserted, vocab.animations.len());

        let second = migration.seed_vocabulary(&vocab).unwrap();
        assert_eq!(second, VocabularyReport::default());

        let status = migration.status().unwrap();
        assert_eq!(status.render_layer_count, vocab.layers.len());
        assert_eq!(status.animation_count, vocab.animations.len());
    }

    #[test]
    fn test_seed_does_not_overwrite_existing_rows() {
        let conn = Connection::open_in_memory().unwrap();
        let mut migration = Migration::new(conn, "lpc_").unwrap();
        migration.up().unwrap();
        migration
            .connection()
            .execute(
                "INSERT INTO lpc_animations (name, direction_count, frame_count) VALUES ('walk', 8, 12)",
                [],
            )
            .unwrap();

        migration.seed_vocabulary(&Vocabulary::default()).unwrap();

        let (dirs, frames): (i64, i64) = migration
            .connection()
            .query_row(
                "SELECT direction_count, frame_count FROM lpc_animations WHERE name = 'walk'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!((dirs, frames), (8, 12));
    }

    #[test]
    fn test_down_removes_tables_and_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        let mut migration = Migration::new(conn, "lpc_").unwrap();
        migration.down().unwrap();
        migration.up().unwrap();
        migration.down().unwrap();
        assert!(!migration.status().unwrap().tables_exist);
    }
}
