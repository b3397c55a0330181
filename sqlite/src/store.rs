//! Store abstraction used by the catalog writer.
//!
//! The writer talks to [`CatalogStore`] rather than to a connection, so the
//! dedup and transaction protocol does not depend on the shape of any
//! particular database handle. [`SqliteStore`] is the SQLite implementation.
//!
//! Every [`upsert`](CatalogStore::upsert) is an insert-if-absent keyed on the
//! entity's natural unique key: an existing row is left untouched and
//! reported as [`Upsert::AlreadyPresent`].

use std::collections::HashMap;
use std::path::Path;

use rusqlite::{Connection, params};
use sprite_catalog_core::{Gender, Vocabulary};

use crate::error::Result;
use crate::migration::{self, CatalogStatus, VocabularyReport};
use crate::schema::validate_prefix;

/// A row to insert, borrowing its text fields from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity<'a> {
    Sheet {
        name: &'a str,
        type_name: &'a str,
        match_body_color: bool,
    },
    Layer {
        sheet_id: i64,
        layer_name: &'a str,
        z_position: i64,
    },
    LayerPath {
        layer_id: i64,
        path_type: &'a str,
        path_value: &'a str,
    },
    Variant {
        sheet_id: i64,
        variant_name: &'a str,
    },
    SheetAnimation {
        sheet_id: i64,
        animation_name: &'a str,
        /// Global vocabulary entry, when the name is known.
        animation_id: Option<i64>,
    },
    SheetFile {
        sheet_id: i64,
        file_path: &'a str,
    },
    Asset {
        name: &'a str,
        /// Row id in `render_layers`.
        layer_id: i64,
        gender: Gender,
        file_path: &'a str,
    },
    AssetAnimation {
        asset_id: i64,
        animation_id: i64,
        frame_path_template: &'a str,
    },
}

/// Natural key of a row whose id can be read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKey<'a> {
    RenderLayer { name: &'a str },
    Animation { name: &'a str },
    Sheet { name: &'a str, type_name: &'a str },
    Layer { sheet_id: i64, layer_name: &'a str },
    Asset { name: &'a str, file_path: &'a str },
}

/// Outcome of an insert-if-absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    AlreadyPresent,
}

impl Upsert {
    pub fn inserted(self) -> bool {
        self == Upsert::Inserted
    }
}

/// Name-keyed reference tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VocabularyTable {
    RenderLayers,
    Animations,
}

/// Persistence operations the writer needs.
pub trait CatalogStore {
    /// Creates missing tables and seeds missing vocabulary rows.
    fn ensure_schema(&self, vocabulary: &Vocabulary) -> Result<VocabularyReport>;

    /// Inserts a row unless a row with the same natural key exists.
    fn upsert(&self, entity: &Entity<'_>) -> Result<Upsert>;

    /// Reads back the id of a committed (or in-transaction) row.
    fn read_back(&self, key: &EntityKey<'_>) -> Result<Option<i64>>;

    /// Maps every vocabulary name to its row id.
    fn name_ids(&self, table: VocabularyTable) -> Result<HashMap<String, i64>>;

    /// Maps `(name, type_name)` to `sheet_id`.
    fn sheet_ids(&self) -> Result<HashMap<(String, String), i64>>;

    /// Maps `(sheet_id, layer_name)` to `layer_id`.
    fn layer_ids(&self) -> Result<HashMap<(i64, String), i64>>;

    /// Maps `(name, file_path)` to asset id.
    fn asset_ids(&self) -> Result<HashMap<(String, String), i64>>;

    /// Returns `(sheet_id, type_name)` for every sheet, ordered by id.
    fn sheet_types(&self) -> Result<Vec<(i64, String)>>;

    /// Runs `f` inside one transaction: committed when `f` returns `Ok`,
    /// rolled back otherwise.
    fn within_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
        Self: Sized;
}

/// [`CatalogStore`] backed by a SQLite connection.
///
/// # Examples
///
/// ```
/// use rusqlite::Connection;
/// use sprite_catalog_core::{Gender, Vocabulary};
/// use sprite_catalog_sqlite::{CatalogStore, Entity, EntityKey, SqliteStore, Upsert};
///
/// let store = SqliteStore::new(Connection::open_in_memory().unwrap(), "lpc_").unwrap();
/// store.ensure_schema(&Vocabulary::default()).unwrap();
///
/// let layer_id = store
///     .read_back(&EntityKey::RenderLayer { name: "torso" })
///     .unwrap()
///     .unwrap();
/// let asset = Entity::Asset {
///     name: "leather",
///     layer_id,
///     gender: Gender::Male,
///     file_path: "male/torso/walk/leather.png",
/// };
/// assert_eq!(store.upsert(&asset).unwrap(), Upsert::Inserted);
/// assert_eq!(store.upsert(&asset).unwrap(), Upsert::AlreadyPresent);
/// ```
pub struct SqliteStore {
    conn: Connection,
    prefix: String,
}

impl SqliteStore {
    /// Wraps a connection, enabling foreign-key enforcement.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::InvalidPrefix`](crate::SqliteError::InvalidPrefix)
    /// if the prefix is invalid.
    pub fn new(conn: Connection, prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn, prefix })
    }

    /// Opens (or creates) a database file.
    pub fn open(path: impl AsRef<Path>, prefix: impl Into<String>) -> Result<Self> {
        Self::new(Connection::open(path)?, prefix)
    }

    /// Row counts per table.
    pub fn status(&self) -> Result<CatalogStatus> {
        migration::catalog_status(&self.conn, &self.prefix)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Consumes the store and returns the underlying connection.
    pub fn into_connection(self) -> Connection {
        self.conn
    }

    fn insert(&self, sql: &str, params: impl rusqlite::Params) -> Result<Upsert> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let changed = stmt.execute(params)?;
        Ok(if changed > 0 {
            Upsert::Inserted
        } else {
            Upsert::AlreadyPresent
        })
    }

    fn lookup(&self, sql: &str, params: impl rusqlite::Params) -> Result<Option<i64>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let mut rows = stmt.query(params)?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }
}

impl CatalogStore for SqliteStore {
    fn ensure_schema(&self, vocabulary: &Vocabulary) -> Result<VocabularyReport> {
        migration::create_tables(&self.conn, &self.prefix)?;
        migration::seed_vocabulary(&self.conn, &self.prefix, vocabulary)
    }

    fn upsert(&self, entity: &Entity<'_>) -> Result<Upsert> {
        let p = &self.prefix;
        match *entity {
            Entity::Sheet {
                name,
                type_name,
                match_body_color,
            } => self.insert(
                &format!(
                    "INSERT OR IGNORE INTO {p}sheets (name, type_name, match_body_color) \
                     VALUES (?1, ?2, ?3)"
                ),
                params![name, type_name, match_body_color],
            ),
            Entity::Layer {
                sheet_id,
                layer_name,
                z_position,
            } => self.insert(
                &format!(
                    "INSERT OR IGNORE INTO {p}layers (sheet_id, layer_name, z_position) \
                     VALUES (?1, ?2, ?3)"
                ),
                params![sheet_id, layer_name, z_position],
            ),
            Entity::LayerPath {
                layer_id,
                path_type,
                path_value,
            } => self.insert(
                &format!(
                    "INSERT OR IGNORE INTO {p}layer_paths (layer_id, path_type, path_value) \
                     VALUES (?1, ?2, ?3)"
                ),
                params![layer_id, path_type, path_value],
            ),
            Entity::Variant {
                sheet_id,
                variant_name,
            } => self.insert(
                &format!(
                    "INSERT OR IGNORE INTO {p}variants (sheet_id, variant_name) VALUES (?1, ?2)"
                ),
                params![sheet_id, variant_name],
            ),
            Entity::SheetAnimation {
                sheet_id,
                animation_name,
                animation_id,
            } => self.insert(
                &format!(
                    "INSERT OR IGNORE INTO {p}sheet_animations (sheet_id, animation_name, animation_id) \
                     VALUES (?1, ?2, ?3)"
                ),
                params![sheet_id, animation_name, animation_id],
            ),
            Entity::SheetFile { sheet_id, file_path } => self.insert(
                &format!(
                    "INSERT OR IGNORE INTO {p}sheet_files (sheet_id, file_path) VALUES (?1, ?2)"
                ),
                params![sheet_id, file_path],
            ),
            Entity::Asset {
                name,
                layer_id,
                gender,
                file_path,
            } => self.insert(
                &format!(
                    "INSERT OR IGNORE INTO {p}assets (name, layer_id, gender, file_path) \
                     VALUES (?1, ?2, ?3, ?4)"
                ),
                params![name, layer_id, gender.as_str(), file_path],
            ),
            Entity::AssetAnimation {
                asset_id,
                animation_id,
                frame_path_template,
            } => self.insert(
                &format!(
                    "INSERT OR IGNORE INTO {p}asset_animations (asset_id, animation_id, frame_path_template) \
                     VALUES (?1, ?2, ?3)"
                ),
                params![asset_id, animation_id, frame_path_template],
            ),
        }
    }

    fn read_back(&self, key: &EntityKey<'_>) -> Result<Option<i64>> {
        let p = &self.prefix;
        match *key {
            EntityKey::RenderLayer { name } => self.lookup(
                &format!("SELECT id FROM {p}render_layers WHERE name = ?1"),
                params![name],
            ),
            EntityKey::Animation { name } => self.lookup(
                &format!("SELECT id FROM {p}animations WHERE name = ?1"),
                params![name],
            ),
            EntityKey::Sheet { name, type_name } => self.lookup(
                &format!("SELECT sheet_id FROM {p}sheets WHERE name = ?1 AND type_name = ?2"),
                params![name, type_name],
            ),
            EntityKey::Layer {
                sheet_id,
                layer_name,
            } => self.lookup(
                &format!(
                    "SELECT layer_id FROM {p}layers WHERE sheet_id = ?1 AND layer_name = ?2"
                ),
                params![sheet_id, layer_name],
            ),
            EntityKey::Asset { name, file_path } => self.lookup(
                &format!("SELECT id FROM {p}assets WHERE name = ?1 AND file_path = ?2"),
                params![name, file_path],
            ),
        }
    }

    fn name_ids(&self, table: VocabularyTable) -> Result<HashMap<String, i64>> {
        let table = match table {
            VocabularyTable::RenderLayers => "render_layers",
            VocabularyTable::Animations => "animations",
        };
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT id, name FROM {}{table}", self.prefix))?;
        let ids = stmt
            .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, i64>(0)?)))?
            .collect::<std::result::Result<HashMap<_, _>, _>>()?;
        Ok(ids)
    }

    fn sheet_ids(&self) -> Result<HashMap<(String, String), i64>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT sheet_id, name, type_name FROM {}sheets",
            self.prefix
        ))?;
        let ids = stmt
            .query_map([], |row| Ok(((row.get(1)?, row.get(2)?), row.get(0)?)))?
            .collect::<std::result::Result<HashMap<_, _>, _>>()?;
        Ok(ids)
    }

    fn layer_ids(&self) -> Result<HashMap<(i64, String), i64>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT layer_id, sheet_id, layer_name FROM {}layers",
            self.prefix
        ))?;
        let ids = stmt
            .query_map([], |row| Ok(((row.get(1)?, row.get(2)?), row.get(0)?)))?
            .collect::<std::result::Result<HashMap<_, _>, _>>()?;
        Ok(ids)
    }

    fn asset_ids(&self) -> Result<HashMap<(String, String), i64>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, name, file_path FROM {}assets",
            self.prefix
        ))?;
        let ids = stmt
            .query_map([], |row| Ok(((row.get(1)?, row.get(2)?), row.get(0)?)))?
            .collect::<std::result::Result<HashMap<_, _>, _>>()?;
        Ok(ids)
    }

    fn sheet_types(&self) -> Result<Vec<(i64, String)>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT sheet_id, type_name FROM {}sheets ORDER BY sheet_id",
            self.prefix
        ))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn within_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        let tx = self.conn.unchecked_transaction()?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SqliteError;

    fn store() -> SqliteStore {
        let store = SqliteStore::new(Connection::open_in_memory().unwrap(), "t_").unwrap();
        store.ensure_schema(&Vocabulary::default()).unwrap();
        store
    }

    #[test]
    fn test_ensure_schema_twice_seeds_once() {
        let store = store();
        let report = store.ensure_schema(&Vocabulary::default()).unwrap();
        assert_eq!(report, VocabularyReport::default());
        assert_eq!(store.status().unwrap().render_layer_count, 10);
    }

    #[test]
    fn test_sheet_upsert_and_read_back() {
        let store = store();
        let sheet = Entity::Sheet {
            name: "Hat",
            type_name: "hat",
            match_body_color: false,
        };
        assert!(store.upsert(&sheet).unwrap().inserted());
        assert!(!store.upsert(&sheet).unwrap().inserted());

        let key = EntityKey::Sheet {
            name: "Hat",
            type_name: "hat",
        };
        let id = store.read_back(&key).unwrap().unwrap();
        assert_eq!(store.sheet_ids().unwrap()[&("Hat".to_string(), "hat".to_string())], id);
        assert!(store
            .read_back(&EntityKey::Sheet {
                name: "Hat",
                type_name: "cape",
            })
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_rollback_on_error_discards_rows() {
        let store = store();
        let result: Result<()> = store.within_transaction(|s| {
            s.upsert(&Entity::Sheet {
                name: "cape",
                type_name: "cape",
                match_body_color: false,
            })?;
            Err(SqliteError::MigrationError("boom".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(store.status().unwrap().sheet_count, 0);
    }

    #[test]
    fn test_foreign_key_violation_is_row_level() {
        let store = store();
        let err = store
            .upsert(&Entity::Layer {
                sheet_id: 999,
                layer_name: "layer_1",
                z_position: 0,
            })
            .unwrap_err();
        assert!(err.is_row_level());
    }

    #[test]
    fn test_name_ids_follow_vocabulary() {
        let store = store();
        let layers = store.name_ids(VocabularyTable::RenderLayers).unwrap();
        let animations = store.name_ids(VocabularyTable::Animations).unwrap();
        assert_eq!(layers.len(), 10);
        assert!(layers.contains_key("shield"));
        assert_eq!(animations.len(), 7);
        assert!(animations.contains_key("spellcast"));
    }
}
