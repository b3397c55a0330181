//! Read-only access to a populated catalog.
//!
//! [`CatalogQuery`] answers the questions the catalog exists for ("which
//! assets does layer X have for animation Y and gender Z") and reads the
//! flat `character_layers` reporting view.
//!
//! # Example
//!
//! ```no_run
//! use rusqlite::Connection;
//! use sprite_catalog_core::Gender;
//! use sprite_catalog_sqlite::CatalogQuery;
//!
//! let conn = Connection::open("lpc_character_generator.sqlite").unwrap();
//! let query = CatalogQuery::new(&conn, "lpc_").unwrap();
//!
//! for asset in query.assets_for("torso", Some("walk"), Some(Gender::Female)).unwrap() {
//!     println!("{} -> {}", asset.name, asset.file_path);
//! }
//! ```

use rusqlite::types::Type;
use rusqlite::{Connection, params};
use serde::Serialize;
use sprite_catalog_core::{CharacterLayerRecord, Gender};

use crate::error::Result;
use crate::schema::validate_prefix;

/// One asset row, joined with one of its animation links when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetRecord {
    pub id: i64,
    pub name: String,
    /// Render layer keyword.
    pub layer: String,
    pub gender: Gender,
    pub file_path: String,
    pub animation: Option<String>,
    pub frame_path_template: Option<String>,
}

/// Query interface over the catalog tables.
pub struct CatalogQuery<'a> {
    conn: &'a Connection,
    prefix: String,
}

impl<'a> CatalogQuery<'a> {
    /// Creates a query interface for the given connection and table prefix.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::InvalidPrefix`](crate::SqliteError::InvalidPrefix)
    /// if the prefix is invalid.
    pub fn new(conn: &'a Connection, prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        Ok(Self { conn, prefix })
    }

    /// Reads the `character_layers` view, ordered by type, z-index, gender,
    /// and variant.
    pub fn character_layers(&self) -> Result<Vec<CharacterLayerRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT type_name, gender, variant, z_index, path FROM {}character_layers \
             ORDER BY type_name, z_index, gender, variant",
            self.prefix
        ))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(CharacterLayerRecord {
                    type_name: row.get(0)?,
                    gender: row.get(1)?,
                    variant: row.get(2)?,
                    z_index: row.get(3)?,
                    path: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Assets on `layer`, optionally narrowed to one animation and one
    /// gender. A gender filter also admits unisex assets.
    ///
    /// Without an animation filter an asset appears once per linked
    /// animation (or once with `animation: None` if it has none).
    pub fn assets_for(
        &self,
        layer: &str,
        animation: Option<&str>,
        gender: Option<Gender>,
    ) -> Result<Vec<AssetRecord>> {
        let p = &self.prefix;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT a.id, a.name, rl.name, a.gender, a.file_path, an.name, aa.frame_path_template
             FROM {p}assets a
             JOIN {p}render_layers rl ON rl.id = a.layer_id
             LEFT JOIN {p}asset_animations aa ON aa.asset_id = a.id
             LEFT JOIN {p}animations an ON an.id = aa.animation_id
             WHERE rl.name = ?1
               AND (?2 IS NULL OR an.name = ?2)
               AND (?3 IS NULL OR a.gender = ?3 OR a.gender = 'unisex')
             ORDER BY a.file_path, an.name"
        ))?;

        let rows = stmt
            .query_map(
                params![layer, animation, gender.map(Gender::as_str)],
                |row| {
                    let gender: String = row.get(3)?;
                    let gender = gender.parse::<Gender>().map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(3, Type::Text, e.into())
                    })?;
                    Ok(AssetRecord {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        layer: row.get(2)?,
                        gender,
                        file_path: row.get(4)?,
                        animation: row.get(5)?,
                        frame_path_template: row.get(6)?,
                    })
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Image files attributed to sheets of the given type, sorted.
    pub fn sheet_files(&self, type_name: &str) -> Result<Vec<String>> {
        let p = &self.prefix;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT f.file_path FROM {p}sheet_files f
             JOIN {p}sheets s ON s.sheet_id = f.sheet_id
             WHERE s.type_name = ?1
             ORDER BY f.file_path"
        ))?;
        let rows = stmt
            .query_map(params![type_name], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(rows)
    }
}
