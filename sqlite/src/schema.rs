//! SQL schema generation with customizable table prefixes.
//!
//! Generates the catalog's `CREATE TABLE`, `CREATE INDEX`, and `CREATE VIEW`
//! statements. Every statement is `IF NOT EXISTS`, so the script is safe to
//! run on every invocation.
//!
//! # Table structure
//!
//! Reference vocabularies (seeded from configuration):
//!
//! - `{prefix}render_layers`: layer keyword → render order
//! - `{prefix}animations`: animation keyword → direction/frame counts
//!
//! Sheet definitions:
//!
//! - `{prefix}sheets`: unique per `(name, type_name)`
//! - `{prefix}layers`: `layer_*` entries owned by a sheet
//! - `{prefix}layer_paths`: body-type → directory fragment, owned by a layer
//! - `{prefix}variants`: named sub-styles of a sheet
//! - `{prefix}sheet_animations`: sheet-scoped animation names
//! - `{prefix}sheet_files`: image files attributed to a sheet
//!
//! Scanned assets:
//!
//! - `{prefix}assets`: unique per `(name, file_path)`
//! - `{prefix}asset_animations`: unique per `(asset_id, animation_id)`
//!
//! Downstream tables, created but not populated here: `{prefix}palettes`,
//! `{prefix}characters`, `{prefix}character_assets`.
//!
//! The `{prefix}character_layers` view is the flat
//! `(type_name, gender, variant, z_index, path)` projection of the sheet
//! tables.

use crate::error::{Result, SqliteError};

/// Tables in dependency order (parents first).
pub(crate) const TABLES: &[&str] = &[
    "render_layers",
    "animations",
    "sheets",
    "layers",
    "layer_paths",
    "variants",
    "sheet_animations",
    "sheet_files",
    "assets",
    "asset_animations",
    "palettes",
    "characters",
    "character_assets",
];

/// Validates that a table prefix contains only alphanumeric characters and underscores.
pub(crate) fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        return Err(SqliteError::InvalidPrefix(prefix.to_string()));
    }
    if !prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(SqliteError::InvalidPrefix(prefix.to_string()));
    }
    Ok(())
}

/// Generates the complete SQL schema for all tables with the given prefix.
///
/// # Errors
///
/// Returns [`SqliteError::InvalidPrefix`] if the prefix contains characters
/// other than ASCII alphanumerics and underscores, or if it is empty.
pub fn generate_schema_sql(prefix: &str) -> Result<String> {
    validate_prefix(prefix)?;

    let sql = format!(
        r#"
CREATE TABLE IF NOT EXISTS {prefix}render_layers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    render_order INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS {prefix}animations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    direction_count INTEGER NOT NULL DEFAULT 4,
    frame_count INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS {prefix}sheets (
    sheet_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    type_name TEXT NOT NULL,
    match_body_color INTEGER NOT NULL DEFAULT 0,
    UNIQUE (name, type_name)
);

CREATE TABLE IF NOT EXISTS {prefix}layers (
    layer_id INTEGER PRIMARY KEY AUTOINCREMENT,
    sheet_id INTEGER NOT NULL,
    layer_name TEXT NOT NULL,
    z_position INTEGER NOT NULL DEFAULT 0,
    UNIQUE (sheet_id, layer_name),
    FOREIGN KEY (sheet_id) REFERENCES {prefix}sheets(sheet_id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS {prefix}layer_paths (
    path_id INTEGER PRIMARY KEY AUTOINCREMENT,
    layer_id INTEGER NOT NULL,
    path_type TEXT NOT NULL,
    path_value TEXT NOT NULL,
    UNIQUE (layer_id, path_type),
    FOREIGN KEY (layer_id) REFERENCES {prefix}layers(layer_id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS {prefix}variants (
    variant_id INTEGER PRIMARY KEY AUTOINCREMENT,
    sheet_id INTEGER NOT NULL,
    variant_name TEXT NOT NULL,
    UNIQUE (sheet_id, variant_name),
    FOREIGN KEY (sheet_id) REFERENCES {prefix}sheets(sheet_id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS {prefix}sheet_animations (
    sheet_animation_id INTEGER PRIMARY KEY AUTOINCREMENT,
    sheet_id INTEGER NOT NULL,
    animation_name TEXT NOT NULL,
    animation_id INTEGER,
    UNIQUE (sheet_id, animation_name),
    FOREIGN KEY (sheet_id) REFERENCES {prefix}sheets(sheet_id) ON DELETE CASCADE,
    FOREIGN KEY (animation_id) REFERENCES {prefix}animations(id)
);

CREATE TABLE IF NOT EXISTS {prefix}sheet_files (
    file_id INTEGER PRIMARY KEY AUTOINCREMENT,
    sheet_id INTEGER NOT NULL,
    file_path TEXT NOT NULL UNIQUE,
    FOREIGN KEY (sheet_id) REFERENCES {prefix}sheets(sheet_id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS {prefix}assets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    layer_id INTEGER NOT NULL,
    gender TEXT NOT NULL DEFAULT 'unisex' CHECK (gender IN ('male', 'female', 'unisex')),
    file_path TEXT NOT NULL,
    UNIQUE (name, file_path),
    FOREIGN KEY (layer_id) REFERENCES {prefix}render_layers(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS {prefix}asset_animations (
    asset_id INTEGER NOT NULL,
    animation_id INTEGER NOT NULL,
    frame_path_template TEXT NOT NULL,
    PRIMARY KEY (asset_id, animation_id),
    FOREIGN KEY (asset_id) REFERENCES {prefix}assets(id) ON DELETE CASCADE,
    FOREIGN KEY (animation_id) REFERENCES {prefix}animations(id)
);

CREATE TABLE IF NOT EXISTS {prefix}palettes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    type TEXT NOT NULL CHECK (type IN ('skin', 'hair', 'clothes')),
    file_path TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS {prefix}characters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS {prefix}character_assets (
    character_id INTEGER NOT NULL,
    asset_id INTEGER NOT NULL,
    PRIMARY KEY (character_id, asset_id),
    FOREIGN KEY (character_id) REFERENCES {prefix}characters(id) ON DELETE CASCADE,
    FOREIGN KEY (asset_id) REFERENCES {prefix}assets(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_{prefix}layers_sheet ON {prefix}layers(sheet_id);
CREATE INDEX IF NOT EXISTS idx_{prefix}layer_paths_layer ON {prefix}layer_paths(layer_id);
CREATE INDEX IF NOT EXISTS idx_{prefix}variants_sheet ON {prefix}variants(sheet_id);
CREATE INDEX IF NOT EXISTS idx_{prefix}sheet_animations_sheet ON {prefix}sheet_animations(sheet_id);
CREATE INDEX IF NOT EXISTS idx_{prefix}sheet_animations_animation ON {prefix}sheet_animations(animation_id);
CREATE INDEX IF NOT EXISTS idx_{prefix}sheet_files_sheet ON {prefix}sheet_files(sheet_id);
CREATE INDEX IF NOT EXISTS idx_{prefix}assets_layer ON {prefix}assets(layer_id);
CREATE INDEX IF NOT EXISTS idx_{prefix}asset_animations_animation ON {prefix}asset_animations(animation_id);
CREATE INDEX IF NOT EXISTS idx_{prefix}character_assets_asset ON {prefix}character_assets(asset_id);

CREATE VIEW IF NOT EXISTS {prefix}character_layers AS
SELECT
    s.type_name AS type_name,
    p.path_type AS gender,
    v.variant_name AS variant,
    l.z_position AS z_index,
    CASE
        WHEN rtrim(p.path_value, '/') = '' THEN v.variant_name
        ELSE rtrim(p.path_value, '/') || '/' || v.variant_name
    END AS path
FROM {prefix}sheets s
JOIN {prefix}layers l ON l.sheet_id = s.sheet_id
JOIN {prefix}layer_paths p ON p.layer_id = l.layer_id
JOIN {prefix}variants v ON v.sheet_id = s.sheet_id;
"#,
        prefix = prefix
    );

    Ok(sql)
}

/// Generates SQL to drop the view and all tables in reverse dependency order.
///
/// # Errors
///
/// Returns [`SqliteError::InvalidPrefix`] if the prefix is invalid.
pub fn generate_drop_sql(prefix: &str) -> Result<String> {
    validate_prefix(prefix)?;

    let mut sql = format!("DROP VIEW IF EXISTS {prefix}character_layers;\n");
    for table in TABLES.iter().rev() {
        sql.push_str(&format!("DROP TABLE IF EXISTS {prefix}{table};\n"));
    }
    Ok(sql)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(prefix: &str) -> rusqlite::Connection {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        conn.execute_batch(&generate_schema_sql(prefix).unwrap())
            .unwrap();
        conn
    }

    #[test]
    fn test_valid_prefix() {
        assert!(validate_prefix("lpc_").is_ok());
        assert!(validate_prefix("test123").is_ok());
        assert!(validate_prefix("A_B_C").is_ok());
    }

    #[test]
    fn test_invalid_prefix() {
        assert!(validate_prefix("").is_err());
        assert!(validate_prefix("drop;--").is_err());
        assert!(validate_prefix("hello world").is_err());
        assert!(validate_prefix("test-prefix").is_err());
    }

    #[test]
    fn test_generate_schema_sql_contains_tables() {
        let sql = generate_schema_sql("lpc_").unwrap();
        for table in TABLES {
            assert!(
                sql.contains(&format!("lpc_{table} (")),
                "missing table {table}"
            );
        }
        assert!(sql.contains("lpc_character_layers"));
    }

    #[test]
    fn test_generate_drop_sql_contains_all_tables() {
        let sql = generate_drop_sql("lpc_").unwrap();
        for table in TABLES {
            assert!(sql.contains(&format!("DROP TABLE IF EXISTS lpc_{table};")));
        }
        assert!(sql.starts_with("DROP VIEW IF EXISTS lpc_character_layers;"));
        assert!(generate_drop_sql("").is_err());
    }

    #[test]
    fn test_schema_sql_runs_twice() {
        let conn = open("t_");
        conn.execute_batch(&generate_schema_sql("t_").unwrap())
            .unwrap();
    }

    #[test]
    fn test_asset_gender_check_constraint() {
        let conn = open("t_");
        conn.execute(
            "INSERT INTO t_render_layers (name, render_order) VALUES ('body', 0)",
            [],
        )
        .unwrap();
        let layer_id = conn.last_insert_rowid();

        assert!(conn
            .execute(
                "INSERT INTO t_assets (name, layer_id, gender, file_path) VALUES ('a', ?1, 'female', 'a.png')",
                [layer_id],
            )
            .is_ok());
        assert!(conn
            .execute(
                "INSERT INTO t_assets (name, layer_id, gender, file_path) VALUES ('b', ?1, 'child', 'b.png')",
                [layer_id],
            )
            .is_err());
    }

    #[test]
    fn test_asset_requires_existing_layer() {
        let conn = open("t_");
        assert!(conn
            .execute(
                "INSERT INTO t_assets (name, layer_id, file_path) VALUES ('a', 42, 'a.png')",
                [],
            )
            .is_err());
    }

    #[test]
    fn test_deleting_sheet_cascades() {
        let conn = open("t_");
        conn.execute(
            "INSERT INTO t_sheets (name, type_name) VALUES ('hat', 'hat')",
            [],
        )
        .unwrap();
        let sheet_id = conn.last_insert_rowid();
        conn.execute(
            "INSERT INTO t_layers (sheet_id, layer_name, z_position) VALUES (?1, 'layer_1', 5)",
            [sheet_id],
        )
        .unwrap();
        let layer_id = conn.last_insert_rowid();
        conn.execute(
            "INSERT INTO t_layer_paths (layer_id, path_type, path_value) VALUES (?1, 'male', 'hats/male')",
            [layer_id],
        )
        .unwrap();

        conn.execute("DELETE FROM t_sheets WHERE sheet_id = ?1", [sheet_id])
            .unwrap();

        let paths: i64 = conn
            .query_row("SELECT COUNT(*) FROM t_layer_paths", [], |r| r.get(0))
            .unwrap();
        assert_eq!(paths, 0);
    }
}
