//! Sheet definition normalization.
//!
//! Maps one parsed sheet-definition JSON tree to a [`SheetDefinition`]. The
//! recognized keys are:
//!
//! - `type_name`: required string; definitions without it yield `None`.
//! - `name`: optional, defaults to `type_name`.
//! - `match_body_color`: optional bool, defaults to `false`.
//! - `variants`: list of strings, `["default"]` when absent or empty.
//! - `animations`: optional list of sheet-scoped animation names.
//! - `layer_*`: mappings with an optional integer `zPos` and any number of
//!   `body type → path` string entries.
//!
//! Malformed entries (a `layer_*` value that is not a mapping, a path that is
//! not a string, a non-string variant) are skipped, never fatal.
//!
//! # Examples
//!
//! ```
//! use serde_json::json;
//! use sprite_catalog_core::normalize_definition;
//!
//! let def = normalize_definition(&json!({
//!     "type_name": "hat",
//!     "variants": ["red", "blue"],
//!     "layer_hat": { "zPos": 5, "male": "hats/male", "female": "hats/female" }
//! }))
//! .unwrap();
//!
//! let records = def.flatten();
//! assert_eq!(records.len(), 4);
//! assert_eq!(records[0].path, "hats/male/red");
//! ```

use serde_json::Value;

use crate::classify::normalize_path;
use crate::types::{CharacterLayerRecord, LayerDefinition, LayerPath, SheetDefinition};

/// Variant used when a definition lists none.
pub const DEFAULT_VARIANT: &str = "default";

const LAYER_KEY_PREFIX: &str = "layer_";
const Z_POSITION_KEY: &str = "zPos";

/// Normalizes a parsed sheet definition.
///
/// Returns `None` when the tree is not an object or has no non-empty string
/// `type_name`.
pub fn normalize_definition(tree: &Value) -> Option<SheetDefinition> {
    let object = tree.as_object()?;

    let type_name = object
        .get("type_name")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())?
        .to_string();

    let name = object
        .get("name")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map_or_else(|| type_name.clone(), str::to_string);

    let match_body_color = object
        .get("match_body_color")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let mut variants = string_list(object.get("variants"));
    if variants.is_empty() {
        variants.push(DEFAULT_VARIANT.to_string());
    }

    let animations = string_list(object.get("animations"));

    let layers = object
        .iter()
        .filter(|(key, _)| key.starts_with(LAYER_KEY_PREFIX))
        .filter_map(|(key, value)| normalize_layer(key, value))
        .collect();

    Some(SheetDefinition {
        name,
        type_name,
        match_body_color,
        layers,
        variants,
        animations,
    })
}

fn normalize_layer(key: &str, value: &Value) -> Option<LayerDefinition> {
    let mapping = value.as_object()?;

    let z_position = mapping
        .get(Z_POSITION_KEY)
        .and_then(Value::as_i64)
        .unwrap_or(0);

    let paths = mapping
        .iter()
        .filter(|(path_type, _)| path_type.as_str() != Z_POSITION_KEY)
        .filter_map(|(path_type, path)| {
            path.as_str().map(|p| LayerPath {
                path_type: path_type.clone(),
                path_value: normalize_path(p),
            })
        })
        .collect();

    Some(LayerDefinition {
        name: key.to_string(),
        z_position,
        paths,
    })
}

/// Collects the string entries of an optional JSON array.
fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Joins a layer path and a variant with exactly one `/`.
pub fn join_variant_path(path_value: &str, variant: &str) -> String {
    let base = normalize_path(path_value);
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        variant.to_string()
    } else {
        format!("{base}/{variant}")
    }
}

impl SheetDefinition {
    /// Expands the definition into one record per `(layer, body type,
    /// variant)` triple, in layer → body type → variant order.
    pub fn flatten(&self) -> Vec<CharacterLayerRecord> {
        let mut records = Vec::new();
        for layer in &self.layers {
            for path in &layer.paths {
                for variant in &self.variants {
                    records.push(CharacterLayerRecord {
                        type_name: self.type_name.clone(),
                        gender: path.path_type.clone(),
                        variant: variant.clone(),
                        z_index: layer.z_position,
                        path: join_variant_path(&path.path_value, variant),
                    });
                }
            }
        }
        records
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(gender: &str, variant: &str, path: &str) -> CharacterLayerRecord {
        CharacterLayerRecord {
            type_name: "hat".to_string(),
            gender: gender.to_string(),
            variant: variant.to_string(),
            z_index: 5,
            path: path.to_string(),
        }
    }

    #[test]
    fn test_hat_definition_flattens_to_four_records() {
        let def = normalize_definition(&json!({
            "type_name": "hat",
            "variants": ["red", "blue"],
            "layer_hat": { "zPos": 5, "male": "hats/male", "female": "hats/female" }
        }))
        .unwrap();

        assert_eq!(
            def.flatten(),
            vec![
                record("male", "red", "hats/male/red"),
                record("male", "blue", "hats/male/blue"),
                record("female", "red", "hats/female/red"),
                record("female", "blue", "hats/female/blue"),
            ]
        );
    }

    #[test]
    fn test_missing_type_name_yields_none() {
        assert!(normalize_definition(&json!({ "variants": ["red"] })).is_none());
        assert!(normalize_definition(&json!({ "type_name": "" })).is_none());
        assert!(normalize_definition(&json!({ "type_name": 3 })).is_none());
        assert!(normalize_definition(&json!(["not", "an", "object"])).is_none());
    }

    #[test]
    fn test_variants_default_when_absent_or_empty() {
        let def = normalize_definition(&json!({ "type_name": "cape" })).unwrap();
        assert_eq!(def.variants, vec![DEFAULT_VARIANT]);

        let def = normalize_definition(&json!({ "type_name": "cape", "variants": [] })).unwrap();
        assert_eq!(def.variants, vec![DEFAULT_VARIANT]);
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let def = normalize_definition(&json!({
            "type_name": "belt",
            "variants": ["black", 7],
            "layer_1": "not a mapping",
            "layer_2": { "male": "belt/male", "female": ["nested"], "child": null }
        }))
        .unwrap();

        assert_eq!(def.variants, vec!["black"]);
        assert_eq!(def.layers.len(), 1);
        assert_eq!(def.layers[0].name, "layer_2");
        assert_eq!(def.layers[0].z_position, 0);
        assert_eq!(
            def.layers[0].paths,
            vec![LayerPath {
                path_type: "male".to_string(),
                path_value: "belt/male".to_string(),
            }]
        );
    }

    #[test]
    fn test_optional_sheet_fields() {
        let def = normalize_definition(&json!({
            "name": "Leather Armour",
            "type_name": "torso",
            "match_body_color": true,
            "animations": ["walk", "slash", 4]
        }))
        .unwrap();
        assert_eq!(def.name, "Leather Armour");
        assert!(def.match_body_color);
        assert_eq!(def.animations, vec!["walk", "slash"]);

        let def = normalize_definition(&json!({ "type_name": "torso" })).unwrap();
        assert_eq!(def.name, "torso");
        assert!(!def.match_body_color);
    }

    #[test]
    fn test_non_integer_zpos_defaults_to_zero() {
        let def = normalize_definition(&json!({
            "type_name": "eyes",
            "layer_1": { "zPos": "high", "male": "eyes/male" }
        }))
        .unwrap();
        assert_eq!(def.layers[0].z_position, 0);
    }

    #[test]
    fn test_join_variant_path() {
        assert_eq!(join_variant_path("hats/male/", "red"), "hats/male/red");
        assert_eq!(join_variant_path("hats\\male", "red"), "hats/male/red");
        assert_eq!(join_variant_path("", "red"), "red");
    }
}
