//! Record types shared by the classifier, the normalizer, and the writer.
//!
//! These are plain in-memory records; nothing here touches the filesystem
//! or the store. The types derive [`serde`] traits so they can be dumped as
//! JSON for inspection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Gender bucket an asset is drawn for.
///
/// Stored as the lowercase string returned by [`Gender::as_str`]; the
/// catalog's `assets.gender` column only accepts these three values.
///
/// # Examples
///
/// ```
/// use sprite_catalog_core::Gender;
///
/// assert_eq!(Gender::infer("female/torso/walk/robe.png"), Gender::Female);
/// assert_eq!(Gender::infer("male/legs/walk/pants.png"), Gender::Male);
/// assert_eq!(Gender::infer("weapon/slash/sword.png"), Gender::Unisex);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    /// Not tied to a body type (the default).
    #[default]
    Unisex,
}

impl Gender {
    /// Returns the lowercase storage form.
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Unisex => "unisex",
        }
    }

    /// Infers the gender from the segments of a relative path.
    ///
    /// Matching is by whole segment so that `female` never counts as `male`.
    /// A `female` segment wins over a `male` one.
    pub fn infer(rel_path: &str) -> Self {
        let mut male = false;
        for segment in rel_path.split(['/', '\\']) {
            if segment.eq_ignore_ascii_case("female") {
                return Gender::Female;
            }
            if segment.eq_ignore_ascii_case("male") {
                male = true;
            }
        }
        if male { Gender::Male } else { Gender::Unisex }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "unisex" => Ok(Gender::Unisex),
            other => Err(format!("unknown gender: {other}")),
        }
    }
}

/// An image file that matched both a layer and an animation keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedAsset {
    /// File stem (`leather` for `male/torso/walk/leather.png`).
    pub name: String,
    /// Root-relative, forward-slash path.
    pub file_path: String,
    /// Layer keyword from the vocabulary.
    pub layer: String,
    /// Animation keyword from the vocabulary.
    pub animation: String,
    pub gender: Gender,
}

/// One `(path_type, path_value)` entry of a `layer_*` mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerPath {
    /// Body-type key such as `male`, `female`, `muscular`.
    pub path_type: String,
    /// Directory fragment, forward-slash normalized.
    pub path_value: String,
}

/// A `layer_*` entry of a sheet definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerDefinition {
    /// The full key, e.g. `layer_1`.
    pub name: String,
    /// Render depth (`zPos`), 0 when absent or not an integer.
    pub z_position: i64,
    pub paths: Vec<LayerPath>,
}

/// A normalized sheet definition file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetDefinition {
    pub name: String,
    pub type_name: String,
    pub match_body_color: bool,
    pub layers: Vec<LayerDefinition>,
    /// Never empty: `["default"]` when the source lists none.
    pub variants: Vec<String>,
    /// Sheet-scoped animation names.
    pub animations: Vec<String>,
}

/// Flat `(type, gender, variant)` projection of a sheet definition.
///
/// This is the row shape of the `character_layers` reporting view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterLayerRecord {
    pub type_name: String,
    pub gender: String,
    pub variant: String,
    pub z_index: i64,
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_infer_prefers_female_segment() {
        assert_eq!(Gender::infer("body/female/walk.png"), Gender::Female);
        assert_eq!(Gender::infer("male/female/walk.png"), Gender::Female);
    }

    #[test]
    fn test_gender_infer_requires_whole_segment() {
        assert_eq!(Gender::infer("females_only/walk.png"), Gender::Unisex);
        assert_eq!(Gender::infer("torso/MALE/walk.png"), Gender::Male);
    }

    #[test]
    fn test_gender_round_trips_through_str() {
        for gender in [Gender::Male, Gender::Female, Gender::Unisex] {
            assert_eq!(gender.as_str().parse::<Gender>().unwrap(), gender);
        }
        assert!("child".parse::<Gender>().is_err());
    }

    #[test]
    fn test_gender_serializes_lowercase() {
        let json = serde_json::to_string(&Gender::Female).unwrap();
        assert_eq!(json, "\"female\"");
    }
}
