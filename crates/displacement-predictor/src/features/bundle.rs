use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::artifacts::{read_json, ArtifactFileError};
use crate::domain::{CategoricalField, NumericField};

pub(crate) const CATEGORICAL_ENCODERS_FILE: &str = "categorical_encoders.json";
pub(crate) const NUMERIC_SCALERS_FILE: &str = "numeric_scalers.json";
pub(crate) const EMBEDDING_INFO_FILE: &str = "embedding_info.json";

/// Failure loading a fitted encoder bundle.
#[derive(Debug, thiserror::Error)]
pub enum FeatureLoadError {
    #[error(transparent)]
    File(#[from] ArtifactFileError),
    #[error("{file} refers to unknown column '{column}'")]
    UnknownColumn { file: &'static str, column: String },
    #[error("{column} has no fitted categories")]
    EmptyCategories { column: CategoricalField },
    #[error("{column} has no embedding entry")]
    MissingEmbedding { column: CategoricalField },
    #[error("{column} embedding vocabulary ({vocab_size}) is smaller than its {categories} categories")]
    VocabularyTooSmall {
        column: CategoricalField,
        vocab_size: usize,
        categories: usize,
    },
}

/// Stored per-column numeric transform.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaler {
    /// `(x - mean) / scale`
    Standard { mean: f64, scale: f64 },
    /// `x * scale + min`
    MinMax { min: f64, scale: f64 },
    /// `(x - center) / scale`
    Robust { center: f64, scale: f64 },
}

impl Scaler {
    pub fn apply(&self, value: f64) -> f64 {
        match *self {
            Scaler::Standard { mean, scale } => (value - mean) / non_zero(scale),
            Scaler::MinMax { min, scale } => value * scale + min,
            Scaler::Robust { center, scale } => (value - center) / non_zero(scale),
        }
    }
}

// Constant training columns are stored with a zero spread; they scale by one.
fn non_zero(scale: f64) -> f64 {
    if scale == 0.0 {
        1.0
    } else {
        scale
    }
}

/// Fitted scalers keyed by numeric column. Columns without an entry pass through.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericScalers {
    scalers: BTreeMap<NumericField, Scaler>,
}

impl NumericScalers {
    pub fn load(dir: &Path) -> Result<Self, FeatureLoadError> {
        let raw: BTreeMap<String, Scaler> = read_json(&dir.join(NUMERIC_SCALERS_FILE))?;
        let mut scalers = BTreeMap::new();
        for (column, scaler) in raw {
            let field = NumericField::from_column(&column).ok_or(FeatureLoadError::UnknownColumn {
                file: NUMERIC_SCALERS_FILE,
                column,
            })?;
            scalers.insert(field, scaler);
        }
        Ok(Self { scalers })
    }

    pub fn from_map(scalers: BTreeMap<NumericField, Scaler>) -> Self {
        Self { scalers }
    }

    pub fn scale(&self, field: NumericField, value: f64) -> f64 {
        match self.scalers.get(&field) {
            Some(scaler) => scaler.apply(value),
            None => value,
        }
    }
}

/// Categories of one fitted column, in the order the encoder learned them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FittedColumn {
    pub field: CategoricalField,
    pub categories: Vec<String>,
}

impl FittedColumn {
    pub fn position(&self, value: &str) -> Option<usize> {
        self.categories.iter().position(|category| category == value)
    }
}

/// Resolve a column-keyed category map into fitted columns ordered by `order`.
pub(crate) fn fitted_columns(
    file: &'static str,
    raw: BTreeMap<String, Vec<String>>,
    order: &[CategoricalField],
) -> Result<Vec<FittedColumn>, FeatureLoadError> {
    let mut by_field = BTreeMap::new();
    for (column, categories) in raw {
        let field = CategoricalField::from_column(&column)
            .filter(|field| order.contains(field))
            .ok_or(FeatureLoadError::UnknownColumn { file, column })?;
        if categories.is_empty() {
            return Err(FeatureLoadError::EmptyCategories { column: field });
        }
        by_field.insert(field, categories);
    }

    Ok(order
        .iter()
        .filter_map(|field| {
            by_field.remove(field).map(|categories| FittedColumn {
                field: *field,
                categories,
            })
        })
        .collect())
}

/// Persisted layout of the classical encoder bundle.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ClassicalEncoderFile {
    #[serde(default)]
    pub(crate) one_hot: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub(crate) ordinal: BTreeMap<String, Vec<String>>,
}

/// Embedding table dimensions recorded when the network was trained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct EmbeddingSpec {
    pub vocab_size: usize,
    pub embedding_dim: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalers_apply_their_stored_transform() {
        let standard = Scaler::Standard {
            mean: 2000.0,
            scale: 10.0,
        };
        assert_eq!(standard.apply(2020.0), 2.0);

        let min_max = Scaler::MinMax {
            min: -0.5,
            scale: 0.01,
        };
        assert!((min_max.apply(100.0) - 0.5).abs() < 1e-12);

        let robust = Scaler::Robust {
            center: 3.0,
            scale: 0.0,
        };
        assert_eq!(robust.apply(5.0), 2.0);
    }

    #[test]
    fn scaler_kind_is_read_from_tag() {
        let scaler: Scaler =
            serde_json::from_str(r#"{"kind": "min_max", "min": 0.0, "scale": 0.5}"#)
                .expect("parses");
        assert_eq!(
            scaler,
            Scaler::MinMax {
                min: 0.0,
                scale: 0.5
            }
        );
    }

    #[test]
    fn fitted_columns_follow_declared_order() {
        let raw = BTreeMap::from([
            ("SEXO".to_string(), vec!["Hombre".to_string()]),
            ("CICLO_VITAL".to_string(), vec!["ND".to_string()]),
            ("ETNIA".to_string(), vec!["Ninguna".to_string()]),
        ]);
        let order = crate::domain::CATEGORICAL_FIELDS;

        let columns = fitted_columns(CATEGORICAL_ENCODERS_FILE, raw, &order).expect("resolves");
        let fields: Vec<_> = columns.iter().map(|column| column.field).collect();
        assert_eq!(
            fields,
            vec![
                CategoricalField::Sex,
                CategoricalField::Ethnicity,
                CategoricalField::AgeBracket
            ]
        );
    }

    #[test]
    fn fitted_columns_reject_unknown_columns() {
        let raw = BTreeMap::from([("MUNICIPIO".to_string(), vec!["Cali".to_string()])]);
        let err = fitted_columns(
            CATEGORICAL_ENCODERS_FILE,
            raw,
            &crate::domain::CATEGORICAL_FIELDS,
        )
        .expect_err("unknown column");
        assert!(matches!(err, FeatureLoadError::UnknownColumn { column, .. } if column == "MUNICIPIO"));
    }
}
