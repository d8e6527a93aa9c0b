use std::path::Path;

use super::bundle::{
    fitted_columns, ClassicalEncoderFile, FeatureLoadError, FittedColumn, NumericScalers,
    CATEGORICAL_ENCODERS_FILE,
};
use super::EncodingError;
use crate::artifacts::read_json;
use crate::domain::{NormalizedInput, CATEGORICAL_FIELDS, NUMERIC_FIELDS};
use crate::geo::GeoFeatures;

/// Fitted one-hot/ordinal encoders and numeric scalers for the tree and linear
/// models.
///
/// Row layout: one-hot blocks, then ordinal columns, then the scaled numeric
/// columns. Both categorical groups follow [`CATEGORICAL_FIELDS`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassicalEncoder {
    one_hot: Vec<FittedColumn>,
    ordinal: Vec<FittedColumn>,
    scalers: NumericScalers,
}

impl ClassicalEncoder {
    pub fn load(dir: &Path) -> Result<Self, FeatureLoadError> {
        let file: ClassicalEncoderFile = read_json(&dir.join(CATEGORICAL_ENCODERS_FILE))?;
        let scalers = NumericScalers::load(dir)?;
        Self::from_parts(file, scalers)
    }

    pub(crate) fn from_parts(
        file: ClassicalEncoderFile,
        scalers: NumericScalers,
    ) -> Result<Self, FeatureLoadError> {
        Ok(Self {
            one_hot: fitted_columns(CATEGORICAL_ENCODERS_FILE, file.one_hot, &CATEGORICAL_FIELDS)?,
            ordinal: fitted_columns(CATEGORICAL_ENCODERS_FILE, file.ordinal, &CATEGORICAL_FIELDS)?,
            scalers,
        })
    }

    /// Number of columns in an encoded row.
    pub fn width(&self) -> usize {
        self.one_hot
            .iter()
            .map(|column| column.categories.len())
            .sum::<usize>()
            + self.ordinal.len()
            + NUMERIC_FIELDS.len()
    }

    pub fn encode(
        &self,
        input: &NormalizedInput,
        geo: &GeoFeatures,
    ) -> Result<Vec<f64>, EncodingError> {
        let mut values = Vec::with_capacity(self.width());

        for column in &self.one_hot {
            let position = locate(column, input)?;
            values.extend((0..column.categories.len()).map(|idx| {
                if idx == position {
                    1.0
                } else {
                    0.0
                }
            }));
        }

        for column in &self.ordinal {
            values.push(locate(column, input)? as f64);
        }

        for field in NUMERIC_FIELDS {
            values.push(self.scalers.scale(field, input.numeric(field, geo)));
        }

        Ok(values)
    }
}

pub(super) fn locate(column: &FittedColumn, input: &NormalizedInput) -> Result<usize, EncodingError> {
    let value = input.categorical(column.field).unwrap_or_default();
    column
        .position(value)
        .ok_or_else(|| EncodingError::UnknownCategory {
            field: column.field,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CategoricalField, NumericField};
    use crate::features::bundle::Scaler;
    use std::collections::BTreeMap;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn encoder() -> ClassicalEncoder {
        let file = ClassicalEncoderFile {
            one_hot: BTreeMap::from([
                ("SEXO".to_string(), strings(&["Hombre", "Mujer"])),
                ("ETNIA".to_string(), strings(&["Indigena", "Ninguna"])),
            ]),
            ordinal: BTreeMap::from([(
                "ESTADO_DEPTO".to_string(),
                strings(&["Antioquia", "Cauca"]),
            )]),
        };
        let scalers = NumericScalers::from_map(BTreeMap::from([(
            NumericField::ReportingYear,
            Scaler::Standard {
                mean: 2000.0,
                scale: 10.0,
            },
        )]));
        ClassicalEncoder::from_parts(file, scalers).expect("valid bundle")
    }

    fn input() -> NormalizedInput {
        NormalizedInput {
            region: "Cauca".to_string(),
            sex: "Mujer".to_string(),
            ethnicity: "Indigena".to_string(),
            disability: "Ninguna".to_string(),
            age_bracket: "entre 18 y 28".to_string(),
            reporting_year: 2010,
            prior_events: 4,
            north_south_km: None,
            east_west_km: None,
            total_km: None,
        }
    }

    #[test]
    fn encodes_one_hot_then_ordinal_then_numeric() {
        let geo = GeoFeatures {
            north_south_km: -100.0,
            east_west_km: -50.0,
            total_km: 111.8,
        };
        let values = encoder().encode(&input(), &geo).expect("encodes");

        assert_eq!(
            values,
            vec![0.0, 1.0, 1.0, 0.0, 1.0, 4.0, 1.0, -100.0, -50.0, 111.8]
        );
        assert_eq!(values.len(), encoder().width());
    }

    #[test]
    fn unknown_category_is_an_error() {
        let mut input = input();
        input.region = "Huila".to_string();

        let err = encoder()
            .encode(&input, &GeoFeatures::default())
            .expect_err("region not fitted");
        assert!(matches!(
            err,
            EncodingError::UnknownCategory {
                field: CategoricalField::Region,
                ..
            }
        ));
    }
}
