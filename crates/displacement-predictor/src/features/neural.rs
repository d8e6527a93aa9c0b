use std::collections::BTreeMap;
use std::path::Path;

use super::bundle::{
    fitted_columns, EmbeddingSpec, FeatureLoadError, FittedColumn, NumericScalers,
    CATEGORICAL_ENCODERS_FILE, EMBEDDING_INFO_FILE,
};
use super::classical::locate;
use super::EncodingError;
use crate::artifacts::read_json;
use crate::domain::{CategoricalField, NormalizedInput, CATEGORICAL_FIELDS, NUMERIC_FIELDS};
use crate::geo::GeoFeatures;

/// Per-column integer encoders feeding the embedding layers, plus the numeric
/// scalers of the dense input.
#[derive(Debug, Clone, PartialEq)]
pub struct NeuralEncoder {
    columns: Vec<FittedColumn>,
    embeddings: BTreeMap<CategoricalField, EmbeddingSpec>,
    scalers: NumericScalers,
}

impl NeuralEncoder {
    pub fn load(dir: &Path) -> Result<Self, FeatureLoadError> {
        let encoders: BTreeMap<String, Vec<String>> =
            read_json(&dir.join(CATEGORICAL_ENCODERS_FILE))?;
        let embeddings: BTreeMap<String, EmbeddingSpec> = read_json(&dir.join(EMBEDDING_INFO_FILE))?;
        let scalers = NumericScalers::load(dir)?;
        Self::from_parts(encoders, embeddings, scalers)
    }

    pub(crate) fn from_parts(
        encoders: BTreeMap<String, Vec<String>>,
        embeddings: BTreeMap<String, EmbeddingSpec>,
        scalers: NumericScalers,
    ) -> Result<Self, FeatureLoadError> {
        let columns = fitted_columns(CATEGORICAL_ENCODERS_FILE, encoders, &CATEGORICAL_FIELDS)?;

        let mut specs = BTreeMap::new();
        for (column, spec) in embeddings {
            let field = CategoricalField::from_column(&column).ok_or(
                FeatureLoadError::UnknownColumn {
                    file: EMBEDDING_INFO_FILE,
                    column,
                },
            )?;
            specs.insert(field, spec);
        }

        for column in &columns {
            let spec = specs
                .get(&column.field)
                .ok_or(FeatureLoadError::MissingEmbedding {
                    column: column.field,
                })?;
            if spec.vocab_size < column.categories.len() {
                return Err(FeatureLoadError::VocabularyTooSmall {
                    column: column.field,
                    vocab_size: spec.vocab_size,
                    categories: column.categories.len(),
                });
            }
        }

        Ok(Self {
            columns,
            embeddings: specs,
            scalers,
        })
    }

    /// Categorical inputs in the order the network consumes them.
    pub fn fields(&self) -> impl Iterator<Item = CategoricalField> + '_ {
        self.columns.iter().map(|column| column.field)
    }

    pub fn embedding(&self, field: CategoricalField) -> Option<EmbeddingSpec> {
        self.embeddings.get(&field).copied()
    }

    pub fn encode(
        &self,
        input: &NormalizedInput,
        geo: &GeoFeatures,
    ) -> Result<(Vec<(CategoricalField, usize)>, Vec<f64>), EncodingError> {
        let indices = self
            .columns
            .iter()
            .map(|column| locate(column, input).map(|index| (column.field, index)))
            .collect::<Result<Vec<_>, _>>()?;

        let numeric = NUMERIC_FIELDS
            .into_iter()
            .map(|field| self.scalers.scale(field, input.numeric(field, geo)))
            .collect();

        Ok((indices, numeric))
    }
}
