use ndarray::Array2;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::{Session, SessionInputValue};
use ort::value::Value;
use parking_lot::Mutex;
use std::fmt;
use std::path::{Path, PathBuf};

use super::artifact::{ArtifactError, Scorer};
use crate::domain::CategoricalField;
use crate::features::EncodedFeatureVector;

/// Graph input carrying the scaled numeric columns of a network.
pub const NUMERIC_INPUT: &str = "numeric";

/// Output preferred when a graph exposes both a label and class scores.
const PROBABILITIES_OUTPUT: &str = "probabilities";

/// An exported classifier graph executed by ONNX Runtime.
///
/// Classical graphs take a single `[1, width]` float input. Network graphs
/// take one `[1, 1]` int64 input per categorical column, named after the
/// column, plus a `[1, 5]` float input named `numeric`.
pub struct OnnxModel {
    path: PathBuf,
    session: Mutex<Session>,
    input_names: Vec<String>,
    output_name: String,
}

impl OnnxModel {
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        if !path.exists() {
            return Err(ArtifactError::Missing(path.to_path_buf()));
        }
        let session = Session::builder()
            .map_err(|err| load_error(path, err))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|err| load_error(path, err))?
            .commit_from_file(path)
            .map_err(|err| load_error(path, err))?;

        let input_names: Vec<String> = session
            .inputs
            .iter()
            .map(|input| input.name.clone())
            .collect();
        let output_name = session
            .outputs
            .iter()
            .find(|output| output.name == PROBABILITIES_OUTPUT)
            .or_else(|| session.outputs.first())
            .map(|output| output.name.clone())
            .ok_or(ArtifactError::NoOutput)?;

        tracing::debug!(
            path = %path.display(),
            inputs = ?input_names,
            output = %output_name,
            "onnx session ready"
        );

        Ok(Self {
            path: path.to_path_buf(),
            session: Mutex::new(session),
            input_names,
            output_name,
        })
    }

    fn feeds(
        &self,
        encoded: &EncodedFeatureVector,
    ) -> Result<Vec<(String, SessionInputValue<'static>)>, ArtifactError> {
        match encoded {
            EncodedFeatureVector::Classical { values } => {
                let [name] = self.input_names.as_slice() else {
                    return Err(ArtifactError::InputCount {
                        expected: 1,
                        found: self.input_names.len(),
                    });
                };
                let row: Vec<f32> = values.iter().map(|value| *value as f32).collect();
                let tensor = float_row(row)?;
                Ok(vec![(name.clone(), tensor)])
            }
            EncodedFeatureVector::Neural { indices, numeric } => {
                if self.input_names.len() != indices.len() + 1 {
                    return Err(ArtifactError::InputCount {
                        expected: self.input_names.len(),
                        found: indices.len() + 1,
                    });
                }
                self.input_names
                    .iter()
                    .map(|name| {
                        if name == NUMERIC_INPUT {
                            let row = numeric.iter().map(|value| *value as f32).collect();
                            return Ok((name.clone(), float_row(row)?));
                        }
                        let index = CategoricalField::from_column(name)
                            .and_then(|field| {
                                indices
                                    .iter()
                                    .find(|(encoded, _)| *encoded == field)
                                    .map(|(_, index)| *index)
                            })
                            .ok_or_else(|| ArtifactError::UnknownInput(name.clone()))?;
                        let array = Array2::from_shape_vec((1, 1), vec![index as i64])?;
                        let tensor = Value::from_array(array).map_err(runtime)?;
                        Ok((name.clone(), tensor.into()))
                    })
                    .collect()
            }
        }
    }
}

impl Scorer for OnnxModel {
    fn raw_scores(&self, encoded: &EncodedFeatureVector) -> Result<Vec<f32>, ArtifactError> {
        let feeds = self.feeds(encoded)?;

        let mut session = self.session.lock();
        let outputs = session.run(feeds).map_err(runtime)?;
        let output = outputs
            .get(self.output_name.as_str())
            .ok_or(ArtifactError::NoOutput)?;
        let (_, scores) = output.try_extract_tensor::<f32>().map_err(runtime)?;
        Ok(scores.to_vec())
    }
}

impl fmt::Debug for OnnxModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnnxModel")
            .field("path", &self.path)
            .field("inputs", &self.input_names)
            .field("output", &self.output_name)
            .finish()
    }
}

fn float_row(row: Vec<f32>) -> Result<SessionInputValue<'static>, ArtifactError> {
    let array = Array2::from_shape_vec((1, row.len()), row)?;
    let tensor = Value::from_array(array).map_err(runtime)?;
    Ok(tensor.into())
}

fn load_error(path: &Path, err: impl fmt::Display) -> ArtifactError {
    ArtifactError::Load {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

fn runtime(err: impl fmt::Display) -> ArtifactError {
    ArtifactError::Runtime(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_reported_before_building_a_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("XGBoost.onnx");

        match OnnxModel::load(&path) {
            Err(ArtifactError::Missing(missing)) => assert_eq!(missing, path),
            other => panic!("expected missing file, got {other:?}"),
        }
    }

    #[test]
    fn unreadable_graph_fails_to_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("Deep.onnx");
        std::fs::write(&path, b"not a protobuf graph").expect("write");

        assert!(matches!(
            OnnxModel::load(&path),
            Err(ArtifactError::Load { .. })
        ));
    }
}
