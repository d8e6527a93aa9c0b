use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Failure reading one persisted JSON artifact.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactFileError {
    #[error("failed to open {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactFileError> {
    let file = File::open(path).map_err(|source| ArtifactFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_reader(BufReader::new(file)).map_err(|source| ArtifactFileError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
