#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use displacement_predictor::domain::RawInput;

pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

pub fn artifacts_dir() -> PathBuf {
    fixtures_dir().join("artifacts")
}

pub fn registry_csv() -> PathBuf {
    fixtures_dir().join("registry.csv")
}

/// Copy the fixture artifacts into `target`, leaving out the `skip` paths
/// (relative, e.g. `classical/Random_Forest.onnx`).
pub fn copy_artifacts(target: &Path, skip: &[&str]) {
    for family in ["classical", "neural"] {
        let source_dir = artifacts_dir().join(family);
        let target_dir = target.join(family);
        fs::create_dir_all(&target_dir).expect("create family dir");

        for entry in fs::read_dir(&source_dir).expect("read fixtures") {
            let entry = entry.expect("dir entry");
            let name = entry.file_name().to_string_lossy().into_owned();
            if skip.contains(&format!("{family}/{name}").as_str()) {
                continue;
            }
            fs::copy(entry.path(), target_dir.join(&name)).expect("copy fixture");
        }
    }
}

/// Request matching exactly one registry row.
pub fn antioquia_input() -> RawInput {
    RawInput {
        region: "Antioquia".to_string(),
        sex: "Mujer".to_string(),
        ethnicity: "Ninguna".to_string(),
        disability: "Ninguna".to_string(),
        age_bracket: "entre 18 y 28".to_string(),
        reporting_year: 2019,
        prior_events: 12,
        north_south_km: None,
        east_west_km: None,
        total_km: None,
    }
}

/// Request spelled the legacy way, matching three registry rows.
pub fn cauca_input() -> RawInput {
    RawInput {
        region: "Cauca".to_string(),
        sex: "Hombre".to_string(),
        ethnicity: "Indigena (Acreditado RA)".to_string(),
        disability: "Ninguna".to_string(),
        age_bracket: "entre 29 y 60".to_string(),
        reporting_year: 2008,
        prior_events: 3,
        north_south_km: None,
        east_west_km: None,
        total_km: None,
    }
}

pub fn amazonas_input() -> RawInput {
    RawInput {
        region: "Amazonas".to_string(),
        sex: "Hombre".to_string(),
        ethnicity: "Indigena".to_string(),
        disability: "Fisica".to_string(),
        age_bracket: "entre 60 y 110".to_string(),
        reporting_year: 1990,
        prior_events: 300,
        north_south_km: None,
        east_west_km: None,
        total_km: None,
    }
}
