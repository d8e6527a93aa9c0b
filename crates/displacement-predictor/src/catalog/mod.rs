//! Canonical category values, substitution of legacy spellings, and rejection of
//! placeholder values.

mod tables;

use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::{CategoricalField, NormalizedInput, RawInput};
use crate::geo;
use crate::validation::{ExternalRecord, ExternalRecordSet};

pub const MIN_YEAR: i32 = 1985;
pub const MAX_YEAR: i32 = 2025;
pub const MAX_PREDICTION_YEAR: i32 = 2030;
pub const MIN_EVENTS: i64 = 1;
pub const MAX_EVENTS: i64 = 10_000;

const REQUEST_FIELDS: [CategoricalField; 5] = [
    CategoricalField::Region,
    CategoricalField::Sex,
    CategoricalField::Ethnicity,
    CategoricalField::Disability,
    CategoricalField::AgeBracket,
];

/// Reason a record could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("{field} value '{value}' is not usable for prediction")]
    Disallowed {
        field: CategoricalField,
        value: String,
    },
    #[error("{field} value '{value}' is not a recognized category")]
    Unrecognized {
        field: CategoricalField,
        value: String,
    },
}

/// Canonicalize every categorical field of `raw`, failing the whole record on
/// the first disallowed or unrecognized value.
pub fn normalize(raw: &RawInput) -> Result<NormalizedInput, NormalizeError> {
    let mut canonical: BTreeMap<CategoricalField, String> = BTreeMap::new();

    for field in REQUEST_FIELDS {
        let value = raw.categorical(field).unwrap_or_default();
        let value = canonical_value(field, value)?;
        if !is_enumerated(field, value) {
            return Err(NormalizeError::Unrecognized {
                field,
                value: value.to_string(),
            });
        }
        canonical.insert(field, value.to_string());
    }

    let mut take = |field: CategoricalField| canonical.remove(&field).unwrap_or_default();

    Ok(NormalizedInput {
        region: take(CategoricalField::Region),
        sex: take(CategoricalField::Sex),
        ethnicity: take(CategoricalField::Ethnicity),
        disability: take(CategoricalField::Disability),
        age_bracket: take(CategoricalField::AgeBracket),
        reporting_year: raw.reporting_year,
        prior_events: raw.prior_events,
        north_south_km: raw.north_south_km,
        east_west_km: raw.east_west_km,
        total_km: raw.total_km,
    })
}

fn canonical_value(field: CategoricalField, value: &str) -> Result<&str, NormalizeError> {
    let value = tables::substitute(field, value);
    if tables::is_disallowed(field, value) {
        return Err(NormalizeError::Disallowed {
            field,
            value: value.to_string(),
        });
    }
    Ok(value)
}

fn is_enumerated(field: CategoricalField, value: &str) -> bool {
    match field {
        CategoricalField::Region => geo::is_known_region(value),
        CategoricalField::Sex => tables::SEX_VALUES.contains(&value),
        CategoricalField::Ethnicity => tables::ETHNICITY_VALUES.contains(&value),
        CategoricalField::Disability => tables::DISABILITY_VALUES.contains(&value),
        CategoricalField::AgeBracket => tables::AGE_BRACKET_VALUES.contains(&value),
        // Event types are open-ended free text on registry records.
        CategoricalField::EventType => true,
    }
}

/// Inclusive numeric bounds offered to form builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
    pub max_prediction: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventRange {
    pub min: i64,
    pub max: i64,
}

/// Enumerated values accepted by [`normalize`], keyed by column name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidValues {
    pub categorical: BTreeMap<&'static str, Vec<&'static str>>,
    pub year: YearRange,
    pub events: EventRange,
}

pub fn valid_values() -> ValidValues {
    let mut regions: Vec<&'static str> = geo::region_names().collect();
    regions.sort_unstable();

    let mut categorical = BTreeMap::new();
    categorical.insert(CategoricalField::Region.column(), regions);
    categorical.insert(CategoricalField::Sex.column(), tables::SEX_VALUES.to_vec());
    categorical.insert(
        CategoricalField::Ethnicity.column(),
        tables::ETHNICITY_VALUES.to_vec(),
    );
    categorical.insert(
        CategoricalField::Disability.column(),
        tables::DISABILITY_VALUES.to_vec(),
    );
    categorical.insert(
        CategoricalField::AgeBracket.column(),
        tables::AGE_BRACKET_VALUES.to_vec(),
    );

    ValidValues {
        categorical,
        year: YearRange {
            min: MIN_YEAR,
            max: MAX_YEAR,
            max_prediction: MAX_PREDICTION_YEAR,
        },
        events: EventRange {
            min: MIN_EVENTS,
            max: MAX_EVENTS,
        },
    }
}

/// Result of checking a reporting year against the supported window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearCheck {
    pub valid: bool,
    pub warning: Option<String>,
}

pub fn check_year(year: i32) -> YearCheck {
    if !(MIN_YEAR..=MAX_PREDICTION_YEAR).contains(&year) {
        return YearCheck {
            valid: false,
            warning: Some(format!(
                "Año debe estar entre {MIN_YEAR} y {MAX_PREDICTION_YEAR}"
            )),
        };
    }

    if year > MAX_YEAR {
        return YearCheck {
            valid: true,
            warning: Some(format!("⚠ Predicción para año futuro ({year})")),
        };
    }

    YearCheck {
        valid: true,
        warning: None,
    }
}

/// Apply the request substitutions to fetched registry records and drop the ones
/// carrying a placeholder value in any categorical column.
pub fn clean_records(records: ExternalRecordSet) -> ExternalRecordSet {
    records
        .into_iter()
        .filter_map(clean_record)
        .collect()
}

fn clean_record(mut record: ExternalRecord) -> Option<ExternalRecord> {
    for field in REQUEST_FIELDS
        .into_iter()
        .chain([CategoricalField::EventType])
    {
        let Some(value) = record.field(field.column()).map(str::to_string) else {
            continue;
        };
        let canonical = canonical_value(field, &value).ok()?;
        if canonical != value {
            let canonical = canonical.to_string();
            record.set_field(field.column(), canonical);
        }
    }
    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn raw_input() -> RawInput {
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

    #[test]
    fn substitutes_legacy_spellings() {
        let mut raw = raw_input();
        raw.region = "Nari\u{fffd}o".to_string();
        raw.ethnicity = "Gitano (RROM) (Acreditado RA)".to_string();
        raw.age_bracket = "entre 61 y 100".to_string();

        let normalized = normalize(&raw).expect("normalizes");
        assert_eq!(normalized.region, "Nariño");
        assert_eq!(normalized.ethnicity, "Gitano(a)");
        assert_eq!(normalized.age_bracket, "entre 60 y 110");
    }

    #[test]
    fn accreditation_variants_collapse() {
        for variant in [
            "Negro(a) o Afrocolombiano(a)",
            "Negro (Acreditado RA)",
            "Afrocolombiano (Acreditado RA)",
        ] {
            let mut raw = raw_input();
            raw.ethnicity = variant.to_string();
            assert_eq!(
                normalize(&raw).expect("normalizes").ethnicity,
                "Afrocolombiano(a)"
            );
        }
    }

    #[test]
    fn rejects_undefined_region() {
        let mut raw = raw_input();
        raw.region = "SIN DEFINIR".to_string();

        match normalize(&raw) {
            Err(NormalizeError::Disallowed { field, value }) => {
                assert_eq!(field, CategoricalField::Region);
                assert_eq!(value, "SIN DEFINIR");
            }
            other => panic!("expected disallowed region, got {other:?}"),
        }
    }

    #[test]
    fn rejects_each_placeholder_value() {
        let cases: [(fn(&mut RawInput), CategoricalField); 3] = [
            (|raw| raw.sex = "No Informa".to_string(), CategoricalField::Sex),
            (
                |raw| raw.disability = "Por Establecer".to_string(),
                CategoricalField::Disability,
            ),
            (
                |raw| raw.age_bracket = "ND".to_string(),
                CategoricalField::AgeBracket,
            ),
        ];

        for (mutate, expected) in cases {
            let mut raw = raw_input();
            mutate(&mut raw);
            match normalize(&raw) {
                Err(NormalizeError::Disallowed { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected {expected} to be disallowed, got {other:?}"),
            }
        }
    }

    #[test]
    fn rejects_values_outside_enumeration() {
        let mut raw = raw_input();
        raw.disability = "Desconocida".to_string();

        assert!(matches!(
            normalize(&raw),
            Err(NormalizeError::Unrecognized {
                field: CategoricalField::Disability,
                ..
            })
        ));
    }

    #[test]
    fn normalization_is_idempotent() {
        let mut raw = raw_input();
        raw.region = "Archip.De San Andres, Providencia y Santa Catalina".to_string();
        raw.ethnicity = "Palenquero (Acreditado RA)".to_string();
        raw.age_bracket = "entre 29 y 60".to_string();
        raw.total_km = Some(12.5);

        let once = normalize(&raw).expect("normalizes");
        let twice = normalize(&RawInput::from(&once)).expect("normalizes again");
        assert_eq!(once, twice);
    }

    #[test]
    fn valid_values_lists_every_request_field() {
        let values = valid_values();
        assert_eq!(values.categorical.len(), 5);
        assert_eq!(values.categorical["ESTADO_DEPTO"].len(), 33);
        assert_eq!(values.categorical["SEXO"].len(), 4);
        assert_eq!(values.year.max_prediction, 2030);
    }

    #[test]
    fn every_enumerated_value_normalizes() {
        let values = valid_values();
        for region in &values.categorical["ESTADO_DEPTO"] {
            let mut raw = raw_input();
            raw.region = region.to_string();
            assert!(normalize(&raw).is_ok(), "{region} should normalize");
        }
    }

    #[test]
    fn year_check_flags_future_and_out_of_range_years() {
        assert_eq!(
            check_year(2010),
            YearCheck {
                valid: true,
                warning: None
            }
        );

        let future = check_year(2027);
        assert!(future.valid);
        assert!(future.warning.expect("warning").contains("2027"));

        assert!(!check_year(1984).valid);
        assert!(!check_year(2031).valid);
    }

    #[test]
    fn clean_records_substitutes_and_drops_placeholders() {
        let records: ExternalRecordSet = vec![
            ExternalRecord::from_pairs([
                ("estado_depto", "Nari\u{fffd}o"),
                ("hecho", "Desaparici\u{fffd}n forzada"),
            ]),
            ExternalRecord::from_pairs([("ESTADO_DEPTO", "Cauca"), ("HECHO", "Sin informacion")]),
            ExternalRecord::from_pairs([("sexo", "No Informa"), ("hecho", "Homicidio")]),
            ExternalRecord::from_pairs([("hecho", "Desplazamiento forzado")]),
        ]
        .into_iter()
        .collect();

        let cleaned = clean_records(records);
        assert_eq!(cleaned.len(), 2);
        let first = &cleaned.records()[0];
        assert_eq!(first.field("ESTADO_DEPTO"), Some("Nariño"));
        assert_eq!(first.field("hecho"), Some("Desaparición forzada"));
    }
}
