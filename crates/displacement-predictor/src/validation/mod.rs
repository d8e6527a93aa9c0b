//! Cross-checks a prediction against registry records sharing the request's
//! categorical and numeric profile.

mod record;

pub use record::{ExternalRecord, ExternalRecordSet};

use serde::Serialize;

use crate::domain::{class_label, DISPLACEMENT_CLASS, OTHER_CLASS};
use crate::models::PredictionResult;

/// Free-text column describing the recorded victimizing event.
pub const EVENT_FIELD: &str = "hecho";

/// Phrase identifying a forced-displacement event, matched case-insensitively.
pub const DISPLACEMENT_PHRASE: &str = "desplazamiento forzado";

/// How the fetched records relate to the prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// No registry record shares the request profile; the prediction stands
    /// unvalidated.
    NoMatch,
    /// Exactly one record shares the profile.
    ExactMatch { real_value: u8, is_correct: bool },
    /// Several records share the profile, so the registry cannot settle the
    /// class at this granularity.
    Ambiguous {
        total: usize,
        displacement_count: usize,
        other_count: usize,
    },
}

impl ValidationOutcome {
    pub fn match_type(&self) -> &'static str {
        match self {
            ValidationOutcome::NoMatch => "no_match",
            ValidationOutcome::ExactMatch { .. } => "exact_match",
            ValidationOutcome::Ambiguous { .. } => "ambiguous",
        }
    }

    pub fn report(&self) -> ValidationReport {
        match *self {
            ValidationOutcome::NoMatch => ValidationReport {
                match_type: self.match_type(),
                message: "⚠ No hay coincidencia exacta en el dataset".to_string(),
                submessage: Some("Se realizará la predicción sin validación".to_string()),
                real_value: None,
                real_label: None,
                is_correct: None,
                displacement_count: None,
                other_count: None,
            },
            ValidationOutcome::ExactMatch {
                real_value,
                is_correct,
            } => ValidationReport {
                match_type: self.match_type(),
                message: "✓ Coincidencia encontrada en el dataset".to_string(),
                submessage: None,
                real_value: Some(real_value),
                real_label: Some(class_label(real_value)),
                is_correct: Some(is_correct),
                displacement_count: None,
                other_count: None,
            },
            ValidationOutcome::Ambiguous {
                total,
                displacement_count,
                other_count,
            } => ValidationReport {
                match_type: self.match_type(),
                message: format!("⚠ Ambigüedad detectada ({total} coincidencias)"),
                submessage: Some(
                    "Se requiere mayor granularidad en los datos (ej: información a nivel municipal)"
                        .to_string(),
                ),
                real_value: None,
                real_label: None,
                is_correct: None,
                displacement_count: Some(displacement_count),
                other_count: Some(other_count),
            },
        }
    }
}

/// Serialized view of a [`ValidationOutcome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub match_type: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submessage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_value: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_label: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub displacement_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_count: Option<usize>,
}

/// Classify the fetched records against `prediction`.
///
/// Only a single record counts as an exact match; any larger set is ambiguous
/// even when every record agrees on the class.
pub fn validate(records: &ExternalRecordSet, prediction: &PredictionResult) -> ValidationOutcome {
    if records.is_empty() {
        return ValidationOutcome::NoMatch;
    }

    let displacement_count = records
        .records()
        .iter()
        .filter(|record| is_displacement(record))
        .count();
    let other_count = records.len() - displacement_count;

    if records.len() == 1 {
        let real_value = if displacement_count > 0 {
            DISPLACEMENT_CLASS
        } else {
            OTHER_CLASS
        };
        return ValidationOutcome::ExactMatch {
            real_value,
            is_correct: real_value == prediction.prediction,
        };
    }

    ValidationOutcome::Ambiguous {
        total: records.len(),
        displacement_count,
        other_count,
    }
}

/// Records without a readable event description count as "other".
fn is_displacement(record: &ExternalRecord) -> bool {
    record
        .field_text(EVENT_FIELD)
        .map(|event| event.to_lowercase().contains(DISPLACEMENT_PHRASE))
        .unwrap_or(false)
}
