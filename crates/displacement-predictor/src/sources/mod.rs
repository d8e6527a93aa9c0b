//! Lookup of registry records sharing a request's profile.

mod local;
mod socrata;

pub use local::CsvRecordSource;
pub use socrata::SocrataSource;

use std::sync::Arc;

use crate::domain::RawInput;
use crate::validation::{ExternalRecord, ExternalRecordSet};

/// A lookup that could not complete. Callers degrade it to an empty set.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),
    #[error("dataset request failed")]
    Request(#[source] reqwest::Error),
    #[error("dataset responded with HTTP {status}")]
    Status { status: u16 },
    #[error("dataset response was not a list of records")]
    Decode(#[source] reqwest::Error),
    #[error("failed to read records file")]
    Csv(#[from] csv::Error),
}

/// Equality terms on registry columns, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    terms: Vec<(String, String)>,
}

impl RecordFilter {
    /// Terms for the request as the caller submitted it. Registry rows carry
    /// the legacy spellings, so the values are deliberately not normalized.
    pub fn from_raw(raw: &RawInput) -> Self {
        let mut filter = Self::default();
        filter.push("ESTADO_DEPTO", &raw.region);
        filter.push("SEXO", &raw.sex);
        filter.push("ETNIA", &raw.ethnicity);
        filter.push("DISCAPACIDAD", &raw.disability);
        filter.push("CICLO_VITAL", &raw.age_bracket);
        filter.push("VIGENCIA", &raw.reporting_year.to_string());
        filter.push("EVENTOS", &raw.prior_events.to_string());
        filter
    }

    pub fn push(&mut self, column: &str, value: &str) {
        self.terms.push((column.to_string(), value.to_string()));
    }

    pub fn terms(&self) -> &[(String, String)] {
        &self.terms
    }

    /// SoQL `$where` expression: lower-cased column names, single quotes
    /// doubled inside values.
    pub fn where_clause(&self) -> String {
        self.terms
            .iter()
            .map(|(column, value)| {
                format!(
                    "{}='{}'",
                    column.to_lowercase(),
                    value.replace('\'', "''")
                )
            })
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// Every term equals the record's value for that column.
    pub fn matches(&self, record: &ExternalRecord) -> bool {
        self.terms
            .iter()
            .all(|(column, value)| record.field_text(column).as_deref() == Some(value.as_str()))
    }
}

/// Fetches registry records for a filter.
pub trait RecordSource: Send + Sync {
    fn fetch(&self, filter: &RecordFilter) -> Result<ExternalRecordSet, LookupError>;
}

impl<T: RecordSource + ?Sized> RecordSource for Arc<T> {
    fn fetch(&self, filter: &RecordFilter) -> Result<ExternalRecordSet, LookupError> {
        (**self).fetch(filter)
    }
}

/// Source that never finds anything; predictions stand unvalidated.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineSource;

impl RecordSource for OfflineSource {
    fn fetch(&self, _filter: &RecordFilter) -> Result<ExternalRecordSet, LookupError> {
        Ok(ExternalRecordSet::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawInput {
        RawInput {
            region: "Nari\u{fffd}o".to_string(),
            sex: "Mujer".to_string(),
            ethnicity: "Negro(a) o Afrocolombiano(a)".to_string(),
            disability: "Ninguna".to_string(),
            age_bracket: "entre 29 y 60".to_string(),
            reporting_year: 2008,
            prior_events: 1,
            north_south_km: None,
            east_west_km: None,
            total_km: None,
        }
    }

    #[test]
    fn filter_keeps_submitted_spellings() {
        let filter = RecordFilter::from_raw(&raw());
        assert_eq!(filter.terms().len(), 7);
        assert_eq!(filter.terms()[0], ("ESTADO_DEPTO".to_string(), "Nari\u{fffd}o".to_string()));
        assert_eq!(filter.terms()[4].1, "entre 29 y 60");
    }

    #[test]
    fn where_clause_lowercases_columns_and_escapes_quotes() {
        let mut filter = RecordFilter::default();
        filter.push("ESTADO_DEPTO", "Bogota, D.C.");
        filter.push("HECHO", "Pérdida de Bienes Muebles o Inmuebles'");
        filter.push("VIGENCIA", "2019");

        assert_eq!(
            filter.where_clause(),
            "estado_depto='Bogota, D.C.' AND hecho='Pérdida de Bienes Muebles o Inmuebles''' AND vigencia='2019'"
        );
    }

    #[test]
    fn matches_compares_text_of_every_term() {
        let mut filter = RecordFilter::default();
        filter.push("SEXO", "Mujer");
        filter.push("VIGENCIA", "2008");

        let hit = ExternalRecord::new(
            [
                ("sexo".to_string(), serde_json::json!("Mujer")),
                ("vigencia".to_string(), serde_json::json!(2008)),
            ]
            .into_iter()
            .collect(),
        );
        let miss = ExternalRecord::from_pairs([("SEXO", "Hombre"), ("VIGENCIA", "2008")]);
        let partial = ExternalRecord::from_pairs([("SEXO", "Mujer")]);

        assert!(filter.matches(&hit));
        assert!(!filter.matches(&miss));
        assert!(!filter.matches(&partial));
    }

    #[test]
    fn offline_source_returns_nothing() {
        let records = OfflineSource
            .fetch(&RecordFilter::from_raw(&raw()))
            .expect("never fails");
        assert!(records.is_empty());
    }
}
