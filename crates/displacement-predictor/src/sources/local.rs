use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use super::{LookupError, RecordFilter, RecordSource};
use crate::validation::{ExternalRecord, ExternalRecordSet};

/// Registry extract loaded from a CSV export, for offline runs and tests.
#[derive(Debug, Clone, Default)]
pub struct CsvRecordSource {
    records: Vec<ExternalRecord>,
    limit: Option<usize>,
}

impl CsvRecordSource {
    pub fn open(path: &Path) -> Result<Self, LookupError> {
        let file = std::fs::File::open(path).map_err(csv::Error::from)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LookupError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for row in csv_reader.deserialize::<BTreeMap<String, String>>() {
            let row = row?;
            records.push(ExternalRecord::from_pairs(
                row.into_iter().filter(|(_, value)| !value.is_empty()),
            ));
        }

        Ok(Self {
            records,
            limit: None,
        })
    }

    /// Cap the number of records returned per lookup.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordSource for CsvRecordSource {
    fn fetch(&self, filter: &RecordFilter) -> Result<ExternalRecordSet, LookupError> {
        Ok(self
            .records
            .iter()
            .filter(|record| filter.matches(record))
            .take(self.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXTRACT: &str = "\
ESTADO_DEPTO,SEXO,VIGENCIA,HECHO
Cauca,Mujer,2010,Desplazamiento forzado
Cauca,Mujer,2010,Amenaza
Cauca,Hombre,2010,Homicidio
Meta,Mujer,2011,
";

    fn filter(pairs: &[(&str, &str)]) -> RecordFilter {
        let mut filter = RecordFilter::default();
        for (column, value) in pairs {
            filter.push(column, value);
        }
        filter
    }

    #[test]
    fn fetch_returns_rows_matching_every_term() {
        let source = CsvRecordSource::from_reader(EXTRACT.as_bytes()).expect("parses");
        assert_eq!(source.len(), 4);

        let found = source
            .fetch(&filter(&[("ESTADO_DEPTO", "Cauca"), ("SEXO", "Mujer")]))
            .expect("fetches");
        assert_eq!(found.len(), 2);
        assert_eq!(found.records()[0].field("hecho"), Some("Desplazamiento forzado"));
    }

    #[test]
    fn empty_cells_are_left_out() {
        let source = CsvRecordSource::from_reader(EXTRACT.as_bytes()).expect("parses");
        let found = source
            .fetch(&filter(&[("ESTADO_DEPTO", "Meta")]))
            .expect("fetches");
        assert_eq!(found.len(), 1);
        assert_eq!(found.records()[0].field("HECHO"), None);
    }

    #[test]
    fn limit_caps_results() {
        let source = CsvRecordSource::from_reader(EXTRACT.as_bytes())
            .expect("parses")
            .with_limit(1);
        let found = source
            .fetch(&filter(&[("ESTADO_DEPTO", "Cauca")]))
            .expect("fetches");
        assert_eq!(found.len(), 1);
    }
}
