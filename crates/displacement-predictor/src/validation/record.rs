use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row fetched from the external registry.
///
/// Field names arrive in either case depending on the source, so every lookup
/// goes through [`ExternalRecord::field`], which ignores ASCII case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalRecord {
    fields: BTreeMap<String, serde_json::Value>,
}

impl ExternalRecord {
    pub fn new(fields: BTreeMap<String, serde_json::Value>) -> Self {
        Self { fields }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let fields = pairs
            .into_iter()
            .map(|(key, value)| (key.into(), serde_json::Value::String(value.into())))
            .collect();
        Self { fields }
    }

    /// Text value of `name`, matched case-insensitively. Non-string scalars are
    /// not returned here; use [`ExternalRecord::field_text`] for those.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.raw(name).and_then(serde_json::Value::as_str)
    }

    /// Value of `name` rendered as text, including numbers and booleans.
    pub fn field_text(&self, name: &str) -> Option<String> {
        match self.raw(name)? {
            serde_json::Value::String(value) => Some(value.clone()),
            serde_json::Value::Number(value) => Some(value.to_string()),
            serde_json::Value::Bool(value) => Some(value.to_string()),
            _ => None,
        }
    }

    /// Overwrite `name`, keeping whichever key casing the record already uses.
    pub fn set_field(&mut self, name: &str, value: String) {
        let key = self
            .key_for(name)
            .map(str::to_string)
            .unwrap_or_else(|| name.to_string());
        self.fields.insert(key, serde_json::Value::String(value));
    }

    pub fn fields(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.fields
    }

    fn raw(&self, name: &str) -> Option<&serde_json::Value> {
        self.key_for(name).and_then(|key| self.fields.get(key))
    }

    fn key_for<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        if self.fields.contains_key(name) {
            return Some(name);
        }
        self.fields
            .keys()
            .find(|key| key.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }
}

/// Records fetched for one filter combination. Owned by the lookup side; the
/// validator only reads it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalRecordSet {
    records: Vec<ExternalRecord>,
}

impl ExternalRecordSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[ExternalRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<ExternalRecord>> for ExternalRecordSet {
    fn from(records: Vec<ExternalRecord>) -> Self {
        Self { records }
    }
}

impl FromIterator<ExternalRecord> for ExternalRecordSet {
    fn from_iter<T: IntoIterator<Item = ExternalRecord>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ExternalRecordSet {
    type Item = ExternalRecord;
    type IntoIter = std::vec::IntoIter<ExternalRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
