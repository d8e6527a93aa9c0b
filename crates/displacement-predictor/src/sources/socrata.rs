use reqwest::blocking::Client;
use std::sync::OnceLock;

use super::{LookupError, RecordFilter, RecordSource};
use crate::config::DatasetConfig;
use crate::validation::ExternalRecordSet;

/// Blocking client for a dataset on a Socrata open-data portal.
///
/// The HTTP client is built on first use so construction never blocks; call
/// [`RecordSource::fetch`] from a blocking thread only.
#[derive(Debug)]
pub struct SocrataSource {
    config: DatasetConfig,
    client: OnceLock<Client>,
}

impl SocrataSource {
    pub fn new(config: DatasetConfig) -> Self {
        Self {
            config,
            client: OnceLock::new(),
        }
    }

    pub fn resource_url(&self) -> String {
        format!(
            "https://{}/resource/{}.json",
            self.config.domain, self.config.dataset_id
        )
    }

    fn client(&self) -> Result<&Client, LookupError> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let built = Client::builder()
            .user_agent(concat!("displacement-predictor/", env!("CARGO_PKG_VERSION")))
            .timeout(self.config.timeout)
            .build()
            .map_err(LookupError::Client)?;
        Ok(self.client.get_or_init(|| built))
    }
}

impl RecordSource for SocrataSource {
    fn fetch(&self, filter: &RecordFilter) -> Result<ExternalRecordSet, LookupError> {
        let where_clause = filter.where_clause();
        tracing::debug!(dataset = %self.config.dataset_id, %where_clause, "querying registry");

        let mut request = self.client()?.get(self.resource_url()).query(&[
            ("$where", where_clause),
            ("$limit", self.config.limit.to_string()),
        ]);
        if let Some(token) = &self.config.app_token {
            request = request.header("X-App-Token", token);
        }

        let response = request.send().map_err(LookupError::Request)?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status {
                status: status.as_u16(),
            });
        }

        let records: ExternalRecordSet = response.json().map_err(LookupError::Decode)?;
        tracing::debug!(matches = records.len(), "registry query complete");
        Ok(records)
    }
}
