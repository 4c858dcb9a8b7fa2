//! HTTP submission of finished results.

use std::collections::BTreeMap;
use std::time::Duration;

use rings_types::Address;
use serde::Serialize;

use crate::config::SubmissionConfig;
use crate::error::DaemonError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// POSTs `{ "<vault>": [records] }` and checks for one expected status.
pub struct Submitter {
    http_client: reqwest::Client,
    url: String,
    expected_status: u16,
}

impl Submitter {
    pub fn new(config: &SubmissionConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            url: config.url.clone(),
            expected_status: config.expected_status,
        }
    }

    pub async fn submit<T: Serialize>(
        &self,
        vault: &Address,
        records: &[T],
    ) -> Result<(), DaemonError> {
        let response = self
            .http_client
            .post(&self.url)
            .json(&payload(vault, records))
            .send()
            .await
            .map_err(|e| DaemonError::Submit(e.to_string()))?;

        let status = response.status().as_u16();
        if status == self.expected_status {
            tracing::info!(url = %self.url, records = records.len(), "results submitted");
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(DaemonError::Submit(format!(
            "{} answered {status} (expected {}): {body}",
            self.url, self.expected_status
        )))
    }
}

fn payload<'a, T: Serialize>(vault: &Address, records: &'a [T]) -> BTreeMap<String, &'a [T]> {
    BTreeMap::from([(vault.as_str().to_string(), records)])
}
