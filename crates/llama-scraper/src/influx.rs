//! Rewrites a batch of [`TsdbPoint`]s into InfluxDB line protocol and POSTs
//! it to an InfluxDB-compatible write endpoint.

use llama_tsdb::TsdbPoint;

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("request to {0} failed")]
    Request(String, #[source] reqwest::Error),
    #[error("{0} responded with status {1}")]
    Status(String, reqwest::StatusCode),
}

/// A handle to one InfluxDB write endpoint.
pub struct InfluxSink {
    http: reqwest::Client,
    url: String,
}

impl InfluxSink {
    pub fn new(http: reqwest::Client, server: &str, port: u16, db: &str) -> Self {
        Self {
            http,
            url: format!("http://{server}:{port}/write?db={db}"),
        }
    }

    /// Writes `points` as a single line-protocol batch. Points with a null
    /// value are silently dropped — there is nothing to write for them.
    /// An empty batch is a no-op; InfluxDB rejects an empty write body.
    pub async fn write(&self, points: &[TsdbPoint]) -> Result<(), WriteError> {
        let body = points
            .iter()
            .filter_map(TsdbPoint::to_line_protocol)
            .collect::<Vec<_>>()
            .join("\n");

        if body.is_empty() {
            return Ok(());
        }

        let response = self
            .http
            .post(&self.url)
            .body(body)
            .send()
            .await
            .map_err(|e| WriteError::Request(self.url.clone(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WriteError::Status(self.url.clone(), status));
        }

        Ok(())
    }
}
