//! Pulls a collector's rolling `/influxdata` snapshot over HTTP.

use llama_tsdb::TsdbPoint;

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("request to {0} failed")]
    Request(String, #[source] reqwest::Error),
    #[error("{0} responded with status {1}")]
    Status(String, reqwest::StatusCode),
    #[error("failed to decode response body from {0}")]
    Decode(String, #[source] reqwest::Error),
}

/// A handle to one collector's `/influxdata` endpoint.
pub struct CollectorClient {
    http: reqwest::Client,
    url: String,
}

impl CollectorClient {
    pub fn new(http: reqwest::Client, host: &str, port: u16) -> Self {
        Self {
            http,
            url: format!("http://{host}:{port}/influxdata"),
        }
    }

    /// Fetches the current set of TSDB points. Any failure — connection
    /// refused, non-2xx status, malformed JSON — is returned to the caller
    /// rather than retried; the next scheduled tick tries again.
    pub async fn fetch(&self) -> Result<Vec<TsdbPoint>, ScrapeError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ScrapeError::Request(self.url.clone(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status(self.url.clone(), status));
        }

        response
            .json::<Vec<TsdbPoint>>()
            .await
            .map_err(|e| ScrapeError::Decode(self.url.clone(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetch_against_unreachable_host_returns_request_error() {
        let client = CollectorClient::new(reqwest::Client::new(), "127.0.0.1", 1);
        let err = client.fetch().await.unwrap_err();
        assert!(matches!(err, ScrapeError::Request(_, _)));
    }
}
