//! Remote job/user data source.
//!
//! The portal API is an external collaborator: the calendar only ever talks
//! to it through [`DataSource`], which keeps the orchestrator testable with
//! scripted sources.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::config::SourceConfig;
use crate::error::{CalendarError, CalendarResult};

/// Query string parameters sent with a request
pub type QueryParams = Vec<(String, String)>;

/// Read-only access to the portal REST API
#[async_trait]
pub trait DataSource: Send + Sync {
    /// GET `path` and return the decoded JSON body.
    ///
    /// Network failures and 5xx/429 answers map to
    /// [`CalendarError::Transport`]; other non-2xx answers and undecodable
    /// bodies map to [`CalendarError::Unsuccessful`].
    async fn get_json(&self, path: &str, query: &QueryParams) -> CalendarResult<Value>;
}

/// reqwest-backed [`DataSource`]
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpSource {
    pub fn new(config: &SourceConfig) -> CalendarResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| CalendarError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl DataSource for HttpSource {
    async fn get_json(&self, path: &str, query: &QueryParams) -> CalendarResult<Value> {
        let url = self.url(path);
        tracing::debug!("GET {}", url);

        let mut request = self.client.get(&url).query(query);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CalendarError::transport(path, e.to_string()))?;

        let status = response.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(CalendarError::transport(path, format!("HTTP {}", status)));
        }
        if !status.is_success() {
            return Err(CalendarError::unsuccessful(path, format!("HTTP {}", status)));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| CalendarError::unsuccessful(path, format!("invalid body: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining_normalizes_slashes() {
        let source = HttpSource::new(&SourceConfig {
            base_url: "http://localhost:5000/api/".to_string(),
            ..SourceConfig::default()
        })
        .unwrap();

        assert_eq!(source.url("/admin/users"), "http://localhost:5000/api/admin/users");
        assert_eq!(source.url("jobs"), "http://localhost:5000/api/jobs");
    }
}
