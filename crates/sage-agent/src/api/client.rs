//! HTTP client plumbing shared by every backend call.

use std::time::Duration;

use reqwest::header::HeaderMap;

use sage_common::ApiError;

use super::config::ApiConfig;

/// HTTP client for the study-planner REST API.
pub struct ApiClient {
    pub(crate) config: ApiConfig,
    pub(crate) http: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            http: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .build()
                .expect("failed to build HTTP client"),
            config,
        }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Bearer-token auth headers sent with every request.
    pub(crate) fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Authorization",
            format!("Bearer {}", self.config.token)
                .parse()
                .expect("invalid auth header"),
        );
        headers
    }

    /// Map a non-success response to `ApiError::Status`, consuming the
    /// body for the error text.
    pub(crate) async fn check_status(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::status(status.as_u16(), &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_base_and_path() {
        let client = ApiClient::new(ApiConfig::new("https://api.example.com", "tok"));
        assert_eq!(
            client.url("/chat/sessions"),
            "https://api.example.com/chat/sessions"
        );
    }

    #[test]
    fn auth_headers_carry_bearer_token() {
        let client = ApiClient::new(ApiConfig::new("https://api.example.com", "tok"));
        let headers = client.auth_headers();
        assert_eq!(headers["Authorization"], "Bearer tok");
    }
}
