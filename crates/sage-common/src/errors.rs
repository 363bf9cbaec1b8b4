use thiserror::Error;

/// Errors from talking to the study-planner backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not configured: {0}")]
    NotConfigured(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// Build a `Status` error, truncating the body so an HTML error page
    /// does not flood the logs.
    pub fn status(status: u16, body: &str) -> Self {
        Self::Status {
            status,
            body: body.chars().take(200).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display() {
        let err = ApiError::NotConfigured("SAGE_API_URL is unset".into());
        assert_eq!(err.to_string(), "not configured: SAGE_API_URL is unset");

        let err = ApiError::Network("connection refused".into());
        assert_eq!(err.to_string(), "network error: connection refused");

        let err = ApiError::Parse("invalid JSON".into());
        assert_eq!(err.to_string(), "parse error: invalid JSON");
    }

    #[test]
    fn status_error_truncates_body() {
        let long_body = "x".repeat(500);
        let err = ApiError::status(502, &long_body);
        match err {
            ApiError::Status { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body.len(), 200);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
