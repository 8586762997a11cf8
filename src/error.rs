//! Error types for the backend client.
//!
//! Transport-level failures are the only errors that change submission
//! state; decode problems inside the stream are contained by the decoder.

use thiserror::Error;

/// Failure talking to the evaluation backend.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Backend base URL could not be parsed
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    /// HTTP client construction failed
    #[error("Failed to create HTTP client: {0}")]
    Build(String),

    /// Backend not reachable
    #[error("Cannot connect to backend at {0}. Is it running?")]
    Connect(String),

    /// Request exceeded the configured timeout
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// Non-success HTTP status
    #[error("Backend error {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Network failure while sending or reading
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body was not the expected JSON
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Map a reqwest error onto the taxonomy above.
    pub fn from_reqwest(err: reqwest::Error, base_url: &str, timeout_seconds: u64) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(timeout_seconds)
        } else if err.is_connect() {
            ClientError::Connect(base_url.to_string())
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ClientError::Timeout(30).to_string(),
            "Request timed out after 30s"
        );
        assert_eq!(
            ClientError::Status {
                status: reqwest::StatusCode::BAD_GATEWAY,
                body: "upstream down".to_string(),
            }
            .to_string(),
            "Backend error 502 Bad Gateway: upstream down"
        );
        assert!(ClientError::Connect("http://127.0.0.1:8000".to_string())
            .to_string()
            .contains("127.0.0.1:8000"));
    }
}
