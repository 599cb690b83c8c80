use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

/// Everything that can go wrong while serving a generate request. Each
/// variant renders as a JSON `{"error": ...}` body; upstream detail stays in
/// the logs.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("{0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("API key is not configured on the server.")]
    MissingApiKey,

    #[error("Google AI API request failed")]
    UpstreamRequest(#[source] reqwest::Error),

    #[error("Google AI API request failed: {reason}")]
    UpstreamStatus { reason: String },

    #[error("Failed to parse Google AI response")]
    UpstreamResponse(#[source] reqwest::Error),

    #[error("No image data found in Google AI response.")]
    NoImageData,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for ProxyError {
    fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::UpstreamRequest(_)
            | ProxyError::UpstreamStatus { .. }
            | ProxyError::UpstreamResponse(_) => StatusCode::BAD_GATEWAY,
            ProxyError::InvalidBody(_) | ProxyError::MissingApiKey | ProxyError::NoImageData => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_status_maps_to_bad_gateway() {
        let err = ProxyError::UpstreamStatus {
            reason: "Too Many Requests".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.to_string(), "Google AI API request failed: Too Many Requests");
    }

    #[test]
    fn local_failures_map_to_internal_error() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        for err in [
            ProxyError::InvalidBody(parse_err),
            ProxyError::MissingApiKey,
            ProxyError::NoImageData,
        ] {
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}
