//! Error handling

use axum::response::IntoResponse;
use tracing::info;

/// definitions for the art explorer application.
#[derive(Debug)]
pub enum ExplorerError {
    /// Startup configuration is unusable, eg the API key is missing
    Configuration(String),
    /// The AI provider call failed or answered with something we can't use
    Upstream(String),
    /// Finding artworks for a theme failed as a whole
    Discovery(String),
    /// Generating a single coloring page failed
    Generation(String),
    /// When you didn't do the right thing
    BadRequest,
    /// When a requested resource is not found
    NotFound(String),
    /// When an internal server error occurs
    InternalServerError(String),
}

impl std::fmt::Display for ExplorerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "Configuration error: {msg}"),
            Self::Upstream(msg) => write!(f, "AI provider error: {msg}"),
            Self::Discovery(msg) => write!(f, "Artwork discovery failed: {msg}"),
            Self::Generation(msg) => write!(f, "Image generation failed: {msg}"),
            Self::BadRequest => write!(f, "Bad request"),
            Self::NotFound(what) => write!(f, "Not found: {what}"),
            Self::InternalServerError(msg) => write!(f, "Internal server error: {msg}"),
        }
    }
}

impl std::error::Error for ExplorerError {}

impl From<reqwest::Error> for ExplorerError {
    fn from(err: reqwest::Error) -> Self {
        ExplorerError::Upstream(err.to_string())
    }
}

impl From<serde_json::Error> for ExplorerError {
    fn from(err: serde_json::Error) -> Self {
        ExplorerError::Upstream(format!("unexpected JSON shape: {err}"))
    }
}

impl From<base64::DecodeError> for ExplorerError {
    fn from(err: base64::DecodeError) -> Self {
        ExplorerError::InternalServerError(format!("invalid base64 image: {err}"))
    }
}

impl From<std::io::Error> for ExplorerError {
    fn from(err: std::io::Error) -> Self {
        ExplorerError::InternalServerError(err.to_string())
    }
}

impl From<axum::http::Error> for ExplorerError {
    fn from(err: axum::http::Error) -> Self {
        ExplorerError::InternalServerError(err.to_string())
    }
}

impl IntoResponse for ExplorerError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ExplorerError::BadRequest => {
                info!("Bad request received");
                let mut response =
                    axum::response::Response::new(axum::body::Body::from("Bad Request"));
                *response.status_mut() = axum::http::StatusCode::BAD_REQUEST;
                response
            }
            ExplorerError::NotFound(url) => {
                info!("404 {url}");
                let mut response =
                    axum::response::Response::new(axum::body::Body::from("Not Found"));
                *response.status_mut() = axum::http::StatusCode::NOT_FOUND;
                response
            }
            ExplorerError::Upstream(_)
            | ExplorerError::Discovery(_)
            | ExplorerError::Generation(_) => {
                tracing::error!("{}", self);
                let mut response = axum::response::Response::new(axum::body::Body::from(
                    "The image service is unavailable",
                ));
                *response.status_mut() = axum::http::StatusCode::BAD_GATEWAY;
                response
            }
            ExplorerError::Configuration(message) | ExplorerError::InternalServerError(message) => {
                tracing::error!("Internal server error: {}", message);
                let mut response =
                    axum::response::Response::new(axum::body::Body::from("Internal server error"));
                *response.status_mut() = axum::http::StatusCode::INTERNAL_SERVER_ERROR;
                response
            }
        }
    }
}
