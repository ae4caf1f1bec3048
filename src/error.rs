use reqwest::{Method, StatusCode};
use thiserror::Error;

/// Failures raised by the HTTP transport.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid value for header {name}")]
    InvalidHeader { name: &'static str },

    #[error("{method} {url} failed: {source}")]
    Request {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {url} returned {status}")]
    Status {
        method: Method,
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl HttpError {
    /// Response body returned by the upstream service, if the request got that far.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            HttpError::Status { body, .. } if !body.is_empty() => Some(body),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failures surfaced by the service adapters.
///
/// Messages are meant for end users; the detailed cause is logged where the
/// error is raised and, for [`ArrError::Transport`], kept as the source.
#[derive(Debug, Error)]
pub enum ArrError {
    #[error("[{service}] Failed to {operation}: {source}")]
    Transport {
        service: &'static str,
        operation: &'static str,
        #[source]
        source: HttpError,
    },

    /// Lookup by cross-catalog id found nothing. Empty results, upstream 404s
    /// and transport failures all end up here.
    #[error("[{service}] Movie not found")]
    LookupNotFound {
        service: &'static str,
        external_id: i64,
    },

    /// The write went through but the returned record shows it was not applied.
    #[error("[{service}] {message}")]
    UpstreamRejected {
        service: &'static str,
        message: String,
    },

    #[error("[{service}] Failed to add movie: {title}")]
    AddFailed { service: &'static str, title: String },

    #[error("[{service}] Failed to remove movie with TMDB ID {external_id}")]
    RemoveFailed {
        service: &'static str,
        external_id: i64,
    },
}

impl ArrError {
    pub fn transport(service: &'static str, operation: &'static str, source: HttpError) -> Self {
        ArrError::Transport {
            service,
            operation,
            source,
        }
    }
}

pub type Result<T, E = ArrError> = std::result::Result<T, E>;
