//! Error taxonomy of the media gateway and its mapping onto HTTP responses.

use std::io;
use std::path::PathBuf;

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::models::RateLimitedBody;

/// Invalid startup parameters. Fatal, never produced per request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("rate limit must be greater than zero")]
    ZeroLimit,
    #[error("rate window must be greater than zero milliseconds")]
    ZeroWindow,
    #[error("chunk size must be greater than zero bytes")]
    ZeroChunkSize,
    #[error("media route {route} must start with '/' and not shadow /health or /metrics")]
    InvalidRoute { route: String },
}

/// Client protocol errors around the `Range` header.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("Range header required")]
    Missing,
    #[error("malformed Range header: {header}")]
    Malformed { header: String },
    #[error("requested range not satisfiable for {total_size} bytes")]
    NotSatisfiable { total_size: u64 },
}

/// I/O failures while reading the media file.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to stat {}: {source}", .path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} ended after {read} of {expected} bytes", .path.display())]
    Truncated {
        path: PathBuf,
        expected: u64,
        read: u64,
    },
}

/// Details of a rejected request, echoed back in the 429 body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitRejection {
    pub ip: String,
    pub limit: u32,
    pub window_ms: u64,
    pub retry_after_ms: u64,
}

/// Everything that can end a media request before its headers are sent.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("rate limit exceeded for {}", .0.ip)]
    RateLimited(RateLimitRejection),
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::RateLimited(rejection) => {
                let retry_after_secs = rejection.retry_after_ms.div_ceil(1000);
                let body = RateLimitedBody::from(&rejection);
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    [(header::RETRY_AFTER, retry_after_secs.to_string())],
                    Json(body),
                )
                    .into_response()
            }
            ApiError::Range(RangeError::NotSatisfiable { total_size }) => (
                StatusCode::RANGE_NOT_SATISFIABLE,
                [(header::CONTENT_RANGE, format!("bytes */{total_size}"))],
                "Requested range not satisfiable",
            )
                .into_response(),
            ApiError::Range(err) => (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
            ApiError::Storage(err) => {
                tracing::error!(error = %err, "media storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read media").into_response()
            }
        }
    }
}
