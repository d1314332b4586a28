use axum::body::Body;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use futures::TryStreamExt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use crate::client_key::client_key;
use crate::config::Enforcement;
use crate::error::{ApiError, RangeError, RateLimitRejection};
use crate::metrics::{BYTES_SERVED, RATE_LIMITED_TOTAL, REQUEST_LATENCY, REQUEST_TOTAL};
use crate::range::{parse_range_header, resolve_spec};
use crate::rate_limit::Decision;
use crate::state::AppState;

// GET <route>: one chunk of the media file per range request
pub async fn media_handler(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response, ApiError> {
    REQUEST_TOTAL.inc();
    // Observes on drop, so every exit path is timed
    let _latency = REQUEST_LATENCY.start_timer();
    let start_time = Instant::now();

    let (parts, _) = request.into_parts();
    let headers = &parts.headers;
    let peer = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = client_key(headers, peer, state.trust_forwarded);

    let limiter = &state.limiter;
    let remaining = match limiter.check(&ip, start_time) {
        Decision::Admitted { remaining } => remaining,
        Decision::Rejected { retry_after_ms } => {
            RATE_LIMITED_TOTAL.inc();
            tracing::warn!(
                ip = %ip,
                limit = limiter.limit(),
                window_ms = limiter.window_ms(),
                retry_after_ms,
                enforcement = state.enforcement.as_str(),
                "rate limit exceeded"
            );

            if state.enforcement == Enforcement::Enforce {
                return Err(ApiError::RateLimited(RateLimitRejection {
                    ip,
                    limit: limiter.limit(),
                    window_ms: limiter.window_ms(),
                    retry_after_ms,
                }));
            }
            0
        }
    };

    // Header problems are answered before the file is touched.
    // A non-UTF-8 Range value is passed on as an unparseable header.
    let range_header = headers
        .get(header::RANGE)
        .map(|value| value.to_str().unwrap_or_default())
        .ok_or(RangeError::Missing)?;
    let spec = parse_range_header(range_header)?;

    let total_size = state.media.total_size().await?;
    let range = resolve_spec(spec, total_size, state.chunk_size)?;
    let chunk = state.media.open_chunk_stream(range).await?;

    tracing::debug!(
        ip = %ip,
        start = range.start,
        end = range.end,
        total_size,
        "serving media chunk"
    );

    let body = Body::from_stream(chunk.inspect_ok(|bytes| BYTES_SERVED.inc_by(bytes.len() as f64)));

    Ok((
        StatusCode::PARTIAL_CONTENT,
        [
            (header::CONTENT_RANGE, range.content_range(total_size)),
            (header::ACCEPT_RANGES, "bytes".to_string()),
            (header::CONTENT_LENGTH, range.content_length.to_string()),
            (header::CONTENT_TYPE, state.media.content_type().to_string()),
        ],
        [
            ("x-ratelimit-limit", limiter.limit().to_string()),
            ("x-ratelimit-remaining", remaining.to_string()),
        ],
        body,
    )
        .into_response())
}
