//! Router-level tests for the media route, health and metrics.

use std::io::Write;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use media_gateway::app;
use media_gateway::config::Enforcement;
use media_gateway::media::MediaResource;
use media_gateway::models::RateLimitedBody;
use media_gateway::rate_limit::RateLimiter;
use media_gateway::state::AppState;
use tempfile::NamedTempFile;
use tower::ServiceExt;

const FILE_LEN: usize = 25_000;
const CHUNK: u64 = 10_000;

struct Fixture {
    _file: NamedTempFile,
    data: Vec<u8>,
    router: Router,
}

fn fixture(limit: u32, enforcement: Enforcement) -> Fixture {
    let data: Vec<u8> = (0..FILE_LEN).map(|i| (i % 256) as u8).collect();
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&data).unwrap();
    file.flush().unwrap();

    let state = AppState {
        limiter: Arc::new(RateLimiter::configure(limit, 60_000).unwrap()),
        media: MediaResource::new(file.path(), "video/mp4"),
        chunk_size: CHUNK,
        enforcement,
        trust_forwarded: true,
    };

    Fixture {
        _file: file,
        data,
        router: app(Arc::new(state), "/media"),
    }
}

fn media_request(ip: &str, range: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri("/media").header("x-forwarded-for", ip);
    if let Some(range) = range {
        builder = builder.header(header::RANGE, range);
    }
    builder.body(Body::empty()).unwrap()
}

fn header_str<'a>(response: &'a axum::response::Response, name: header::HeaderName) -> &'a str {
    response.headers().get(name).unwrap().to_str().unwrap()
}

#[tokio::test]
async fn serves_first_chunk_with_partial_content_headers() {
    let fx = fixture(10, Enforcement::Enforce);

    let response = fx
        .router
        .oneshot(media_request("203.0.113.1", Some("bytes=0-")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header_str(&response, header::CONTENT_RANGE), "bytes 0-9999/25000");
    assert_eq!(header_str(&response, header::ACCEPT_RANGES), "bytes");
    assert_eq!(header_str(&response, header::CONTENT_LENGTH), "10000");
    assert_eq!(header_str(&response, header::CONTENT_TYPE), "video/mp4");
    assert_eq!(response.headers().get("x-ratelimit-limit").unwrap(), "10");
    assert_eq!(response.headers().get("x-ratelimit-remaining").unwrap(), "9");

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], &fx.data[..10_000]);
}

#[tokio::test]
async fn final_chunk_is_clamped_to_file_end() {
    let fx = fixture(10, Enforcement::Enforce);

    let response = fx
        .router
        .oneshot(media_request("203.0.113.2", Some("bytes=20000-")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header_str(&response, header::CONTENT_RANGE), "bytes 20000-24999/25000");
    assert_eq!(header_str(&response, header::CONTENT_LENGTH), "5000");

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], &fx.data[20_000..]);
}

#[tokio::test]
async fn missing_range_header_is_bad_request() {
    let fx = fixture(10, Enforcement::Enforce);

    let response = fx
        .router
        .oneshot(media_request("203.0.113.3", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"Range header required");
}

#[tokio::test]
async fn malformed_range_header_is_bad_request() {
    let fx = fixture(10, Enforcement::Enforce);

    let response = fx
        .router
        .oneshot(media_request("203.0.113.4", Some("bytes=abc")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_range_header_is_rejected_before_storage_is_read() {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState {
        limiter: Arc::new(RateLimiter::configure(10, 60_000).unwrap()),
        media: MediaResource::new(dir.path().join("gone.mp4"), "video/mp4"),
        chunk_size: CHUNK,
        enforcement: Enforcement::Enforce,
        trust_forwarded: true,
    };
    let router = app(Arc::new(state), "/media");

    let missing = router
        .clone()
        .oneshot(media_request("203.0.113.10", None))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let malformed = router
        .oneshot(media_request("203.0.113.10", Some("bytes=oops")))
        .await
        .unwrap();
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn start_beyond_file_is_not_satisfiable() {
    let fx = fixture(10, Enforcement::Enforce);

    let response = fx
        .router
        .oneshot(media_request("203.0.113.5", Some("bytes=25000-")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(header_str(&response, header::CONTENT_RANGE), "bytes */25000");
}

#[tokio::test]
async fn missing_media_file_is_internal_error() {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState {
        limiter: Arc::new(RateLimiter::configure(10, 60_000).unwrap()),
        media: MediaResource::new(dir.path().join("gone.mp4"), "video/mp4"),
        chunk_size: CHUNK,
        enforcement: Enforcement::Enforce,
        trust_forwarded: true,
    };

    let response = app(Arc::new(state), "/media")
        .oneshot(media_request("203.0.113.6", Some("bytes=0-")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn rejects_with_diagnostic_json_once_quota_is_spent() {
    let fx = fixture(2, Enforcement::Enforce);

    for _ in 0..2 {
        let response = fx
            .router
            .clone()
            .oneshot(media_request("198.51.100.7", Some("bytes=0-")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    }

    let response = fx
        .router
        .clone()
        .oneshot(media_request("198.51.100.7", Some("bytes=0-")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    // Quota spent within one test, so the oldest slot frees in just under 60s
    assert_eq!(header_str(&response, header::RETRY_AFTER), "60");

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let payload: RateLimitedBody = serde_json::from_slice(&body).unwrap();
    assert_eq!(payload.message, "Rate limit exceeded");
    assert_eq!(payload.ip, "198.51.100.7");
    assert_eq!(payload.limit, 2);
    assert_eq!(payload.window_ms, 60_000);
    assert!(payload.remaining_time.ends_with("ms"));

    // Another client still has its own quota
    let response = fx
        .router
        .oneshot(media_request("198.51.100.8", Some("bytes=0-")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
}

#[tokio::test]
async fn rate_limit_applies_before_range_validation() {
    let fx = fixture(1, Enforcement::Enforce);

    let first = fx
        .router
        .clone()
        .oneshot(media_request("198.51.100.9", None))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::BAD_REQUEST);

    let second = fx
        .router
        .oneshot(media_request("198.51.100.9", None))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn observe_mode_serves_over_quota_requests() {
    let fx = fixture(1, Enforcement::Observe);

    for _ in 0..3 {
        let response = fx
            .router
            .clone()
            .oneshot(media_request("192.0.2.10", Some("bytes=0-99")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(header_str(&response, header::CONTENT_LENGTH), "100");
    }
}

#[tokio::test]
async fn health_reports_healthy() {
    let fx = fixture(10, Enforcement::Enforce);

    let response = fx
        .router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn metrics_expose_request_counter() {
    let fx = fixture(10, Enforcement::Enforce);
    media_gateway::metrics::register();

    let response = fx
        .router
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("media_requests_total"));
}

#[tokio::test]
async fn latency_is_recorded_for_rejected_requests() {
    let fx = fixture(10, Enforcement::Enforce);
    let before = media_gateway::metrics::REQUEST_LATENCY.get_sample_count();

    let response = fx
        .router
        .oneshot(media_request("203.0.113.11", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Other tests share the registry, so only growth is checked
    assert!(media_gateway::metrics::REQUEST_LATENCY.get_sample_count() > before);
}
