use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("media_requests_total", "Total number of media requests")
            .expect("media_requests_total registers once");
    pub static ref RATE_LIMITED_TOTAL: Counter =
        register_counter!("media_rate_limited_total", "Requests rejected by the rate limiter")
            .expect("media_rate_limited_total registers once");
    pub static ref BYTES_SERVED: Counter =
        register_counter!("media_bytes_served_total", "Media bytes written to clients")
            .expect("media_bytes_served_total registers once");
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "media_request_latency_seconds",
        "Time until response headers are ready, in seconds"
    )
    .expect("media_request_latency_seconds registers once");
    pub static ref TRACKED_CLIENTS: Gauge =
        register_gauge!("media_tracked_clients", "Client keys held by the rate limiter")
            .expect("media_tracked_clients registers once");
}

// Touch every metric so /metrics lists them before the first request
pub fn register() {
    lazy_static::initialize(&REQUEST_TOTAL);
    lazy_static::initialize(&RATE_LIMITED_TOTAL);
    lazy_static::initialize(&BYTES_SERVED);
    lazy_static::initialize(&REQUEST_LATENCY);
    lazy_static::initialize(&TRACKED_CLIENTS);
}
