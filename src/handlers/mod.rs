mod health;
mod metrics;
mod media;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use media::media_handler;
