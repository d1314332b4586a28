use std::sync::Arc;
use crate::config::{Args, Enforcement};
use crate::error::ConfigurationError;
use crate::media::MediaResource;
use crate::rate_limit::RateLimiter;
// app's shared state, built once at startup and handed to the router

// Mounted next to the media route by `app`
const RESERVED_ROUTES: [&str; 2] = ["/health", "/metrics"];

pub struct AppState {
    pub limiter: Arc<RateLimiter>,
    pub media: MediaResource,
    pub chunk_size: u64,           // max bytes per 206 response
    pub enforcement: Enforcement,
    pub trust_forwarded: bool,     // key clients by proxy headers
}

impl AppState {
    pub fn from_args(args: &Args) -> Result<Self, ConfigurationError> {
        if !args.route.starts_with('/') || RESERVED_ROUTES.contains(&args.route.as_str()) {
            return Err(ConfigurationError::InvalidRoute {
                route: args.route.clone(),
            });
        }
        if args.chunk_size == 0 {
            return Err(ConfigurationError::ZeroChunkSize);
        }
        let limiter = RateLimiter::configure(args.rate_limit, args.rate_window_ms)?;

        Ok(Self {
            limiter: Arc::new(limiter),
            media: MediaResource::new(args.media_path.clone(), args.content_type.clone()),
            chunk_size: args.chunk_size,
            enforcement: args.enforcement,
            trust_forwarded: args.trust_forwarded_headers,
        })
    }
}
