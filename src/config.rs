use clap::{Parser, ValueEnum};
use std::path::PathBuf;

// What to do with a request once the limiter has rejected it
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Enforcement {
    // Answer 429
    #[default]
    Enforce,
    // Log and count the rejection, then serve anyway (dry run)
    Observe,
}

impl Enforcement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Enforcement::Enforce => "enforce",
            Enforcement::Observe => "observe",
        }
    }
}

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "media-gateway")]
#[command(about = "Rate limited byte-range media streaming server")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    // Interface to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    // File served by the media route
    #[arg(short, long, default_value = "public/sample.mp4")]
    pub media_path: PathBuf,

    // Content-Type sent with every chunk
    #[arg(long, default_value = "video/mp4")]
    pub content_type: String,

    // Path of the media route
    #[arg(long, default_value = "/media")]
    pub route: String,

    // Rate limit max requests per window
    #[arg(long, default_value_t = 10)]
    pub rate_limit: u32,

    // Rate limit window in milliseconds
    #[arg(long, default_value_t = 60_000)]
    pub rate_window_ms: u64,

    // Max bytes answered per range request
    #[arg(short, long, default_value_t = 1_000_000)]
    pub chunk_size: u64,

    // enforce = answer 429, observe = only log rejections
    #[arg(long, value_enum, default_value_t = Enforcement::Enforce)]
    pub enforcement: Enforcement,

    // Key clients by X-Forwarded-For / X-Real-IP.
    // Only safe behind a proxy that overwrites these headers.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub trust_forwarded_headers: bool,

    // How often idle client windows are evicted, 0 disables the sweeper
    #[arg(long, default_value_t = 60)]
    pub sweep_interval_secs: u64,

    // Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
