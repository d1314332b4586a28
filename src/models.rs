use serde::{Deserialize, Serialize};

use crate::error::RateLimitRejection;

// 429 diagnostic payload
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitedBody {
    pub message: String,
    pub ip: String,
    pub limit: u32,
    pub window_ms: u64,
    pub remaining_time: String, // "<ms>ms"
}

impl From<&RateLimitRejection> for RateLimitedBody {
    fn from(rejection: &RateLimitRejection) -> Self {
        Self {
            message: "Rate limit exceeded".to_string(),
            ip: rejection.ip.clone(),
            limit: rejection.limit,
            window_ms: rejection.window_ms,
            remaining_time: format!("{}ms", rejection.retry_after_ms),
        }
    }
}

// GET /health payload
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}
