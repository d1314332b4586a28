use axum::http::HeaderMap;
use std::net::SocketAddr;

pub const FALLBACK_CLIENT_KEY: &str = "127.0.0.1";

// Identity a request is rate limited under.
// Trusted: first X-Forwarded-For hop, then X-Real-IP, then the peer, then loopback.
// Untrusted: the peer address only, headers are client controlled.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded: bool) -> String {
    if trust_forwarded {
        let forwarded = header_str(headers, "x-forwarded-for")
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|hop| !hop.is_empty());
        if let Some(hop) = forwarded {
            return hop.to_string();
        }

        if let Some(real_ip) = header_str(headers, "x-real-ip").map(str::trim).filter(|v| !v.is_empty()) {
            return real_ip.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| FALLBACK_CLIENT_KEY.to_string())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
