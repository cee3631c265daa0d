//! Visitor identity derivation at the HTTP edge
//!
//! The core treats identities as opaque strings. When a request carries no
//! explicit user id, the handlers derive a stable per-day identity from the
//! client address and user agent:
//! - first `X-Forwarded-For` hop, then `X-Real-IP`, then `0.0.0.0`
//! - SHA-256 over address, user agent and UTC day, truncated to 12 hex chars

use axum::http::HeaderMap;
use chrono::NaiveDate;
use sha2::{Digest, Sha256};
use std::fmt::Write;
use std::net::IpAddr;

const IDENTITY_HEX_LEN: usize = 12;
const UNKNOWN_ADDRESS: &str = "0.0.0.0";
const UNKNOWN_AGENT: &str = "unknown";

/// Header carrying a caller-chosen identity
pub const USER_ID_HEADER: &str = "x-user-id";

/// Best-effort client address from proxy headers
pub fn client_address(headers: &HeaderMap) -> String {
    forwarded_for(headers)
        .or_else(|| header_ip(headers, "x-real-ip"))
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN_ADDRESS.to_string())
}

fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok())
}

fn header_ip(headers: &HeaderMap, name: &str) -> Option<IpAddr> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
}

fn user_agent(headers: &HeaderMap) -> &str {
    headers
        .get("user-agent")
        .and_then(|h| h.to_str().ok())
        .unwrap_or(UNKNOWN_AGENT)
}

fn non_blank(id: &str) -> Option<String> {
    let id = id.trim();
    (!id.is_empty()).then(|| id.to_string())
}

/// Identity carried in the `X-User-Id` header
pub fn header_identity(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(non_blank)
}

/// Identity explicitly supplied by the caller, body first
pub fn explicit_identity(headers: &HeaderMap, body_user_id: Option<&str>) -> Option<String> {
    body_user_id
        .and_then(non_blank)
        .or_else(|| header_identity(headers))
}

/// Stable identity for one visitor on one UTC day
pub fn derive_identity(headers: &HeaderMap, day: NaiveDate) -> String {
    let mut hasher = Sha256::new();
    hasher.update(client_address(headers).as_bytes());
    hasher.update(user_agent(headers).as_bytes());
    hasher.update(day.format("%Y-%m-%d").to_string().as_bytes());
    let digest = hasher.finalize();

    let mut hex = String::with_capacity(IDENTITY_HEX_LEN);
    for byte in digest.iter().take(IDENTITY_HEX_LEN / 2) {
        let _ = write!(hex, "{:02x}", byte);
    }
    hex
}

/// Explicit identity when present, otherwise the derived one
pub fn resolve_identity(headers: &HeaderMap, body_user_id: Option<&str>, day: NaiveDate) -> String {
    explicit_identity(headers, body_user_id).unwrap_or_else(|| derive_identity(headers, day))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    #[test]
    fn test_client_address_prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));

        assert_eq!(client_address(&headers), "203.0.113.7");
    }

    #[test]
    fn test_client_address_fallbacks() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_address(&headers), "0.0.0.0");

        headers.insert("x-forwarded-for", HeaderValue::from_static("garbage"));
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(client_address(&headers), "198.51.100.2");
    }

    #[test]
    fn test_derived_identity_is_stable_per_day() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7"));
        headers.insert("user-agent", HeaderValue::from_static("test-agent"));

        let a = derive_identity(&headers, day(1));
        let b = derive_identity(&headers, day(1));
        let c = derive_identity(&headers, day(2));

        assert_eq!(a.len(), 12);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_explicit_identity_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("from-header"));

        assert_eq!(resolve_identity(&headers, Some("from-body"), day(1)), "from-body");
        assert_eq!(resolve_identity(&headers, Some("  "), day(1)), "from-header");
        assert_eq!(resolve_identity(&headers, None, day(1)), "from-header");
    }
}
