//! Small helpers for request inspection.

use axum::{extract::ConnectInfo, http::HeaderMap};
use std::net::SocketAddr;

const UNKNOWN_CLIENT: &str = "unknown";

/// The `X-Forwarded-For` entry written by the outermost trusted proxy.
///
/// Proxies append, so only entries counted from the right are trustworthy:
/// with `trusted_hops = 1` the rightmost entry is used. Returns `None` when no
/// proxy is trusted or the header is shorter than the configured chain.
pub(super) fn forwarded_client_ip(headers: &HeaderMap, trusted_hops: usize) -> Option<String> {
    if trusted_hops == 0 {
        return None;
    }
    let entries: Vec<&str> = headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .collect();
    let index = entries.len().checked_sub(trusted_hops)?;
    entries.get(index).map(|value| (*value).to_string())
}

/// Rate limit key: the trusted forwarded address, then the peer address.
pub(super) fn client_key(
    headers: &HeaderMap,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
    trusted_hops: usize,
) -> String {
    forwarded_client_ip(headers, trusted_hops)
        .or_else(|| connect_info.map(|ConnectInfo(addr)| addr.ip().to_string()))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}
