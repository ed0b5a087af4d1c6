//! IPアドレス正規化ユーティリティ
//!
//! 監査ログに記録する接続元アドレスを決定する

use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

/// IPアドレスを正規化する
///
/// IPv4-mapped IPv6（::ffff:x.x.x.x）をIPv4に変換。
/// それ以外はそのまま返す。
pub fn normalize_ip(addr: IpAddr) -> IpAddr {
    match addr {
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                IpAddr::V4(v4)
            } else {
                IpAddr::V6(v6)
            }
        }
        v4 => v4,
    }
}

/// SocketAddrからIPアドレスを抽出し正規化する
pub fn normalize_socket_ip(addr: &SocketAddr) -> IpAddr {
    normalize_ip(addr.ip())
}

/// プロキシヘッダー（X-Forwarded-For / X-Real-IP）の先頭アドレス
fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
        .map(normalize_ip)
}

/// 接続元アドレスを決定する
///
/// `trust_proxy_headers`が有効な場合のみプロキシヘッダーを優先する。
/// どちらからも得られなければ`None`。
pub fn resolve_origin(
    headers: &HeaderMap,
    peer: Option<&SocketAddr>,
    trust_proxy_headers: bool,
) -> Option<String> {
    if trust_proxy_headers {
        if let Some(ip) = forwarded_ip(headers) {
            return Some(ip.to_string());
        }
    }
    peer.map(|addr| normalize_socket_ip(addr).to_string())
}
