// 認可ミドルウェア
//
// ルートごとに許可ロール集合を持つ`RoleGuard`を状態として渡し、
// 判定に通ったリクエストには検証済み`Claims`を拡張に挿入する。

use crate::auth::access::RequestContext;
use crate::common::auth::{Claims, RoleSet};
use crate::common::error::AuthError;
use crate::common::ip::resolve_origin;
use crate::AppState;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;

/// ルート単位の認可設定
#[derive(Clone)]
pub struct RoleGuard {
    state: AppState,
    required: RoleSet,
}

impl RoleGuard {
    /// 許可ロール集合を指定して作成
    pub fn new(state: AppState, required: RoleSet) -> Self {
        Self { state, required }
    }
}

/// AuthorizationヘッダーからBearerトークンを取り出す
///
/// # Returns
/// * `Ok(None)` - ヘッダーなし、または値が空
/// * `Ok(Some(token))` - Bearerトークン
/// * `Err(AuthError::InvalidToken)` - Bearer以外のスキーム、または非ASCII
pub(crate) fn extract_bearer(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| AuthError::InvalidToken)?.trim();
    if value.is_empty() {
        return Ok(None);
    }

    let (scheme, token) = value.split_once(' ').unwrap_or((value, ""));
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidToken);
    }

    let token = token.trim();
    Ok((!token.is_empty()).then_some(token))
}

/// リクエストの接続元アドレスを決定
pub(crate) fn request_origin(request: &Request, trust_proxy_headers: bool) -> Option<String> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr);
    resolve_origin(request.headers(), peer, trust_proxy_headers)
}

/// ロール判定ミドルウェア
///
/// `axum::middleware::from_fn_with_state(RoleGuard, require_roles)`で使う。
/// 操作名は`"{METHOD} {path}"`として監査ログに残る。
pub async fn require_roles(
    State(guard): State<RoleGuard>,
    mut request: Request,
    next: Next,
) -> Response {
    let ctx = RequestContext::new(
        format!("{} {}", request.method(), request.uri().path()),
        request_origin(&request, guard.state.config.trust_proxy_headers),
    );

    let bearer = match extract_bearer(request.headers()) {
        Ok(bearer) => bearer.map(str::to_owned),
        Err(e) => return crate::api::error::AppError::from(e).into_response(),
    };

    match guard
        .state
        .access
        .authorize(bearer.as_deref(), &guard.required, &ctx)
        .await
    {
        Ok(claims) => {
            request.extensions_mut().insert::<Claims>(claims);
            next.run(request).await
        }
        Err(e) => crate::api::error::AppError::from(e).into_response(),
    }
}
