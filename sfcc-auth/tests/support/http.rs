//! HTTPリクエストヘルパー

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::net::SocketAddr;
use tower::ServiceExt;

/// テストで使う接続元アドレス
pub const PEER_ADDR: &str = "198.51.100.20:40000";

fn peer() -> ConnectInfo<SocketAddr> {
    ConnectInfo(PEER_ADDR.parse().expect("valid socket address"))
}

/// リクエストを送信し、ステータスとJSON本文を返す
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("send request");
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

/// GETリクエスト
pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method("GET").uri(uri).extension(peer());
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    send(app, builder.body(Body::empty()).expect("build request")).await
}

/// 任意のAuthorizationヘッダー付きGETリクエスト
pub async fn get_with_authorization(
    app: &Router,
    uri: &str,
    authorization: &str,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .extension(peer())
        .header("authorization", authorization)
        .body(Body::empty())
        .expect("build request");
    send(app, request).await
}

/// JSON本文付きPOSTリクエスト
pub async fn post_json(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    body: &Value,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .extension(peer())
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = builder
        .body(Body::from(serde_json::to_vec(body).expect("serialize body")))
        .expect("build request");
    send(app, request).await
}

/// ログインしてステータスとレスポンスを返す
pub async fn login(app: &Router, username: &str, password: &str) -> (StatusCode, Value) {
    post_json(
        app,
        "/api/auth/login",
        None,
        &serde_json::json!({ "username": username, "password": password }),
    )
    .await
}

/// ログインしてトークンを返す（失敗時はpanic）
pub async fn login_token(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = login(app, username, password).await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["token"].as_str().expect("token in response").to_string()
}
