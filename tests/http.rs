mod common;

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use blog_backend::AppState;
use blog_backend::config::{CacheSettings, Config};
use blog_backend::routes;
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    let h = common::harness();
    let config = Config {
        database_url: "memory://".to_string(),
        redis_url: "memory://".to_string(),
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        cache: CacheSettings::default(),
        service: common::settings(),
    };
    routes::router(AppState {
        services: Arc::new(h.services),
        config,
    })
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn register_and_login(app: &Router, username: &str) -> String {
    let (status, _) = send(
        app,
        json_request(
            "POST",
            "/api/users/register",
            None,
            json!({ "username": username, "password": "password", "email": format!("{username}@example.com") }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/api/users/login",
            None,
            json!({ "username": username, "password": "password" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["resp_data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn register_login_and_fetch_profile() {
    let app = app();
    let token = register_and_login(&app, "alice").await;

    let (status, body) = send(&app, get("/api/users/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 0);
    assert_eq!(body["resp_data"]["username"], "alice");
    assert!(body["resp_data"].get("password_hash").is_none());
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = app();

    let (status, body) = send(&app, get("/api/users/me", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("resp_data").is_none());

    let (status, _) = send(&app, get("/api/users/me", Some("not-a-jwt"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        json_request("POST", "/api/categories", None, json!({ "name": "Tech" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_invalidates_the_token() {
    let app = app();
    let token = register_and_login(&app, "alice").await;

    let (status, _) = send(
        &app,
        json_request("POST", "/api/users/logout", Some(&token), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, get("/api/users/me", Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_registration_is_a_conflict() {
    let app = app();
    register_and_login(&app, "alice").await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/users/register",
            None,
            json!({ "username": "alice", "password": "password", "email": "other@example.com" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_ne!(body["code"], 0);
}

#[tokio::test]
async fn public_reads_of_missing_entities_are_not_found() {
    let app = app();
    let (status, _) = send(&app, get("/api/posts/42", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, get("/api/categories", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resp_data"]["total"], 0);
}
