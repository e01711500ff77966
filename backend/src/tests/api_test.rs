// Router-level tests: every request goes through the full middleware stack

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::config::Config;
use crate::services::LLMService;
use crate::tests::common::{FakeLLM, create_test_db};
use crate::{AppState, build_router};

async fn test_app() -> Router {
    let pool = create_test_db().await;
    let llm = Arc::new(LLMService::with_client(Arc::new(FakeLLM::new()), 0.2));
    let config = Config::default();
    let static_config = config.static_config.clone();
    build_router(Arc::new(AppState::with_llm(config, pool, llm)), &static_config)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, body)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn register_and_login(app: &Router, email: &str) -> String {
    let (status, _) = send(
        app,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({ "email": email, "password": "correct-horse", "full_name": "Ada" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        json_request("POST", "/api/auth/login", None, json!({ "email": email, "password": "correct-horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_is_public() {
    let app = test_app().await;
    let (status, body) = send(&app, get_request("/api/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["llm_available"], true);
    assert_eq!(body["default_target"], false);
}

#[tokio::test]
async fn test_register_login_me() {
    let app = test_app().await;
    let token = register_and_login(&app, "Ada@Example.com").await;

    let (status, body) = send(&app, get_request("/api/auth/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "ada@example.com");
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = test_app().await;
    register_and_login(&app, "ada@example.com").await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({ "email": "ADA@example.com", "password": "another-pass" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 4005);
}

#[tokio::test]
async fn test_bad_password_is_unauthorized() {
    let app = test_app().await;
    register_and_login(&app, "ada@example.com").await;

    let (status, body) = send(
        &app,
        json_request("POST", "/api/auth/login", None, json!({ "email": "ada@example.com", "password": "nope-nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1003);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = test_app().await;

    let (status, body) = send(&app, json_request("POST", "/api/analyze", None, json!({ "sql": "SELECT 1" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Missing authorization header");

    let (status, _) = send(&app, get_request("/api/vault", Some("not-a-jwt"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_analyze_rejects_empty_and_unsafe_sql() {
    let app = test_app().await;
    let token = register_and_login(&app, "ada@example.com").await;

    let (status, body) =
        send(&app, json_request("POST", "/api/analyze", Some(&token), json!({ "sql": "   " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4003);
    assert_eq!(body["message"], "SQL query cannot be empty");

    let (status, body) = send(
        &app,
        json_request("POST", "/api/analyze", Some(&token), json!({ "sql": "DELETE FROM orders" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Only SELECT/CTE queries are allowed.");

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/analyze",
            Some(&token),
            json!({ "sql": "SELECT 1; GRANT ALL ON *.* TO 'x'@'%'" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4004);
}

#[tokio::test]
async fn test_analyze_without_any_target() {
    let app = test_app().await;
    let token = register_and_login(&app, "ada@example.com").await;

    let (status, body) =
        send(&app, json_request("POST", "/api/analyze", Some(&token), json!({ "sql": "SELECT 1" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2004);
}

#[tokio::test]
async fn test_analyze_with_unknown_profile() {
    let app = test_app().await;
    let token = register_and_login(&app, "ada@example.com").await;

    let (status, body) = send(
        &app,
        json_request("POST", "/api/analyze", Some(&token), json!({ "sql": "SELECT 1", "profile_id": 999 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 3001);
}

#[tokio::test]
async fn test_error_messages_follow_accept_language() {
    let app = test_app().await;
    let token = register_and_login(&app, "ada@example.com").await;

    let mut req = json_request("POST", "/api/analyze", Some(&token), json!({ "sql": "" }));
    req.headers_mut()
        .insert(header::ACCEPT_LANGUAGE, "zh-CN,zh;q=0.9".parse().unwrap());

    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "SQL 查询不能为空");
}

#[tokio::test]
async fn test_vault_crud_over_http() {
    let app = test_app().await;
    let token = register_and_login(&app, "ada@example.com").await;
    let other = register_and_login(&app, "bob@example.com").await;

    let (status, created) = send(
        &app,
        json_request(
            "POST",
            "/api/vault",
            Some(&token),
            json!({
                "connection_name": "replica",
                "config": { "host": "db.internal", "user": "reader", "password": "pw-123", "database": "shop" }
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["config"]["port"], 3306);
    let id = created["id"].as_i64().unwrap();

    let (status, list) = send(&app, get_request("/api/vault", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert!(!list.to_string().contains("pw-123"));

    let (status, _) = send(&app, get_request(&format!("/api/vault/{}", id), Some(&other))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let delete = Request::builder()
        .method("DELETE")
        .uri(format!("/api/vault/{}", id))
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, delete).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_vault_rejects_invalid_profile() {
    let app = test_app().await;
    let token = register_and_login(&app, "ada@example.com").await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/vault",
            Some(&token),
            json!({ "connection_name": "", "config": { "host": "", "user": "", "password": "", "database": "" } }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4001);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = test_app().await;
    let (status, body) = send(&app, get_request("/api-docs/openapi.json", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/api/analyze").is_some());
    assert!(body["components"]["securitySchemes"].get("bearer_auth").is_some());
}
