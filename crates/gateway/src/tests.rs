//! Router tests against an in-memory SQLite database

use super::*;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use ideahub_common::{assistant::MockCompletionClient, config::DatabaseConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn app_with(configure: impl FnOnce(&mut AppConfig), assistant: Option<Arc<dyn CompletionClient>>) -> Router {
    let mut config = AppConfig::default();
    config.database = DatabaseConfig::sqlite_memory();
    config.auth.jwt_secret = Some("test-secret".to_string());
    config.auth.allow_admin_signup = true;
    config.rate_limit.enabled = false;
    configure(&mut config);

    let db = DbPool::new(&config.database).await.unwrap();
    db.sync_schema().await.unwrap();

    let state = AppState::new(Arc::new(config), db, assistant, None).unwrap();
    create_router(state)
}

async fn app() -> Router {
    app_with(|_| {}, None).await
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");

    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let body = match body {
        Some(value) => Body::from(serde_json::to_vec(&value).unwrap()),
        None => Body::empty(),
    };

    let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}

/// Register an account and return its token
async fn register(app: &Router, username: &str, is_admin: bool) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "secret1",
            "isAdmin": is_admin,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["token"].as_str().unwrap().to_string()
}

async fn submit(app: &Router, token: &str, title: &str, description: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/api/ideas",
        Some(token),
        Some(json!({ "title": title, "description": description })),
    )
    .await
}

#[tokio::test]
async fn test_health() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["database"]["status"], "up");
    assert_eq!(body["checks"]["assistant"]["status"], "disabled");
}

#[tokio::test]
async fn test_register_login_and_validate_token() {
    let app = app().await;
    register(&app, "alice", false).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "alice");
    assert!(body["user"].get("password_hash").is_none());

    let token = body["token"].as_str().unwrap();
    let (status, body) = send(&app, Method::GET, &format!("/api/validate-token?token={}", token), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "username": "alice", "email": "alice@example.com", "role": "user" }));

    let (status, _) = send(&app, Method::GET, "/api/validate-token", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/api/validate-token?token=garbage", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bad_login_and_duplicate_registration() {
    let app = app().await;
    register(&app, "alice", false).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "nope-nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/register",
        None,
        Some(json!({ "username": "alice", "email": "new@example.com", "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["message"], "Username already exists");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/register",
        None,
        Some(json!({ "username": "x", "email": "bad", "password": "1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_ideas_require_authentication() {
    let app = app().await;

    let (status, body) = send(&app, Method::POST, "/api/ideas", None, Some(json!({ "title": "t", "description": "d" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, _) = send(&app, Method::GET, "/api/ideas", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_submission_gates() {
    let app = app().await;
    let token = register(&app, "alice", false).await;

    let (status, created) = submit(&app, &token, "Build a treehouse", "A wooden platform in the big oak").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "pending");

    // Gate 1: missing description
    let (status, body) = submit(&app, &token, "Something else", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["message"], "Validation failed: Title and description are required");

    // Gate 2: exact title, different case
    let (status, body) = submit(&app, &token, "build a Treehouse", "Totally different text").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "DUPLICATE_IDEA");
    assert_eq!(body["error"]["details"]["field"], "title");

    // Gate 4: near-duplicate description
    let (status, body) = submit(&app, &token, "Climbing frame", "A wooden platform in the big  OAK tree").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "SIMILAR_IDEA");
    assert_eq!(body["error"]["details"]["field"], "description");
    assert_eq!(body["error"]["details"]["conflicting_idea_id"], created["id"]);

    let (status, mine) = send(&app, Method::GET, "/api/ideas", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);
    assert_eq!(mine[0]["owner"]["email"], "alice@example.com");
}

#[tokio::test]
async fn test_edit_and_delete_own_ideas() {
    let app = app().await;
    let alice = register(&app, "alice", false).await;
    let bob = register(&app, "bob", false).await;

    let (_, idea) = submit(&app, &alice, "Nap pods", "Quiet pods on floor three").await;
    submit(&app, &alice, "Bike racks", "More racks at the north entrance").await;
    let uri = format!("/api/ideas/{}", idea["id"].as_str().unwrap());

    let (status, _) = send(&app, Method::PUT, &uri, Some(&bob), Some(json!({ "title": "Mine now" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::PUT, &uri, Some(&alice), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Colliding with another idea is rejected; its own old content is not a collision
    let (status, _) = send(&app, Method::PUT, &uri, Some(&alice), Some(json!({ "title": "bike racks" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, updated) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&alice),
        Some(json!({ "description": "Quiet pods on floor three and four" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Nap pods");
    assert_eq!(updated["status"], "pending");

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::DELETE, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Idea deleted successfully");
}

#[tokio::test]
async fn test_admin_routes_require_admin() {
    let app = app().await;
    let user = register(&app, "alice", false).await;

    let (status, body) = send(&app, Method::GET, "/api/admin/ideas", Some(&user), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_admin_signup_disabled_by_config() {
    let app = app_with(|config| config.auth.allow_admin_signup = false, None).await;
    let token = register(&app, "root", true).await;

    let (status, _) = send(&app, Method::GET, "/api/admin/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_moderation_and_public_listing() {
    let app = app().await;
    let admin = register(&app, "root", true).await;
    let alice = register(&app, "alice", false).await;

    let (_, idea) = submit(&app, &alice, "Rooftop garden", "Grow herbs for the kitchen").await;
    submit(&app, &alice, "Nap pods", "Quiet pods on floor three").await;
    let status_uri = format!("/api/admin/ideas/{}/status", idea["id"].as_str().unwrap());

    let (status, _) = send(&app, Method::PUT, &status_uri, Some(&admin), Some(json!({ "status": "archived" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing = format!("/api/admin/ideas/{}/status", uuid::Uuid::new_v4());
    let (status, _) = send(&app, Method::PUT, &missing, Some(&admin), Some(json!({ "status": "approved" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::PUT, &status_uri, Some(&admin), Some(json!({ "status": "approved" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "approved");

    let (_, approved) = send(&app, Method::GET, "/api/ideas/approved", None, None).await;
    assert_eq!(approved.as_array().unwrap().len(), 1);
    assert_eq!(approved[0]["owner"]["username"], "alice");

    let (_, hits) = send(&app, Method::GET, "/api/ideas/search?query=GARDEN", None, None).await;
    assert_eq!(hits.as_array().unwrap().len(), 1);
    let (_, hits) = send(&app, Method::GET, "/api/ideas/search?query=pods", None, None).await;
    assert_eq!(hits.as_array().unwrap().len(), 0);
    let (status, _) = send(&app, Method::GET, "/api/ideas/search?query=", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    // Spaces are matched literally, not treated as a missing query
    let (status, hits) = send(&app, Method::GET, "/api/ideas/search?query=%20", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hits.as_array().unwrap().len(), 1);

    let (_, stats) = send(&app, Method::GET, "/api/admin/stats/ideas-status", Some(&admin), None).await;
    assert_eq!(stats, json!({ "approvedCount": 1, "pendingCount": 1 }));

    let (_, stats) = send(&app, Method::GET, "/api/admin/stats/ideas", Some(&admin), None).await;
    assert_eq!(stats["totalIdeas"], 2);
    assert_eq!(
        stats["ideasByStatus"],
        json!([{ "status": "approved", "count": 1 }, { "status": "pending", "count": 1 }])
    );

    let (_, stats) = send(&app, Method::GET, "/api/admin/stats/users", Some(&admin), None).await;
    assert_eq!(stats, json!({ "totalUsers": 1, "totalAdmins": 1 }));
}

#[tokio::test]
async fn test_admin_deletes_user_and_ideas() {
    let app = app().await;
    let admin = register(&app, "root", true).await;
    let alice = register(&app, "alice", false).await;
    submit(&app, &alice, "Rooftop garden", "Grow herbs for the kitchen").await;

    let (_, users) = send(&app, Method::GET, "/api/admin/users", Some(&admin), None).await;
    assert_eq!(users.as_array().unwrap().len(), 1);
    let alice_id = users[0]["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, Method::DELETE, &format!("/api/admin/users/{}", alice_id), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, ideas) = send(&app, Method::GET, "/api/admin/ideas", Some(&admin), None).await;
    assert_eq!(ideas, json!([]));

    // The deleted user's token no longer authenticates
    let (status, _) = send(&app, Method::GET, "/api/ideas", Some(&alice), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/admin/users/{}", alice_id), Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::POST, "/api/admin/users/bulk-delete", Some(&admin), Some(json!({ "userIds": [] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_assistant_proxy() {
    let app = app().await;
    let (status, body) = send(&app, Method::POST, "/api/assistant", None, Some(json!({ "text": "hi" }))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");

    let app = app_with(|_| {}, Some(Arc::new(MockCompletionClient::answering("Hello!")))).await;
    let (status, body) = send(&app, Method::POST, "/api/assistant", None, Some(json!({ "text": "hi" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "answer": "Hello!" }));

    let app = app_with(|_| {}, Some(Arc::new(MockCompletionClient::failing("upstream down")))).await;
    let (status, body) = send(&app, Method::POST, "/api/assistant", None, Some(json!({ "text": "hi" }))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");
}

#[tokio::test]
async fn test_groq_route_serves_the_assistant() {
    let app = app_with(|_| {}, Some(Arc::new(MockCompletionClient::answering("Hello!")))).await;
    let (status, body) = send(&app, Method::POST, "/api/groq", None, Some(json!({ "text": "hi" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "answer": "Hello!" }));
}

#[tokio::test]
async fn test_error_body_echoes_request_id() {
    let app = app().await;
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/ideas")
        .header("x-request-id", "trace-123")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()["x-request-id"], "trace-123");

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["request_id"], "trace-123");
}

#[tokio::test]
async fn test_shutdown_deadline() {
    let (tx, rx) = watch::channel(false);
    tx.send(true).unwrap();
    let stuck = with_shutdown_deadline(std::future::pending::<()>(), rx, Duration::from_millis(10)).await;
    assert!(stuck.is_none());

    let (_tx, rx) = watch::channel(false);
    let finished = with_shutdown_deadline(async { 7 }, rx, Duration::from_millis(10)).await;
    assert_eq!(finished, Some(7));
}

#[tokio::test]
async fn test_rate_limit() {
    let app = app_with(
        |config| {
            config.rate_limit.enabled = true;
            config.rate_limit.requests_per_second = 1;
            config.rate_limit.burst = 1;
        },
        None,
    )
    .await;

    let (status, _) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], "RATE_LIMITED");
}

#[test]
fn test_missing_jwt_secret_fails_state_construction() {
    let config = AppConfig::default();
    assert!(config.jwt_secret().is_err());
}
