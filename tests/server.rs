#![cfg(feature = "server")]

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use danbiz_insight::{db, server};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    let conn = db::open_in_memory().unwrap();
    db::setup_database(&conn).unwrap();
    db::setup_reporting_schema(&conn).unwrap();
    common::seed_sector_c(&conn);

    server::router(server::AppState::new(conn, common::fast_passwords()))
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_reporting_requires_login() {
    let app = app();

    let (status, body) = call(&app, "GET", "/api/years", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));

    let (status, _) = call(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_and_browse() {
    let app = app();

    let (_, session) = call(&app, "POST", "/api/auth/begin", None).await;
    assert_eq!(session["data"]["page"], json!("auth"));

    let (_, session) = call(&app, "POST", "/api/auth/toggle", None).await;
    assert_eq!(session["data"]["view"], json!("register"));

    let (status, session) = call(
        &app,
        "POST",
        "/api/auth/register",
        Some(json!({"username": "analyst", "password": "pw", "sectors": ["C", "Real estate"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["data"]["logged_in"], json!(true));
    assert_eq!(session["data"]["page"], json!("dashboard"));

    let (status, years) = call(&app, "GET", "/api/years", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(years["data"], json!({"min": 2019, "max": 2023}));

    let (_, companies) = call(&app, "GET", "/api/sectors/C/companies", None).await;
    assert_eq!(companies["data"][0]["cvr"], json!(10000001));
    assert_eq!(companies["data"][1]["cvr"], json!(10000002));

    let (_, compare) = call(
        &app,
        "GET",
        "/api/compare?first=10000001&second=10000002&start=2020&end=2022",
        None,
    )
    .await;
    assert_eq!(compare["data"]["rows"].as_array().unwrap().len(), 6);

    let (_, history) = call(&app, "GET", "/api/companies/10000001/history?start=abc&end=2020", None).await;
    assert_eq!(history["data"]["bounds"], json!({"start": 2019, "end": 2023}));
    assert!(history["data"]["warning"].is_string());

    let (status, _) = call(&app, "GET", "/api/companies/99999999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, health) = call(&app, "GET", "/api/metrics/health/avg_solvency_ratio", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!health["data"].as_array().unwrap().is_empty());

    let (_, session) = call(&app, "POST", "/api/auth/logout", None).await;
    assert_eq!(session["data"]["logged_in"], json!(false));
    assert_eq!(session["data"]["view"], json!("login"));

    let (status, _) = call(&app, "GET", "/api/metrics/liquidity", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bad_login_and_duplicate_registration() {
    let app = app();
    call(&app, "POST", "/api/auth/begin", None).await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/auth/login",
        Some(json!({"username": "ghost", "password": "pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], json!("Invalid username or password."));

    call(&app, "POST", "/api/auth/toggle", None).await;
    let register = json!({"username": "twice", "password": "pw"});
    let (status, _) = call(&app, "POST", "/api/auth/register", Some(register.clone())).await;
    assert_eq!(status, StatusCode::OK);

    call(&app, "POST", "/api/auth/logout", None).await;
    call(&app, "POST", "/api/auth/toggle", None).await;
    let (status, body) = call(&app, "POST", "/api/auth/register", Some(register)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], json!("Username already exists. Please try a different one."));

    let (status, _) = call(
        &app,
        "POST",
        "/api/auth/register",
        Some(json!({"username": "x", "password": "pw", "sectors": ["ZZ"]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
