// tests/support/mod.rs

#![allow(dead_code)]

use std::sync::Arc;

use axum::{body::Body, http::Request, Router};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use solar_backend::{
    build_router,
    config::{AppState, Config},
    services::mailer::SmtpMailer,
};

pub const JWT_SECRET: &str = "segredo-de-teste";

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/solar_test".into(),
        jwt_secret: JWT_SECRET.into(),
        bind_addr: "127.0.0.1:0".into(),
        frontend_url: "http://localhost:8081".into(),
        jwt_ttl_days: 7,
        db_max_connections: 2,
        measurement_interval_secs: 300,
        smtp_url: None,
        mail_from: None,
    }
}

pub fn app_with_pool(pool: PgPool) -> Router {
    let state = AppState::build(pool, test_config(), Arc::new(SmtpMailer::disabled()));
    build_router(state)
}

// Pool que nunca conecta: serve para rotas que respondem antes de tocar no banco.
pub fn app_without_db() -> Router {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy("postgres://localhost/solar_test")
        .unwrap();
    app_with_pool(pool)
}

pub async fn send(app: &Router, request: Request<Body>) -> (u16, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status().as_u16();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_owned())).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}
