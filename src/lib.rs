// src/lib.rs

use std::any::Any;

use axum::{
    http::{header, Method, StatusCode},
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::{config::AppState, docs::ApiDoc, middleware::auth::auth_guard};

// Pânico em handler vira 500 no envelope padrão, sem derrubar o processo.
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("pânico sem mensagem");
    tracing::error!("💥 Pânico ao processar a requisição: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "success": false,
            "error": "Ocorreu um erro inesperado.",
            "code": "INTERNAL",
        })),
    )
        .into_response()
}

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let origin = match frontend_url.parse() {
        Ok(origin) => AllowOrigin::exact(origin),
        Err(_) => {
            tracing::warn!("FRONTEND_URL inválida ({}), CORS liberado para qualquer origem", frontend_url);
            AllowOrigin::any()
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

async fn health() -> impl IntoResponse {
    common::response::ok(json!({ "status": "ok" }), "OK")
}

pub fn build_router(app_state: AppState) -> Router {
    // Define as rotas de usuário públicas
    let user_public_routes = Router::new()
        .route("/register/residential", post(handlers::auth::register_residential))
        .route("/register/business", post(handlers::auth::register_business))
        .route("/login", post(handlers::auth::login))
        .route("/forgot-password", post(handlers::auth::forgot_password))
        .route("/reset-password", post(handlers::auth::reset_password));

    // Define as rotas de usuário (protegidas pelo middleware)
    let user_routes = Router::new()
        .route("/", get(handlers::auth::list_users))
        .route("/me", get(handlers::auth::get_me))
        .route("/me/summary", get(handlers::auth::get_my_summary))
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let panel_routes = Router::new()
        .route("/", get(handlers::panels::list_panels))
        .route("/provision", post(handlers::panels::provision))
        .route("/{id}", get(handlers::panels::get_panel))
        // Aqui o segmento é o serial; o nome do parâmetro precisa bater com as rotas irmãs.
        .route("/{id}/status", patch(handlers::panels::update_status))
        .route("/{id}/link", post(handlers::panels::link_panel))
        .route("/{id}/ping", post(handlers::panels::ping_panel))
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    // Ingestão aceita dispositivo (serial) ou usuário (token): autenticação opcional
    let measurement_ingest_routes = Router::new()
        .route("/", post(handlers::measurements::ingest))
        .route("/ping", post(handlers::measurements::ping));

    let measurement_routes = Router::new()
        .route("/panel/{panel_id}", get(handlers::measurements::list_by_panel))
        .route("/panel/{panel_id}/summary", get(handlers::measurements::panel_summary))
        .route("/{id}", get(handlers::measurements::get_measurement))
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let company_routes = Router::new()
        .route(
            "/",
            post(handlers::companies::create_company).get(handlers::companies::list_companies),
        )
        .route(
            "/{id}",
            get(handlers::companies::get_company)
                .put(handlers::companies::update_company)
                .delete(handlers::companies::delete_company),
        )
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let branch_routes = Router::new()
        .route("/", post(handlers::companies::create_branch))
        .route("/company/{company_id}", get(handlers::companies::list_branches))
        .route(
            "/{id}",
            get(handlers::companies::get_branch)
                .put(handlers::companies::update_branch)
                .delete(handlers::companies::delete_branch),
        )
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let newsletter_routes =
        Router::new().route("/subscribe", post(handlers::newsletter::subscribe));

    let api = Router::new()
        .route("/health", get(health))
        .nest("/users", user_public_routes.merge(user_routes))
        .nest("/panels", panel_routes)
        .nest("/measurements", measurement_ingest_routes.merge(measurement_routes))
        .nest("/companies", company_routes)
        .nest("/branches", branch_routes)
        .nest("/newsletter", newsletter_routes);

    let cors = cors_layer(&app_state.config.frontend_url);

    // Combina tudo no router principal
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api)
        .with_state(app_state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
