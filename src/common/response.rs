// src/common/response.rs

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

/// Envelope de sucesso comum a todos os endpoints: `{success, data, message}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
        }
    }
}

// 200 OK
pub fn ok<T: Serialize>(data: T, message: impl Into<String>) -> impl IntoResponse {
    (StatusCode::OK, Json(ApiResponse::new(data, message)))
}

// 201 Created
pub fn created<T: Serialize>(data: T, message: impl Into<String>) -> impl IntoResponse {
    (StatusCode::CREATED, Json(ApiResponse::new(data, message)))
}

// 202 Accepted (ingestão vinda do dispositivo)
pub fn accepted<T: Serialize>(data: T, message: impl Into<String>) -> impl IntoResponse {
    (StatusCode::ACCEPTED, Json(ApiResponse::new(data, message)))
}
