// src/common/error.rs

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// Cada variante corresponde a uma categoria da taxonomia pública (ver `code()`).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Painel não autorizado ou não provisionado")]
    DeviceNotProvisioned,

    #[error("{0}")]
    Forbidden(String),

    #[error("Limite de {0} painéis por usuário residencial atingido")]
    QuotaExceeded(i64),

    #[error("{0} não encontrado(a)")]
    NotFound(&'static str),

    // `field` é a dica legível do campo duplicado (email, cpf, cnpj, serial).
    #[error("Já existe um registro com este {field}")]
    Conflict { field: &'static str },

    #[error("{0}")]
    StillReferenced(&'static str),

    #[error("Painel já vinculado a outro dono")]
    PanelAlreadyOwned,

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials
            | AppError::InvalidToken
            | AppError::DeviceNotProvisioned => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) | AppError::QuotaExceeded(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict { .. }
            | AppError::StillReferenced(_)
            | AppError::PanelAlreadyOwned => StatusCode::CONFLICT,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Código estável da taxonomia, usado pelos clientes para decidir o que fazer.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) => "VALIDATION",
            AppError::InvalidCredentials
            | AppError::InvalidToken
            | AppError::DeviceNotProvisioned => "AUTH",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::QuotaExceeded(_) => "QUOTA_EXCEEDED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict { .. }
            | AppError::StillReferenced(_)
            | AppError::PanelAlreadyOwned => "CONFLICT",
            _ => "INTERNAL",
        }
    }

    pub fn forbidden() -> Self {
        AppError::Forbidden("Acesso negado. Você não tem permissão para executar esta ação.".into())
    }
}

// Corpo JSON malformado também precisa sair no envelope padrão.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let (error_message, details): (String, Option<Value>) = match &self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                (
                    "Um ou mais campos são inválidos.".to_string(),
                    Some(json!(details)),
                )
            }
            AppError::Conflict { field } => (self.to_string(), Some(json!({ "field": field }))),
            AppError::QuotaExceeded(limit) => (self.to_string(), Some(json!({ "limit": limit }))),

            // Os erros internos são logados com detalhe e respondidos de forma genérica.
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => {
                tracing::error!("Erro Interno do Servidor: {}", self);
                ("Ocorreu um erro inesperado.".to_string(), None)
            }
            _ => (self.to_string(), None),
        };

        let mut body = json!({
            "success": false,
            "error": error_message,
            "code": code,
        });
        if let Some(details) = details {
            body["details"] = details;
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{ValidationError, ValidationErrors};

    async fn body_of(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn taxonomy_maps_to_http_status() {
        assert_eq!(AppError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::DeviceNotProvisioned.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::forbidden().status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::QuotaExceeded(10).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("Painel").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict { field: "email" }.status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::InternalServerError(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn quota_is_forbidden_with_its_own_code() {
        assert_eq!(AppError::QuotaExceeded(10).code(), "QUOTA_EXCEEDED");
        assert_eq!(AppError::forbidden().code(), "FORBIDDEN");
    }

    #[tokio::test]
    async fn conflict_envelope_carries_field_hint() {
        let (status, body) = body_of(AppError::Conflict { field: "cpf" }).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "CONFLICT");
        assert_eq!(body["details"]["field"], "cpf");
    }

    #[tokio::test]
    async fn internal_errors_do_not_leak_details() {
        let (status, body) =
            body_of(AppError::InternalServerError(anyhow::anyhow!("senha do banco: 123"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Ocorreu um erro inesperado.");
        assert!(!body.to_string().contains("123"));
    }

    #[tokio::test]
    async fn validation_envelope_lists_fields() {
        let mut errors = ValidationErrors::new();
        let mut err = ValidationError::new("email");
        err.message = Some("O e-mail fornecido é inválido.".into());
        errors.add("email", err);

        let (status, body) = body_of(AppError::ValidationError(errors)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION");
        assert_eq!(body["details"]["email"][0], "O e-mail fornecido é inválido.");
    }
}
