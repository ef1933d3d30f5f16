// src/models/auth.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::company::{Branch, Company};

// Mapeia o ENUM 'user_role' do Postgres
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Residential,
    Business,
    Admin,
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    pub role: Role,
    pub cpf: Option<String>,
    pub company_id: Option<Uuid>,
    pub tarifa_kwh: Decimal,
    pub fator_co2_kwh: Decimal,

    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub reset_token: Option<String>,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub reset_token_expires: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
            company_id: self.company_id,
        }
    }
}

/// A identidade autenticada que faz a requisição, com os atributos de posse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub company_id: Option<Uuid>,
}

// ---
// Validações customizadas (documentos brasileiros só com dígitos)
// ---
fn only_digits(value: &str, len: usize, code: &'static str, message: &'static str) -> Result<(), ValidationError> {
    if value.len() == len && value.chars().all(|c| c.is_ascii_digit()) {
        return Ok(());
    }
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    Err(err)
}

fn validate_cpf(cpf: &str) -> Result<(), ValidationError> {
    only_digits(cpf, 11, "cpf", "O CPF deve conter 11 dígitos.")
}

pub(crate) fn validate_cnpj(cnpj: &str) -> Result<(), ValidationError> {
    only_digits(cnpj, 14, "cnpj", "O CNPJ deve conter 14 dígitos.")
}

// Dados para registro de um usuário residencial
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterResidentialPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
    #[validate(custom(function = "validate_cpf"))]
    pub cpf: String,
}

// Dados para registro empresarial (usuário + empresa + filial padrão)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBusinessPayload {
    #[validate(length(min = 1, message = "O nome do usuário é obrigatório."))]
    pub user_name: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub user_email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
    #[validate(length(min = 1, message = "O nome da empresa é obrigatório."))]
    pub company_name: String,
    #[validate(custom(function = "validate_cnpj"))]
    pub company_cnpj: String,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 1, message = "A senha é obrigatória."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordPayload {
    #[validate(length(min = 1, message = "O token é obrigatório."))]
    pub token: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

// Resultado do registro empresarial: tudo o que foi criado na mesma transação
#[derive(Debug, Serialize, ToSchema)]
pub struct BusinessRegistration {
    pub user: User,
    pub company: Company,
    pub branch: Branch,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub sub: Uuid, // Subject (ID do usuário)
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<Uuid>,
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}
