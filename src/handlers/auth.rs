// src/handlers/auth.rs

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use validator::Validate;

use crate::{
    common::{error::AppError, response},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{AdminOnly, RequireRole, ResidentialOnly},
    },
    models::{
        auth::{
            AuthResponse, BusinessRegistration, ForgotPasswordPayload, LoginUserPayload,
            RegisterBusinessPayload, RegisterResidentialPayload, ResetPasswordPayload, User,
        },
        summary::{ResidentialSummary, SummaryQuery},
    },
    services::summary_service::parse_days,
};

// E-mail é único sem diferenciar caixa.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[utoipa::path(
    post,
    path = "/api/users/register/residential",
    tag = "Users",
    request_body = RegisterResidentialPayload,
    responses(
        (status = 201, description = "Usuário residencial criado", body = User),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "E-mail ou CPF já cadastrado")
    )
)]
pub async fn register_residential(
    State(app_state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<RegisterResidentialPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = app_state
        .auth_service
        .register_residential(
            payload.name.trim(),
            &normalize_email(&payload.email),
            &payload.password,
            &payload.cpf,
        )
        .await?;

    Ok(response::created(user, "Usuário registrado com sucesso."))
}

#[utoipa::path(
    post,
    path = "/api/users/register/business",
    tag = "Users",
    request_body = RegisterBusinessPayload,
    responses(
        (status = 201, description = "Empresa, usuário e filial padrão criados", body = BusinessRegistration),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "E-mail ou CNPJ já cadastrado")
    )
)]
pub async fn register_business(
    State(app_state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<RegisterBusinessPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let registration = app_state
        .auth_service
        .register_business(
            payload.user_name.trim(),
            &normalize_email(&payload.user_email),
            &payload.password,
            payload.company_name.trim(),
            &payload.company_cnpj,
        )
        .await?;

    Ok(response::created(registration, "Empresa registrada com sucesso."))
}

#[utoipa::path(
    post,
    path = "/api/users/login",
    tag = "Users",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Login realizado", body = AuthResponse),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<LoginUserPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let auth = app_state
        .auth_service
        .login_user(&normalize_email(&payload.email), &payload.password)
        .await?;

    Ok(response::ok(auth, "Login realizado com sucesso."))
}

// Handler da rota protegida /me
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "Usuário autenticado", body = User),
        (status = 401, description = "Token ausente ou inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> impl IntoResponse {
    response::ok(user, "Usuário autenticado.")
}

#[utoipa::path(
    get,
    path = "/api/users/me/summary",
    tag = "Users",
    params(("days" = Option<String>, Query, description = "Janela em dias (padrão 7)")),
    responses(
        (status = 200, description = "Resumo do usuário residencial", body = ResidentialSummary),
        (status = 403, description = "Disponível apenas para RESIDENTIAL")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_my_summary(
    State(app_state): State<AppState>,
    guard: RequireRole<ResidentialOnly>,
    WithRejection(Query(query), _): WithRejection<Query<SummaryQuery>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let days = parse_days(query.days.as_deref());
    let summary = app_state
        .summary_service
        .residential_summary(guard.user(), days)
        .await?;

    Ok(response::ok(summary, "Resumo calculado."))
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    responses(
        (status = 200, description = "Todos os usuários", body = [User]),
        (status = 403, description = "Apenas ADMIN")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
) -> Result<impl IntoResponse, AppError> {
    let users = app_state.auth_service.list_users().await?;
    Ok(response::ok(users, "Usuários listados."))
}

#[utoipa::path(
    post,
    path = "/api/users/forgot-password",
    tag = "Users",
    request_body = ForgotPasswordPayload,
    responses(
        (status = 200, description = "E-mail de recuperação enviado"),
        (status = 404, description = "E-mail não cadastrado")
    )
)]
pub async fn forgot_password(
    State(app_state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<ForgotPasswordPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    app_state
        .auth_service
        .request_password_reset(&normalize_email(&payload.email))
        .await?;

    Ok(response::ok((), "Se o e-mail estiver correto, você receberá o link de recuperação."))
}

#[utoipa::path(
    post,
    path = "/api/users/reset-password",
    tag = "Users",
    request_body = ResetPasswordPayload,
    responses(
        (status = 200, description = "Senha redefinida"),
        (status = 400, description = "Token inválido ou expirado")
    )
)]
pub async fn reset_password(
    State(app_state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<ResetPasswordPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    app_state
        .auth_service
        .reset_password(payload.token.trim(), &payload.password)
        .await?;

    Ok(response::ok((), "Senha redefinida com sucesso."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_compared_case_insensitively() {
        assert_eq!(normalize_email("  Ana@Exemplo.COM "), "ana@exemplo.com");
    }
}
