// src/handlers/companies.rs

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, response},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{AdminOnly, RequireRole},
    },
    models::company::{
        Branch, Company, CreateBranchPayload, CreateCompanyPayload, UpdateBranchPayload,
        UpdateCompanyPayload,
    },
};

// ---
// Empresas
// ---

#[utoipa::path(
    post,
    path = "/api/companies",
    tag = "Companies",
    request_body = CreateCompanyPayload,
    responses(
        (status = 201, description = "Empresa criada", body = Company),
        (status = 403, description = "Apenas ADMIN"),
        (status = 409, description = "CNPJ já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_company(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateCompanyPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let company = app_state
        .company_service
        .create_company(&payload.name, &payload.cnpj)
        .await?;

    Ok(response::created(company, "Empresa criada com sucesso."))
}

#[utoipa::path(
    get,
    path = "/api/companies",
    tag = "Companies",
    responses(
        (status = 200, description = "Todas as empresas", body = [Company]),
        (status = 403, description = "Apenas ADMIN")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_companies(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
) -> Result<impl IntoResponse, AppError> {
    let companies = app_state.company_service.list_companies().await?;
    Ok(response::ok(companies, "Empresas listadas."))
}

#[utoipa::path(
    get,
    path = "/api/companies/{id}",
    tag = "Companies",
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses(
        (status = 200, description = "Empresa", body = Company),
        (status = 403, description = "Empresa de outro usuário"),
        (status = 404, description = "Empresa não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_company(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let company = app_state.company_service.get_company(&user.principal(), id).await?;
    Ok(response::ok(company, "Empresa encontrada."))
}

#[utoipa::path(
    put,
    path = "/api/companies/{id}",
    tag = "Companies",
    request_body = UpdateCompanyPayload,
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses(
        (status = 200, description = "Empresa atualizada", body = Company),
        (status = 403, description = "Empresa de outro usuário"),
        (status = 409, description = "CNPJ já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_company(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateCompanyPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let company = app_state
        .company_service
        .update_company(&user.principal(), id, &payload)
        .await?;
    Ok(response::ok(company, "Empresa atualizada."))
}

#[utoipa::path(
    delete,
    path = "/api/companies/{id}",
    tag = "Companies",
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses(
        (status = 200, description = "Empresa removida"),
        (status = 409, description = "Empresa ainda possui filiais ou usuários")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_company(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    app_state.company_service.delete_company(&user.principal(), id).await?;
    Ok(response::ok((), "Empresa removida."))
}

// ---
// Filiais
// ---

#[utoipa::path(
    post,
    path = "/api/branches",
    tag = "Branches",
    request_body = CreateBranchPayload,
    responses(
        (status = 201, description = "Filial criada", body = Branch),
        (status = 403, description = "Empresa de outro usuário"),
        (status = 404, description = "Empresa não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_branch(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    WithRejection(Json(payload), _): WithRejection<Json<CreateBranchPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let branch = app_state
        .company_service
        .create_branch(&user.principal(), &payload)
        .await?;
    Ok(response::created(branch, "Filial criada com sucesso."))
}

#[utoipa::path(
    get,
    path = "/api/branches/company/{company_id}",
    tag = "Branches",
    params(("company_id" = Uuid, Path, description = "ID da empresa")),
    responses(
        (status = 200, description = "Filiais da empresa", body = [Branch]),
        (status = 403, description = "Empresa de outro usuário")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_branches(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    WithRejection(Path(company_id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let branches = app_state
        .company_service
        .list_branches(&user.principal(), company_id)
        .await?;
    Ok(response::ok(branches, "Filiais listadas."))
}

#[utoipa::path(
    get,
    path = "/api/branches/{id}",
    tag = "Branches",
    params(("id" = Uuid, Path, description = "ID da filial")),
    responses(
        (status = 200, description = "Filial", body = Branch),
        (status = 404, description = "Filial não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_branch(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let branch = app_state.company_service.get_branch(&user.principal(), id).await?;
    Ok(response::ok(branch, "Filial encontrada."))
}

#[utoipa::path(
    put,
    path = "/api/branches/{id}",
    tag = "Branches",
    request_body = UpdateBranchPayload,
    params(("id" = Uuid, Path, description = "ID da filial")),
    responses(
        (status = 200, description = "Filial atualizada", body = Branch),
        (status = 403, description = "Filial de outra empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_branch(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateBranchPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let branch = app_state
        .company_service
        .update_branch(&user.principal(), id, &payload)
        .await?;
    Ok(response::ok(branch, "Filial atualizada."))
}

#[utoipa::path(
    delete,
    path = "/api/branches/{id}",
    tag = "Branches",
    params(("id" = Uuid, Path, description = "ID da filial")),
    responses(
        (status = 200, description = "Filial removida"),
        (status = 409, description = "Filial ainda possui painéis")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_branch(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    app_state.company_service.delete_branch(&user.principal(), id).await?;
    Ok(response::ok((), "Filial removida."))
}
