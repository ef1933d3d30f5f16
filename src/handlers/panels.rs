// src/handlers/panels.rs

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
    middleware::auth::AuthenticatedUser,
    models::{
        measurement::Measurement,
        panel::{Panel, PingResponse, ProvisionPanelPayload, UpdatePanelStatusPayload},
    },
};

#[utoipa::path(
    post,
    path = "/api/panels/provision",
    tag = "Panels",
    request_body = ProvisionPanelPayload,
    responses(
        (status = 201, description = "Painel provisionado", body = Panel),
        (status = 403, description = "Cota de painéis atingida"),
        (status = 404, description = "Filial não encontrada"),
        (status = 409, description = "Serial já pertence a outro dono")
    ),
    security(("api_jwt" = []))
)]
pub async fn provision(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    WithRejection(Json(payload), _): WithRejection<Json<ProvisionPanelPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let panel = app_state
        .panel_service
        .provision(
            &user.principal(),
            payload.serial.trim(),
            payload.location.trim(),
            payload.model.trim(),
            payload.branch_id,
        )
        .await?;

    Ok(response::created(panel, "Painel provisionado com sucesso."))
}

#[utoipa::path(
    get,
    path = "/api/panels",
    tag = "Panels",
    responses((status = 200, description = "Painéis visíveis para o usuário", body = [Panel])),
    security(("api_jwt" = []))
)]
pub async fn list_panels(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let panels = app_state.panel_service.list(&user.principal()).await?;
    Ok(response::ok(panels, "Painéis listados."))
}

#[utoipa::path(
    get,
    path = "/api/panels/{id}",
    tag = "Panels",
    params(("id" = Uuid, Path, description = "ID do painel")),
    responses(
        (status = 200, description = "Painel", body = Panel),
        (status = 403, description = "Painel de outro dono"),
        (status = 404, description = "Painel não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_panel(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let panel = app_state.panel_service.get_by_id(&user.principal(), id).await?;
    Ok(response::ok(panel, "Painel encontrado."))
}

#[utoipa::path(
    patch,
    path = "/api/panels/{id}/status",
    tag = "Panels",
    request_body = UpdatePanelStatusPayload,
    params(("id" = String, Path, description = "Serial do painel (o segmento `{id}` carrega o serial)")),
    responses(
        (status = 201, description = "Status registrado como nova medição", body = Measurement),
        (status = 403, description = "Painel de outro dono"),
        (status = 404, description = "Painel não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_status(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    WithRejection(Path(serial), _): WithRejection<Path<String>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdatePanelStatusPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let measurement = app_state
        .panel_service
        .update_status_by_serial(&user.principal(), serial.trim(), &payload.status, payload.energia_kwh)
        .await?;

    Ok(response::created(measurement, "Status atualizado."))
}

#[utoipa::path(
    post,
    path = "/api/panels/{id}/link",
    tag = "Panels",
    params(("id" = Uuid, Path, description = "ID do painel")),
    responses(
        (status = 200, description = "Painel vinculado ao usuário", body = Panel),
        (status = 403, description = "Apenas RESIDENTIAL, ou cota atingida"),
        (status = 409, description = "Painel já pertence a outro dono")
    ),
    security(("api_jwt" = []))
)]
pub async fn link_panel(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let panel = app_state.panel_service.link_existing(&user.principal(), id).await?;
    Ok(response::ok(panel, "Painel vinculado com sucesso."))
}

#[utoipa::path(
    post,
    path = "/api/panels/{id}/ping",
    tag = "Panels",
    params(("id" = Uuid, Path, description = "ID do painel")),
    responses(
        (status = 200, description = "lastSeen atualizado", body = PingResponse),
        (status = 403, description = "Painel de outro dono")
    ),
    security(("api_jwt" = []))
)]
pub async fn ping_panel(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let ping = app_state
        .telemetry_service
        .ping_for_user(&user.principal(), id)
        .await?;
    Ok(response::ok(ping, "Ping registrado."))
}
