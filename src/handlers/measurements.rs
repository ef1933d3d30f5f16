// src/handlers/measurements.rs

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;

use crate::{
    common::{error::AppError, response},
    config::AppState,
    middleware::auth::{AuthenticatedUser, MaybeUser},
    models::{
        measurement::{IngestMeasurementPayload, IngestResponse, Measurement, MeasurementPage, PageQuery, PingPayload},
        panel::PingResponse,
        summary::{PanelSummary, SummaryQuery},
    },
    services::{summary_service::parse_days, telemetry_service::page_params},
};

/// Ingestão de telemetria.
///
/// Com `serial` é o caminho do dispositivo e responde 202.
/// Com token e `panelId` é o caminho do usuário, com checagem de posse, e responde 201.
#[utoipa::path(
    post,
    path = "/api/measurements",
    tag = "Measurements",
    request_body = IngestMeasurementPayload,
    responses(
        (status = 201, description = "Medição registrada (usuário)", body = IngestResponse),
        (status = 202, description = "Medição aceita (dispositivo)", body = IngestResponse),
        (status = 400, description = "Payload inválido"),
        (status = 401, description = "Serial desconhecido ou não provisionado")
    )
)]
pub async fn ingest(
    State(app_state): State<AppState>,
    MaybeUser(user): MaybeUser,
    WithRejection(Json(payload), _): WithRejection<Json<IngestMeasurementPayload>, AppError>,
) -> Result<Response, AppError> {
    let telemetry = &app_state.telemetry_service;

    match (user, payload.panel_id, payload.serial.as_deref()) {
        (Some(user), Some(panel_id), _) => {
            let measurement = telemetry
                .ingest_for_user(&user.principal(), panel_id, &payload)
                .await?;
            Ok(response::created(IngestResponse { id: measurement.id }, "Medição registrada.").into_response())
        }
        (_, _, Some(serial)) if !serial.trim().is_empty() => {
            let measurement = telemetry.ingest_from_device(serial, &payload).await?;
            Ok(response::accepted(IngestResponse { id: measurement.id }, "Medição recebida.").into_response())
        }
        (None, Some(_), _) => Err(AppError::InvalidToken),
        _ => Err(AppError::BadRequest("Informe o serial do dispositivo ou o panelId.".into())),
    }
}

#[utoipa::path(
    post,
    path = "/api/measurements/ping",
    tag = "Measurements",
    request_body = PingPayload,
    responses(
        (status = 200, description = "lastSeen atualizado, nenhuma medição criada", body = PingResponse),
        (status = 401, description = "Serial desconhecido ou não provisionado")
    )
)]
pub async fn ping(
    State(app_state): State<AppState>,
    MaybeUser(user): MaybeUser,
    WithRejection(Json(payload), _): WithRejection<Json<PingPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let telemetry = &app_state.telemetry_service;

    let ping = match (user, payload.panel_id, payload.serial.as_deref()) {
        (Some(user), Some(panel_id), _) => telemetry.ping_for_user(&user.principal(), panel_id).await?,
        (_, _, Some(serial)) if !serial.trim().is_empty() => telemetry.ping_device(serial).await?,
        (None, Some(_), _) => return Err(AppError::InvalidToken),
        _ => {
            return Err(AppError::BadRequest(
                "Informe o serial do dispositivo ou o panelId.".into(),
            ))
        }
    };

    Ok(response::ok(ping, "Ping registrado."))
}

#[utoipa::path(
    get,
    path = "/api/measurements/panel/{panel_id}",
    tag = "Measurements",
    params(
        ("panel_id" = Uuid, Path, description = "ID do painel"),
        ("page" = Option<String>, Query, description = "Página (padrão 1)"),
        ("limit" = Option<String>, Query, description = "Itens por página (padrão 20, máximo 100)")
    ),
    responses(
        (status = 200, description = "Medições do painel, mais recentes primeiro", body = MeasurementPage),
        (status = 403, description = "Painel de outro dono"),
        (status = 404, description = "Painel não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_by_panel(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    WithRejection(Path(panel_id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Query(query), _): WithRejection<Query<PageQuery>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let (page, limit) = page_params(query.page.as_deref(), query.limit.as_deref());
    let result = app_state
        .telemetry_service
        .list_for_panel(&user.principal(), panel_id, page, limit)
        .await?;

    Ok(response::ok(result, "Medições listadas."))
}

#[utoipa::path(
    get,
    path = "/api/measurements/panel/{panel_id}/summary",
    tag = "Measurements",
    params(
        ("panel_id" = Uuid, Path, description = "ID do painel"),
        ("days" = Option<String>, Query, description = "Janela em dias (padrão 7)")
    ),
    responses(
        (status = 200, description = "Energia total na janela", body = PanelSummary),
        (status = 403, description = "Painel de outro dono"),
        (status = 404, description = "Painel não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn panel_summary(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    WithRejection(Path(panel_id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Query(query), _): WithRejection<Query<SummaryQuery>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let days = parse_days(query.days.as_deref());
    let summary = app_state
        .summary_service
        .summarize_panel(&user.principal(), panel_id, days)
        .await?;

    Ok(response::ok(summary, "Resumo calculado."))
}

#[utoipa::path(
    get,
    path = "/api/measurements/{id}",
    tag = "Measurements",
    params(("id" = Uuid, Path, description = "ID da medição")),
    responses(
        (status = 200, description = "Medição", body = Measurement),
        (status = 403, description = "Medição de painel de outro dono"),
        (status = 404, description = "Medição não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_measurement(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let measurement = app_state
        .telemetry_service
        .get_measurement(&user.principal(), id)
        .await?;
    Ok(response::ok(measurement, "Medição encontrada."))
}
