// src/handlers/newsletter.rs

use axum::{extract::State, response::IntoResponse, Json};
use axum_extra::extract::WithRejection;
use validator::Validate;

use crate::{
    common::{error::AppError, response},
    config::AppState,
    models::newsletter::{NewsletterSubscriber, SubscribePayload},
};

#[utoipa::path(
    post,
    path = "/api/newsletter/subscribe",
    tag = "Newsletter",
    request_body = SubscribePayload,
    responses(
        (status = 201, description = "Inscrição realizada", body = NewsletterSubscriber),
        (status = 409, description = "E-mail já inscrito")
    )
)]
pub async fn subscribe(
    State(app_state): State<AppState>,
    WithRejection(Json(mut payload), _): WithRejection<Json<SubscribePayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.validate()?;

    let subscriber = app_state.newsletter_repo.subscribe(&payload.email).await?;
    tracing::info!("📬 Nova inscrição na newsletter: {}", subscriber.id);

    Ok(response::created(subscriber, "Inscrição realizada com sucesso."))
}
