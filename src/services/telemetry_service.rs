// src/services/telemetry_service.rs

use chrono::{DateTime, Utc};
use rust_decimal::{prelude::FromPrimitive, Decimal};
use sqlx::PgPool;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::{
    common::error::AppError,
    db::{MeasurementRepository, PanelRepository},
    models::{
        auth::Principal,
        measurement::{energy_in_range, IngestMeasurementPayload, Measurement, MeasurementPage, NewMeasurement, Pagination},
        panel::{Panel, PingResponse},
    },
    services::access::{ensure_access, Resource, ResourceKind},
};

pub const DEFAULT_STATUS: &str = "OK";
pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;

// kWh guardado com 6 casas, igual à coluna NUMERIC(18,6).
const ENERGY_SCALE: u32 = 6;
const JOULES_PER_KWH: f64 = 3_600_000.0;

fn field_error(errors: &mut ValidationErrors, field: &'static str, code: &'static str, message: &'static str) {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    errors.add(field, err);
}

fn finite(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<f64>,
) -> Option<f64> {
    match value {
        Some(v) if v.is_finite() => Some(v),
        Some(_) => {
            field_error(errors, field, "finite", "Valor numérico inválido.");
            None
        }
        None => None,
    }
}

// None quando o valor não cabe na coluna.
fn energy_from_f64(kwh: f64) -> Option<Decimal> {
    Decimal::from_f64(kwh)
        .map(|d| d.round_dp(ENERGY_SCALE))
        .filter(energy_in_range)
}

fn energy_field(errors: &mut ValidationErrors, field: &'static str, kwh: f64) -> Option<Decimal> {
    let energy = energy_from_f64(kwh);
    if energy.is_none() {
        field_error(errors, field, "range", "Valor de energia fora do intervalo suportado.");
    }
    energy
}

/// Normaliza os dois formatos de payload para uma `NewMeasurement` em kWh.
///
/// Caminho de energia: `energia_kWh` é usado como está.
/// Caminho de potência: `power` (W) integrado sobre o intervalo de amostragem,
/// `kWh = W * intervalo_s / 3_600_000`.
pub fn normalize(
    payload: &IngestMeasurementPayload,
    interval_secs: u64,
    now: DateTime<Utc>,
) -> Result<NewMeasurement, AppError> {
    let mut errors = ValidationErrors::new();

    let status = payload
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_STATUS)
        .to_string();

    // Timestamp ilegível não é erro: cai para a hora do servidor.
    // Data no futuro é limitada a `now`.
    let measured_at = payload
        .timestamp
        .as_deref()
        .and_then(|ts| DateTime::parse_from_rfc3339(ts.trim()).ok())
        .map(|ts| ts.with_timezone(&Utc).min(now))
        .unwrap_or(now);

    let temperature = finite(&mut errors, "temperature", payload.temperature);
    let consumption = finite(&mut errors, "consumption", payload.consumption);

    let (energy_kwh, voltage, current, power) = if payload.energia_kwh.is_some() {
        let energy = finite(&mut errors, "energia_kWh", payload.energia_kwh)
            .and_then(|kwh| energy_field(&mut errors, "energia_kWh", kwh));
        let voltage = finite(&mut errors, "voltage", payload.voltage);
        let current = finite(&mut errors, "current", payload.current);
        let power = finite(&mut errors, "power", payload.power);
        (energy, voltage, current, power)
    } else {
        let voltage = finite(&mut errors, "voltage", payload.voltage);
        let current = finite(&mut errors, "current", payload.current);
        let power = finite(&mut errors, "power", payload.power);

        for (field, value) in [
            ("voltage", payload.voltage),
            ("current", payload.current),
            ("power", payload.power),
        ] {
            if value.is_none() {
                field_error(
                    &mut errors,
                    field,
                    "required",
                    "Obrigatório quando energia_kWh não é informado.",
                );
            }
        }

        let energy = power.and_then(|w| energy_field(&mut errors, "power", w * interval_secs as f64 / JOULES_PER_KWH));
        (energy, voltage, current, power)
    };

    if !errors.is_empty() {
        return Err(AppError::ValidationError(errors));
    }

    let energy_kwh = energy_kwh
        .ok_or_else(|| AppError::BadRequest("Valor de energia fora do intervalo suportado.".into()))?;

    Ok(NewMeasurement {
        measured_at,
        status,
        energy_kwh,
        voltage,
        current,
        power,
        temperature,
        consumption,
    })
}

/// `page` e `limit` vêm como texto; valores inválidos caem no padrão.
pub fn page_params(page: Option<&str>, limit: Option<&str>) -> (i64, i64) {
    let page = page
        .and_then(|p| p.trim().parse::<i64>().ok())
        .filter(|p| *p > 0)
        .unwrap_or(1);
    let limit = limit
        .and_then(|l| l.trim().parse::<i64>().ok())
        .filter(|l| *l > 0)
        .unwrap_or(DEFAULT_PAGE_LIMIT)
        .min(MAX_PAGE_LIMIT);
    (page, limit)
}

#[derive(Clone)]
pub struct TelemetryService {
    panel_repo: PanelRepository,
    measurement_repo: MeasurementRepository,
    pool: PgPool,
    interval_secs: u64,
}

impl TelemetryService {
    pub fn new(
        panel_repo: PanelRepository,
        measurement_repo: MeasurementRepository,
        pool: PgPool,
        interval_secs: u64,
    ) -> Self {
        Self {
            panel_repo,
            measurement_repo,
            pool,
            interval_secs,
        }
    }

    /// Caminho do dispositivo: o serial precisa existir e estar provisionado.
    pub async fn ingest_from_device(
        &self,
        serial: &str,
        payload: &IngestMeasurementPayload,
    ) -> Result<Measurement, AppError> {
        let panel = self.resolve_device(serial).await?;
        let new = normalize(payload, self.interval_secs, Utc::now())?;
        self.store(&panel, &new).await
    }

    /// Caminho autenticado: além de existir, o painel precisa ser do principal.
    pub async fn ingest_for_user(
        &self,
        principal: &Principal,
        panel_id: Uuid,
        payload: &IngestMeasurementPayload,
    ) -> Result<Measurement, AppError> {
        let panel = self.authorized_panel(principal, panel_id).await?;
        let new = normalize(payload, self.interval_secs, Utc::now())?;
        self.store(&panel, &new).await
    }

    pub async fn ping_device(&self, serial: &str) -> Result<PingResponse, AppError> {
        let panel = self.resolve_device(serial).await?;
        self.ping(panel.id).await
    }

    pub async fn ping_for_user(&self, principal: &Principal, panel_id: Uuid) -> Result<PingResponse, AppError> {
        let panel = self.authorized_panel(principal, panel_id).await?;
        self.ping(panel.id).await
    }

    pub async fn list_for_panel(
        &self,
        principal: &Principal,
        panel_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<MeasurementPage, AppError> {
        let panel = self.authorized_panel(principal, panel_id).await?;

        let total = self.measurement_repo.count_by_panel(panel.id).await?;
        let offset = (page - 1) * limit;
        let items = self
            .measurement_repo
            .list_by_panel(panel.id, limit, offset)
            .await?;

        Ok(MeasurementPage {
            pagination: Pagination {
                total,
                page,
                pages: (total + limit - 1) / limit,
            },
            items,
        })
    }

    // A medição herda a autorização do painel dono.
    pub async fn get_measurement(&self, principal: &Principal, id: Uuid) -> Result<Measurement, AppError> {
        let measurement = self
            .measurement_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("Medição"))?;

        let panel = self.panel_repo.find_by_id(&self.pool, measurement.panel_id).await?;
        ensure_access(principal, ResourceKind::Measurement, panel.as_ref().map(Resource::Panel))?;
        Ok(measurement)
    }

    async fn resolve_device(&self, serial: &str) -> Result<Panel, AppError> {
        match self.panel_repo.find_by_serial(serial.trim()).await? {
            Some(panel) if panel.is_provisioned() => Ok(panel),
            _ => Err(AppError::DeviceNotProvisioned),
        }
    }

    async fn authorized_panel(&self, principal: &Principal, panel_id: Uuid) -> Result<Panel, AppError> {
        let panel = self.panel_repo.find_by_id(&self.pool, panel_id).await?;
        ensure_access(principal, ResourceKind::Panel, panel.as_ref().map(Resource::Panel))?;
        panel.ok_or(AppError::NotFound("Painel"))
    }

    async fn store(&self, panel: &Panel, new: &NewMeasurement) -> Result<Measurement, AppError> {
        let measurement = self
            .measurement_repo
            .insert_measurement(&self.pool, panel.id, new)
            .await?;

        // lastSeen é só sinal de vida: falha aqui não derruba a ingestão.
        if let Err(e) = self.panel_repo.touch_last_seen(panel.id, new.measured_at).await {
            tracing::warn!("Falha ao atualizar lastSeen do painel {}: {}", panel.id, e);
        }

        tracing::debug!("📈 Medição {} gravada para o painel {}", measurement.id, panel.serial);
        Ok(measurement)
    }

    async fn ping(&self, panel_id: Uuid) -> Result<PingResponse, AppError> {
        let now = Utc::now();
        if !self.panel_repo.touch_last_seen(panel_id, now).await? {
            return Err(AppError::NotFound("Painel"));
        }
        Ok(PingResponse {
            panel_id,
            last_seen: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn energy_payload_is_stored_as_is() {
        let payload = IngestMeasurementPayload {
            energia_kwh: Some(1.25),
            ..Default::default()
        };
        let new = normalize(&payload, 300, now()).unwrap();
        assert_eq!(new.energy_kwh, Decimal::from_str("1.25").unwrap());
        assert_eq!(new.status, "OK");
        assert_eq!(new.measured_at, now());
    }

    #[test]
    fn power_payload_integrates_over_interval() {
        // 1200 W durante 300 s = 0.1 kWh
        let payload = IngestMeasurementPayload {
            voltage: Some(220.0),
            current: Some(5.45),
            power: Some(1200.0),
            status: Some("  GERANDO ".into()),
            ..Default::default()
        };
        let new = normalize(&payload, 300, now()).unwrap();
        assert_eq!(new.energy_kwh, Decimal::from_str("0.1").unwrap());
        assert_eq!(new.status, "GERANDO");
        assert_eq!(new.power, Some(1200.0));
    }

    #[test]
    fn power_payload_requires_all_three_fields() {
        let payload = IngestMeasurementPayload {
            voltage: Some(220.0),
            ..Default::default()
        };
        let err = normalize(&payload, 300, now()).unwrap_err();
        let AppError::ValidationError(errors) = err else {
            panic!("esperava erro de validação");
        };
        let fields = errors.field_errors();
        assert!(fields.contains_key("current"));
        assert!(fields.contains_key("power"));
        assert!(!fields.contains_key("voltage"));
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        let payload = IngestMeasurementPayload {
            energia_kwh: Some(f64::NAN),
            ..Default::default()
        };
        assert_eq!(normalize(&payload, 300, now()).unwrap_err().code(), "VALIDATION");

        let payload = IngestMeasurementPayload {
            voltage: Some(220.0),
            current: Some(1.0),
            power: Some(f64::INFINITY),
            ..Default::default()
        };
        assert_eq!(normalize(&payload, 300, now()).unwrap_err().code(), "VALIDATION");
    }

    #[test]
    fn supplied_timestamp_wins_when_parseable() {
        let payload = IngestMeasurementPayload {
            energia_kwh: Some(1.0),
            timestamp: Some("2025-02-28T08:30:00Z".into()),
            ..Default::default()
        };
        let new = normalize(&payload, 300, now()).unwrap();
        assert_eq!(new.measured_at, Utc.with_ymd_and_hms(2025, 2, 28, 8, 30, 0).unwrap());

        let payload = IngestMeasurementPayload {
            energia_kwh: Some(1.0),
            timestamp: Some("ontem de manhã".into()),
            ..Default::default()
        };
        assert_eq!(normalize(&payload, 300, now()).unwrap().measured_at, now());
    }

    #[test]
    fn energy_beyond_column_range_is_a_field_error() {
        let payload = IngestMeasurementPayload {
            energia_kwh: Some(1e13),
            ..Default::default()
        };
        let AppError::ValidationError(errors) = normalize(&payload, 300, now()).unwrap_err() else {
            panic!("esperava erro de validação");
        };
        assert!(errors.field_errors().contains_key("energia_kWh"));

        // 1e15 W por 300 s dá ~8.3e13 kWh
        let payload = IngestMeasurementPayload {
            voltage: Some(220.0),
            current: Some(1.0),
            power: Some(1e15),
            ..Default::default()
        };
        let AppError::ValidationError(errors) = normalize(&payload, 300, now()).unwrap_err() else {
            panic!("esperava erro de validação");
        };
        assert!(errors.field_errors().contains_key("power"));

        let payload = IngestMeasurementPayload {
            energia_kwh: Some(999_999_999_999.0),
            ..Default::default()
        };
        assert!(normalize(&payload, 300, now()).is_ok());
    }

    #[test]
    fn future_timestamp_is_clamped_to_now() {
        let payload = IngestMeasurementPayload {
            energia_kwh: Some(5.0),
            timestamp: Some("2099-01-01T00:00:00Z".into()),
            ..Default::default()
        };
        assert_eq!(normalize(&payload, 300, now()).unwrap().measured_at, now());
    }

    #[test]
    fn page_params_are_lenient_and_capped() {
        assert_eq!(page_params(None, None), (1, DEFAULT_PAGE_LIMIT));
        assert_eq!(page_params(Some("3"), Some("50")), (3, 50));
        assert_eq!(page_params(Some("0"), Some("abc")), (1, DEFAULT_PAGE_LIMIT));
        assert_eq!(page_params(Some("-2"), Some("1000")), (1, MAX_PAGE_LIMIT));
    }
}
