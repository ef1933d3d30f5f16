// src/models/measurement.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::ValidationError;

// NUMERIC(18,6) guarda até 12 dígitos inteiros.
const ENERGY_INTEGER_DIGITS: u32 = 12;

/// Energia cabe na coluna de medições (|kWh| < 10^12).
pub fn energy_in_range(kwh: &Decimal) -> bool {
    kwh.abs() < Decimal::from(10_i64.pow(ENERGY_INTEGER_DIGITS))
}

pub(crate) fn validate_energy(kwh: &Decimal) -> Result<(), ValidationError> {
    if energy_in_range(kwh) {
        return Ok(());
    }
    let mut err = ValidationError::new("range");
    err.message = Some("Valor de energia fora do intervalo suportado.".into());
    Err(err)
}

// Medição gravada. Imutável depois de escrita.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    pub id: Uuid,
    pub panel_id: Uuid,
    #[serde(rename = "timestamp")]
    pub measured_at: DateTime<Utc>,
    pub status: String,
    #[serde(rename = "energia_kWh")]
    pub energy_kwh: Decimal,
    pub voltage: Option<f64>,
    pub current: Option<f64>,
    pub power: Option<f64>,
    pub temperature: Option<f64>,
    pub consumption: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Corpo de `POST /measurements`.
///
/// Aceita os dois formatos de payload: `{energia_kWh, status}` ou
/// `{voltage, current, power, temperature?, consumption?, status}`.
/// `serial` identifica o dispositivo; `panelId` é o caminho autenticado por usuário.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngestMeasurementPayload {
    pub serial: Option<String>,
    pub panel_id: Option<Uuid>,
    pub timestamp: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "energia_kWh")]
    pub energia_kwh: Option<f64>,
    pub voltage: Option<f64>,
    pub current: Option<f64>,
    pub power: Option<f64>,
    pub temperature: Option<f64>,
    pub consumption: Option<f64>,
}

// Corpo de `POST /measurements/ping`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PingPayload {
    pub serial: Option<String>,
    pub panel_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IngestResponse {
    pub id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub pages: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeasurementPage {
    pub pagination: Pagination,
    pub items: Vec<Measurement>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Medição já validada e normalizada, pronta para gravar.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMeasurement {
    pub measured_at: DateTime<Utc>,
    pub status: String,
    pub energy_kwh: Decimal,
    pub voltage: Option<f64>,
    pub current: Option<f64>,
    pub power: Option<f64>,
    pub temperature: Option<f64>,
    pub consumption: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn energy_range_follows_column_precision() {
        assert!(energy_in_range(&Decimal::from_str("999999999999.999999").unwrap()));
        assert!(energy_in_range(&Decimal::from_str("-12.5").unwrap()));
        assert!(!energy_in_range(&Decimal::from(1_000_000_000_000_i64)));
        assert!(!energy_in_range(&Decimal::from_str("10000000000000").unwrap()));
        assert!(validate_energy(&Decimal::from(1_000_000_000_000_i64)).is_err());
    }
}
