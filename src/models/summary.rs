// src/models/summary.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Query string `?days=N`. Mantida como texto: valores inválidos caem no padrão.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SummaryQuery {
    pub days: Option<String>,
}

// Linha crua do agregado SQL
#[derive(Debug, Clone, FromRow)]
pub struct EnergyTotals {
    pub total_kwh: Decimal,
    pub count: i64,
}

// Resumo por painel
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PanelSummary {
    pub panel_id: Uuid,
    pub days: i64,
    #[serde(rename = "totalEnergiaKWh")]
    pub total_energia_kwh: Decimal,
    pub measurements: i64,
}

// Resumo do usuário residencial (dashboard)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResidentialSummary {
    pub days: i64,
    pub panels: i64,
    #[serde(rename = "totalEnergiaKWh")]
    pub total_energia_kwh: Decimal,
    pub measurements: i64,
    pub dinheiro_economizado: Decimal,
    pub co2_evitado_kg: Decimal,
}
