// src/services/summary_service.rs

use chrono::{Duration, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{MeasurementRepository, PanelRepository},
    models::{
        auth::{Principal, Role, User},
        summary::{PanelSummary, ResidentialSummary},
    },
    services::access::{ensure_access, Resource, ResourceKind},
};

pub const DEFAULT_SUMMARY_DAYS: i64 = 7;
const MAX_SUMMARY_DAYS: i64 = 3650;

/// `?days=N` leniente: ausente, não numérico ou não positivo vira 7.
pub fn parse_days(raw: Option<&str>) -> i64 {
    raw.and_then(|d| d.trim().parse::<i64>().ok())
        .filter(|d| *d > 0)
        .map(|d| d.min(MAX_SUMMARY_DAYS))
        .unwrap_or(DEFAULT_SUMMARY_DAYS)
}

// Duas casas, meio para longe do zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// (dinheiro economizado, CO2 evitado em kg) para um total em kWh.
pub fn savings(total_kwh: Decimal, tarifa_kwh: Decimal, fator_co2_kwh: Decimal) -> (Decimal, Decimal) {
    (
        round_money(total_kwh * tarifa_kwh),
        round_money(total_kwh * fator_co2_kwh),
    )
}

#[derive(Clone)]
pub struct SummaryService {
    panel_repo: PanelRepository,
    measurement_repo: MeasurementRepository,
    pool: PgPool,
}

impl SummaryService {
    pub fn new(panel_repo: PanelRepository, measurement_repo: MeasurementRepository, pool: PgPool) -> Self {
        Self {
            panel_repo,
            measurement_repo,
            pool,
        }
    }

    pub async fn summarize_panel(
        &self,
        principal: &Principal,
        panel_id: Uuid,
        days: i64,
    ) -> Result<PanelSummary, AppError> {
        let panel = self.panel_repo.find_by_id(&self.pool, panel_id).await?;
        ensure_access(principal, ResourceKind::Panel, panel.as_ref().map(Resource::Panel))?;

        let since = Utc::now() - Duration::days(days);
        let totals = self.measurement_repo.totals_for_panel(panel_id, since).await?;

        Ok(PanelSummary {
            panel_id,
            days,
            total_energia_kwh: totals.total_kwh.normalize(),
            measurements: totals.count,
        })
    }

    /// Resumo de todos os painéis do usuário residencial.
    /// É um filtro de papel: qualquer outro papel recebe FORBIDDEN.
    pub async fn residential_summary(&self, user: &User, days: i64) -> Result<ResidentialSummary, AppError> {
        if user.role != Role::Residential {
            return Err(AppError::Forbidden(
                "Resumo disponível apenas para usuários residenciais.".into(),
            ));
        }

        let since = Utc::now() - Duration::days(days);
        let totals = self.measurement_repo.totals_for_user(user.id, since).await?;
        let panels = self.panel_repo.count_by_user(&self.pool, user.id).await?;

        let (dinheiro, co2) = savings(totals.total_kwh, user.tarifa_kwh, user.fator_co2_kwh);

        Ok(ResidentialSummary {
            days,
            panels,
            total_energia_kwh: totals.total_kwh.normalize(),
            measurements: totals.count,
            dinheiro_economizado: dinheiro,
            co2_evitado_kg: co2,
        })
    }
}
