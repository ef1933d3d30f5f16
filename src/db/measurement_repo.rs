// src/db/measurement_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Executor};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        measurement::{Measurement, NewMeasurement},
        summary::EnergyTotals,
    },
};

const MEASUREMENT_COLUMNS: &str = r#"
    id, panel_id, measured_at, status, energy_kwh,
    voltage, current, power, temperature, consumption, created_at
"#;

#[derive(Clone)]
pub struct MeasurementRepository {
    pool: PgPool,
}

impl MeasurementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Medições são só de inserção: não existe update nem delete aqui.
    pub async fn insert_measurement<'e, E>(
        &self,
        executor: E,
        panel_id: Uuid,
        new: &NewMeasurement,
    ) -> Result<Measurement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let measurement = sqlx::query_as::<_, Measurement>(&format!(
            r#"
            INSERT INTO measurements (
                panel_id, measured_at, status, energy_kwh,
                voltage, current, power, temperature, consumption
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {MEASUREMENT_COLUMNS}
            "#
        ))
        .bind(panel_id)
        .bind(new.measured_at)
        .bind(&new.status)
        .bind(new.energy_kwh)
        .bind(new.voltage)
        .bind(new.current)
        .bind(new.power)
        .bind(new.temperature)
        .bind(new.consumption)
        .fetch_one(executor)
        .await?;
        Ok(measurement)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Measurement>, AppError> {
        let measurement = sqlx::query_as::<_, Measurement>(&format!(
            "SELECT {MEASUREMENT_COLUMNS} FROM measurements WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(measurement)
    }

    pub async fn list_by_panel(
        &self,
        panel_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Measurement>, AppError> {
        let items = sqlx::query_as::<_, Measurement>(&format!(
            r#"
            SELECT {MEASUREMENT_COLUMNS} FROM measurements
            WHERE panel_id = $1
            ORDER BY measured_at DESC, created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(panel_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn count_by_panel(&self, panel_id: Uuid) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM measurements WHERE panel_id = $1")
            .bind(panel_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    // Soma da janela de um painel; medições datadas no futuro ficam fora
    pub async fn totals_for_panel(
        &self,
        panel_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<EnergyTotals, AppError> {
        let totals = sqlx::query_as::<_, EnergyTotals>(
            r#"
            SELECT COALESCE(SUM(energy_kwh), 0) AS total_kwh, COUNT(*) AS count
            FROM measurements
            WHERE panel_id = $1 AND measured_at >= $2 AND measured_at <= now()
            "#,
        )
        .bind(panel_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(totals)
    }

    // Soma da janela de todos os painéis do usuário residencial
    pub async fn totals_for_user(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<EnergyTotals, AppError> {
        let totals = sqlx::query_as::<_, EnergyTotals>(
            r#"
            SELECT COALESCE(SUM(m.energy_kwh), 0) AS total_kwh, COUNT(m.id) AS count
            FROM measurements m
            JOIN panels p ON p.id = m.panel_id
            WHERE p.user_id = $1 AND m.measured_at >= $2 AND m.measured_at <= now()
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(totals)
    }
}
