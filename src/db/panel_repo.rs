// src/db/panel_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_constraint_violation, error::AppError},
    models::panel::Panel,
};

// O status é o da medição mais recente; a empresa vem da filial.
const PANEL_SELECT: &str = r#"
    SELECT
        p.id, p.serial, p.location, p.model, p.installed_at, p.last_seen,
        p.user_id, p.branch_id,
        b.company_id,
        b.name AS branch_name,
        (
            SELECT m.status FROM measurements m
            WHERE m.panel_id = p.id
            ORDER BY m.measured_at DESC, m.created_at DESC
            LIMIT 1
        ) AS status,
        p.created_at, p.updated_at
    FROM panels p
    LEFT JOIN branches b ON b.id = p.branch_id
"#;

#[derive(Clone)]
pub struct PanelRepository {
    pool: PgPool,
}

impl PanelRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Panel>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let panel = sqlx::query_as::<_, Panel>(&format!("{PANEL_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(panel)
    }

    pub async fn find_by_serial(&self, serial: &str) -> Result<Option<Panel>, AppError> {
        let panel = sqlx::query_as::<_, Panel>(&format!("{PANEL_SELECT} WHERE p.serial = $1"))
            .bind(serial)
            .fetch_optional(&self.pool)
            .await?;
        Ok(panel)
    }

    // Trava só a linha do painel (a filial é o lado anulável do JOIN).
    pub async fn find_by_serial_for_update<'e, E>(
        &self,
        executor: E,
        serial: &str,
    ) -> Result<Option<Panel>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let panel = sqlx::query_as::<_, Panel>(&format!(
            "{PANEL_SELECT} WHERE p.serial = $1 FOR UPDATE OF p"
        ))
        .bind(serial)
        .fetch_optional(executor)
        .await?;
        Ok(panel)
    }

    pub async fn find_by_id_for_update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<Panel>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let panel = sqlx::query_as::<_, Panel>(&format!(
            "{PANEL_SELECT} WHERE p.id = $1 FOR UPDATE OF p"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(panel)
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Panel>, AppError> {
        let panels = sqlx::query_as::<_, Panel>(&format!(
            "{PANEL_SELECT} WHERE p.user_id = $1 ORDER BY p.created_at"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(panels)
    }

    // Todos os painéis de todas as filiais da empresa
    pub async fn list_by_company(&self, company_id: Uuid) -> Result<Vec<Panel>, AppError> {
        let panels = sqlx::query_as::<_, Panel>(&format!(
            "{PANEL_SELECT} WHERE b.company_id = $1 ORDER BY p.created_at"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(panels)
    }

    pub async fn list_all(&self) -> Result<Vec<Panel>, AppError> {
        let panels = sqlx::query_as::<_, Panel>(&format!("{PANEL_SELECT} ORDER BY p.created_at"))
            .fetch_all(&self.pool)
            .await?;
        Ok(panels)
    }

    pub async fn count_by_user<'e, E>(&self, executor: E, user_id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM panels WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    /// Insere o painel e devolve o ID. Serial duplicado vira CONFLICT("serial").
    pub async fn insert_panel<'e, E>(
        &self,
        executor: E,
        serial: &str,
        location: &str,
        model: &str,
        user_id: Option<Uuid>,
        branch_id: Option<Uuid>,
    ) -> Result<Uuid, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO panels (serial, location, model, user_id, branch_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(serial)
        .bind(location)
        .bind(model)
        .bind(user_id)
        .bind(branch_id)
        .fetch_one(executor)
        .await
        .map_err(map_constraint_violation)
    }

    pub async fn update_details<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        location: &str,
        model: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE panels SET location = $2, model = $3, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(location)
            .bind(model)
            .execute(executor)
            .await?;
        Ok(())
    }

    // Troca o dono para um usuário residencial (e solta a filial, se houver).
    pub async fn assign_to_user<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "UPDATE panels SET user_id = $2, branch_id = NULL, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(user_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Sinal de vida: sobrescreve `last_seen` sem condição.
    pub async fn touch_last_seen(&self, id: Uuid, seen_at: DateTime<Utc>) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE panels SET last_seen = $2 WHERE id = $1")
            .bind(id)
            .bind(seen_at)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
