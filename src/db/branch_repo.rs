// src/db/branch_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_constraint_violation, error::AppError},
    models::company::Branch,
};

const BRANCH_COLUMNS: &str =
    "id, name, address, company_id, tarifa_kwh, fator_co2_kwh, created_at, updated_at";

#[derive(Clone)]
pub struct BranchRepository {
    pool: PgPool,
}

impl BranchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Cria uma filial. Tarifa e fator ausentes ficam com o DEFAULT da tabela.
    pub async fn create_branch<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        name: &str,
        address: Option<&str>,
        tarifa_kwh: Option<Decimal>,
        fator_co2_kwh: Option<Decimal>,
    ) -> Result<Branch, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Branch>(&format!(
            r#"
            INSERT INTO branches (company_id, name, address, tarifa_kwh, fator_co2_kwh)
            VALUES ($1, $2, $3, COALESCE($4, 0.95), COALESCE($5, 0.0817))
            RETURNING {BRANCH_COLUMNS}
            "#
        ))
        .bind(company_id)
        .bind(name)
        .bind(address)
        .bind(tarifa_kwh)
        .bind(fator_co2_kwh)
        .fetch_one(executor)
        .await
        .map_err(map_constraint_violation)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Branch>, AppError> {
        let branch = sqlx::query_as::<_, Branch>(&format!(
            "SELECT {BRANCH_COLUMNS} FROM branches WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(branch)
    }

    // Filial só conta se pertencer à empresa informada.
    pub async fn find_in_company<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<Branch>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let branch = sqlx::query_as::<_, Branch>(&format!(
            "SELECT {BRANCH_COLUMNS} FROM branches WHERE id = $1 AND company_id = $2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(executor)
        .await?;
        Ok(branch)
    }

    pub async fn list_by_company(&self, company_id: Uuid) -> Result<Vec<Branch>, AppError> {
        let branches = sqlx::query_as::<_, Branch>(&format!(
            "SELECT {BRANCH_COLUMNS} FROM branches WHERE company_id = $1 ORDER BY created_at"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(branches)
    }

    pub async fn update_branch(
        &self,
        id: Uuid,
        name: Option<&str>,
        address: Option<&str>,
        tarifa_kwh: Option<Decimal>,
        fator_co2_kwh: Option<Decimal>,
    ) -> Result<Option<Branch>, AppError> {
        let branch = sqlx::query_as::<_, Branch>(&format!(
            r#"
            UPDATE branches
            SET name = COALESCE($2, name),
                address = COALESCE($3, address),
                tarifa_kwh = COALESCE($4, tarifa_kwh),
                fator_co2_kwh = COALESCE($5, fator_co2_kwh),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {BRANCH_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(name)
        .bind(address)
        .bind(tarifa_kwh)
        .bind(fator_co2_kwh)
        .fetch_optional(&self.pool)
        .await?;
        Ok(branch)
    }

    pub async fn delete_branch(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM branches WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_constraint_violation)?;
        Ok(result.rows_affected() > 0)
    }
}
