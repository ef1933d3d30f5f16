// src/db/company_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_constraint_violation, error::AppError},
    models::company::Company,
};

#[derive(Clone)]
pub struct CompanyRepository {
    pool: PgPool,
}

impl CompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_company<'e, E>(
        &self,
        executor: E,
        name: &str,
        cnpj: &str,
    ) -> Result<Company, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (name, cnpj)
            VALUES ($1, $2)
            RETURNING id, name, cnpj, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(cnpj)
        .fetch_one(executor)
        .await
        .map_err(map_constraint_violation)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>(
            "SELECT id, name, cnpj, created_at, updated_at FROM companies WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(company)
    }

    pub async fn list_all(&self) -> Result<Vec<Company>, AppError> {
        let companies = sqlx::query_as::<_, Company>(
            "SELECT id, name, cnpj, created_at, updated_at FROM companies ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(companies)
    }

    // COALESCE mantém o valor atual quando o campo não veio no payload.
    pub async fn update_company(
        &self,
        id: Uuid,
        name: Option<&str>,
        cnpj: Option<&str>,
    ) -> Result<Option<Company>, AppError> {
        sqlx::query_as::<_, Company>(
            r#"
            UPDATE companies
            SET name = COALESCE($2, name), cnpj = COALESCE($3, cnpj), updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, cnpj, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(cnpj)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_constraint_violation)
    }

    pub async fn delete_company(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_constraint_violation)?;
        Ok(result.rows_affected() > 0)
    }
}
