// src/services/company_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{BranchRepository, CompanyRepository},
    models::{
        auth::Principal,
        company::{Branch, Company, CreateBranchPayload, UpdateBranchPayload, UpdateCompanyPayload},
    },
    services::access::{ensure_access, Resource, ResourceKind},
};

// Empresas e filiais. Toda leitura/escrita passa pelo resolvedor de acesso.
#[derive(Clone)]
pub struct CompanyService {
    company_repo: CompanyRepository,
    branch_repo: BranchRepository,
    pool: PgPool,
}

impl CompanyService {
    pub fn new(company_repo: CompanyRepository, branch_repo: BranchRepository, pool: PgPool) -> Self {
        Self {
            company_repo,
            branch_repo,
            pool,
        }
    }

    // --- Empresas ---

    // A checagem de papel (ADMIN) fica no handler.
    pub async fn create_company(&self, name: &str, cnpj: &str) -> Result<Company, AppError> {
        let company = self
            .company_repo
            .create_company(&self.pool, name.trim(), cnpj)
            .await?;
        tracing::info!("🏢 Empresa {} criada", company.id);
        Ok(company)
    }

    pub async fn list_companies(&self) -> Result<Vec<Company>, AppError> {
        self.company_repo.list_all().await
    }

    pub async fn get_company(&self, principal: &Principal, id: Uuid) -> Result<Company, AppError> {
        let company = self.company_repo.find_by_id(id).await?;
        ensure_access(principal, ResourceKind::Company, company.as_ref().map(|c| Resource::Company(c.id)))?;
        company.ok_or(AppError::NotFound("Empresa"))
    }

    pub async fn update_company(
        &self,
        principal: &Principal,
        id: Uuid,
        payload: &UpdateCompanyPayload,
    ) -> Result<Company, AppError> {
        self.get_company(principal, id).await?;
        self.company_repo
            .update_company(id, payload.name.as_deref(), payload.cnpj.as_deref())
            .await?
            .ok_or(AppError::NotFound("Empresa"))
    }

    pub async fn delete_company(&self, principal: &Principal, id: Uuid) -> Result<(), AppError> {
        self.get_company(principal, id).await?;
        if !self.company_repo.delete_company(id).await? {
            return Err(AppError::NotFound("Empresa"));
        }
        tracing::info!("🗑️ Empresa {} removida por {}", id, principal.id);
        Ok(())
    }

    // --- Filiais ---

    pub async fn create_branch(
        &self,
        principal: &Principal,
        payload: &CreateBranchPayload,
    ) -> Result<Branch, AppError> {
        // A filial nasce dentro de uma empresa que o principal pode acessar.
        self.get_company(principal, payload.company_id).await?;

        self.branch_repo
            .create_branch(
                &self.pool,
                payload.company_id,
                payload.name.trim(),
                payload.address.as_deref(),
                payload.tarifa_kwh,
                payload.fator_co2_kwh,
            )
            .await
    }

    pub async fn list_branches(&self, principal: &Principal, company_id: Uuid) -> Result<Vec<Branch>, AppError> {
        self.get_company(principal, company_id).await?;
        self.branch_repo.list_by_company(company_id).await
    }

    pub async fn get_branch(&self, principal: &Principal, id: Uuid) -> Result<Branch, AppError> {
        let branch = self.branch_repo.find_by_id(id).await?;
        ensure_access(principal, ResourceKind::Branch, branch.as_ref().map(Resource::Branch))?;
        branch.ok_or(AppError::NotFound("Filial"))
    }

    pub async fn update_branch(
        &self,
        principal: &Principal,
        id: Uuid,
        payload: &UpdateBranchPayload,
    ) -> Result<Branch, AppError> {
        self.get_branch(principal, id).await?;
        self.branch_repo
            .update_branch(
                id,
                payload.name.as_deref(),
                payload.address.as_deref(),
                payload.tarifa_kwh,
                payload.fator_co2_kwh,
            )
            .await?
            .ok_or(AppError::NotFound("Filial"))
    }

    pub async fn delete_branch(&self, principal: &Principal, id: Uuid) -> Result<(), AppError> {
        self.get_branch(principal, id).await?;
        if !self.branch_repo.delete_branch(id).await? {
            return Err(AppError::NotFound("Filial"));
        }
        Ok(())
    }
}
