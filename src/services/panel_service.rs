// src/services/panel_service.rs

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{BranchRepository, MeasurementRepository, PanelRepository, UserRepository},
    models::{
        auth::{Principal, Role},
        measurement::{Measurement, NewMeasurement},
        panel::{Panel, RESIDENTIAL_PANEL_QUOTA},
    },
    services::access::{ensure_access, Resource, ResourceKind},
};

// Dono pretendido de um painel. Nenhum dos dois = estoque não provisionado (só ADMIN).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Owner {
    user_id: Option<Uuid>,
    branch_id: Option<Uuid>,
}

impl Owner {
    fn matches(&self, panel: &Panel) -> bool {
        panel.user_id == self.user_id && panel.branch_id == self.branch_id
    }
}

#[derive(Clone)]
pub struct PanelService {
    panel_repo: PanelRepository,
    user_repo: UserRepository,
    branch_repo: BranchRepository,
    measurement_repo: MeasurementRepository,
    pool: PgPool,
}

impl PanelService {
    pub fn new(
        panel_repo: PanelRepository,
        user_repo: UserRepository,
        branch_repo: BranchRepository,
        measurement_repo: MeasurementRepository,
        pool: PgPool,
    ) -> Self {
        Self {
            panel_repo,
            user_repo,
            branch_repo,
            measurement_repo,
            pool,
        }
    }

    /// Provisiona (upsert por serial) um painel para o principal.
    ///
    /// - RESIDENTIAL: dono é o próprio usuário, sujeito à cota de painéis.
    /// - BUSINESS: exige `branch_id` de uma filial da sua empresa.
    /// - ADMIN: com `branch_id` vai para a filial; sem, vira estoque sem dono.
    ///
    /// Serial já existente com outro dono -> CONFLICT.
    pub async fn provision(
        &self,
        principal: &Principal,
        serial: &str,
        location: &str,
        model: &str,
        branch_id: Option<Uuid>,
    ) -> Result<Panel, AppError> {
        let mut tx = self.pool.begin().await?;

        let owner = match principal.role {
            Role::Residential => {
                // Trava o usuário: contagem e inserção ficam serializadas por dono.
                self.user_repo.lock_for_update(&mut *tx, principal.id).await?;
                Owner {
                    user_id: Some(principal.id),
                    branch_id: None,
                }
            }
            Role::Business => {
                let company_id = principal.company_id.ok_or_else(AppError::forbidden)?;
                let branch_id = branch_id.ok_or_else(|| {
                    AppError::BadRequest(
                        "Para contas empresariais, é necessário informar a filial (branchId).".into(),
                    )
                })?;
                self.branch_repo
                    .find_in_company(&mut *tx, branch_id, company_id)
                    .await?
                    .ok_or(AppError::NotFound("Filial"))?;
                Owner {
                    user_id: None,
                    branch_id: Some(branch_id),
                }
            }
            Role::Admin => {
                if let Some(branch_id) = branch_id {
                    self.branch_repo
                        .find_by_id(branch_id)
                        .await?
                        .ok_or(AppError::NotFound("Filial"))?;
                }
                Owner {
                    user_id: None,
                    branch_id,
                }
            }
        };

        let existing = self
            .panel_repo
            .find_by_serial_for_update(&mut *tx, serial)
            .await?;

        let panel_id = match existing {
            Some(panel) if owner.matches(&panel) => {
                self.panel_repo
                    .update_details(&mut *tx, panel.id, location, model)
                    .await?;
                panel.id
            }
            Some(_) => return Err(AppError::Conflict { field: "serial" }),
            None => {
                if let Some(user_id) = owner.user_id {
                    self.check_quota(&mut tx, user_id).await?;
                }
                self.panel_repo
                    .insert_panel(&mut *tx, serial, location, model, owner.user_id, owner.branch_id)
                    .await?
            }
        };

        let panel = self
            .panel_repo
            .find_by_id(&mut *tx, panel_id)
            .await?
            .ok_or(AppError::NotFound("Painel"))?;

        tx.commit().await?;

        tracing::info!("🔆 Painel {} provisionado por {}", panel.serial, principal.id);
        Ok(panel)
    }

    /// Vincula um painel já cadastrado (estoque sem dono) ao usuário residencial.
    /// Mesmo controle de cota do provisionamento.
    pub async fn link_existing(&self, principal: &Principal, panel_id: Uuid) -> Result<Panel, AppError> {
        if principal.role != Role::Residential {
            return Err(AppError::forbidden());
        }

        let mut tx = self.pool.begin().await?;
        self.user_repo.lock_for_update(&mut *tx, principal.id).await?;

        let panel = self
            .panel_repo
            .find_by_id_for_update(&mut *tx, panel_id)
            .await?
            .ok_or(AppError::NotFound("Painel"))?;

        if panel.user_id == Some(principal.id) {
            return Ok(panel);
        }
        if panel.is_provisioned() {
            return Err(AppError::PanelAlreadyOwned);
        }

        self.check_quota(&mut tx, principal.id).await?;
        self.panel_repo
            .assign_to_user(&mut *tx, panel.id, principal.id)
            .await?;

        let linked = self
            .panel_repo
            .find_by_id(&mut *tx, panel.id)
            .await?
            .ok_or(AppError::NotFound("Painel"))?;

        tx.commit().await?;
        Ok(linked)
    }

    /// Atualização manual de status: vira uma medição nova, o painel não é alterado.
    pub async fn update_status_by_serial(
        &self,
        principal: &Principal,
        serial: &str,
        status: &str,
        energia_kwh: Option<Decimal>,
    ) -> Result<Measurement, AppError> {
        let panel = self.panel_repo.find_by_serial(serial).await?;
        ensure_access(principal, ResourceKind::Panel, panel.as_ref().map(Resource::Panel))?;
        let panel = panel.ok_or(AppError::NotFound("Painel"))?;

        let new = NewMeasurement {
            measured_at: Utc::now(),
            status: status.trim().to_string(),
            energy_kwh: energia_kwh.unwrap_or(Decimal::ZERO),
            voltage: None,
            current: None,
            power: None,
            temperature: None,
            consumption: None,
        };

        self.measurement_repo
            .insert_measurement(&self.pool, panel.id, &new)
            .await
    }

    // Lista os painéis do contexto do usuário
    pub async fn list(&self, principal: &Principal) -> Result<Vec<Panel>, AppError> {
        match principal.role {
            Role::Admin => self.panel_repo.list_all().await,
            Role::Residential => self.panel_repo.list_by_user(principal.id).await,
            Role::Business => match principal.company_id {
                Some(company_id) => self.panel_repo.list_by_company(company_id).await,
                None => Ok(Vec::new()),
            },
        }
    }

    pub async fn get_by_id(&self, principal: &Principal, id: Uuid) -> Result<Panel, AppError> {
        let panel = self.panel_repo.find_by_id(&self.pool, id).await?;
        ensure_access(principal, ResourceKind::Panel, panel.as_ref().map(Resource::Panel))?;
        panel.ok_or(AppError::NotFound("Painel"))
    }

    // Conta dentro da transação que vai inserir, com o usuário já travado.
    async fn check_quota(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        let owned = self.panel_repo.count_by_user(&mut **tx, user_id).await?;
        if owned >= RESIDENTIAL_PANEL_QUOTA {
            return Err(AppError::QuotaExceeded(RESIDENTIAL_PANEL_QUOTA));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel(user_id: Option<Uuid>, branch_id: Option<Uuid>) -> Panel {
        let now = Utc::now();
        Panel {
            id: Uuid::new_v4(),
            serial: "PANEL-1".into(),
            location: "Telhado".into(),
            model: "M1".into(),
            installed_at: now,
            last_seen: None,
            user_id,
            branch_id,
            company_id: None,
            branch_name: None,
            status: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn owner_matches_only_the_exact_pair() {
        let user = Uuid::new_v4();
        let residential = Owner {
            user_id: Some(user),
            branch_id: None,
        };
        assert!(residential.matches(&panel(Some(user), None)));
        assert!(!residential.matches(&panel(Some(Uuid::new_v4()), None)));
        assert!(!residential.matches(&panel(None, None)));

        let stock = Owner {
            user_id: None,
            branch_id: None,
        };
        assert!(stock.matches(&panel(None, None)));
        assert!(!stock.matches(&panel(None, Some(Uuid::new_v4()))));
    }
}
