// src/services/access.rs

//! Decisão de acesso por papel e cadeia de posse.
//!
//! Função pura sobre registros já buscados: quem chama é responsável por
//! carregar o recurso (e passar `None` quando ele não existe). Assim a tabela
//! de decisão inteira é testável sem banco.

use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        auth::{Principal, Role},
        company::Branch,
        panel::Panel,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Company,
    Branch,
    Panel,
    Measurement,
}

impl ResourceKind {
    fn label(self) -> &'static str {
        match self {
            ResourceKind::Company => "Empresa",
            ResourceKind::Branch => "Filial",
            ResourceKind::Panel => "Painel",
            ResourceKind::Measurement => "Medição",
        }
    }
}

/// O recurso alvo, já resolvido. Medições são autorizadas pelo painel dono.
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    Company(Uuid),
    Branch(&'a Branch),
    Panel(&'a Panel),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(&'static str),
    NotFound(ResourceKind),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(_) => Err(AppError::forbidden()),
            Decision::NotFound(kind) => Err(AppError::NotFound(kind.label())),
        }
    }
}

const FORBIDDEN: &str = "forbidden";

pub fn can_access(principal: &Principal, kind: ResourceKind, resource: Option<Resource<'_>>) -> Decision {
    let Some(resource) = resource else {
        return Decision::NotFound(kind);
    };

    if principal.role == Role::Admin {
        return Decision::Allow;
    }

    let allowed = match (principal.role, resource) {
        (Role::Business, Resource::Company(company_id)) => {
            principal.company_id == Some(company_id)
        }
        (Role::Business, Resource::Branch(branch)) => {
            principal.company_id == Some(branch.company_id)
        }
        // Painel empresarial: a filial do painel precisa ser da empresa do principal.
        (Role::Business, Resource::Panel(panel)) => {
            panel.branch_id.is_some()
                && panel.company_id.is_some()
                && panel.company_id == principal.company_id
        }
        (Role::Residential, Resource::Panel(panel)) => panel.user_id == Some(principal.id),
        _ => false,
    };

    if allowed {
        Decision::Allow
    } else {
        Decision::Deny(FORBIDDEN)
    }
}

/// Atalho para o caso comum: decide e já converte em `Result`.
pub fn ensure_access(
    principal: &Principal,
    kind: ResourceKind,
    resource: Option<Resource<'_>>,
) -> Result<(), AppError> {
    can_access(principal, kind, resource).into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn principal(role: Role, company_id: Option<Uuid>) -> Principal {
        Principal {
            id: Uuid::new_v4(),
            email: "p@x.com".into(),
            role,
            company_id,
        }
    }

    fn branch(company_id: Uuid) -> Branch {
        let now = Utc::now();
        Branch {
            id: Uuid::new_v4(),
            name: "Sede Principal".into(),
            address: None,
            company_id,
            tarifa_kwh: Decimal::ONE,
            fator_co2_kwh: Decimal::ONE,
            created_at: now,
            updated_at: now,
        }
    }

    fn residential_panel(owner: Uuid) -> Panel {
        panel(Some(owner), None, None)
    }

    fn business_panel(branch: &Branch) -> Panel {
        panel(None, Some(branch.id), Some(branch.company_id))
    }

    fn panel(user_id: Option<Uuid>, branch_id: Option<Uuid>, company_id: Option<Uuid>) -> Panel {
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
            company_id,
            branch_name: None,
            status: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn admin_is_allowed_everywhere() {
        let admin = principal(Role::Admin, None);
        let other_company = Uuid::new_v4();
        let b = branch(other_company);
        let p = residential_panel(Uuid::new_v4());

        assert!(can_access(&admin, ResourceKind::Company, Some(Resource::Company(other_company))).is_allowed());
        assert!(can_access(&admin, ResourceKind::Branch, Some(Resource::Branch(&b))).is_allowed());
        assert!(can_access(&admin, ResourceKind::Panel, Some(Resource::Panel(&p))).is_allowed());
        assert!(can_access(&admin, ResourceKind::Measurement, Some(Resource::Panel(&p))).is_allowed());
    }

    #[test]
    fn missing_resource_is_not_found_even_for_admin() {
        let admin = principal(Role::Admin, None);
        assert_eq!(
            can_access(&admin, ResourceKind::Panel, None),
            Decision::NotFound(ResourceKind::Panel)
        );
        assert_eq!(can_access(&admin, ResourceKind::Branch, None).into_result().unwrap_err().code(), "NOT_FOUND");
    }

    #[test]
    fn business_sees_only_its_company() {
        let company = Uuid::new_v4();
        let user = principal(Role::Business, Some(company));

        assert!(can_access(&user, ResourceKind::Company, Some(Resource::Company(company))).is_allowed());
        assert_eq!(
            can_access(&user, ResourceKind::Company, Some(Resource::Company(Uuid::new_v4()))),
            Decision::Deny("forbidden")
        );
    }

    #[test]
    fn business_branch_access_follows_company() {
        let company = Uuid::new_v4();
        let user = principal(Role::Business, Some(company));

        assert!(can_access(&user, ResourceKind::Branch, Some(Resource::Branch(&branch(company)))).is_allowed());
        assert!(!can_access(&user, ResourceKind::Branch, Some(Resource::Branch(&branch(Uuid::new_v4())))).is_allowed());
    }

    #[test]
    fn business_panel_access_resolves_through_branch() {
        let company = Uuid::new_v4();
        let user = principal(Role::Business, Some(company));
        let own = business_panel(&branch(company));
        let foreign = business_panel(&branch(Uuid::new_v4()));

        assert!(can_access(&user, ResourceKind::Panel, Some(Resource::Panel(&own))).is_allowed());
        assert!(can_access(&user, ResourceKind::Measurement, Some(Resource::Panel(&own))).is_allowed());
        assert!(!can_access(&user, ResourceKind::Panel, Some(Resource::Panel(&foreign))).is_allowed());
        assert!(!can_access(&user, ResourceKind::Measurement, Some(Resource::Panel(&foreign))).is_allowed());
    }

    #[test]
    fn business_cannot_reach_residential_panels() {
        let user = principal(Role::Business, Some(Uuid::new_v4()));
        let p = residential_panel(Uuid::new_v4());
        assert!(!can_access(&user, ResourceKind::Panel, Some(Resource::Panel(&p))).is_allowed());
    }

    #[test]
    fn business_without_company_is_denied() {
        let user = principal(Role::Business, None);
        let unowned = panel(None, None, None);
        assert!(!can_access(&user, ResourceKind::Panel, Some(Resource::Panel(&unowned))).is_allowed());
    }

    #[test]
    fn residential_owns_panels_directly() {
        let user = principal(Role::Residential, None);
        let own = residential_panel(user.id);
        let other = residential_panel(Uuid::new_v4());

        assert!(can_access(&user, ResourceKind::Panel, Some(Resource::Panel(&own))).is_allowed());
        assert!(can_access(&user, ResourceKind::Measurement, Some(Resource::Panel(&own))).is_allowed());

        let denied = can_access(&user, ResourceKind::Panel, Some(Resource::Panel(&other)));
        assert_eq!(denied, Decision::Deny("forbidden"));
        assert_eq!(denied.into_result().unwrap_err().code(), "FORBIDDEN");
    }

    #[test]
    fn residential_cannot_touch_companies_or_branches() {
        let user = principal(Role::Residential, None);
        let company = Uuid::new_v4();
        assert!(!can_access(&user, ResourceKind::Company, Some(Resource::Company(company))).is_allowed());
        assert!(!can_access(&user, ResourceKind::Branch, Some(Resource::Branch(&branch(company)))).is_allowed());
    }
}
