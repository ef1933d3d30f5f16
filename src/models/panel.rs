// src/models/panel.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::measurement::validate_energy;

// Quantidade máxima de painéis por usuário residencial.
pub const RESIDENTIAL_PANEL_QUOTA: i64 = 10;

/// Painel como é exposto e autorizado.
///
/// `company_id` vem do JOIN com a filial (não é coluna de `panels`) e `status`
/// é derivado da medição mais recente: o painel não guarda status próprio.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Panel {
    pub id: Uuid,
    pub serial: String,
    pub location: String,
    pub model: String,
    pub installed_at: DateTime<Utc>,
    pub last_seen: Option<DateTime<Utc>>,
    pub user_id: Option<Uuid>,
    pub branch_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub branch_name: Option<String>,
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Panel {
    /// Provisionado = tem exatamente um dono.
    pub fn is_provisioned(&self) -> bool {
        self.user_id.is_some() != self.branch_id.is_some()
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionPanelPayload {
    #[validate(length(min = 1, message = "O serial é obrigatório."))]
    pub serial: String,
    #[validate(length(min = 1, message = "A localização é obrigatória."))]
    pub location: String,
    #[validate(length(min = 1, message = "O modelo é obrigatório."))]
    pub model: String,
    pub branch_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePanelStatusPayload {
    #[validate(length(min = 1, message = "O status é obrigatório."))]
    pub status: String,
    #[serde(rename = "energia_kWh")]
    #[validate(custom(function = "validate_energy"))]
    pub energia_kwh: Option<Decimal>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PingResponse {
    pub panel_id: Uuid,
    pub last_seen: DateTime<Utc>,
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
            model: "X".into(),
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
    fn status_energy_must_fit_the_column() {
        let payload: UpdatePanelStatusPayload =
            serde_json::from_str(r#"{"status":"OK","energia_kWh":1e13}"#).unwrap();
        let errors = payload.validate().unwrap_err();
        assert_eq!(errors.field_errors().len(), 1);

        let payload: UpdatePanelStatusPayload =
            serde_json::from_str(r#"{"status":"OK","energia_kWh":12.5}"#).unwrap();
        assert!(payload.validate().is_ok());

        let payload: UpdatePanelStatusPayload = serde_json::from_str(r#"{"status":"OK"}"#).unwrap();
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn provisioned_means_exactly_one_owner() {
        assert!(panel(Some(Uuid::new_v4()), None).is_provisioned());
        assert!(panel(None, Some(Uuid::new_v4())).is_provisioned());
        assert!(!panel(None, None).is_provisioned());
    }
}
