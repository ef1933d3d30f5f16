// src/common/db_utils.rs

use crate::common::error::AppError;

/// Traduz violações de restrição do Postgres para erros de domínio.
/// Unique -> CONFLICT com o campo legível; FK -> CONFLICT de "ainda referenciado".
/// Qualquer outra coisa segue como erro de banco (500).
pub(crate) fn map_constraint_violation(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            if let Some(field) = db_err.constraint().and_then(field_for_constraint) {
                return AppError::Conflict { field };
            }
        }
        if db_err.is_foreign_key_violation() {
            return AppError::StillReferenced(
                "O registro ainda possui vínculos e não pode ser removido.",
            );
        }
    }
    e.into()
}

// Os nomes vêm das migrations (CONSTRAINT ... UNIQUE).
fn field_for_constraint(constraint: &str) -> Option<&'static str> {
    match constraint {
        "users_email_key" | "newsletter_subscribers_email_key" => Some("email"),
        "users_cpf_key" => Some("cpf"),
        "companies_cnpj_key" => Some("cnpj"),
        "panels_serial_key" => Some("serial"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_constraints_have_field_hints() {
        assert_eq!(field_for_constraint("users_email_key"), Some("email"));
        assert_eq!(field_for_constraint("users_cpf_key"), Some("cpf"));
        assert_eq!(field_for_constraint("companies_cnpj_key"), Some("cnpj"));
        assert_eq!(field_for_constraint("panels_serial_key"), Some("serial"));
        assert_eq!(field_for_constraint("whatever_idx"), None);
    }

    #[test]
    fn non_database_errors_stay_internal() {
        let err = map_constraint_violation(sqlx::Error::RowNotFound);
        assert_eq!(err.code(), "INTERNAL");
    }
}
