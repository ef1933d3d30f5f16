// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    middleware::auth::AuthenticatedUser,
    models::auth::{Role, User},
};

/// 1. O Trait que define quais papéis passam pelo guardião
pub trait RoleRequirement: Send + Sync + 'static {
    const ALLOWED: &'static [Role];
}

/// 2. O Extractor (Guardião). Depende do `auth_guard` ter rodado antes.
pub struct RequireRole<T>(pub User, pub PhantomData<T>);

impl<T> RequireRole<T> {
    pub fn user(&self) -> &User {
        &self.0
    }
}

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleRequirement,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;

        if !T::ALLOWED.contains(&user.role) {
            return Err(AppError::forbidden());
        }

        Ok(RequireRole(user, PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS PAPÉIS (TIPOS)
// ---

pub struct AdminOnly;
impl RoleRequirement for AdminOnly {
    const ALLOWED: &'static [Role] = &[Role::Admin];
}

pub struct ResidentialOnly;
impl RoleRequirement for ResidentialOnly {
    const ALLOWED: &'static [Role] = &[Role::Residential];
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn parts_with(role: Option<Role>) -> Parts {
        let (mut parts, _) = Request::new(()).into_parts();
        if let Some(role) = role {
            let now = Utc::now();
            parts.extensions.insert(AuthenticatedUser(User {
                id: Uuid::new_v4(),
                name: "Caio".into(),
                email: "caio@x.com".into(),
                password_hash: String::new(),
                role,
                cpf: None,
                company_id: None,
                tarifa_kwh: Decimal::ONE,
                fator_co2_kwh: Decimal::ONE,
                reset_token: None,
                reset_token_expires: None,
                created_at: now,
                updated_at: now,
            }));
        }
        parts
    }

    #[tokio::test]
    async fn admin_only_rejects_other_roles() {
        let mut parts = parts_with(Some(Role::Admin));
        assert!(RequireRole::<AdminOnly>::from_request_parts(&mut parts, &()).await.is_ok());

        let mut parts = parts_with(Some(Role::Business));
        let err = RequireRole::<AdminOnly>::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert_eq!(err.code(), "FORBIDDEN");
    }

    #[tokio::test]
    async fn residential_gate_is_role_based() {
        let mut parts = parts_with(Some(Role::Admin));
        let err = RequireRole::<ResidentialOnly>::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert_eq!(err.code(), "FORBIDDEN");
    }

    #[tokio::test]
    async fn missing_user_is_unauthorized() {
        let mut parts = parts_with(None);
        let err = RequireRole::<AdminOnly>::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert_eq!(err.code(), "AUTH");
    }
}
