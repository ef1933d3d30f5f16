// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::{distributions::Alphanumeric, Rng};
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{BranchRepository, CompanyRepository, UserRepository},
    models::{
        auth::{AuthResponse, BusinessRegistration, Claims, Role, User},
        company::DEFAULT_BRANCH_NAME,
    },
    services::mailer::MailSender,
};

const RESET_TOKEN_LEN: usize = 64;
const RESET_TOKEN_TTL_MINUTES: i64 = 60;

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    company_repo: CompanyRepository,
    branch_repo: BranchRepository,
    mailer: Arc<dyn MailSender>,
    jwt_secret: String,
    jwt_ttl_days: i64,
    frontend_url: String,
    pool: PgPool,
}

impl AuthService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_repo: UserRepository,
        company_repo: CompanyRepository,
        branch_repo: BranchRepository,
        mailer: Arc<dyn MailSender>,
        jwt_secret: String,
        jwt_ttl_days: i64,
        frontend_url: String,
        pool: PgPool,
    ) -> Self {
        Self {
            user_repo,
            company_repo,
            branch_repo,
            mailer,
            jwt_secret,
            jwt_ttl_days,
            frontend_url,
            pool,
        }
    }

    pub async fn register_residential(
        &self,
        name: &str,
        email: &str,
        password: &str,
        cpf: &str,
    ) -> Result<User, AppError> {
        let hashed_password = hash_password(password).await?;

        let user = self
            .user_repo
            .create_user(&self.pool, name, email, &hashed_password, Role::Residential, Some(cpf), None)
            .await?;

        tracing::info!("👤 Usuário residencial {} registrado", user.id);
        Ok(user)
    }

    /// Empresa, usuário BUSINESS e a filial "Sede Principal" numa única transação.
    /// Qualquer falha no meio desfaz tudo (rollback no drop do `tx`).
    pub async fn register_business(
        &self,
        user_name: &str,
        user_email: &str,
        password: &str,
        company_name: &str,
        company_cnpj: &str,
    ) -> Result<BusinessRegistration, AppError> {
        // 1. Hashing (fica fora da transação, não toca no banco)
        let hashed_password = hash_password(password).await?;

        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        // 2. Empresa
        let company = self
            .company_repo
            .create_company(&mut *tx, company_name, company_cnpj)
            .await?;

        // 3. Usuário vinculado à empresa
        let user = self
            .user_repo
            .create_user(
                &mut *tx,
                user_name,
                user_email,
                &hashed_password,
                Role::Business,
                None,
                Some(company.id),
            )
            .await?;

        // 4. Filial padrão
        let branch = self
            .branch_repo
            .create_branch(&mut *tx, company.id, DEFAULT_BRANCH_NAME, None, None, None)
            .await?;

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        tracing::info!("🏢 Empresa {} registrada com o usuário {}", company.id, user.id);
        Ok(BusinessRegistration {
            user,
            company,
            branch,
        })
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        let token = self.create_token(&user)?;
        Ok(AuthResponse { token, user })
    }

    /// Valida o token e recarrega o usuário: contas removidas perdem o acesso
    /// e o `companyId` é sempre o atual.
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = self.decode_token(token)?;

        self.user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)
    }

    pub async fn find_user(&self, id: uuid::Uuid) -> Result<User, AppError> {
        self.user_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("Usuário"))
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.user_repo.list_all().await
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<(), AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::NotFound("E-mail"))?;

        let token = generate_reset_token();
        let expires = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
        self.user_repo.set_reset_token(user.id, &token, expires).await?;

        let reset_url = format!("{}/reset-password?token={}", self.frontend_url, token);

        // Falha de entrega não derruba o pedido: o token já está salvo.
        if let Err(e) = self
            .mailer
            .send_password_reset(&user.email, &user.name, &reset_url)
            .await
        {
            tracing::warn!("Falha ao enviar e-mail de recuperação para {}: {}", user.email, e);
        }
        Ok(())
    }

    /// Troca a senha e invalida o token na mesma transação (uso único).
    pub async fn reset_password(&self, token: &str, password: &str) -> Result<(), AppError> {
        let hashed_password = hash_password(password).await?;

        let mut tx = self.pool.begin().await?;

        let user = self
            .user_repo
            .find_by_reset_token_for_update(&mut *tx, token)
            .await?
            .ok_or_else(|| AppError::BadRequest("Token inválido ou expirado".into()))?;

        self.user_repo
            .update_password_and_clear_token(&mut *tx, user.id, &hashed_password)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;
        Ok(token_data.claims)
    }

    fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + Duration::days(self.jwt_ttl_days);

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            company_id: user.company_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

fn generate_reset_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RESET_TOKEN_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_tokens_are_long_and_distinct() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_eq!(a.len(), RESET_TOKEN_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    fn service(secret: &str) -> AuthService {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/solar_test")
            .unwrap();
        AuthService::new(
            UserRepository::new(pool.clone()),
            CompanyRepository::new(pool.clone()),
            BranchRepository::new(pool.clone()),
            Arc::new(crate::services::mailer::SmtpMailer::disabled()),
            secret.to_string(),
            7,
            "http://localhost:8081".to_string(),
            pool,
        )
    }

    fn user(role: Role, company_id: Option<uuid::Uuid>) -> User {
        let now = Utc::now();
        User {
            id: uuid::Uuid::new_v4(),
            name: "Bia".into(),
            email: "bia@x.com".into(),
            password_hash: String::new(),
            role,
            cpf: None,
            company_id,
            tarifa_kwh: rust_decimal::Decimal::ONE,
            fator_co2_kwh: rust_decimal::Decimal::ONE,
            reset_token: None,
            reset_token_expires: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn token_carries_role_and_company() {
        let auth = service("segredo-de-teste");
        let company = uuid::Uuid::new_v4();
        let user = user(Role::Business, Some(company));

        let token = auth.create_token(&user).unwrap();
        let claims = auth.decode_token(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, "bia@x.com");
        assert_eq!(claims.role, Role::Business);
        assert_eq!(claims.company_id, Some(company));
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_rejected() {
        let token = service("um").create_token(&user(Role::Residential, None)).unwrap();
        let err = service("outro").decode_token(&token).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[tokio::test]
    async fn hashed_password_verifies() {
        let hashed = hash_password("segredo").await.unwrap();
        assert!(verify("segredo", &hashed).unwrap());
        assert!(!verify("outra", &hashed).unwrap());
    }
}
