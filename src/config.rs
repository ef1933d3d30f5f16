// src/config.rs

use crate::{
    db::{
        BranchRepository, CompanyRepository, MeasurementRepository, NewsletterRepository,
        PanelRepository, UserRepository,
    },
    services::{
        auth::AuthService,
        company_service::CompanyService,
        mailer::{MailSender, SmtpMailer},
        panel_service::PanelService,
        summary_service::SummaryService,
        telemetry_service::TelemetryService,
    },
};
use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, sync::Arc, time::Duration};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_FRONTEND_URL: &str = "http://localhost:8081";
const DEFAULT_JWT_TTL_DAYS: i64 = 7;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_MEASUREMENT_INTERVAL_SECS: u64 = 300;

// Configuração lida do ambiente (com `.env` opcional via dotenvy)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub frontend_url: String,
    pub jwt_ttl_days: i64,
    pub db_max_connections: u32,
    pub measurement_interval_secs: u64,
    pub smtp_url: Option<String>,
    pub mail_from: Option<String>,
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_or<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{name} inválido: {raw}")),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: optional("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            frontend_url: optional("FRONTEND_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
            jwt_ttl_days: parsed_or("JWT_TTL_DAYS", DEFAULT_JWT_TTL_DAYS)?,
            db_max_connections: parsed_or("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            measurement_interval_secs: parsed_or(
                "MEASUREMENT_INTERVAL_SECS",
                DEFAULT_MEASUREMENT_INTERVAL_SECS,
            )?,
            smtp_url: optional("SMTP_URL"),
            mail_from: optional("MAIL_FROM"),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub auth_service: AuthService,
    pub panel_service: PanelService,
    pub telemetry_service: TelemetryService,
    pub summary_service: SummaryService,
    pub company_service: CompanyService,
    pub newsletter_repo: NewsletterRepository,
}

impl AppState {
    // A assinatura retorna um Result: falhas de conexão sobem para o main.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar no banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let mailer = SmtpMailer::new(config.smtp_url.as_deref(), config.mail_from.as_deref())
            .context("Configuração de e-mail inválida")?;

        Ok(Self::build(db_pool, config, Arc::new(mailer)))
    }

    // --- Monta o gráfico de dependências ---
    pub fn build(db_pool: PgPool, config: Config, mailer: Arc<dyn MailSender>) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let company_repo = CompanyRepository::new(db_pool.clone());
        let branch_repo = BranchRepository::new(db_pool.clone());
        let panel_repo = PanelRepository::new(db_pool.clone());
        let measurement_repo = MeasurementRepository::new(db_pool.clone());
        let newsletter_repo = NewsletterRepository::new(db_pool.clone());

        let auth_service = AuthService::new(
            user_repo.clone(),
            company_repo.clone(),
            branch_repo.clone(),
            mailer,
            config.jwt_secret.clone(),
            config.jwt_ttl_days,
            config.frontend_url.clone(),
            db_pool.clone(),
        );
        let panel_service = PanelService::new(
            panel_repo.clone(),
            user_repo,
            branch_repo.clone(),
            measurement_repo.clone(),
            db_pool.clone(),
        );
        let telemetry_service = TelemetryService::new(
            panel_repo.clone(),
            measurement_repo.clone(),
            db_pool.clone(),
            config.measurement_interval_secs,
        );
        let summary_service = SummaryService::new(panel_repo, measurement_repo, db_pool.clone());
        let company_service = CompanyService::new(company_repo, branch_repo, db_pool.clone());

        Self {
            db_pool,
            config: Arc::new(config),
            auth_service,
            panel_service,
            telemetry_service,
            summary_service,
            company_service,
            newsletter_repo,
        }
    }
}
