// src/db/newsletter_repo.rs

use sqlx::PgPool;

use crate::{
    common::{db_utils::map_constraint_violation, error::AppError},
    models::newsletter::NewsletterSubscriber,
};

#[derive(Clone)]
pub struct NewsletterRepository {
    pool: PgPool,
}

impl NewsletterRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn subscribe(&self, email: &str) -> Result<NewsletterSubscriber, AppError> {
        sqlx::query_as::<_, NewsletterSubscriber>(
            "INSERT INTO newsletter_subscribers (email) VALUES ($1) RETURNING id, email, created_at",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(map_constraint_violation)
    }
}
