use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Duration;

use super::{bounded, InsertOutcome, StoreError, UserStore};
use crate::models::{NewUser, UpdateProfileInput, UserRecord};

const UNIQUE_VIOLATION: &str = "23505";

pub struct PgUserStore {
    db: PgPool,
    timeout: Duration,
}

impl PgUserStore {
    pub fn new(db: PgPool, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_subject(&self, subject: &str) -> Result<Option<UserRecord>, StoreError> {
        bounded(self.timeout, async {
            let user = sqlx::query_as::<_, UserRecord>(r#"SELECT * FROM users WHERE subject = $1"#)
                .bind(subject)
                .fetch_optional(&self.db)
                .await?;
            Ok::<_, StoreError>(user)
        })
        .await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, StoreError> {
        bounded(self.timeout, async {
            let user = sqlx::query_as::<_, UserRecord>(r#"SELECT * FROM users WHERE id = $1"#)
                .bind(id)
                .fetch_optional(&self.db)
                .await?;
            Ok::<_, StoreError>(user)
        })
        .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        bounded(self.timeout, async {
            let user = sqlx::query_as::<_, UserRecord>(
                r#"SELECT * FROM users WHERE email = $1 ORDER BY id LIMIT 1"#,
            )
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
            Ok::<_, StoreError>(user)
        })
        .await
    }

    async fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        bounded(self.timeout, async {
            let users = sqlx::query_as::<_, UserRecord>(r#"SELECT * FROM users ORDER BY id"#)
                .fetch_all(&self.db)
                .await?;
            Ok::<_, StoreError>(users)
        })
        .await
    }

    async fn insert_if_absent(&self, user: &NewUser) -> Result<InsertOutcome, StoreError> {
        bounded(self.timeout, async {
            let inserted = sqlx::query_as::<_, UserRecord>(
                r#"
                INSERT INTO users
                    (subject, email, first_name, last_name, bio, location, phone_number, profile_picture)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (subject) DO NOTHING
                RETURNING *
                "#,
            )
            .bind(&user.subject)
            .bind(&user.email)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.bio)
            .bind(&user.location)
            .bind(&user.phone_number)
            .bind(&user.profile_picture)
            .fetch_optional(&self.db)
            .await;

            match inserted {
                Ok(Some(record)) => Ok::<_, StoreError>(InsertOutcome::Inserted(record)),
                Ok(None) => Ok(InsertOutcome::AlreadyExists),
                Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                    Ok(InsertOutcome::AlreadyExists)
                }
                Err(e) => Err(StoreError::Database(e)),
            }
        })
        .await
    }

    async fn update_fields(
        &self,
        subject: &str,
        changes: &UpdateProfileInput,
    ) -> Result<Option<UserRecord>, StoreError> {
        bounded(self.timeout, async {
            let user = sqlx::query_as::<_, UserRecord>(
                r#"
                UPDATE users
                SET first_name = COALESCE($2, first_name),
                    last_name = COALESCE($3, last_name),
                    phone_number = COALESCE($4, phone_number),
                    location = COALESCE($5, location),
                    bio = COALESCE($6, bio),
                    profile_picture = COALESCE($7, profile_picture)
                WHERE subject = $1
                RETURNING *
                "#,
            )
            .bind(subject)
            .bind(&changes.first_name)
            .bind(&changes.last_name)
            .bind(&changes.phone_number)
            .bind(&changes.location)
            .bind(&changes.bio)
            .bind(&changes.profile_picture)
            .fetch_optional(&self.db)
            .await?;
            Ok::<_, StoreError>(user)
        })
        .await
    }
}
