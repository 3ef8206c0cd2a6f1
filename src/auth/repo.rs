use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use crate::error::ApiError;

/// User record in the database. The password column holds the argon2
/// digest, never the plaintext, and is not exposed in JSON.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub active: bool,
}

const USER_COLUMNS: &str = "id, name, email, password, active";

impl User {
    /// Find a user by email, the authentication principal.
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password, active
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Insert a user with an already-hashed password. The id is assigned by
    /// the store unless the caller supplies one. Uniqueness is enforced by
    /// the store's constraints, not application-level checks, so concurrent
    /// same-email signups serialize to exactly one winner.
    pub async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        id: Option<i64>,
        name: &str,
        email: &str,
        password_hash: &str,
        active: bool,
    ) -> Result<User, ApiError> {
        let user = match id {
            Some(id) => {
                sqlx::query_as::<_, User>(
                    r#"
                    INSERT INTO users (id, name, email, password, active)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING id, name, email, password, active
                    "#,
                )
                .bind(id)
                .bind(name)
                .bind(email)
                .bind(password_hash)
                .bind(active)
                .fetch_one(&mut **tx)
                .await
            }
            None => {
                sqlx::query_as::<_, User>(
                    r#"
                    INSERT INTO users (name, email, password, active)
                    VALUES ($1, $2, $3, $4)
                    RETURNING id, name, email, password, active
                    "#,
                )
                .bind(name)
                .bind(email)
                .bind(password_hash)
                .bind(active)
                .fetch_one(&mut **tx)
                .await
            }
        };
        user.map_err(|e| translate_unique_violation(e, email, id))
    }

    /// Partial update; absent fields keep their stored value. Returns `None`
    /// when no row matches.
    pub async fn update(
        db: &PgPool,
        id: i64,
        name: Option<&str>,
        email: Option<&str>,
        password_hash: Option<&str>,
        active: Option<bool>,
    ) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                password = COALESCE($4, password),
                active = COALESCE($5, active)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(active)
        .fetch_optional(db)
        .await
        .map_err(|e| translate_unique_violation(e, email.unwrap_or_default(), Some(id)))?;
        Ok(user)
    }
}

fn translate_unique_violation(e: sqlx::Error, email: &str, id: Option<i64>) -> ApiError {
    let constraint = match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            db.constraint().map(|c| c.to_string())
        }
        _ => None,
    };
    match constraint.as_deref() {
        Some("users_email_key") => ApiError::DuplicateEmail(email.to_string()),
        Some("users_pkey") => ApiError::DuplicateUserId(id.unwrap_or_default()),
        _ => ApiError::Database(e),
    }
}
