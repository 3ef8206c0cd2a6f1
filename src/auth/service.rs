use lazy_static::lazy_static;
use regex::Regex;
use sqlx::PgPool;
use tracing::warn;

use crate::auth::password::verify_password;
use crate::auth::repo::User;
use crate::error::ApiError;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Validate email + password against the credential store. Read-only.
///
/// Deliberately does not check the `active` flag: the `/token` login path
/// rejects inactive accounts itself, while the bearer-resolver path leaves
/// it to the `ActiveUser` guard. Callers must not assume a returned user
/// can log in.
pub async fn authenticate(db: &PgPool, email: &str, password: &str) -> Result<User, ApiError> {
    let user = User::find_by_email(db, email)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    if !verify_password(password, &user.password)? {
        warn!(email = %email, "authentication failed: bad password");
        return Err(ApiError::InvalidCredentials);
    }

    Ok(user)
}
