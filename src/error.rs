use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Domain errors surfaced by the auth core and the data-access glue.
/// The boundary mapping lives in `IntoResponse` below; everything up the
/// call chain works with typed values, never transport statuses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Username not found. Please check on your email, or sign-up.")]
    UserNotFound,
    #[error("Incorrect username or password. Please check on your username and password.")]
    InvalidCredentials,
    #[error("Inactive User. User Account has not been activated.")]
    InactiveAccount,
    #[error("Inactive User. User Account has been disabled.")]
    AccountDisabled,
    #[error("Could not validate credentials. Please check on the token and its validity. It may have expired.")]
    TokenExpired,
    #[error("Could not validate credentials. Please check on the token and its validity.")]
    InvalidToken,
    #[error("Could not validate credentials. Couldn't find email in payload.")]
    MissingSubjectClaim,
    #[error("Could not validate credentials. Couldn't find user. Please check on your email and password.")]
    UnknownSubject,
    #[error("Email {0} is already registered.")]
    DuplicateEmail(String),
    #[error("User ID {0} already exists.")]
    DuplicateUserId(i64),
    #[error("Customer ID {0} already exists.")]
    DuplicateCustomerId(i64),
    #[error("User not found")]
    UserIdNotFound,
    #[error("Customer not found")]
    CustomerNotFound,
    #[error("Invalid sort column")]
    InvalidSortColumn(String),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::UserNotFound => StatusCode::NOT_FOUND,
            ApiError::InvalidCredentials => StatusCode::BAD_REQUEST,
            ApiError::InactiveAccount => StatusCode::BAD_REQUEST,
            ApiError::AccountDisabled => StatusCode::FORBIDDEN,
            ApiError::TokenExpired
            | ApiError::InvalidToken
            | ApiError::MissingSubjectClaim
            | ApiError::UnknownSubject => StatusCode::UNAUTHORIZED,
            ApiError::DuplicateEmail(_) => StatusCode::CONFLICT,
            ApiError::DuplicateUserId(_) | ApiError::DuplicateCustomerId(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::UserIdNotFound | ApiError::CustomerNotFound => StatusCode::NOT_FOUND,
            ApiError::InvalidSortColumn(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Auth failures answer with a bearer challenge, matching the wire
    /// behavior the browser and API clients already expect.
    fn bearer_challenge(&self) -> bool {
        matches!(
            self,
            ApiError::UserNotFound
                | ApiError::InvalidCredentials
                | ApiError::InactiveAccount
                | ApiError::AccountDisabled
                | ApiError::TokenExpired
                | ApiError::InvalidToken
                | ApiError::MissingSubjectClaim
                | ApiError::UnknownSubject
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            // Store and infrastructure failures propagate unmasked but keep
            // their internals out of the response body.
            ApiError::Database(e) => {
                error!(error = %e, "database error");
                "Internal server error".to_string()
            }
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                "Internal server error".to_string()
            }
            ApiError::InvalidSortColumn(col) => format!("Invalid sort column: {col}"),
            other => other.to_string(),
        };

        let mut response = (status, Json(json!({ "detail": detail }))).into_response();
        if self.bearer_challenge() {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_failures_stay_distinguishable() {
        assert_eq!(ApiError::UserNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::InvalidCredentials.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn bearer_path_collapses_to_unauthorized() {
        for e in [
            ApiError::TokenExpired,
            ApiError::InvalidToken,
            ApiError::MissingSubjectClaim,
            ApiError::UnknownSubject,
        ] {
            assert_eq!(e.status(), StatusCode::UNAUTHORIZED);
            assert!(e.bearer_challenge());
        }
    }

    #[test]
    fn inactive_account_statuses_differ_per_entry_point() {
        // Resolver guard rejects with 400, the /token login with 403.
        assert_eq!(ApiError::InactiveAccount.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::AccountDisabled.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn auth_failure_carries_bearer_challenge() {
        let response = ApiError::UserNotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }
}
