use axum::{
    extract::{FromRef, Path, State},
    routing::{get, post, put},
    Form, Json, Router,
};
use time::macros::format_description;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        claims::TokenScope,
        dto::{
            LoginRequest, LoginResponse, MessageResponse, PublicUser, SessionResponse,
            TokenRequest, TokenResponse, UserCreate, UserUpdate,
        },
        extractors::{ActiveUser, CookieUser},
        jwt::TokenKeys,
        password::hash_password,
        repo::User,
        service::{self, is_valid_email},
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/session", get(session))
        .route("/token", post(token))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_users))
        .route("/users/:id", put(update_user))
        .route("/me", get(me))
}

/// Browser login. Issues an app-scope token the client stores in the
/// `access_token` cookie. Does not check the `active` flag; the cookie
/// path exposes it through the resolved user instead.
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    let user = service::authenticate(&state.db, &payload.email, &payload.password).await?;

    let keys = TokenKeys::from_ref(&state);
    let access_token = keys.mint(&user.email, TokenScope::App, None)?;

    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok(Json(LoginResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        access_token,
    }))
}

/// API login, OAuth2 password-grant shaped. Inactive accounts are refused
/// here with 403 before any token is minted.
#[instrument(skip(state, form))]
pub async fn token(
    State(state): State<AppState>,
    Form(form): Form<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let email = form.username.trim().to_lowercase();
    let user = service::authenticate(&state.db, &email, &form.password).await?;

    if !user.active {
        warn!(email = %user.email, "inactive account refused a token");
        return Err(ApiError::AccountDisabled);
    }

    let keys = TokenKeys::from_ref(&state);
    let (access_token, expires_at) = keys.mint_with_expiry(&user.email, TokenScope::Api, None)?;

    let ttl_days = state.config.auth.token_ttl_days;
    let expiry_date_time = expires_at
        .format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        ))
        .map_err(|e| ApiError::Internal(e.into()))?;

    info!(user_id = user.id, email = %user.email, "api token issued");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".into(),
        expiry: format!("{ttl_days} day(s)"),
        expiry_date_time,
        success: true,
    }))
}

/// Bulk signup. Each plaintext password is hashed before persisting and the
/// original is discarded. Duplicate ids and emails are rejected by the
/// store's constraints inside one transaction, so a batch lands whole or
/// not at all.
#[instrument(skip(state, payload))]
pub async fn create_users(
    State(state): State<AppState>,
    Json(payload): Json<Vec<UserCreate>>,
) -> Result<Json<MessageResponse>, ApiError> {
    for user in &payload {
        if user.name.trim().is_empty() {
            return Err(ApiError::Validation("Name cannot be empty".into()));
        }
        if !is_valid_email(user.email.trim()) {
            return Err(ApiError::Validation(format!(
                "Invalid email: {}",
                user.email
            )));
        }
        if user.password.len() < 8 {
            return Err(ApiError::Validation("Password too short".into()));
        }
    }

    let mut tx = state.db.begin().await.map_err(ApiError::Database)?;
    let count = payload.len();
    for user in payload {
        let email = user.email.trim().to_lowercase();
        let hash = hash_password(&user.password)?;
        User::insert(&mut tx, user.id, user.name.trim(), &email, &hash, user.active).await?;
    }
    tx.commit().await.map_err(ApiError::Database)?;

    info!(count, "users created");
    Ok(Json(MessageResponse {
        message: format!("{count} user(s) created successfully"),
    }))
}

/// Partial profile update; re-hashes the password when one is supplied.
#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UserUpdate>,
) -> Result<Json<User>, ApiError> {
    let password_hash = match payload.password.as_deref() {
        Some(plain) => Some(hash_password(plain)?),
        None => None,
    };
    let email = payload.email.as_deref().map(|e| e.trim().to_lowercase());

    let user = User::update(
        &state.db,
        id,
        payload.name.as_deref(),
        email.as_deref(),
        password_hash.as_deref(),
        payload.active,
    )
    .await?
    .ok_or(ApiError::UserIdNotFound)?;

    info!(user_id = user.id, "user updated");
    Ok(Json(user))
}

/// Echo the caller's public record; bearer-resolved and active-guarded.
#[instrument(skip_all)]
pub async fn me(ActiveUser(user): ActiveUser) -> Json<PublicUser> {
    Json(PublicUser {
        id: user.id,
        name: user.name,
        email: user.email,
    })
}

/// Cookie-resolved session probe for the browser UI. Anonymous is a valid,
/// expected outcome here, not an error.
#[instrument(skip_all)]
pub async fn session(CookieUser(user): CookieUser) -> Json<SessionResponse> {
    Json(SessionResponse {
        user: user.map(|u| PublicUser {
            id: u.id,
            name: u.name,
            email: u.email,
        }),
    })
}
