use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use tracing::debug;

use crate::auth::claims::TokenScope;
use crate::auth::jwt::{TokenError, TokenKeys};
use crate::auth::repo::User;
use crate::error::ApiError;
use crate::state::AppState;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(header::COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;
            (key == name).then(|| value.to_string())
        })
}

/// The cookie stores `"Bearer <token>"` URL-encoded. Decode, then take the
/// payload after the first space. Anything that doesn't fit the shape is
/// treated as no token at all.
fn parse_scheme_token(raw: &str) -> Option<String> {
    let decoded = urlencoding::decode(raw).ok()?;
    let (_scheme, token) = decoded.split_once(' ')?;
    (!token.is_empty()).then(|| token.to_string())
}

/// Lenient cookie-based session resolver used by browser-facing routes.
/// Every failure path (missing cookie, malformed value, bad or expired
/// token, dangling subject) degrades to anonymous; only store failures
/// propagate.
pub struct CookieUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<AppState> for CookieUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(raw) = cookie_value(&parts.headers, ACCESS_TOKEN_COOKIE) else {
            return Ok(CookieUser(None));
        };
        let Some(token) = parse_scheme_token(&raw) else {
            return Ok(CookieUser(None));
        };

        let keys = TokenKeys::from_ref(state);
        let subject = match keys.decode(&token, TokenScope::App) {
            Ok(subject) => subject,
            Err(e) => {
                debug!(error = %e, "cookie token rejected");
                return Ok(CookieUser(None));
            }
        };

        let user = User::find_by_email(&state.db, &subject).await?;
        if user.is_none() {
            debug!(subject = %subject, "cookie token subject has no user");
        }
        Ok(CookieUser(user))
    }
}

/// Strict bearer-header session resolver used by the programmatic API.
/// Every failure is terminal: all rejections map to 401 with a bearer
/// challenge, and an unknown subject is deliberately indistinguishable
/// by status from a bad token.
pub struct BearerUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for BearerUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::InvalidToken)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or(ApiError::InvalidToken)?;

        let keys = TokenKeys::from_ref(state);
        let subject = keys
            .decode(token, TokenScope::Api)
            .map_err(|e| match e {
                TokenError::Expired => ApiError::TokenExpired,
                TokenError::InvalidSignature => ApiError::InvalidToken,
                TokenError::MissingSubject => ApiError::MissingSubjectClaim,
            })?;

        let user = User::find_by_email(&state.db, &subject)
            .await?
            .ok_or(ApiError::UnknownSubject)?;

        Ok(BearerUser(user))
    }
}

/// Bearer resolver plus the `active` guard. `authenticate` does not check
/// the flag, so any route that needs a live account composes this on top.
pub struct ActiveUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for ActiveUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerUser(user) = BearerUser::from_request_parts(parts, state).await?;
        if !user.active {
            debug!(email = %user.email, "inactive account rejected");
            return Err(ApiError::InactiveAccount);
        }
        Ok(ActiveUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request};

    fn make_parts(header_name: axum::http::HeaderName, value: String) -> Parts {
        let request = Request::builder()
            .header(header_name, value)
            .body(())
            .expect("request");
        request.into_parts().0
    }

    fn tamper(token: &str) -> String {
        let (rest, signature) = token.rsplit_once('.').expect("three segments");
        let mut flipped = signature.to_string();
        let replacement = if flipped.starts_with('A') { "B" } else { "A" };
        flipped.replace_range(0..1, replacement);
        format!("{rest}.{flipped}")
    }

    #[test]
    fn cookie_value_picks_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("foo=bar; access_token=Bearer%20abc; other=xyz"),
        );
        assert_eq!(
            cookie_value(&headers, ACCESS_TOKEN_COOKIE),
            Some("Bearer%20abc".to_string())
        );
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn cookie_value_absent_header() {
        let headers = HeaderMap::new();
        assert_eq!(cookie_value(&headers, ACCESS_TOKEN_COOKIE), None);
    }

    #[test]
    fn parse_scheme_token_url_decodes() {
        assert_eq!(
            parse_scheme_token("Bearer%20abc.def.ghi"),
            Some("abc.def.ghi".to_string())
        );
    }

    #[test]
    fn parse_scheme_token_plain_space() {
        assert_eq!(
            parse_scheme_token("Bearer abc.def.ghi"),
            Some("abc.def.ghi".to_string())
        );
    }

    #[test]
    fn parse_scheme_token_without_scheme_is_none() {
        assert_eq!(parse_scheme_token("abc.def.ghi"), None);
        assert_eq!(parse_scheme_token("Bearer%20"), None);
        assert_eq!(parse_scheme_token(""), None);
    }

    // Decode failure precedes the store lookup, so the resolver paths below
    // never touch the lazily-connecting pool in the fake state.

    #[tokio::test]
    async fn cookie_resolver_tampered_token_degrades_to_anonymous() {
        let state = AppState::fake();
        let keys = TokenKeys::from_ref(&state);
        let token = keys.mint("ana@x.com", TokenScope::App, None).expect("mint");
        let mut parts = make_parts(
            header::COOKIE,
            format!("{ACCESS_TOKEN_COOKIE}=Bearer%20{}", tamper(&token)),
        );
        let result = CookieUser::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Ok(CookieUser(None))));
    }

    #[tokio::test]
    async fn cookie_resolver_malformed_cookie_degrades_to_anonymous() {
        let state = AppState::fake();
        let mut parts = make_parts(
            header::COOKIE,
            format!("{ACCESS_TOKEN_COOKIE}=not-even-a-scheme"),
        );
        let result = CookieUser::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Ok(CookieUser(None))));
    }

    #[tokio::test]
    async fn bearer_resolver_tampered_token_is_unauthorized() {
        let state = AppState::fake();
        let keys = TokenKeys::from_ref(&state);
        let token = keys.mint("ana@x.com", TokenScope::Api, None).expect("mint");
        let mut parts = make_parts(
            header::AUTHORIZATION,
            format!("Bearer {}", tamper(&token)),
        );
        let result = BearerUser::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(ApiError::InvalidToken)));
    }

    #[tokio::test]
    async fn bearer_resolver_rejects_cross_scope_token() {
        let state = AppState::fake();
        let keys = TokenKeys::from_ref(&state);
        let token = keys.mint("ana@x.com", TokenScope::App, None).expect("mint");
        let mut parts = make_parts(header::AUTHORIZATION, format!("Bearer {token}"));
        let result = BearerUser::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(ApiError::InvalidToken)));
    }

    #[tokio::test]
    async fn bearer_resolver_expired_token_is_unauthorized() {
        let state = AppState::fake();
        let keys = TokenKeys::from_ref(&state);
        let token = keys
            .mint("ana@x.com", TokenScope::Api, Some(time::Duration::seconds(-5)))
            .expect("mint");
        let mut parts = make_parts(header::AUTHORIZATION, format!("Bearer {token}"));
        let result = BearerUser::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(ApiError::TokenExpired)));
    }

    #[tokio::test]
    async fn bearer_resolver_missing_header_is_unauthorized() {
        let state = AppState::fake();
        let mut parts = Request::builder().body(()).expect("request").into_parts().0;
        let result = BearerUser::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(ApiError::InvalidToken)));
    }
}
