use axum::extract::FromRef;
use jsonwebtoken::{encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::auth::claims::{Claims, TokenScope};
use crate::config::AuthConfig;
use crate::state::AppState;

/// Decode failures the two session resolvers react to differently: the
/// cookie resolver swallows all of them, the bearer resolver maps each
/// kind to its own rejection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired or not yet valid")]
    Expired,
    #[error("token signature verification failed")]
    InvalidSignature,
    #[error("token is missing the subject claim")]
    MissingSubject,
}

#[derive(Clone)]
struct ScopeKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl ScopeKeys {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Holds one symmetric key pair per token scope plus the default TTL.
/// Built from process-wide immutable configuration; never mutated after
/// startup.
#[derive(Clone)]
pub struct TokenKeys {
    app: ScopeKeys,
    api: ScopeKeys,
    pub ttl: Duration,
}

impl FromRef<AppState> for TokenKeys {
    fn from_ref(state: &AppState) -> Self {
        let AuthConfig {
            app_secret,
            api_secret,
            token_ttl_days,
        } = state.config.auth.clone();
        Self {
            app: ScopeKeys::from_secret(&app_secret),
            api: ScopeKeys::from_secret(&api_secret),
            ttl: Duration::days(token_ttl_days),
        }
    }
}

impl TokenKeys {
    fn keys(&self, scope: TokenScope) -> &ScopeKeys {
        match scope {
            TokenScope::App => &self.app,
            TokenScope::Api => &self.api,
        }
    }

    /// Sign a token for `subject` under the given scope's secret. `exp` is
    /// now + ttl (the configured default unless overridden), `nbf` and `iat`
    /// are now.
    pub fn mint(
        &self,
        subject: &str,
        scope: TokenScope,
        ttl: Option<Duration>,
    ) -> anyhow::Result<String> {
        Ok(self.mint_with_expiry(subject, scope, ttl)?.0)
    }

    /// Like `mint`, but also returns the expiry embedded in the token, for
    /// callers that advertise it alongside the token itself.
    pub fn mint_with_expiry(
        &self,
        subject: &str,
        scope: TokenScope,
        ttl: Option<Duration>,
    ) -> anyhow::Result<(String, OffsetDateTime)> {
        let now = OffsetDateTime::now_utc();
        let exp = (now + ttl.unwrap_or(self.ttl)).unix_timestamp();
        let claims = Claims {
            sub: Some(subject.to_string()),
            exp,
            nbf: now.unix_timestamp(),
            iat: now.unix_timestamp(),
        };
        let token = encode(&Header::default(), &claims, &self.keys(scope).encoding)?;
        debug!(subject = %subject, scope = ?scope, "token minted");
        Ok((token, OffsetDateTime::from_unix_timestamp(exp)?))
    }

    /// Verify a token under the given scope's secret and return its subject.
    /// Zero leeway: a token is rejected the moment `exp` passes, and before
    /// `nbf` arrives.
    pub fn decode(&self, token: &str, scope: TokenScope) -> Result<String, TokenError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.validate_nbf = true;
        let data = jsonwebtoken::decode::<Claims>(token, &self.keys(scope).decoding, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => TokenError::Expired,
                _ => TokenError::InvalidSignature,
            })?;
        data.claims.sub.ok_or(TokenError::MissingSubject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys() -> TokenKeys {
        let state = AppState::fake();
        TokenKeys::from_ref(&state)
    }

    #[tokio::test]
    async fn mint_and_decode_roundtrip() {
        let keys = make_keys();
        let token = keys.mint("ana@x.com", TokenScope::App, None).expect("mint");
        let subject = keys.decode(&token, TokenScope::App).expect("decode");
        assert_eq!(subject, "ana@x.com");
    }

    #[tokio::test]
    async fn reported_expiry_matches_embedded_claim() {
        let keys = make_keys();
        let (token, expires_at) = keys
            .mint_with_expiry("ana@x.com", TokenScope::Api, None)
            .expect("mint");
        let mut validation = Validation::default();
        validation.leeway = 0;
        let data = jsonwebtoken::decode::<Claims>(&token, &keys.api.decoding, &validation)
            .expect("decode");
        assert_eq!(data.claims.exp, expires_at.unix_timestamp());
    }

    #[tokio::test]
    async fn decode_is_idempotent() {
        let keys = make_keys();
        let token = keys.mint("ana@x.com", TokenScope::Api, None).expect("mint");
        let first = keys.decode(&token, TokenScope::Api).expect("first decode");
        let second = keys.decode(&token, TokenScope::Api).expect("second decode");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn scopes_are_isolated() {
        let keys = make_keys();
        let app_token = keys.mint("ana@x.com", TokenScope::App, None).expect("mint");
        let api_token = keys.mint("ana@x.com", TokenScope::Api, None).expect("mint");
        assert_eq!(
            keys.decode(&app_token, TokenScope::Api),
            Err(TokenError::InvalidSignature)
        );
        assert_eq!(
            keys.decode(&api_token, TokenScope::App),
            Err(TokenError::InvalidSignature)
        );
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let keys = make_keys();
        let token = keys
            .mint("ana@x.com", TokenScope::App, Some(Duration::seconds(-5)))
            .expect("mint");
        assert_eq!(
            keys.decode(&token, TokenScope::App),
            Err(TokenError::Expired)
        );
    }

    #[tokio::test]
    async fn token_valid_just_before_expiry() {
        let keys = make_keys();
        let token = keys
            .mint("ana@x.com", TokenScope::App, Some(Duration::seconds(1)))
            .expect("mint");
        assert!(keys.decode(&token, TokenScope::App).is_ok());
    }

    #[tokio::test]
    async fn not_yet_valid_token_is_rejected() {
        let keys = make_keys();
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: Some("ana@x.com".into()),
            exp: now + 600,
            nbf: now + 300,
            iat: now,
        };
        let token = encode(&Header::default(), &claims, &keys.app.encoding).expect("encode");
        assert_eq!(
            keys.decode(&token, TokenScope::App),
            Err(TokenError::Expired)
        );
    }

    #[tokio::test]
    async fn tampered_signature_is_rejected() {
        let keys = make_keys();
        let token = keys.mint("ana@x.com", TokenScope::App, None).expect("mint");
        let (rest, signature) = token.rsplit_once('.').expect("three segments");
        let mut flipped = signature.to_string();
        let replacement = if flipped.starts_with('A') { "B" } else { "A" };
        flipped.replace_range(0..1, replacement);
        let tampered = format!("{rest}.{flipped}");
        assert_eq!(
            keys.decode(&tampered, TokenScope::App),
            Err(TokenError::InvalidSignature)
        );
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let keys = make_keys();
        assert_eq!(
            keys.decode("not-a-token", TokenScope::Api),
            Err(TokenError::InvalidSignature)
        );
    }

    #[tokio::test]
    async fn missing_subject_is_reported() {
        let keys = make_keys();
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: None,
            exp: now + 600,
            nbf: now,
            iat: now,
        };
        let token = encode(&Header::default(), &claims, &keys.api.encoding).expect("encode");
        assert_eq!(
            keys.decode(&token, TokenScope::Api),
            Err(TokenError::MissingSubject)
        );
    }
}
