use serde::{Deserialize, Serialize};

/// Request body for the browser login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response returned after a browser login; carries the app-scope token.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub access_token: String,
}

/// OAuth2 password-grant shaped form for the API token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

/// Response for the API token endpoint.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expiry: String,
    pub expiry_date_time: String,
    pub success: bool,
}

/// Signup payload; `/users` takes a batch of these.
#[derive(Debug, Deserialize)]
pub struct UserCreate {
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Partial profile update; a supplied password is re-hashed before storage.
#[derive(Debug, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub active: Option<bool>,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// Cookie-resolved session; `user` is null for anonymous requests.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: Option<PublicUser>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_create_active_defaults_to_true() {
        let user: UserCreate = serde_json::from_str(
            r#"{"name":"Ana","email":"ana@x.com","password":"secret123"}"#,
        )
        .unwrap();
        assert!(user.active);
        assert_eq!(user.id, None);
    }

    #[test]
    fn token_response_shape() {
        let response = TokenResponse {
            access_token: "tok".into(),
            token_type: "bearer".into(),
            expiry: "10 day(s)".into(),
            expiry_date_time: "2026-09-03 12:00:00".into(),
            success: true,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["token_type"], "bearer");
        assert_eq!(json["success"], true);
        assert!(json["expiry_date_time"].is_string());
    }
}
