use serde::{Deserialize, Serialize};

/// Audience a token is bound to: the browser cookie session ("app") or the
/// programmatic bearer session ("api"). Each scope signs with its own secret,
/// so tokens are never cross-valid. Not a permission level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenScope {
    App,
    Api,
}

/// JWT payload used for authentication. `sub` is optional on the wire so a
/// token that verifies but carries no subject can be reported as such
/// instead of failing deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>, // user email
    pub exp: i64, // expires at (unix timestamp)
    pub nbf: i64, // not before (unix timestamp)
    pub iat: i64, // issued at (unix timestamp)
}
