//! Types exchanged with the auth service

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Response of the sign-up, password and refresh endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The access token, absent when sign-up still needs e-mail confirmation
    pub access_token: Option<String>,

    /// The refresh token
    pub refresh_token: Option<String>,

    /// The token type
    pub token_type: Option<String>,

    /// The expiry time in seconds
    pub expires_in: Option<i64>,

    /// The expiry timestamp
    pub expires_at: Option<i64>,

    /// The user data
    pub user: Option<User>,
}

/// User data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// The user ID
    pub id: String,

    /// The user's email address
    pub email: Option<String>,

    /// The user metadata; the display name lives under `name`
    #[serde(default)]
    pub user_metadata: HashMap<String, serde_json::Value>,

    /// The creation time
    pub created_at: Option<String>,
}

impl User {
    /// Name shown next to the user's listings
    pub fn display_name(&self) -> String {
        self.user_metadata
            .get("name")
            .and_then(|v| v.as_str())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| self.id.clone())
    }
}

/// E-mail and password credentials
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Sign-up payload; `data` becomes the user metadata
#[derive(Debug, Clone, Serialize)]
pub(crate) struct SignUpRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub data: SignUpMetadata<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SignUpMetadata<'a> {
    pub name: &'a str,
}

/// Tokens kept by the embedding application between runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTokens {
    pub access_token: String,
    pub refresh_token: String,
}
