//! Session data for the signed-in user

use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::auth::types::{AuthResponse, User};
use crate::error::{Error, Result};

/// Identity of the signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// The user ID, stored as the listing's `uid`
    pub id: String,

    /// The display name, stored as the listing's `owner`
    pub name: String,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.display_name(),
        }
    }
}

/// Session data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The access token
    pub access_token: String,

    /// The refresh token
    pub refresh_token: String,

    /// The expiry timestamp in seconds since the epoch
    pub expires_at: Option<i64>,

    /// The signed-in user
    pub user: SessionUser,
}

/// Claims read from the access token
#[derive(Debug, Clone, Deserialize)]
struct AccessTokenClaims {
    sub: String,
    exp: Option<i64>,
    email: Option<String>,
    #[serde(default)]
    user_metadata: HashMap<String, serde_json::Value>,
}

impl Session {
    /// Build a session from an auth endpoint response.
    ///
    /// Returns `None` when the response carries no tokens, which is the case for
    /// a sign-up that still awaits e-mail confirmation.
    pub fn from_response(response: &AuthResponse) -> Option<Self> {
        let access_token = response.access_token.clone()?;
        let user = response.user.as_ref()?;

        let expires_at = response.expires_at.or_else(|| {
            response
                .expires_in
                .map(|expires_in| Utc::now().timestamp() + expires_in)
        });

        Some(Self {
            access_token,
            refresh_token: response.refresh_token.clone().unwrap_or_default(),
            expires_at,
            user: SessionUser::from(user),
        })
    }

    /// Rebuild a session from stored tokens without a network call.
    ///
    /// The signature is not checked: the backend verifies the token on every
    /// request, the client only needs the identity it names.
    pub fn from_tokens(access_token: &str, refresh_token: &str) -> Result<Self> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<AccessTokenClaims>(
            access_token,
            &DecodingKey::from_secret(&[]),
            &validation,
        )?;
        let claims = data.claims;

        if claims.sub.is_empty() {
            return Err(Error::auth("access token has no subject"));
        }

        let name = claims
            .user_metadata
            .get("name")
            .and_then(|v| v.as_str())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .or(claims.email)
            .unwrap_or_else(|| claims.sub.clone());

        Ok(Self {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            expires_at: claims.exp,
            user: SessionUser {
                id: claims.sub,
                name,
            },
        })
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now().timestamp() >= expires_at,
            None => false,
        }
    }
}
