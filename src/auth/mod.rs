//! Authentication and session handling

mod session;
mod store;
mod types;

use reqwest::Client;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::fetch::Fetch;

pub use session::*;
pub use store::*;
pub use types::*;

/// Client for the auth service
///
/// Every successful sign-in, sign-up, sign-out or restore is published to the
/// shared [`SessionStore`].
pub struct Auth {
    /// The base URL for the backend project
    url: String,

    /// The anonymous API key
    key: String,

    /// HTTP client used for requests
    client: Client,

    /// Value of the `X-Client-Info` header
    client_info: String,

    /// Where session changes are published
    store: Arc<SessionStore>,
}

impl Auth {
    /// Create a new Auth client
    pub fn new(
        url: &str,
        key: &str,
        client: Client,
        options: &ClientOptions,
        store: Arc<SessionStore>,
    ) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            client,
            client_info: options.client_info.clone(),
            store,
        }
    }

    fn get_auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.url, path)
    }

    /// The store this client publishes to
    pub fn store(&self) -> Arc<SessionStore> {
        Arc::clone(&self.store)
    }

    /// Get the current session
    pub fn get_session(&self) -> Option<Session> {
        self.store.state().session().cloned()
    }

    /// Register a dealer account. The name is shown on their listings.
    ///
    /// Returns `None` when the backend requires e-mail confirmation before
    /// handing out a session; the store is left untouched in that case.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Option<Session>> {
        let url = self.get_auth_url("/signup");

        let body = SignUpRequest {
            email,
            password,
            data: SignUpMetadata { name },
        };

        let response = Fetch::post(&self.client, &url)
            .header("apikey", &self.key)
            .header("X-Client-Info", &self.client_info)
            .json(&body)?
            .execute::<AuthResponse>()
            .await?;

        let session = Session::from_response(&response);
        if let Some(ref session) = session {
            info!("signed up user {}", session.user.id);
            self.store.publish(SessionState::Authenticated(session.clone()));
        }

        Ok(session)
    }

    /// Sign in with e-mail and password
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let url = self.get_auth_url("/token");

        let body = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response = Fetch::post(&self.client, &url)
            .header("apikey", &self.key)
            .header("X-Client-Info", &self.client_info)
            .query_pair("grant_type", "password")
            .json(&body)?
            .execute::<AuthResponse>()
            .await?;

        let session = Session::from_response(&response)
            .ok_or_else(|| Error::auth("sign-in response carried no session"))?;

        info!("signed in user {}", session.user.id);
        self.store.publish(SessionState::Authenticated(session.clone()));

        Ok(session)
    }

    /// Sign out the current user.
    ///
    /// The local session is cleared even when the logout call fails.
    pub async fn sign_out(&self) -> Result<()> {
        if let Some(session) = self.get_session() {
            let url = self.get_auth_url("/logout");

            let result = Fetch::post(&self.client, &url)
                .header("apikey", &self.key)
                .header("X-Client-Info", &self.client_info)
                .bearer_auth(&session.access_token)
                .execute_checked()
                .await;

            if let Err(e) = result {
                warn!("logout call failed for user {}: {}", session.user.id, e);
            }
        }

        self.store.publish(SessionState::Unauthenticated);
        Ok(())
    }

    /// Get the user data for the currently authenticated user
    pub async fn get_user(&self) -> Result<User> {
        let token = self.store.access_token().ok_or(Error::NotSignedIn)?;
        self.fetch_user(&token).await
    }

    async fn fetch_user(&self, token: &str) -> Result<User> {
        let url = self.get_auth_url("/user");

        let user = Fetch::get(&self.client, &url)
            .header("apikey", &self.key)
            .header("X-Client-Info", &self.client_info)
            .bearer_auth(token)
            .execute::<User>()
            .await?;

        Ok(user)
    }

    /// Exchange a refresh token for a new session
    pub async fn refresh(&self, refresh_token: &str) -> Result<Session> {
        let url = self.get_auth_url("/token");

        let body = serde_json::json!({ "refresh_token": refresh_token });

        let response = Fetch::post(&self.client, &url)
            .header("apikey", &self.key)
            .header("X-Client-Info", &self.client_info)
            .query_pair("grant_type", "refresh_token")
            .json(&body)?
            .execute::<AuthResponse>()
            .await?;

        Session::from_response(&response)
            .ok_or_else(|| Error::auth("refresh response carried no session"))
    }

    /// Resolve the initial session state from tokens kept by the application.
    ///
    /// * no tokens: `Unauthenticated`
    /// * tokens the backend accepts: `Authenticated`
    /// * tokens the backend rejects: `Unauthenticated`
    /// * backend unreachable: the store stays `Loading` and the error is returned
    pub async fn restore(&self, tokens: Option<StoredTokens>) -> Result<SessionState> {
        let tokens = match tokens {
            Some(tokens) => tokens,
            None => {
                self.store.publish(SessionState::Unauthenticated);
                return Ok(SessionState::Unauthenticated);
            }
        };

        let parsed = Session::from_tokens(&tokens.access_token, &tokens.refresh_token);
        let mut session = match parsed {
            Ok(session) => session,
            Err(e) => {
                warn!("stored access token is unreadable: {}", e);
                self.store.publish(SessionState::Unauthenticated);
                return Ok(SessionState::Unauthenticated);
            }
        };

        if session.is_expired() {
            match self.refresh(&tokens.refresh_token).await {
                Ok(fresh) => session = fresh,
                Err(e) => return self.restore_failed(e),
            }
        }

        match self.fetch_user(&session.access_token).await {
            Ok(user) => {
                session.user = SessionUser::from(&user);
                let state = SessionState::Authenticated(session);
                self.store.publish(state.clone());
                Ok(state)
            }
            Err(e) => self.restore_failed(e),
        }
    }

    fn restore_failed(&self, error: Error) -> Result<SessionState> {
        if error.status().is_some() {
            warn!("stored session rejected by the auth service: {}", error);
            self.store.publish(SessionState::Unauthenticated);
            return Ok(SessionState::Unauthenticated);
        }

        warn!("auth service unreachable, session stays loading: {}", error);
        Err(error)
    }
}
