//! Reactive holder of the current session

use tokio::sync::watch;

use crate::auth::session::{Session, SessionUser};

/// What the rest of the application knows about the signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// The auth service has not answered yet
    #[default]
    Loading,

    /// Nobody is signed in
    Unauthenticated,

    /// A user is signed in
    Authenticated(Session),
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }
}

/// Capability handed to every flow that needs to know who is signed in
pub trait SessionProvider: Send + Sync {
    /// Snapshot of the current state
    fn state(&self) -> SessionState;

    /// Receiver notified on every state change
    fn subscribe(&self) -> watch::Receiver<SessionState>;

    /// The signed-in user, if any
    fn user(&self) -> Option<SessionUser> {
        self.state().session().map(|session| session.user.clone())
    }

    /// Bearer token of the signed-in user, if any
    fn access_token(&self) -> Option<String> {
        self.state()
            .session()
            .map(|session| session.access_token.clone())
    }
}

/// Session store backed by a watch channel
///
/// Starts in [`SessionState::Loading`] and stays there until the auth client
/// publishes a resolved state.
#[derive(Debug)]
pub struct SessionStore {
    sender: watch::Sender<SessionState>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(SessionState::Loading);
        Self { sender }
    }

    /// Store that is already resolved, mostly useful in tests and tools
    pub fn with_state(state: SessionState) -> Self {
        let (sender, _) = watch::channel(state);
        Self { sender }
    }

    /// Replace the current state and wake every subscriber
    pub fn publish(&self, state: SessionState) {
        self.sender.send_replace(state);
    }

    /// Wait until the state is no longer `Loading`.
    ///
    /// No timeout: if the auth service never answers this never returns.
    pub async fn resolved(&self) -> SessionState {
        let mut receiver = self.sender.subscribe();
        loop {
            let state = receiver.borrow_and_update().clone();
            if !state.is_loading() {
                return state;
            }
            if receiver.changed().await.is_err() {
                return self.state();
            }
        }
    }
}

impl SessionProvider for SessionStore {
    fn state(&self) -> SessionState {
        self.sender.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn session() -> Session {
        Session {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: None,
            user: SessionUser {
                id: "user-1".to_string(),
                name: "Dealer".to_string(),
            },
        }
    }

    #[test]
    fn starts_loading() {
        let store = SessionStore::new();
        assert!(store.state().is_loading());
        assert!(store.user().is_none());
        assert!(store.access_token().is_none());
    }

    #[test]
    fn publish_exposes_user_and_token() {
        let store = SessionStore::new();
        store.publish(SessionState::Authenticated(session()));
        assert_eq!(store.user().unwrap().id, "user-1");
        assert_eq!(store.access_token().as_deref(), Some("access"));

        store.publish(SessionState::Unauthenticated);
        assert!(store.user().is_none());
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let store = SessionStore::new();
        let mut receiver = store.subscribe();

        store.publish(SessionState::Authenticated(session()));
        receiver.changed().await.unwrap();
        assert!(receiver.borrow().is_signed_in());
    }

    #[tokio::test]
    async fn resolved_waits_for_first_answer() {
        let store = Arc::new(SessionStore::new());
        let publisher = Arc::clone(&store);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            publisher.publish(SessionState::Unauthenticated);
        });

        let state = tokio::time::timeout(Duration::from_secs(2), store.resolved())
            .await
            .unwrap();
        assert_eq!(state, SessionState::Unauthenticated);
    }
}
