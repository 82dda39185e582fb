use carmarket::auth::{Auth, SessionProvider, SessionState, SessionStore, StoredTokens};
use carmarket::config::ClientOptions;
use carmarket::error::Error;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn auth_client(url: &str) -> (Auth, Arc<SessionStore>) {
    let store = Arc::new(SessionStore::new());
    let auth = Auth::new(
        url,
        "test_anon_key",
        Client::new(),
        &ClientOptions::default(),
        store.clone(),
    );
    (auth, store)
}

fn access_token(sub: &str, exp: i64) -> String {
    encode(
        &Header::default(),
        &json!({ "sub": sub, "exp": exp, "email": "dealer@example.com" }),
        &EncodingKey::from_secret(b"backend-secret"),
    )
    .unwrap()
}

fn session_body(access_token: &str) -> serde_json::Value {
    json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "test_refresh_token",
        "user": {
            "id": "test_user_id",
            "email": "test@example.com",
            "user_metadata": { "name": "Test Dealer" }
        }
    })
}

#[tokio::test]
async fn test_sign_up_publishes_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .and(header("apikey", "test_anon_key"))
        .and(body_partial_json(json!({
            "email": "test@example.com",
            "data": { "name": "Test Dealer" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body("test_access_token")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (auth, store) = auth_client(&mock_server.uri());
    let session = auth
        .sign_up("test@example.com", "password123", "Test Dealer")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(session.access_token, "test_access_token");
    assert_eq!(session.user.id, "test_user_id");
    assert_eq!(session.user.name, "Test Dealer");
    assert_eq!(store.user().unwrap().name, "Test Dealer");
}

#[tokio::test]
async fn test_sign_up_awaiting_confirmation_leaves_store_alone() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": { "id": "test_user_id", "email": "test@example.com" }
        })))
        .mount(&mock_server)
        .await;

    let (auth, store) = auth_client(&mock_server.uri());
    let session = auth
        .sign_up("test@example.com", "password123", "Test Dealer")
        .await
        .unwrap();

    assert!(session.is_none());
    assert!(store.state().is_loading());
}

#[tokio::test]
async fn test_sign_in_with_password() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(body_partial_json(json!({ "email": "test@example.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body("test_access_token")))
        .mount(&mock_server)
        .await;

    let (auth, store) = auth_client(&mock_server.uri());
    let session = auth
        .sign_in("test@example.com", "password123")
        .await
        .unwrap();

    assert_eq!(session.refresh_token, "test_refresh_token");
    assert_eq!(store.access_token().as_deref(), Some("test_access_token"));
    assert_eq!(auth.get_session(), Some(session));
}

#[tokio::test]
async fn test_sign_in_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&mock_server)
        .await;

    let (auth, store) = auth_client(&mock_server.uri());
    let result = auth.sign_in("test@example.com", "wrong").await;

    assert!(matches!(result, Err(Error::Api { status: 400, .. })));
    assert!(!store.state().is_signed_in());
}

#[tokio::test]
async fn test_sign_out_clears_session_even_when_logout_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body("test_access_token")))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("authorization", "Bearer test_access_token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (auth, store) = auth_client(&mock_server.uri());
    auth.sign_in("test@example.com", "password123").await.unwrap();

    auth.sign_out().await.unwrap();
    assert_eq!(store.state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn test_get_user_requires_session() {
    let (auth, _) = auth_client("http://127.0.0.1:9");
    assert!(matches!(auth.get_user().await, Err(Error::NotSignedIn)));
}

#[tokio::test]
async fn test_restore_without_tokens() {
    let (auth, store) = auth_client("http://127.0.0.1:9");
    let state = auth.restore(None).await.unwrap();

    assert_eq!(state, SessionState::Unauthenticated);
    assert_eq!(store.state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn test_restore_accepted_token() {
    let mock_server = MockServer::start().await;
    let token = access_token("test_user_id", Utc::now().timestamp() + 3600);

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "test_user_id",
            "email": "dealer@example.com",
            "user_metadata": { "name": "Test Dealer" }
        })))
        .mount(&mock_server)
        .await;

    let (auth, store) = auth_client(&mock_server.uri());
    let state = auth
        .restore(Some(StoredTokens {
            access_token: token.clone(),
            refresh_token: "test_refresh_token".to_string(),
        }))
        .await
        .unwrap();

    let session = state.session().unwrap();
    assert_eq!(session.access_token, token);
    assert_eq!(session.user.name, "Test Dealer");
    assert!(store.state().is_signed_in());
}

#[tokio::test]
async fn test_restore_rejected_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let (auth, store) = auth_client(&mock_server.uri());
    let state = auth
        .restore(Some(StoredTokens {
            access_token: access_token("test_user_id", Utc::now().timestamp() + 3600),
            refresh_token: "test_refresh_token".to_string(),
        }))
        .await
        .unwrap();

    assert_eq!(state, SessionState::Unauthenticated);
    assert_eq!(store.state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn test_restore_refreshes_expired_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .and(body_partial_json(json!({ "refresh_token": "old_refresh_token" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body("fresh_access_token")))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", "Bearer fresh_access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "test_user_id",
            "email": "test@example.com",
            "user_metadata": { "name": "Test Dealer" }
        })))
        .mount(&mock_server)
        .await;

    let (auth, _) = auth_client(&mock_server.uri());
    let state = auth
        .restore(Some(StoredTokens {
            access_token: access_token("test_user_id", Utc::now().timestamp() - 60),
            refresh_token: "old_refresh_token".to_string(),
        }))
        .await
        .unwrap();

    assert_eq!(
        state.session().map(|s| s.access_token.as_str()),
        Some("fresh_access_token")
    );
}

#[tokio::test]
async fn test_restore_with_unreachable_backend_stays_loading() {
    let (auth, store) = auth_client("http://127.0.0.1:1");
    let result = auth
        .restore(Some(StoredTokens {
            access_token: access_token("test_user_id", Utc::now().timestamp() + 3600),
            refresh_token: "test_refresh_token".to_string(),
        }))
        .await;

    assert!(matches!(result, Err(Error::Http(_))));
    assert!(store.state().is_loading());
}
