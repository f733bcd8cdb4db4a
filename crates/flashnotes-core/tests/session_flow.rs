//! End-to-end session flows against a mock UserAuth server.

use flashnotes_core::auth::{FileStore, SessionStore, AUTH_TOKEN_KEY, USERNAME_KEY, USER_ID_KEY};
use flashnotes_core::{AuthClient, SessionManager, SessionStatus};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn manager_for(
    server: &MockServer,
    dir: &std::path::Path,
) -> SessionManager<AuthClient, FileStore> {
    let client = AuthClient::new(server.uri(), None).unwrap();
    SessionManager::new(client, FileStore::new(dir.to_path_buf()))
}

#[tokio::test]
async fn login_then_restart_revalidates() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/api/UserAuth/login"))
        .and(body_json(json!({"username": "bob", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "t2"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/UserAuth/_getAuthenticatedUser"))
        .and(body_json(json!({"token": "t2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"user": "u2"}])))
        .expect(2)
        .mount(&server)
        .await;

    let mut manager = manager_for(&server, dir.path());
    assert!(manager.login("bob", "pw").await);
    assert_eq!(manager.status(), SessionStatus::LoggedIn);
    drop(manager);

    // A fresh process picks the session up from disk and confirms it.
    let mut restarted = manager_for(&server, dir.path());
    assert_eq!(restarted.status(), SessionStatus::LoggedOut);
    restarted.init().await;
    assert_eq!(restarted.status(), SessionStatus::LoggedIn);
    assert_eq!(restarted.user_id(), Some("u2"));
    assert_eq!(restarted.username(), Some("bob"));
}

#[tokio::test]
async fn login_with_unresolvable_token_persists_nothing() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/api/UserAuth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "t2"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/UserAuth/_getAuthenticatedUser"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "Invalid session"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut manager = manager_for(&server, dir.path());
    assert!(!manager.login("bob", "pw").await);
    assert!(!manager.is_authenticated());
    assert_eq!(manager.error(), Some("Invalid session"));
    assert!(!manager.store().path().exists());
}

#[tokio::test]
async fn stale_token_is_torn_down_on_startup() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let mut store = FileStore::new(dir.path().to_path_buf());
    store.set(AUTH_TOKEN_KEY, "expired").unwrap();
    store.set(USER_ID_KEY, "u1").unwrap();
    store.set(USERNAME_KEY, "alice").unwrap();

    Mock::given(method("POST"))
        .and(path("/api/UserAuth/_getAuthenticatedUser"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let mut manager = manager_for(&server, dir.path());
    manager.init().await;

    assert_eq!(manager.status(), SessionStatus::LoggedOut);
    assert!(!manager.store().path().exists());
    for key in [AUTH_TOKEN_KEY, USER_ID_KEY, USERNAME_KEY] {
        assert_eq!(manager.store().get(key).unwrap(), None);
    }
}

#[tokio::test]
async fn register_then_logout_with_server_down() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/api/UserAuth/register"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"user": "u1", "token": "t1"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/UserAuth/logout"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let mut manager = manager_for(&server, dir.path());
    assert!(manager.register("alice", "pw").await);
    assert_eq!(
        manager.store().get(AUTH_TOKEN_KEY).unwrap().as_deref(),
        Some("t1")
    );

    manager.logout().await;
    assert!(!manager.is_authenticated());
    assert!(!manager.store().path().exists());
}
