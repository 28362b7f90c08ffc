mod support;

use eco_collect::api::Role;
use eco_collect::session::SessionStore;
use eco_collect::Error;
use support::FakeServer;

#[tokio::test]
async fn login_captures_the_session_cookie() {
    let server = FakeServer::start().await;
    let api = server.client();

    let session = server.login("wanjiku@example.test").await;
    assert_eq!(session.user().user_name, "wanjiku");
    assert_eq!(session.user().role, Role::Civilian);

    let user = api.current_user(&session).await.unwrap().unwrap();
    assert_eq!(user.id, session.user().id);
}

#[tokio::test]
async fn wrong_password_surfaces_server_message() {
    let server = FakeServer::start().await;
    let err = server
        .client()
        .login("wanjiku@example.test", "nope")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Server { status: 401, .. }));
    assert_eq!(err.user_message("Login failed."), "Invalid credentials");
}

#[tokio::test]
async fn stored_session_survives_a_restart() {
    let server = FakeServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path().join("nested").join("session.json"));

    let session = server.login("corp@acme.test").await;
    store.save(&session).await.unwrap();

    let restored = SessionStore::new(store.path()).load().await.unwrap().unwrap();
    assert_eq!(restored, session);
    assert_eq!(restored.user().role, Role::Corporative);
    server.client().current_user(&restored).await.unwrap();
}

#[tokio::test]
async fn logout_ends_the_session_server_side() {
    let server = FakeServer::start().await;
    let api = server.client();
    let session = server.login("wanjiku@example.test").await;
    let kept = session.clone();

    api.logout(session).await.unwrap();
    assert_eq!(server.backend().calls.logout, 1);

    let err = api.current_user(&kept).await.unwrap_err();
    assert!(matches!(err, Error::Server { status: 401, .. }));
}
