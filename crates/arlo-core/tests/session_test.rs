#![allow(clippy::unwrap_used)]
// Session lifecycle over real HTTP, using wiremock.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use arlo_api::{Credentials, HttpConnector, ServiceUrls};
use arlo_core::{
    Action, ClientConfig, CommandDispatcher, CommandResult, CoreError, FailureReason,
    SessionManager, SessionState,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn manager(server: &MockServer) -> SessionManager<HttpConnector> {
    let root = Url::parse(&format!("{}/hmsweb", server.uri())).unwrap();
    SessionManager::new(
        HttpConnector::default(),
        ServiceUrls::new(&root),
        Credentials::new("user@example.com", SecretString::from("hunter2".to_string())),
    )
    .with_event_timeout(Duration::from_secs(2))
}

/// Mount login, subscribe, devices, unsubscribe and logout, each expected
/// exactly `times` times.
async fn mount_session(server: &MockServer, times: u64) {
    Mock::given(method("POST"))
        .and(path("/hmsweb/login/v2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "token": "tok-1", "userId": "U1" }
        })))
        .expect(times)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/hmsweb/client/subscribe"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("data: {\"status\":\"connected\"}\n\n", "text/event-stream"),
        )
        .expect(times)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/hmsweb/users/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                { "deviceId": "B1", "deviceName": "Home", "deviceType": "basestation", "parentId": "B1" },
                { "deviceId": "C1", "deviceName": "Porch", "deviceType": "camera", "parentId": "B1" }
            ]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/hmsweb/client/unsubscribe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(times)
        .mount(server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/hmsweb/logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(times)
        .mount(server)
        .await;
}

// ── SessionManager ──────────────────────────────────────────────────

#[tokio::test]
async fn login_then_logout_walks_the_state_machine() {
    let server = MockServer::start().await;
    mount_session(&server, 1).await;

    let session = manager(&server).login().await.unwrap();
    let state = session.state();
    assert_eq!(*state.borrow(), SessionState::Authenticated);
    assert_eq!(session.user_id(), "U1");

    let registry = session.registry().await.unwrap();
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.parent_of("C1").unwrap().serial, "B1");

    session.logout().await;
    assert_eq!(*state.borrow(), SessionState::LoggedOut);
    assert!(session.is_logged_out());
    assert!(session.events().is_closed());
}

#[tokio::test]
async fn logout_is_idempotent() {
    let server = MockServer::start().await;
    mount_session(&server, 1).await;

    let session = manager(&server).login().await.unwrap();
    session.logout().await;
    session.logout().await;
    session.clone().logout().await;
    // expect(1) on unsubscribe/logout is verified when the server drops
}

#[tokio::test]
async fn logout_failures_are_swallowed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/hmsweb/login/v2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "token": "tok-1", "userId": "U1" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hmsweb/client/subscribe"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("", "text/event-stream"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hmsweb/client/unsubscribe"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/hmsweb/logout"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let session = manager(&server).login().await.unwrap();
    session.logout().await;
    assert!(session.is_logged_out());
}

#[tokio::test]
async fn rejected_login_opens_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/hmsweb/login/v2"))
        .and(body_partial_json(json!({ "email": "user@example.com" })))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hmsweb/client/subscribe"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = manager(&server).login().await;
    assert!(
        matches!(result, Err(CoreError::AuthenticationFailed { .. })),
        "expected AuthenticationFailed"
    );
}

#[tokio::test]
async fn refused_push_channel_undoes_the_login() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/hmsweb/login/v2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "token": "tok-1", "userId": "U1" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hmsweb/client/subscribe"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/hmsweb/logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let result = manager(&server).login().await;
    assert!(
        matches!(result, Err(CoreError::EventChannelClosed { .. })),
        "expected EventChannelClosed"
    );
}

#[tokio::test]
async fn with_session_logs_out_when_the_body_fails() {
    let server = MockServer::start().await;
    mount_session(&server, 1).await;

    let result: Result<(), CoreError> = manager(&server)
        .with_session(|_session| async {
            Err(CoreError::Internal("boom".into()))
        })
        .await;

    assert!(matches!(result, Err(CoreError::Internal(_))));
}

// ── Dispatcher over HTTP ────────────────────────────────────────────

#[tokio::test]
async fn arm_over_http_uses_one_session() {
    let server = MockServer::start().await;
    mount_session(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/hmsweb/users/devices/notify/B1"))
        .and(body_partial_json(json!({
            "from": "U1_web",
            "to": "B1",
            "resource": "modes",
            "properties": { "active": "mode1" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = CommandDispatcher::new(Arc::new(manager(&server)));
    let result = dispatcher.execute("B1", Action::Arm, true).await;

    assert_eq!(result, Some(CommandResult::ArmAck));
}

#[tokio::test]
async fn mode_poll_parses_automation_over_http() {
    let server = MockServer::start().await;
    mount_session(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/hmsweb/users/devices/automation/active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{ "activeModes": ["armed"], "activeSchedules": [] }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = CommandDispatcher::new(Arc::new(manager(&server)));
    let result = dispatcher.execute("B1", Action::QueryMode, true).await;

    assert_eq!(
        result,
        Some(CommandResult::ModeInfo {
            mode: "armed".into(),
            schedule: String::new(),
        })
    );
}

#[tokio::test]
async fn manager_from_config_uses_configured_root() {
    let server = MockServer::start().await;
    mount_session(&server, 1).await;

    let root = Url::parse(&format!("{}/hmsweb", server.uri())).unwrap();
    let config = ClientConfig::new(
        "user@example.com",
        SecretString::from("hunter2".to_string()),
        root,
    );
    let sessions = SessionManager::from_config(&config);
    assert_eq!(sessions.event_timeout(), config.event_timeout);

    let registry = sessions
        .with_session(|session| async move { session.registry().await })
        .await
        .unwrap();
    assert_eq!(registry.base_stations().count(), 1);
}

#[tokio::test]
async fn mode_poll_accepts_bare_data_body() {
    let server = MockServer::start().await;
    mount_session(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/hmsweb/users/devices/automation/active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "activeModes": ["armed"], "activeSchedules": [] }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = CommandDispatcher::new(Arc::new(manager(&server)));
    let result = dispatcher.execute("B1", Action::QueryMode, true).await;

    assert_eq!(
        result,
        Some(CommandResult::ModeInfo {
            mode: "armed".into(),
            schedule: String::new(),
        })
    );
}

#[tokio::test]
async fn unreachable_login_endpoint_is_an_auth_error() {
    let root = Url::parse("http://127.0.0.1:1/hmsweb").unwrap();
    let sessions = SessionManager::new(
        HttpConnector::default(),
        ServiceUrls::new(&root),
        Credentials::new("user@example.com", SecretString::from("hunter2".to_string())),
    );

    let result = sessions.login().await;
    assert!(
        matches!(result, Err(CoreError::AuthenticationFailed { ref message }) if message.contains("127.0.0.1")),
        "expected AuthenticationFailed"
    );

    let dispatcher = CommandDispatcher::new(Arc::new(sessions));
    let result = dispatcher.execute("B1", Action::Arm, true).await;
    assert!(
        matches!(
            result,
            Some(CommandResult::Failure {
                reason: FailureReason::AuthError,
                ..
            })
        ),
        "got {result:?}"
    );
}
