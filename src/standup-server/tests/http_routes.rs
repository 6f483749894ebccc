//! Route tests: the router runs in-process against a mocked Slack Web API.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;

use standup_server::{AppState, ServerConfig, create_router_with_state};
use standup_slack::BotConfig;
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ok(body: Value) -> ResponseTemplate {
    let mut body = body;
    body["ok"] = json!(true);
    ResponseTemplate::new(200).set_body_json(body)
}

async fn slack() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/conversations.members"))
        .respond_with(ok(json!({ "members": ["U1", "U2"] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users.info"))
        .respond_with(ok(json!({ "user": { "name": "ann" } })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/conversations.open"))
        .respond_with(ok(json!({ "channel": { "id": "D1" } })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat.postMessage"))
        .respond_with(ok(json!({ "ts": "1700000000.000100" })))
        .mount(&server)
        .await;
    server
}

fn state(server: &MockServer) -> Arc<AppState> {
    let bot = BotConfig::new("xoxb-test", "standup")
        .with_main_channel_id("C1")
        .with_admins(["UADMIN"])
        .with_admin_suffix(" (admin)")
        .with_api_url(server.uri());
    let client = standup_slack::SlackApiClient::new(&bot).unwrap();
    Arc::new(AppState::with_client(
        ServerConfig::default(),
        &bot,
        Arc::new(client),
    ))
}

fn app(server: &MockServer) -> Router {
    create_router_with_state(state(server))
}

fn form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8_lossy(&bytes).to_string())
}

#[tokio::test]
async fn test_health() {
    let server = slack().await;
    let (status, body) = send(&app(&server), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_url_verification_echoes_challenge() {
    let server = slack().await;
    let request = Request::builder()
        .method("POST")
        .uri("/slack/events")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "type": "url_verification", "challenge": "abc123" }).to_string(),
        ))
        .unwrap();

    let (status, body) = send(&app(&server), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "abc123");
}

#[tokio::test]
async fn test_malformed_callback_is_bad_request() {
    let server = slack().await;
    let request = Request::builder()
        .method("POST")
        .uri("/slack/events")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, _) = send(&app(&server), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_event_callback_is_acknowledged_empty() {
    let server = slack().await;
    let request = Request::builder()
        .method("POST")
        .uri("/slack/events")
        .body(Body::from(
            json!({
                "type": "event_callback",
                "event": { "type": "reaction_added", "user": "U1" }
            })
            .to_string(),
        ))
        .unwrap();

    let (status, body) = send(&app(&server), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "");
}

#[tokio::test]
async fn test_direct_message_is_handled_after_ack() {
    let server = slack().await;
    let state = state(&server);
    let app = create_router_with_state(Arc::clone(&state));

    let request = Request::builder()
        .method("POST")
        .uri("/slack/events")
        .body(Body::from(
            json!({
                "type": "event_callback",
                "event": {
                    "type": "message",
                    "channel": "D1",
                    "channel_type": "im",
                    "user": "U1",
                    "text": "done",
                    "ts": "5.5"
                }
            })
            .to_string(),
        ))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "");

    state.events.close();
    state.events.wait().await;

    // No open check-in, so the member is told privately.
    let requests = server.received_requests().await.unwrap();
    let notice = requests
        .iter()
        .find(|r| r.url.path() == "/chat.postMessage")
        .unwrap();
    let sent: Value = serde_json::from_slice(&notice.body).unwrap();
    assert_eq!(sent["channel"], "D1");
}

#[tokio::test]
async fn test_blank_actor_is_forbidden() {
    let server = slack().await;
    let app = app(&server);

    let (status, body) = send(&app, form("/checkin/open", "actor_id=%20%20")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, "You are not authorized to manage check-ins.");

    assert!(server.received_requests().await.unwrap().is_empty());
    let (_, body) = send(&app, get("/checkin/status")).await;
    let status: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(status["open"], false);
}

#[tokio::test]
async fn test_admin_lifecycle() {
    let server = slack().await;
    let app = app(&server);

    let (_, body) = send(&app, get("/checkin/status")).await;
    let status: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(status["open"], false);

    let (status, body) = send(&app, form("/checkin/open", "actor_id=UADMIN")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Check-in opened for 2 members. (admin)");

    let (_, body) = send(&app, get("/checkin/status")).await;
    let status: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(status["open"], true);
    assert_eq!(status["channel"], "C1");
    assert_eq!(status["thread"], "1700000000.000100");
    assert_eq!(status["pending"], json!(["U1", "U2"]));

    // Re-open is refused and gets no suffix.
    let (status, body) = send(&app, form("/checkin/open", "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        "A check-in is already open. Close it before opening a new one."
    );

    let (status, body) = send(&app, form("/checkin/close", "actor_id=")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Check-in closed. 2 members did not respond. (admin)");

    let (status, body) = send(&app, form("/checkin/remind", "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "There is no open check-in.");
}

#[tokio::test]
async fn test_non_admin_is_forbidden() {
    let server = slack().await;
    let app = app(&server);

    let (status, body) = send(&app, form("/checkin/open", "actor_id=U9")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, "You are not authorized to manage check-ins.");

    let requests = server.received_requests().await.unwrap();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_platform_failure_is_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/conversations.members"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "ok": false, "error": "channel_not_found" })),
        )
        .mount(&server)
        .await;
    let app = app(&server);

    let (status, body) = send(&app, form("/checkin/open", "")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("channel_not_found"));

    let (_, body) = send(&app, get("/checkin/status")).await;
    let status: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(status["open"], false);
}

#[tokio::test]
async fn test_api_test_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api.test"))
        .and(body_partial_json(json!({ "error": "test_error" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "ok": false, "error": "test_error" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api.test"))
        .respond_with(ok(json!({})))
        .mount(&server)
        .await;
    let app = app(&server);

    let (status, body) = send(&app, get("/slack/test")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Tested Success");

    let (status, body) = send(&app, get("/slack/test-error")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Tested Error");
}

#[tokio::test]
async fn test_channel_listing_refreshes_directory() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/conversations.list"))
        .respond_with(ok(json!({
            "channels": [
                { "id": "C2", "name": "random", "is_member": false },
                { "id": "C1", "name": "general", "is_member": true }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(&app(&server), get("/slack/channels")).await;
    assert_eq!(status, StatusCode::OK);
    let channels: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        channels,
        json!([
            { "id": "C1", "name": "general", "is_member": true },
            { "id": "C2", "name": "random", "is_member": false }
        ])
    );
}
