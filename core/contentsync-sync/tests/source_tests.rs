use contentsync_sync::source::{AUTH_HEADER, QUERY_PASS, QUERY_USER};
use contentsync_sync::{DocumentSource, PingStatus, SourceClient, SourceConfig, SyncError};
use contentsync_types::SourceIdentifier;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// "editor:abcd efgh" with the password's spaces stripped.
const CREDENTIAL: &str = "Basic ZWRpdG9yOmFiY2RlZmdo";

fn mock_config(server: &MockServer) -> SourceConfig {
    SourceConfig {
        base_url: server.uri(),
        username: "editor".to_string(),
        app_password: "abcd efgh".to_string(),
        ..Default::default()
    }
}

fn client(server: &MockServer) -> SourceClient {
    SourceClient::new(mock_config(server)).unwrap()
}

fn slug(s: &str) -> SourceIdentifier {
    SourceIdentifier::parse(s).unwrap()
}

const DOC_PATH: &str = "/wp-json/sf-sync/v1/post-type/page/by-slug/about-us";

// ── Config ───────────────────────────────────────────────────────

#[test]
fn config_defaults() {
    let cfg = SourceConfig::default();
    assert_eq!(cfg.api_path, "wp-json/sf-sync/v1");
    assert_eq!(cfg.timeout_secs, 60);
    assert_eq!(cfg.ping_timeout_secs, 15);
    assert!(cfg.query_auth_fallback);
}

#[test]
fn config_requires_all_credentials() {
    let cfg = SourceConfig {
        base_url: "https://src.example".to_string(),
        username: "editor".to_string(),
        app_password: "   ".to_string(),
        ..Default::default()
    };
    let err = cfg.validate().unwrap_err();
    assert_eq!(err.reason(), "not_configured");
}

#[test]
fn config_requires_https_except_loopback() {
    let mut cfg = SourceConfig {
        base_url: "http://src.example".to_string(),
        username: "editor".to_string(),
        app_password: "pw".to_string(),
        ..Default::default()
    };
    assert!(matches!(cfg.validate(), Err(SyncError::Config(_))));

    for local in ["http://localhost:8080", "http://127.0.0.1:9000", "http://[::1]/"] {
        cfg.base_url = local.to_string();
        assert!(cfg.validate().is_ok(), "{local}");
    }

    cfg.base_url = "https://src.example/".to_string();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.api_base(), "https://src.example/wp-json/sf-sync/v1");
}

#[test]
fn config_loads_toml_and_json() {
    let dir = tempfile::tempdir().unwrap();

    let toml_path = dir.path().join("source.toml");
    std::fs::write(
        &toml_path,
        "base_url = \"https://src.example\"\nusername = \"editor\"\napp_password = \"a b c\"\nquery_auth_fallback = false\n",
    )
    .unwrap();
    let cfg = SourceConfig::load(&toml_path).unwrap();
    assert_eq!(cfg.password(), "abc");
    assert!(!cfg.query_auth_fallback);
    assert_eq!(cfg.timeout_secs, 60);

    let json_path = dir.path().join("source.json");
    std::fs::write(&json_path, r#"{"base_url": "https://src.example", "api_path": "/custom/v2/"}"#).unwrap();
    let cfg = SourceConfig::load(&json_path).unwrap();
    assert_eq!(cfg.api_base(), "https://src.example/custom/v2");

    let err = SourceConfig::load(dir.path().join("missing.toml")).unwrap_err();
    assert_eq!(err.reason(), "invalid_config");
}

// ── fetch_document ───────────────────────────────────────────────

#[tokio::test]
async fn fetch_sends_both_auth_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DOC_PATH))
        .and(header("Authorization", CREDENTIAL))
        .and(header(AUTH_HEADER, CREDENTIAL))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5, "title": "About", "slug": "about-us", "acf": {"x": 1}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let doc = client(&server).fetch_document("page", &slug("About Us")).await.unwrap();
    assert_eq!(doc.id, 5);
    assert_eq!(doc.acf["x"], 1);
}

#[tokio::test]
async fn fetch_by_id_uses_id_route() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wp-json/sf-sync/v1/post-type/event/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 42})))
        .expect(1)
        .mount(&server)
        .await;

    let doc = client(&server).fetch_document("event", &slug("42")).await.unwrap();
    assert_eq!(doc.id, 42);
}

#[tokio::test]
async fn unauthorized_retries_with_query_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DOC_PATH))
        .and(query_param(QUERY_USER, "editor"))
        .and(query_param(QUERY_PASS, "abcdefgh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 9})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(DOC_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let doc = client(&server).fetch_document("page", &slug("about-us")).await.unwrap();
    assert_eq!(doc.id, 9);
}

#[tokio::test]
async fn failed_retry_keeps_original_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DOC_PATH))
        .and(query_param(QUERY_USER, "editor"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(DOC_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client(&server).fetch_document("page", &slug("about-us")).await.unwrap_err();
    assert!(matches!(err, SyncError::Unauthorized));
    assert_eq!(err.reason(), "unauthorized");
}

#[tokio::test]
async fn no_query_retry_when_disabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DOC_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let cfg = SourceConfig {
        query_auth_fallback: false,
        ..mock_config(&server)
    };
    let err = SourceClient::new(cfg)
        .unwrap()
        .fetch_document("page", &slug("about-us"))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Unauthorized));
}

#[tokio::test]
async fn not_found_reports_tried_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DOC_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"code": "not_found"})))
        .mount(&server)
        .await;

    let err = client(&server).fetch_document("page", &slug("about-us")).await.unwrap_err();
    assert_eq!(err.reason(), "not_found");
    assert_eq!(err.tried_url(), Some(format!("{}{DOC_PATH}", server.uri()).as_str()));
}

#[tokio::test]
async fn other_status_is_source_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DOC_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client(&server).fetch_document("page", &slug("about-us")).await.unwrap_err();
    assert!(matches!(err, SyncError::Source { status: 503 }));
    assert_eq!(err.reason(), "source_error");
}

#[tokio::test]
async fn non_object_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DOC_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = client(&server).fetch_document("page", &slug("about-us")).await.unwrap_err();
    assert_eq!(err.reason(), "invalid_response");
}

#[tokio::test]
async fn unreachable_host_is_network_error() {
    let server = MockServer::start().await;
    let cfg = mock_config(&server);
    drop(server);

    let err = SourceClient::new(cfg)
        .unwrap()
        .fetch_document("page", &slug("about-us"))
        .await
        .unwrap_err();
    assert_eq!(err.reason(), "network_error");
    assert!(err.tried_url().is_some());
}

// ── ping ─────────────────────────────────────────────────────────

async fn ping_with(status: u16) -> Result<PingStatus, SyncError> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wp-json/sf-sync/v1/ping"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    client(&server).ping().await
}

#[tokio::test]
async fn ping_outcomes() {
    assert_eq!(ping_with(200).await.unwrap(), PingStatus::Connected);
    assert_eq!(ping_with(404).await.unwrap(), PingStatus::Reachable);
    assert!(matches!(ping_with(401).await, Err(SyncError::Unauthorized)));
    assert!(matches!(ping_with(500).await, Err(SyncError::Source { status: 500 })));
}

#[test]
fn client_rejects_unconfigured_source() {
    let err = SourceClient::new(SourceConfig::default()).err().unwrap();
    assert_eq!(err.reason(), "not_configured");
}
