use std::sync::{Arc, Mutex, Once};

use serde_json::json;
use tracing::subscriber::{DefaultGuard, set_default};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{Registry, fmt};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tokengate::{
    ClientConfig, Credential, Error, MemoryCredentialStore, ReqwestTransport, RequestCoordinator,
    RequestDescriptor,
};

static INIT: Once = Once::new();
fn init_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

struct VecWriter {
    lines: Arc<Mutex<Vec<String>>>,
}

impl std::io::Write for VecWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut guard = self.lines.lock().unwrap();
        guard.push(String::from_utf8_lossy(buf).into_owned());
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn capture_logs() -> (Arc<Mutex<Vec<String>>>, DefaultGuard) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let writer_lines = lines.clone();
    let subscriber = Registry::default().with(
        fmt::Layer::default()
            .with_writer(move || VecWriter {
                lines: writer_lines.clone(),
            })
            .with_target(false)
            .with_level(true)
            .with_ansi(false),
    );
    let guard = set_default(subscriber);
    (lines, guard)
}

fn envelope(code: i64, result: serde_json::Value) -> String {
    json!({ "code": code, "msg": null, "result": result }).to_string()
}

fn coordinator(server_uri: &str, store: Arc<MemoryCredentialStore>) -> RequestCoordinator {
    let config = ClientConfig::from_values(
        server_uri,
        "/auth/guest-register",
        "/auth/refresh-token",
        vec![],
    )
    .expect("config");
    RequestCoordinator::new(config, Arc::new(ReqwestTransport::new()), store)
}

fn seeded_store() -> Arc<MemoryCredentialStore> {
    Arc::new(MemoryCredentialStore::with_credential(Credential::new(
        "tok1",
    )))
}

#[tokio::test]
async fn application_failure_surfaces_the_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/records"))
        .respond_with(ResponseTemplate::new(500).set_body_string(
            json!({ "code": 500, "msg": "quota exceeded", "result": null }).to_string(),
        ))
        .mount(&server)
        .await;

    let coordinator = coordinator(&server.uri(), seeded_store());

    let (lines, guard) = capture_logs();
    let err = coordinator
        .post("/records", json!({ "uricAcid": 420 }), &[])
        .await
        .expect_err("server error");
    drop(guard);

    match err {
        Error::Application { status, message } => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(message, "quota exceeded");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let logs = lines.lock().unwrap().clone();
    assert!(
        logs.iter()
            .any(|line| line.contains("WARN") && line.contains("quota exceeded")),
        "expected warning with the server message, got: {logs:?}"
    );
}

#[tokio::test]
async fn silent_descriptor_suppresses_the_failure_notice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/records"))
        .respond_with(ResponseTemplate::new(500).set_body_string(
            json!({ "code": 500, "msg": "quota exceeded", "result": null }).to_string(),
        ))
        .mount(&server)
        .await;

    let coordinator = coordinator(&server.uri(), seeded_store());

    let (lines, guard) = capture_logs();
    let err = coordinator
        .send(
            RequestDescriptor::post("/records")
                .body(json!({ "uricAcid": 420 }))
                .silent(),
        )
        .await
        .expect_err("server error");
    drop(guard);

    // The error still carries the message; only the notice is suppressed.
    assert!(matches!(err, Error::Application { .. }));
    let logs = lines.lock().unwrap().clone();
    assert!(
        !logs.iter().any(|line| line.contains("quota exceeded")),
        "silent call must not emit the failure notice, got: {logs:?}"
    );
}

#[tokio::test]
async fn unreachable_host_is_a_transport_failure() {
    init_logging();
    // Nothing listens here; connection is refused immediately.
    let coordinator = coordinator("http://127.0.0.1:9", seeded_store());

    let err = coordinator
        .get("/profile", &[])
        .await
        .expect_err("no server");
    assert!(matches!(err, Error::Transport(_)));
}

#[tokio::test]
async fn success_payload_deserializes_through_the_envelope() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_string(envelope(
            0,
            json!({ "name": "kay", "level": 3 }),
        )))
        .mount(&server)
        .await;

    #[derive(serde::Deserialize)]
    struct Profile {
        name: String,
        level: u8,
    }

    let coordinator = coordinator(&server.uri(), seeded_store());
    let envelope = coordinator.get("/profile", &[]).await.expect("send");
    let profile: Profile = envelope.parse_result().expect("typed result");
    assert_eq!(profile.name, "kay");
    assert_eq!(profile.level, 3);
}
