//! A fake engine control API, served over a real Unix domain socket so
//! these tests exercise the same `EngineClient` transport the binary uses
//! in production, not a mocked trait.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use http::{HeaderMap, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as AutoBuilder;
use hyper_util::service::TowerToHyperService;
use serde_json::Value;
use tokio::net::UnixListener;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Value>,
}

#[derive(Clone)]
pub struct FakeEngine {
    store: Arc<Mutex<HashMap<String, Value>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    distribution_status: Arc<AtomicU16>,
    next_id: Arc<Mutex<u64>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            store: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            distribution_status: Arc::new(AtomicU16::new(200)),
            next_id: Arc::new(Mutex::new(1)),
        }
    }

    /// Pre-seed an existing resource in the shape `GET /<segment>/<id>`
    /// would return it (spec-nested for service/secret/config, flat for
    /// network/volume).
    pub fn seed(&self, segment: &str, id: &str, value: Value) {
        self.store
            .lock()
            .unwrap()
            .insert(format!("{segment}/{id}"), value);
    }

    pub fn set_distribution_status(&self, status: u16) {
        self.distribution_status.store(status, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_was_made(&self, path: &str) -> bool {
        self.requests().iter().any(|r| r.path == path)
    }

    fn record(&self, path: &str, headers: &HeaderMap, body: Option<&Value>) {
        let headers = headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect();
        self.requests.lock().unwrap().push(RecordedRequest {
            path: path.to_string(),
            headers,
            body: body.cloned(),
        });
    }

    fn fresh_id(&self, prefix: &str) -> String {
        let mut next = self.next_id.lock().unwrap();
        let id = format!("{prefix}-{next}");
        *next += 1;
        id
    }

    fn create_nested(&self, segment: &str, headers: &HeaderMap, body: Value) -> (StatusCode, Value) {
        self.record(&format!("/{segment}/create"), headers, Some(&body));
        let id = self.fresh_id(segment);
        let stored = serde_json::json!({ "ID": id, "Spec": body });
        self.store.lock().unwrap().insert(format!("{segment}/{id}"), stored);
        (StatusCode::CREATED, serde_json::json!({ "ID": id }))
    }

    fn create_flat(&self, segment: &str, headers: &HeaderMap, mut body: Value) -> (StatusCode, Value) {
        self.record(&format!("/{segment}/create"), headers, Some(&body));
        let id = self.fresh_id(segment);
        if let Value::Object(ref mut map) = body {
            map.insert("Id".to_string(), Value::String(id.clone()));
        }
        self.store.lock().unwrap().insert(format!("{segment}/{id}"), body);
        (StatusCode::CREATED, serde_json::json!({ "Id": id }))
    }

    fn inspect(&self, segment: &str, id: &str) -> Option<Value> {
        self.store.lock().unwrap().get(&format!("{segment}/{id}")).cloned()
    }

    fn remove(&self, segment: &str, id: &str) {
        self.store.lock().unwrap().remove(&format!("{segment}/{id}"));
    }
}

fn router(engine: FakeEngine) -> Router {
    Router::new()
        .route("/_ping", get(ping))
        .route("/distribution/*image_and_suffix", get(distribution))
        .route("/services/create", post(create_service))
        .route("/services/:id", get(inspect_service).delete(remove_service))
        .route("/secrets/create", post(create_secret))
        .route("/secrets/:id", get(inspect_secret).delete(remove_secret))
        .route("/configs/create", post(create_config))
        .route("/configs/:id", get(inspect_config).delete(remove_config))
        .route("/networks/create", post(create_network))
        .route("/networks/:id", get(inspect_network).delete(remove_network))
        .route("/volumes/create", post(create_volume))
        .route("/volumes/:name", get(inspect_volume).delete(remove_volume))
        .with_state(engine)
}

async fn ping() -> &'static str {
    "OK"
}

async fn distribution(
    State(engine): State<FakeEngine>,
    Path(image_and_suffix): Path<String>,
    headers: HeaderMap,
) -> Response {
    engine.record(&format!("/distribution/{image_and_suffix}"), &headers, None);
    let status = StatusCode::from_u16(engine.distribution_status.load(Ordering::SeqCst))
        .unwrap_or(StatusCode::OK);
    (status, Json(serde_json::json!({}))).into_response()
}

async fn create_service(
    State(engine): State<FakeEngine>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let (status, resp) = engine.create_nested("services", &headers, body);
    (status, Json(resp)).into_response()
}

async fn inspect_service(State(engine): State<FakeEngine>, Path(id): Path<String>) -> Response {
    match engine.inspect("services", &id) {
        Some(value) => Json(value).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn remove_service(State(engine): State<FakeEngine>, Path(id): Path<String>) -> Response {
    engine.remove("services", &id);
    Json(serde_json::json!({})).into_response()
}

async fn create_secret(
    State(engine): State<FakeEngine>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let (status, resp) = engine.create_nested("secrets", &headers, body);
    (status, Json(resp)).into_response()
}

async fn inspect_secret(State(engine): State<FakeEngine>, Path(id): Path<String>) -> Response {
    match engine.inspect("secrets", &id) {
        Some(value) => Json(value).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn remove_secret(State(engine): State<FakeEngine>, Path(id): Path<String>) -> Response {
    engine.remove("secrets", &id);
    Json(serde_json::json!({})).into_response()
}

async fn create_config(
    State(engine): State<FakeEngine>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let (status, resp) = engine.create_nested("configs", &headers, body);
    (status, Json(resp)).into_response()
}

async fn inspect_config(State(engine): State<FakeEngine>, Path(id): Path<String>) -> Response {
    match engine.inspect("configs", &id) {
        Some(value) => Json(value).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn remove_config(State(engine): State<FakeEngine>, Path(id): Path<String>) -> Response {
    engine.remove("configs", &id);
    Json(serde_json::json!({})).into_response()
}

async fn create_network(
    State(engine): State<FakeEngine>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let (status, resp) = engine.create_flat("networks", &headers, body);
    (status, Json(resp)).into_response()
}

async fn inspect_network(State(engine): State<FakeEngine>, Path(id): Path<String>) -> Response {
    match engine.inspect("networks", &id) {
        Some(value) => Json(value).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn remove_network(State(engine): State<FakeEngine>, Path(id): Path<String>) -> Response {
    engine.remove("networks", &id);
    Json(serde_json::json!({})).into_response()
}

async fn create_volume(
    State(engine): State<FakeEngine>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let (status, resp) = engine.create_flat("volumes", &headers, body);
    (status, Json(resp)).into_response()
}

async fn inspect_volume(State(engine): State<FakeEngine>, Path(name): Path<String>) -> Response {
    match engine.inspect("volumes", &name) {
        Some(value) => Json(value).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn remove_volume(State(engine): State<FakeEngine>, Path(name): Path<String>) -> Response {
    engine.remove("volumes", &name);
    Json(serde_json::json!({})).into_response()
}

/// Spawn the fake engine on a temp-directory Unix socket and return the
/// socket path plus a handle for seeding/asserting. The temp directory is
/// leaked deliberately so the socket path stays valid for the test's
/// lifetime; the OS reclaims it at process exit.
pub async fn spawn_fake_engine() -> (PathBuf, FakeEngine) {
    let dir = tempfile::tempdir().expect("tempdir");
    let socket_path = dir.path().join("engine.sock");
    std::mem::forget(dir);

    let engine = FakeEngine::new();
    let app = router(engine.clone());

    let listener = UnixListener::bind(&socket_path).expect("bind fake engine socket");
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                continue;
            };
            let app = app.clone();
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = TowerToHyperService::new(app);
                let _ = AutoBuilder::new(TokioExecutor::new())
                    .serve_connection(io, service)
                    .await;
            });
        }
    });

    tokio::task::yield_now().await;

    (socket_path, engine)
}
