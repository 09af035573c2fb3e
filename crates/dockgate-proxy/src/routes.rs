//! The router: maps (method, path) to handlers, with an optional leading
//! `/v<n>` API-version segment accepted everywhere. The proxy is an
//! allow-list, not a pass-through — unrouted paths return 404, and
//! `/swarm*` is never wired up at all.

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use dockgate_core::{Error, ResourceKind};
use http::{HeaderMap, Method, StatusCode};
use serde_json::Value;
use tower_http::trace::TraceLayer;
use std::collections::HashMap;

use crate::error::AppError;
use crate::passthrough::stream_engine_response;
use crate::security::strip_client_registry_headers;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let versioned = Router::new()
        .route("/_ping", get(ping).head(ping))
        .route("/version", get(version))
        .route("/info", get(info))
        .route("/nodes", get(list_nodes))
        .route("/nodes/:id", get(inspect_node))
        .route("/distribution/*image_and_suffix", get(distribution))
        .route("/services/create", axum::routing::post(create_service))
        .route(
            "/services/:id",
            get(inspect_service).delete(delete_service),
        )
        .route("/services", get(list_services))
        .route("/services/:id/update", axum::routing::post(update_service))
        .route("/services/:id/logs", get(service_logs))
        .route("/networks/create", axum::routing::post(create_network))
        .route(
            "/networks/:id",
            get(inspect_network).delete(delete_network),
        )
        .route("/networks", get(list_networks))
        .route("/secrets/create", axum::routing::post(create_secret))
        .route("/secrets/:id", get(inspect_secret).delete(delete_secret))
        .route("/secrets", get(list_secrets))
        .route(
            "/secrets/:id/update",
            axum::routing::post(update_secret),
        )
        .route("/configs/create", axum::routing::post(create_config))
        .route("/configs/:id", get(inspect_config).delete(delete_config))
        .route("/configs", get(list_configs))
        .route(
            "/configs/:id/update",
            axum::routing::post(update_config),
        )
        .route("/volumes/create", axum::routing::post(create_volume))
        .route("/volumes/:name", get(inspect_volume).delete(delete_volume))
        .route("/volumes", get(list_volumes))
        .route("/tasks/:id", get(inspect_task))
        .route("/tasks", get(list_tasks))
        .route("/tasks/:id/logs", get(task_logs))
        .fallback(not_found);

    Router::new()
        .merge(versioned.clone())
        .nest("/:version", versioned)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::NotFound
}

// ---------------------------------------------------------------------
// Unrestricted read-only surface
// ---------------------------------------------------------------------

async fn ping(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    forward_unrestricted(&state, method, "/_ping", headers).await
}

async fn version(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AppError> {
    forward_unrestricted(&state, Method::GET, "/version", headers).await
}

async fn info(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AppError> {
    forward_unrestricted(&state, Method::GET, "/info", headers).await
}

async fn list_nodes(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AppError> {
    forward_unrestricted(&state, Method::GET, "/nodes", headers).await
}

async fn inspect_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    forward_unrestricted(&state, Method::GET, &format!("/nodes/{id}"), headers).await
}

async fn forward_unrestricted(
    state: &AppState,
    method: Method,
    path: &str,
    mut headers: HeaderMap,
) -> Result<Response, AppError> {
    strip_client_registry_headers(&mut headers);
    let response = state.engine.dial(method, path, headers, None).await?;
    stream_engine_response(response)
}

// ---------------------------------------------------------------------
// Distribution lookup
// ---------------------------------------------------------------------

async fn distribution(
    State(state): State<AppState>,
    Path(image_and_suffix): Path<String>,
    mut headers: HeaderMap,
) -> Result<Response, AppError> {
    // Image references routinely contain `/` (e.g.
    // `registry.example.com/app:1`), so the route captures everything after
    // `/distribution/` as a wildcard and this strips the fixed `/json`
    // suffix back off to recover the image reference.
    let image = image_and_suffix
        .strip_suffix("/json")
        .ok_or(AppError::NotFound)?
        .to_string();
    strip_client_registry_headers(&mut headers);

    let registry = dockgate_engine::registry_auth::resolve_registry(&image);
    let credential = state.auth_store.get(&registry);

    if state.config.policy.only_known_registries && credential.is_none() {
        return Err(AppError::Rejected {
            status: StatusCode::FORBIDDEN,
            message: format!("Registry {registry} is not known"),
        });
    }

    if let Some(cred) = credential {
        if !cred.is_anonymous() {
            let value = cred
                .encode_header_value()
                .map_err(AppError::Engine)?;
            let (name, header_value) = crate::security::registry_auth_header(&value)
                .map_err(|e| AppError::Engine(Error::internal(e.to_string())))?;
            headers.insert(name, header_value);
        }
    }

    let response = state
        .engine
        .dial(Method::GET, &format!("/distribution/{image}/json"), headers, None)
        .await?;
    stream_engine_response(response)
}

// ---------------------------------------------------------------------
// Generic helpers shared across resource kinds
// ---------------------------------------------------------------------

async fn inspect_generic(state: &AppState, kind: ResourceKind, id: &str) -> Result<Response, AppError> {
    if !state.oracle.is_owned(kind, id).await {
        return Err(not_owned_error(kind));
    }
    match state.engine.inspect(kind, id).await? {
        Some(value) => Ok(Json(value).into_response()),
        None => Err(AppError::NotFound),
    }
}

async fn list_generic(state: &AppState, kind: ResourceKind) -> Result<Response, AppError> {
    let items = state.engine.list(kind, None).await?;
    let mut owned = Vec::with_capacity(items.len());
    for item in items {
        if value_is_owned(state, kind, &item).await {
            owned.push(item);
        }
    }
    Ok(Json(Value::Array(owned)).into_response())
}

async fn value_is_owned(state: &AppState, kind: ResourceKind, value: &Value) -> bool {
    let id = value
        .get("ID")
        .or_else(|| value.get("Id"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    if id.is_empty() {
        return false;
    }
    state.oracle.is_owned(kind, id).await
}

async fn delete_generic(state: &AppState, kind: ResourceKind, id: &str) -> Result<Response, AppError> {
    if !state.oracle.is_owned(kind, id).await {
        return Err(not_owned_error(kind));
    }
    let (status, body) = state.engine.remove(kind, id).await?;
    Ok((status, Json(body)).into_response())
}

fn not_owned_error(kind: ResourceKind) -> AppError {
    AppError::Rejected {
        status: dockgate_policy::OwnershipOracle::not_owned_inspect_status(kind),
        message: format!("Access denied: {} is not owned.", kind.label()),
    }
}

// ---------------------------------------------------------------------
// Services
// ---------------------------------------------------------------------

async fn list_services(State(state): State<AppState>) -> Result<Response, AppError> {
    list_generic(&state, ResourceKind::Service).await
}

async fn inspect_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    inspect_generic(&state, ResourceKind::Service, &id).await
}

async fn delete_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    delete_generic(&state, ResourceKind::Service, &id).await
}

async fn create_service(
    State(state): State<AppState>,
    mut headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Result<Response, AppError> {
    strip_client_registry_headers(&mut headers);
    state.validator.validate_create_name(&body)?;
    state.validator.validate_and_stamp_service(&mut body).await?;

    let extra_headers = brokered_headers(&state, &body).await?;
    let (status, response_body) = state
        .engine
        .create(ResourceKind::Service, &body, extra_headers)
        .await?;
    Ok((status, Json(response_body)).into_response())
}

async fn update_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    mut headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Result<Response, AppError> {
    strip_client_registry_headers(&mut headers);
    if !state.oracle.is_owned(ResourceKind::Service, &id).await {
        return Err(not_owned_error(ResourceKind::Service));
    }
    state.validator.validate_and_stamp_service(&mut body).await?;

    let extra_headers = brokered_headers(&state, &body).await?;
    let version = query.get("version").map(String::as_str);
    let (status, response_body) = state
        .engine
        .update(ResourceKind::Service, &id, version, &body, extra_headers)
        .await?;
    Ok((status, Json(response_body)).into_response())
}

/// Resolve and broker registry credentials for a service create/update
/// body's image, returning the header map to forward.
async fn brokered_headers(state: &AppState, body: &Value) -> Result<HeaderMap, AppError> {
    let image = body
        .pointer("/TaskTemplate/ContainerSpec/Image")
        .and_then(Value::as_str);
    let Some(image) = image else {
        return Ok(HeaderMap::new());
    };

    let brokered = state.broker.broker(image).await?;
    let mut headers = HeaderMap::new();
    if let Some(value) = brokered.header_value {
        let (name, header_value) = crate::security::registry_auth_header(&value)
            .map_err(|e| AppError::Engine(Error::internal(e.to_string())))?;
        headers.insert(name, header_value);
    }
    Ok(headers)
}

async fn service_logs(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if !state.oracle.is_owned(ResourceKind::Service, &id).await {
        return Err(not_owned_error(ResourceKind::Service));
    }
    forward_with_query(&state, &format!("/services/{id}/logs"), query, headers).await
}

async fn task_logs(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if !state.oracle.is_task_of_owned_service(&id).await {
        return Err(not_owned_error(ResourceKind::Task));
    }
    forward_with_query(&state, &format!("/tasks/{id}/logs"), query, headers).await
}

async fn forward_with_query(
    state: &AppState,
    path: &str,
    query: HashMap<String, String>,
    mut headers: HeaderMap,
) -> Result<Response, AppError> {
    strip_client_registry_headers(&mut headers);
    let path_and_query = if query.is_empty() {
        path.to_string()
    } else {
        let qs = query
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        format!("{path}?{qs}")
    };
    let response = state.engine.dial(Method::GET, &path_and_query, headers, None).await?;
    stream_engine_response(response)
}

// ---------------------------------------------------------------------
// Networks
// ---------------------------------------------------------------------

async fn list_networks(State(state): State<AppState>) -> Result<Response, AppError> {
    list_generic(&state, ResourceKind::Network).await
}

async fn inspect_network(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    if !state.oracle.is_owned_network(&id, true).await {
        return Err(not_owned_error(ResourceKind::Network));
    }
    match state.engine.inspect(ResourceKind::Network, &id).await? {
        Some(value) => Ok(Json(value).into_response()),
        None => Err(AppError::NotFound),
    }
}

async fn delete_network(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    // Allow-listed networks are referenceable but never mutable, so
    // deletion never honors the allow-list.
    if !state.oracle.is_owned_network(&id, false).await {
        return Err(not_owned_error(ResourceKind::Network));
    }
    delete_generic(&state, ResourceKind::Network, &id).await
}

async fn create_network(
    State(state): State<AppState>,
    Json(mut body): Json<Value>,
) -> Result<Response, AppError> {
    state.validator.validate_create_name(&body)?;
    state.validator.validate_and_stamp_network(&mut body)?;
    let (status, response_body) = state
        .engine
        .create(ResourceKind::Network, &body, HeaderMap::new())
        .await?;
    Ok((status, Json(response_body)).into_response())
}

// ---------------------------------------------------------------------
// Secrets
// ---------------------------------------------------------------------

async fn list_secrets(State(state): State<AppState>) -> Result<Response, AppError> {
    list_generic(&state, ResourceKind::Secret).await
}

async fn inspect_secret(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    inspect_generic(&state, ResourceKind::Secret, &id).await
}

async fn delete_secret(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    delete_generic(&state, ResourceKind::Secret, &id).await
}

async fn create_secret(
    State(state): State<AppState>,
    Json(mut body): Json<Value>,
) -> Result<Response, AppError> {
    state.validator.validate_create_name(&body)?;
    state.validator.validate_and_stamp_secret(&mut body)?;
    let (status, response_body) = state
        .engine
        .create(ResourceKind::Secret, &body, HeaderMap::new())
        .await?;
    Ok((status, Json(response_body)).into_response())
}

async fn update_secret(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    Json(mut body): Json<Value>,
) -> Result<Response, AppError> {
    if !state.oracle.is_owned(ResourceKind::Secret, &id).await {
        return Err(not_owned_error(ResourceKind::Secret));
    }
    state.validator.validate_and_stamp_secret(&mut body)?;
    let version = query.get("version").map(String::as_str);
    let (status, response_body) = state
        .engine
        .update(ResourceKind::Secret, &id, version, &body, HeaderMap::new())
        .await?;
    Ok((status, Json(response_body)).into_response())
}

// ---------------------------------------------------------------------
// Configs
// ---------------------------------------------------------------------

async fn list_configs(State(state): State<AppState>) -> Result<Response, AppError> {
    list_generic(&state, ResourceKind::Config).await
}

async fn inspect_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    inspect_generic(&state, ResourceKind::Config, &id).await
}

async fn delete_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    delete_generic(&state, ResourceKind::Config, &id).await
}

async fn create_config(
    State(state): State<AppState>,
    Json(mut body): Json<Value>,
) -> Result<Response, AppError> {
    state.validator.validate_create_name(&body)?;
    state.validator.validate_and_stamp_config(&mut body)?;
    let (status, response_body) = state
        .engine
        .create(ResourceKind::Config, &body, HeaderMap::new())
        .await?;
    Ok((status, Json(response_body)).into_response())
}

async fn update_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    Json(mut body): Json<Value>,
) -> Result<Response, AppError> {
    if !state.oracle.is_owned(ResourceKind::Config, &id).await {
        return Err(not_owned_error(ResourceKind::Config));
    }
    state.validator.validate_and_stamp_config(&mut body)?;
    let version = query.get("version").map(String::as_str);
    let (status, response_body) = state
        .engine
        .update(ResourceKind::Config, &id, version, &body, HeaderMap::new())
        .await?;
    Ok((status, Json(response_body)).into_response())
}

// ---------------------------------------------------------------------
// Volumes
// ---------------------------------------------------------------------

async fn list_volumes(State(state): State<AppState>) -> Result<Response, AppError> {
    list_generic(&state, ResourceKind::Volume).await
}

async fn inspect_volume(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    inspect_generic(&state, ResourceKind::Volume, &name).await
}

async fn delete_volume(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    delete_generic(&state, ResourceKind::Volume, &name).await
}

async fn create_volume(
    State(state): State<AppState>,
    Json(mut body): Json<Value>,
) -> Result<Response, AppError> {
    state.validator.validate_create_name(&body)?;
    state.validator.validate_and_stamp_volume(&mut body).await?;
    let (status, response_body) = state
        .engine
        .create(ResourceKind::Volume, &body, HeaderMap::new())
        .await?;
    Ok((status, Json(response_body)).into_response())
}

// ---------------------------------------------------------------------
// Tasks (read-only; ownership derived from the parent service)
// ---------------------------------------------------------------------

async fn list_tasks(State(state): State<AppState>) -> Result<Response, AppError> {
    let items = state.engine.list(ResourceKind::Task, None).await?;
    let mut owned = Vec::with_capacity(items.len());
    for item in items {
        let service_id = item
            .get("ServiceID")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if !service_id.is_empty() && state.oracle.is_owned(ResourceKind::Service, service_id).await {
            owned.push(item);
        }
    }
    Ok(Json(Value::Array(owned)).into_response())
}

async fn inspect_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    if !state.oracle.is_task_of_owned_service(&id).await {
        return Err(not_owned_error(ResourceKind::Task));
    }
    match state.engine.inspect(ResourceKind::Task, &id).await? {
        Some(value) => Ok(Json(value).into_response()),
        None => Err(AppError::NotFound),
    }
}
