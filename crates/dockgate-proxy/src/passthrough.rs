//! Streaming passthrough: copy the engine's status and headers first, then
//! bytes, without buffering. Used for logs, ping, and the distribution
//! lookup — anywhere the response body shouldn't be collected into memory
//! before forwarding.

use axum::body::Body;
use axum::response::Response;
use dockgate_core::EngineResponse;

use crate::error::AppError;

/// Turn an `EngineResponse` into an axum `Response` whose body streams
/// lazily from the engine connection. On client disconnect, axum/hyper
/// drop the body stream, which in turn drops the engine-side connection,
/// releasing it promptly instead of waiting on a full buffered read.
pub fn stream_engine_response(engine_response: EngineResponse) -> Result<Response, AppError> {
    let mut builder = Response::builder().status(engine_response.status);
    *builder.headers_mut().expect("builder has no error yet") = engine_response.headers;

    builder
        .body(Body::from_stream(engine_response.body))
        .map_err(|e| AppError::Engine(dockgate_core::Error::internal(format!(
            "failed to build streamed response: {e}"
        ))))
}
