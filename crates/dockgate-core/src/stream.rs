//! The byte-stream response type used for streaming passthrough.
//!
//! This proxy never inspects the *body* of a streamed engine response — it
//! only classifies and validates the *request*. So there's no adapter
//! trait to parse chunks, just an opaque byte-for-byte carrier that
//! preserves status and headers ahead of the body, per the streaming
//! passthrough contract.

use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;
use http::{HeaderMap, StatusCode};

use crate::error::Error;

/// A boxed stream of body chunks, as read off the engine socket.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, Error>> + Send>>;

/// An engine response ready to be copied verbatim to the client: status and
/// headers are available immediately, the body streams lazily so the
/// caller never buffers an unbounded log or ping stream.
pub struct EngineResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: BodyStream,
}

impl EngineResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: BodyStream) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }
}
