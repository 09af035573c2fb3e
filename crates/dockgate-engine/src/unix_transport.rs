//! A tiny `tower::Service<Uri> -> Unix socket` connector.
//!
//! This proxy talks to exactly one fixed Unix-domain socket path per
//! process, so unlike a general-purpose Unix-socket HTTP client the
//! connector doesn't need to decode a socket path out of the request URI —
//! it just dials the configured path on every connect. The request URI only
//! needs to be well-formed enough for `hyper`'s client machinery to build a
//! request line from; the host is never resolved.
//!
//! Built directly on `hyper`, `hyper-util`, and `tower` rather than pulling
//! in `hyperlocal`, since the transport needed here is small enough to own
//! and adapters elsewhere in this workspace favor writing a thin adapter
//! over reaching for another crate's abstraction.

use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use http::Uri;
use hyper::rt::{Read, Write};
use hyper_util::client::legacy::connect::{Connected, Connection};
use hyper_util::rt::TokioIo;
use pin_project::pin_project;
use tokio::net::UnixStream;
use tower::Service;

/// Connects to a single, fixed Unix domain socket path.
#[derive(Clone)]
pub struct UnixConnector {
    socket_path: Arc<PathBuf>,
}

impl UnixConnector {
    pub fn new(socket_path: PathBuf) -> Self {
        Self {
            socket_path: Arc::new(socket_path),
        }
    }
}

impl Service<Uri> for UnixConnector {
    type Response = UnixIo;
    type Error = io::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _req: Uri) -> Self::Future {
        let socket_path = self.socket_path.clone();
        Box::pin(async move {
            let stream = UnixStream::connect(socket_path.as_path()).await?;
            Ok(UnixIo(TokioIo::new(stream)))
        })
    }
}

/// Local newtype wrapping `TokioIo<UnixStream>` so we can implement
/// `hyper_util`'s `Connection` trait on it — both `TokioIo` and
/// `UnixStream` are foreign types, so the impl has to live on a type we
/// own.
#[pin_project]
pub struct UnixIo(#[pin] TokioIo<UnixStream>);

impl Connection for UnixIo {
    fn connected(&self) -> Connected {
        Connected::new()
    }
}

impl Read for UnixIo {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: hyper::rt::ReadBufCursor<'_>,
    ) -> Poll<io::Result<()>> {
        self.project().0.poll_read(cx, buf)
    }
}

impl Write for UnixIo {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.project().0.poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.project().0.poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.project().0.poll_shutdown(cx)
    }
}

/// Build a request URI for a path against the (ignored) Unix-socket
/// authority. `hyper` requires an absolute-form URI to build the request
/// line; the authority is never dialed, so any well-formed placeholder
/// works.
pub fn socket_uri(path_and_query: &str) -> Uri {
    Uri::builder()
        .scheme("http")
        .authority("docker.sock.local")
        .path_and_query(path_and_query)
        .build()
        .expect("path_and_query must already be percent-encoded by the caller")
}
