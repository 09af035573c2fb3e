//! DockGate Engine Client
//!
//! A typed client for the container engine's HTTP control API, dialed over
//! a Unix domain socket, plus the read-only registry-auth store that backs
//! image-pull credential brokering.

pub mod client;
pub mod registry_auth;
mod unix_transport;

pub use client::EngineClient;
pub use registry_auth::{RegistryAuthStore, RegistryCredential};
