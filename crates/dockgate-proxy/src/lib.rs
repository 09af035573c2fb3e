//! DockGate Proxy
//!
//! The library backing the binary: configuration loading, the
//! router/handlers that compose the ownership oracle, the create/update
//! validator, and the engine client, plus the streaming-passthrough glue.
//! See `main.rs` for process startup.

pub mod cli;
pub mod config;
pub mod error;
pub mod passthrough;
pub mod routes;
pub mod security;
pub mod state;

pub use cli::Cli;
pub use config::Config;
pub use error::AppError;
pub use state::AppState;
