//! DockGate Policy
//!
//! The ownership oracle, the create/update validator and label stamper,
//! and the registry-auth broker it delegates to. This
//! crate holds every decision that short-circuits a request before the
//! engine is contacted (or decides the engine's response should be
//! filtered), so the router in `dockgate-proxy` can stay a thin composition
//! of oracle + validator + engine client.

pub mod broker;
pub mod config;
pub mod error;
pub mod oracle;
pub mod stamp;
pub mod validator;

pub use broker::RegistryBroker;
pub use config::PolicyConfig;
pub use error::{PolicyError, PolicyResult};
pub use oracle::OwnershipOracle;
pub use validator::SpecValidator;
