//! Per-process shared state: one `AppState` per process, cheaply
//! `Clone`-able, no per-tenant map — this proxy is single-tenant-per-process
//! by construction (see DESIGN.md for the rejected multi-tenant-per-process
//! alternative).

use std::sync::Arc;

use dockgate_engine::{EngineClient, RegistryAuthStore};
use dockgate_policy::{OwnershipOracle, RegistryBroker, SpecValidator};

use crate::Config;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<EngineClient>,
    pub oracle: Arc<OwnershipOracle>,
    pub validator: Arc<SpecValidator>,
    pub broker: Arc<RegistryBroker>,
    pub auth_store: Arc<RegistryAuthStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let engine = Arc::new(EngineClient::new(config.engine_socket.clone()));
        let auth_store = Arc::new(RegistryAuthStore::load(&config.registry_auth_path));

        let oracle = Arc::new(OwnershipOracle::new(
            engine.clone(),
            config.policy.tenant_label_value.clone(),
            config.policy.name_prefix.clone(),
            config.policy.service_allow_listed_networks.clone(),
        ));
        let validator = Arc::new(SpecValidator::new(oracle.clone(), config.policy.clone()));
        let broker = Arc::new(RegistryBroker::new(
            engine.clone(),
            auth_store.clone(),
            config.policy.only_known_registries,
        ));

        Self {
            engine,
            oracle,
            validator,
            broker,
            auth_store,
            config: Arc::new(config),
        }
    }
}
