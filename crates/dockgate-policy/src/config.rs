//! Policy-relevant configuration, read once at startup by `dockgate-proxy`
//! and handed down to the oracle, validator, and broker.

use std::collections::HashSet;

/// The known mount types the engine itself understands. Separate from
/// `allowed_mount_types`, which is the operator-configured subset actually
/// permitted.
pub const KNOWN_MOUNT_TYPES: &[&str] = &["bind", "volume", "tmpfs", "npipe", "cluster"];

#[derive(Debug, Clone)]
pub struct PolicyConfig {
    /// The value every owned resource's tenant label must equal.
    pub tenant_label_value: String,
    /// Required prefix on every newly created resource name. Defaults to
    /// `tenant_label_value` at the config-loading layer.
    pub name_prefix: String,
    /// Volume drivers permitted on volume create.
    pub allowed_volume_drivers: HashSet<String>,
    /// Mount types permitted, a subset of `KNOWN_MOUNT_TYPES`.
    pub allowed_mount_types: HashSet<String>,
    /// Whether services may declare published ports.
    pub allow_port_expose: bool,
    /// Shared network names referenceable (but never mutable) by any
    /// tenant.
    pub service_allow_listed_networks: HashSet<String>,
    /// When set, image pulls from registries with no stored credentials
    /// are rejected outright.
    pub only_known_registries: bool,
}

impl PolicyConfig {
    pub fn is_mount_type_known(type_: &str) -> bool {
        KNOWN_MOUNT_TYPES.contains(&type_)
    }

    pub fn is_mount_type_allowed(&self, type_: &str) -> bool {
        self.allowed_mount_types.iter().any(|t| t == type_)
    }

    pub fn is_volume_driver_allowed(&self, driver: &str) -> bool {
        self.allowed_volume_drivers.iter().any(|d| d == driver)
    }

    pub fn is_network_allow_listed(&self, name: &str) -> bool {
        self.service_allow_listed_networks
            .iter()
            .any(|n| n == name)
    }
}
