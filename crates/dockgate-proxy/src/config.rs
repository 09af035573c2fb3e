//! Proxy configuration: environment-variable driven, loaded once at
//! startup. Unlike a YAML-file-first configuration a general reverse proxy
//! might use, the canonical source here is the environment; `Cli` only
//! supplies the handful of things that make sense as flags for local runs
//! (listen address/port, socket path).

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use dockgate_policy::PolicyConfig;

use crate::Cli;

const DEFAULT_ENGINE_SOCKET: &str = "/var/run/docker.sock";
const DEFAULT_REGISTRY_AUTH_PATH: &str = "/run/secrets/registry_auth_overrides";
const DEFAULT_LISTEN: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 2375;

/// Fully resolved proxy configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen: String,
    pub port: u16,
    pub engine_socket: PathBuf,
    pub registry_auth_path: PathBuf,
    pub policy: PolicyConfig,
}

impl Config {
    /// Load configuration from the environment (the primary channel), with
    /// `Cli` flags overriding listen address/port/socket path for local
    /// runs: defaults first, then override.
    pub fn from_env(cli: &Cli) -> Result<Self> {
        let tenant_label_value = std::env::var("TENANT_NAME")
            .or_else(|_| std::env::var("OWNER_LABEL_VALUE"))
            .context("TENANT_NAME (or legacy OWNER_LABEL_VALUE) is required")?;
        if tenant_label_value.is_empty() {
            bail!("TENANT_NAME must not be empty");
        }

        let name_prefix =
            env_or("NAME_PREFIX", tenant_label_value.clone());

        let allowed_volume_drivers = csv_env_or("ALLOWED_REGULAR_VOLUMES_DRIVERS", &["local"]);
        let allowed_mount_types = csv_env_or(
            "ALLOWED_VOLUME_TYPES",
            &["bind", "volume", "tmpfs", "npipe", "cluster"],
        );
        let allow_port_expose = bool_env("ALLOW_PORT_EXPOSE");
        let service_allow_listed_networks = csv_env_or("SERVICE_ALLOW_LISTED_NETWORKS", &[]);
        let only_known_registries = bool_env("ONLY_KNOWN_REGISTRIES");

        let registry_auth_path = std::env::var("REGISTRY_AUTH_OVERRIDES_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_REGISTRY_AUTH_PATH));

        let listen = cli
            .listen
            .clone()
            .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let port = cli.port.unwrap_or(DEFAULT_PORT);
        let engine_socket = cli
            .socket
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ENGINE_SOCKET));

        Ok(Self {
            listen,
            port,
            engine_socket,
            registry_auth_path,
            policy: PolicyConfig {
                tenant_label_value,
                name_prefix,
                allowed_volume_drivers,
                allowed_mount_types,
                allow_port_expose,
                service_allow_listed_networks,
                only_known_registries,
            },
        })
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn bool_env(key: &str) -> bool {
    matches!(
        std::env::var(key).as_deref(),
        Ok("1") | Ok("true") | Ok("TRUE") | Ok("True")
    )
}

fn csv_env_or(key: &str, default: &[&str]) -> HashSet<String> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => default.iter().map(|s| s.to_string()).collect(),
    }
}
