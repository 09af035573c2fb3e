//! Validates a create/update body against tenant policy, then stamps it.
//! Each `validate_*` method returns `Ok(())` on success or a `PolicyError`
//! carrying the status it should surface; callers in `dockgate-proxy` stop
//! at the first error and never contact the engine.

use std::sync::Arc;

use dockgate_core::ResourceKind;
use serde_json::Value;

use crate::config::PolicyConfig;
use crate::error::{PolicyError, PolicyResult};
use crate::oracle::{OwnershipOracle, VolumeOwnership};
use crate::stamp::{stamp_body, stamp_mount_volume_options};

pub struct SpecValidator {
    oracle: Arc<OwnershipOracle>,
    config: PolicyConfig,
}

impl SpecValidator {
    pub fn new(oracle: Arc<OwnershipOracle>, config: PolicyConfig) -> Self {
        Self { oracle, config }
    }

    /// Every create requires a non-empty name starting with the configured
    /// prefix. Updates don't call this.
    pub fn validate_create_name(&self, body: &Value) -> PolicyResult<()> {
        let name = body.get("Name").and_then(Value::as_str).unwrap_or("");
        if name.is_empty() {
            return Err(PolicyError::bad_request("A resource name is required"));
        }
        if !name.starts_with(&self.config.name_prefix) {
            return Err(PolicyError::bad_request(format!(
                "Name {name} does not start with the required prefix {}",
                self.config.name_prefix
            )));
        }
        Ok(())
    }

    /// Published ports require `allow_port_expose`.
    pub fn validate_endpoint_spec(&self, body: &Value) -> PolicyResult<()> {
        let has_ports = body
            .pointer("/EndpointSpec/Ports")
            .and_then(Value::as_array)
            .is_some_and(|ports| !ports.is_empty());
        if has_ports && !self.config.allow_port_expose {
            return Err(PolicyError::forbidden("Exposing ports is not allowed"));
        }
        Ok(())
    }

    /// Full validation + stamping for a service create/update body: task
    /// template, endpoint spec, then the tenant label stamp.
    pub async fn validate_and_stamp_service(&self, body: &mut Value) -> PolicyResult<()> {
        self.validate_task_template(body).await?;
        self.validate_endpoint_spec(body)?;
        stamp_body(ResourceKind::Service, body, &self.config.tenant_label_value);
        Ok(())
    }

    pub fn validate_and_stamp_network(&self, body: &mut Value) -> PolicyResult<()> {
        stamp_body(ResourceKind::Network, body, &self.config.tenant_label_value);
        Ok(())
    }

    pub fn validate_and_stamp_secret(&self, body: &mut Value) -> PolicyResult<()> {
        stamp_body(ResourceKind::Secret, body, &self.config.tenant_label_value);
        Ok(())
    }

    pub fn validate_and_stamp_config(&self, body: &mut Value) -> PolicyResult<()> {
        stamp_body(ResourceKind::Config, body, &self.config.tenant_label_value);
        Ok(())
    }

    /// Volume create validation: driver must be configured and allowed.
    pub async fn validate_and_stamp_volume(&self, body: &mut Value) -> PolicyResult<()> {
        let driver = body.get("Driver").and_then(Value::as_str).unwrap_or("");
        if driver.is_empty() {
            return Err(PolicyError::bad_request("A volume driver is required"));
        }
        if !self.config.is_volume_driver_allowed(driver) {
            return Err(PolicyError::bad_request(format!(
                "Volume driver {driver} is not allowed"
            )));
        }

        if let Some(secrets) = body
            .pointer("/ClusterVolumeSpec/AccessMode/Secrets")
            .and_then(Value::as_array)
        {
            for entry in secrets {
                let secret_name = entry
                    .get("Secret")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                if secret_name.is_empty() {
                    continue;
                }
                if !self.oracle.is_owned(ResourceKind::Secret, secret_name).await {
                    return Err(PolicyError::forbidden(format!(
                        "Secret {secret_name} is not owned"
                    )));
                }
            }
        }

        stamp_body(ResourceKind::Volume, body, &self.config.tenant_label_value);
        Ok(())
    }

    /// Task-template validation. Runs before stamping; a rejection here
    /// means the engine is never contacted.
    async fn validate_task_template(&self, body: &mut Value) -> PolicyResult<()> {
        let has_task_template = body.get("TaskTemplate").is_some();
        let runtime = body
            .get("TaskTemplate")
            .and_then(|t| t.get("Runtime"))
            .and_then(Value::as_str)
            .map(str::to_string);

        if !has_task_template {
            return match runtime.as_deref() {
                Some("plugin") | Some("attachment") => Ok(()),
                _ => Err(PolicyError::bad_request(
                    "TaskTemplate is required unless Runtime is plugin or attachment",
                )),
            };
        }
        let task_template = body.get_mut("TaskTemplate").expect("checked above");

        self.validate_networks(&*task_template).await?;
        self.validate_secret_and_config_refs(&*task_template).await?;
        self.validate_mounts(task_template).await?;
        Ok(())
    }

    async fn validate_networks(&self, task_template: &Value) -> PolicyResult<()> {
        let Some(networks) = task_template.get("Networks").and_then(Value::as_array) else {
            return Ok(());
        };
        for network in networks {
            let Some(target) = network.get("Target").and_then(Value::as_str) else {
                continue;
            };
            if !self.oracle.is_network_reference_allowed(target).await {
                return Err(PolicyError::forbidden(format!(
                    "Network {target} is not owned"
                )));
            }
        }
        Ok(())
    }

    async fn validate_secret_and_config_refs(&self, task_template: &Value) -> PolicyResult<()> {
        let container_spec = task_template.get("ContainerSpec");

        if let Some(secrets) = container_spec
            .and_then(|c| c.get("Secrets"))
            .and_then(Value::as_array)
        {
            for reference in secrets {
                let name = reference
                    .get("SecretName")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                if name.is_empty() {
                    continue;
                }
                if !self.oracle.is_owned(ResourceKind::Secret, name).await {
                    return Err(PolicyError::forbidden(format!("Secret {name} is not owned")));
                }
            }
        }

        if let Some(configs) = container_spec
            .and_then(|c| c.get("Configs"))
            .and_then(Value::as_array)
        {
            for reference in configs {
                let name = reference
                    .get("ConfigName")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                if name.is_empty() {
                    continue;
                }
                if !self.oracle.is_owned(ResourceKind::Config, name).await {
                    return Err(PolicyError::forbidden(format!("Config {name} is not owned")));
                }
            }
        }
        Ok(())
    }

    async fn validate_mounts(&self, task_template: &mut Value) -> PolicyResult<()> {
        let Some(mounts) = task_template
            .pointer_mut("/ContainerSpec/Mounts")
            .and_then(Value::as_array_mut)
        else {
            return Ok(());
        };

        for mount in mounts {
            let mount_type_raw = mount
                .get("Type")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let mount_type = mount_type_raw.to_ascii_lowercase();

            if !PolicyConfig::is_mount_type_known(&mount_type) {
                return Err(PolicyError::bad_request(format!(
                    "Mount type {mount_type_raw} is not supported"
                )));
            }
            if !self.config.is_mount_type_allowed(&mount_type) {
                return Err(PolicyError::bad_request(format!(
                    "Mount type {mount_type_raw} is not allowed"
                )));
            }

            if mount_type != "volume" && mount_type != "cluster" {
                continue;
            }
            let source = mount
                .get("Source")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            if source.is_empty() {
                continue;
            }
            match self.oracle.volume_ownership(&source).await {
                VolumeOwnership::Foreign => {
                    return Err(PolicyError::forbidden(format!("Volume {source} is not owned")));
                }
                VolumeOwnership::Absent => {
                    stamp_mount_volume_options(mount, &self.config.tenant_label_value);
                }
                VolumeOwnership::Owned => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dockgate_engine::EngineClient;
    use std::collections::HashSet;

    fn config() -> PolicyConfig {
        PolicyConfig {
            tenant_label_value: "acme".to_string(),
            name_prefix: "acme".to_string(),
            allowed_volume_drivers: ["local".to_string()].into_iter().collect(),
            allowed_mount_types: ["bind", "volume", "tmpfs", "npipe", "cluster"]
                .into_iter()
                .map(String::from)
                .collect(),
            allow_port_expose: false,
            service_allow_listed_networks: HashSet::new(),
            only_known_registries: false,
        }
    }

    fn validator() -> SpecValidator {
        let oracle = Arc::new(OwnershipOracle::new(
            Arc::new(EngineClient::new("/dev/null/unused.sock".into())),
            "acme".to_string(),
            "acme".to_string(),
            HashSet::new(),
        ));
        SpecValidator::new(oracle, config())
    }

    #[test]
    fn rejects_missing_name() {
        let v = validator();
        let body = serde_json::json!({});
        assert!(v.validate_create_name(&body).is_err());
    }

    #[test]
    fn rejects_name_without_prefix() {
        let v = validator();
        let body = serde_json::json!({ "Name": "foo" });
        let err = v.validate_create_name(&body).unwrap_err();
        assert_eq!(err.status(), Some(http::StatusCode::BAD_REQUEST));
    }

    #[test]
    fn accepts_prefixed_name() {
        let v = validator();
        let body = serde_json::json!({ "Name": "acme_foo" });
        assert!(v.validate_create_name(&body).is_ok());
    }

    #[tokio::test]
    async fn rejects_missing_task_template_without_plugin_runtime() {
        let v = validator();
        let mut body = serde_json::json!({ "Name": "acme_web" });
        let err = v.validate_and_stamp_service(&mut body).await.unwrap_err();
        assert_eq!(err.status(), Some(http::StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn accepts_missing_task_template_for_plugin_runtime() {
        let v = validator();
        let mut body = serde_json::json!({ "Name": "acme_plug", "Runtime": "plugin" });
        assert!(v.validate_and_stamp_service(&mut body).await.is_ok());
    }

    #[test]
    fn endpoint_spec_with_ports_rejected_when_disabled() {
        let v = validator();
        let body = serde_json::json!({
            "EndpointSpec": { "Ports": [{ "TargetPort": 80 }] }
        });
        let err = v.validate_endpoint_spec(&body).unwrap_err();
        assert_eq!(err.status(), Some(http::StatusCode::FORBIDDEN));
    }

    #[test]
    fn endpoint_spec_without_ports_is_accepted() {
        let v = validator();
        let body = serde_json::json!({});
        assert!(v.validate_endpoint_spec(&body).is_ok());
    }

    #[tokio::test]
    async fn rejects_unsupported_mount_type() {
        let v = validator();
        let mut body = serde_json::json!({
            "Name": "acme_web",
            "TaskTemplate": {
                "ContainerSpec": {
                    "Mounts": [{ "Type": "made-up", "Source": "x", "Target": "/x" }]
                }
            }
        });
        let err = v.validate_task_template(&mut body).await.unwrap_err();
        assert_eq!(err.status(), Some(http::StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn rejects_disallowed_but_known_mount_type() {
        let oracle = Arc::new(OwnershipOracle::new(
            Arc::new(EngineClient::new("/dev/null/unused.sock".into())),
            "acme".to_string(),
            "acme".to_string(),
            HashSet::new(),
        ));
        let mut cfg = config();
        cfg.allowed_mount_types = ["bind".to_string()].into_iter().collect();
        let v = SpecValidator::new(oracle, cfg);
        let mut body = serde_json::json!({
            "Name": "acme_web",
            "TaskTemplate": {
                "ContainerSpec": {
                    "Mounts": [{ "Type": "tmpfs", "Target": "/x" }]
                }
            }
        });
        let err = v.validate_task_template(&mut body).await.unwrap_err();
        assert_eq!(err.status(), Some(http::StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn stamps_volume_options_labels_for_not_yet_existing_volume() {
        let v = validator();
        let mut body = serde_json::json!({
            "Name": "acme_web",
            "TaskTemplate": {
                "ContainerSpec": {
                    "Mounts": [{ "Type": "volume", "Source": "acme_data", "Target": "/data" }]
                }
            }
        });
        v.validate_and_stamp_service(&mut body).await.unwrap();
        let labels = &body["TaskTemplate"]["ContainerSpec"]["Mounts"][0]["VolumeOptions"]["Labels"];
        assert_eq!(labels[dockgate_core::TENANT_LABEL_KEY], "acme");
    }
}
