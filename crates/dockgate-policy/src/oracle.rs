//! The ownership oracle.
//!
//! Stateless: every call round-trips to the engine and answers purely from
//! what it observes there. On any engine error or not-found, ownership is
//! `false` — never surfaced as a 403-vs-500 ambiguity.

use std::collections::HashSet;
use std::sync::Arc;

use dockgate_core::{ResourceKind, TENANT_LABEL_KEY};
use dockgate_engine::EngineClient;
use http::StatusCode;
use serde_json::Value;
use tracing::debug;

/// Read-only service answering "is this resource owned by *this* tenant?"
pub struct OwnershipOracle {
    engine: Arc<EngineClient>,
    tenant_label_value: String,
    name_prefix: String,
    allow_listed_networks: HashSet<String>,
}

impl OwnershipOracle {
    pub fn new(
        engine: Arc<EngineClient>,
        tenant_label_value: String,
        name_prefix: String,
        allow_listed_networks: HashSet<String>,
    ) -> Self {
        Self {
            engine,
            tenant_label_value,
            name_prefix,
            allow_listed_networks,
        }
    }

    /// `is_owned(kind, id) -> bool`
    pub async fn is_owned(&self, kind: ResourceKind, id: &str) -> bool {
        match self.engine.inspect(kind, id).await {
            Ok(Some(value)) => self.value_is_owned(kind, &value),
            Ok(None) => false,
            Err(e) => {
                debug!(error = %e, kind = kind.label(), id, "ownership inspect failed, treating as not owned");
                false
            }
        }
    }

    /// `is_task_of_owned_service(task_id) -> bool`: a task is visible iff
    /// its parent service is owned.
    pub async fn is_task_of_owned_service(&self, task_id: &str) -> bool {
        let task = match self.engine.inspect(ResourceKind::Task, task_id).await {
            Ok(Some(task)) => task,
            _ => return false,
        };
        let service_id = match task.get("ServiceID").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id,
            _ => return false,
        };
        self.is_owned(ResourceKind::Service, service_id).await
    }

    /// `is_owned_network(id, include_allow_listed) -> bool`. Allow-listing
    /// is only ever honored here for reads/references — callers performing
    /// a mutation (delete) must pass `include_allow_listed = false`.
    pub async fn is_owned_network(&self, id: &str, include_allow_listed: bool) -> bool {
        let network = match self.engine.inspect(ResourceKind::Network, id).await {
            Ok(Some(network)) => network,
            _ => return false,
        };
        if self.value_is_owned(ResourceKind::Network, &network) {
            return true;
        }
        if include_allow_listed {
            if let Some(name) = network.get("Name").and_then(Value::as_str) {
                return self.allow_listed_networks.contains(name);
            }
        }
        false
    }

    /// Same check as `is_owned_network`, but resolves allow-listing by
    /// *name* directly, for validating a `TaskTemplate.Networks[].Target`
    /// entry which may itself already be a name rather than an id.
    pub async fn is_network_reference_allowed(&self, target: &str) -> bool {
        if self.allow_listed_networks.contains(target) {
            return true;
        }
        self.is_owned_network(target, false).await
    }

    fn value_is_owned(&self, kind: ResourceKind, value: &Value) -> bool {
        let labels = extract_labels(kind, value);
        let label_matches = labels
            .get(TENANT_LABEL_KEY)
            .and_then(Value::as_str)
            .map(|v| v == self.tenant_label_value)
            .unwrap_or(false);
        if !label_matches {
            return false;
        }
        // Name-prefix check: load-bearing for volumes because some volume
        // drivers don't propagate labels reliably, and applied uniformly to
        // every kind that carries a user-chosen name.
        match extract_name(kind, value) {
            Some(name) => name.starts_with(&self.name_prefix),
            None => false,
        }
    }

    /// The status code to use when an *inspect* misses ownership:
    /// secrets/configs return 404 for orchestrator-client compatibility,
    /// everything else returns 403.
    pub fn not_owned_inspect_status(kind: ResourceKind) -> StatusCode {
        match kind {
            ResourceKind::Secret | ResourceKind::Config => StatusCode::NOT_FOUND,
            _ => StatusCode::FORBIDDEN,
        }
    }

    /// Three-way ownership check for a mount's source volume: a volume
    /// that doesn't exist yet is accepted (the engine will materialize it,
    /// carrying the stamp applied to `VolumeOptions.Labels` at validation
    /// time); one that exists and is owned is accepted; one that exists
    /// and belongs to someone else is rejected.
    pub(crate) async fn volume_ownership(&self, name: &str) -> VolumeOwnership {
        match self.engine.inspect(ResourceKind::Volume, name).await {
            Ok(Some(value)) => {
                if self.value_is_owned(ResourceKind::Volume, &value) {
                    VolumeOwnership::Owned
                } else {
                    VolumeOwnership::Foreign
                }
            }
            Ok(None) => VolumeOwnership::Absent,
            Err(_) => VolumeOwnership::Absent,
        }
    }
}

pub(crate) enum VolumeOwnership {
    Owned,
    Foreign,
    Absent,
}

fn extract_labels(kind: ResourceKind, value: &Value) -> Value {
    let labels = if kind.labels_are_spec_nested() {
        value.pointer("/Spec/Labels")
    } else {
        value.get("Labels")
    };
    labels.cloned().unwrap_or(Value::Null)
}

fn extract_name(kind: ResourceKind, value: &Value) -> Option<String> {
    let name = if kind.labels_are_spec_nested() {
        value.pointer("/Spec/Name")
    } else {
        value.get("Name")
    };
    name.and_then(Value::as_str).map(str::to_string)
}
