//! Label stamping: every create/update body gets the tenant label written
//! into *every* position the engine can read labels from for that resource
//! kind, overwriting whatever the client supplied.

use dockgate_core::{labels, ResourceKind};
use serde_json::{Map, Value};

/// Stamp `body` in place for a create/update of `kind`, owned by
/// `tenant_label_value`.
///
/// Create/update bodies *are* the engine's `*Spec` object directly (the
/// `Spec` nesting `dockgate_core::ResourceKind::labels_are_spec_nested`
/// describes only applies to *inspect* responses, which wrap the spec one
/// level down) — so every stamp position here is relative to the body
/// root, never behind an extra `Spec` hop.
pub fn stamp_body(kind: ResourceKind, body: &mut Value, tenant_label_value: &str) {
    match kind {
        ResourceKind::Service => {
            stamp_object_labels(top_level_object_mut(body, "Labels"), tenant_label_value);
            stamp_object_labels(
                pointer_object_mut(body, "/TaskTemplate/ContainerSpec/Labels"),
                tenant_label_value,
            );
        }
        ResourceKind::Secret | ResourceKind::Config => {
            stamp_object_labels(top_level_object_mut(body, "Labels"), tenant_label_value);
        }
        ResourceKind::Network => {
            stamp_object_labels(top_level_object_mut(body, "Labels"), tenant_label_value);
        }
        ResourceKind::Volume => {
            stamp_object_labels(top_level_object_mut(body, "Labels"), tenant_label_value);
            // DriverOpts aren't labels and are left untouched; only the
            // volume-options label position gets stamped.
        }
        ResourceKind::Task => {
            // Tasks are never created directly by a client; no
            // stamping position applies.
        }
    }
}

/// Stamp the tenant label into a single mount's `VolumeOptions.Labels`
/// position. Used for a `volume`/`cluster` mount whose source volume
/// doesn't exist on the engine yet, so the volume the engine materializes
/// from this mount already carries ownership.
pub fn stamp_mount_volume_options(mount: &mut Value, tenant_label_value: &str) {
    stamp_object_labels(
        pointer_object_mut(mount, "/VolumeOptions/Labels"),
        tenant_label_value,
    );
}

fn stamp_object_labels(labels_slot: &mut Value, tenant_label_value: &str) {
    let map = labels_slot.as_object_mut().expect("ensured object above");
    let mut parsed: labels::Labels = map
        .iter()
        .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
        .collect();
    labels::stamp(&mut parsed, tenant_label_value);
    *map = parsed
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();
}

/// Navigate/create a nested object at a `/`-separated pointer path,
/// returning a mutable reference to the object living there.
fn pointer_object_mut<'a>(body: &'a mut Value, pointer: &str) -> &'a mut Value {
    let segments: Vec<&str> = pointer.trim_start_matches('/').split('/').collect();
    let mut current = body;
    for segment in segments {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        current = current
            .as_object_mut()
            .expect("just ensured object")
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    if !current.is_object() {
        *current = Value::Object(Map::new());
    }
    current
}

fn top_level_object_mut<'a>(body: &'a mut Value, key: &str) -> &'a mut Value {
    if !body.is_object() {
        *body = Value::Object(Map::new());
    }
    body.as_object_mut()
        .expect("just ensured object")
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()))
}
