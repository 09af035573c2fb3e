//! Registry-auth store.
//!
//! Loaded once at startup from a JSON file mapping registry host to
//! credentials; read-only for the lifetime of the process. Follows the
//! "read file, fall back to a sane default on absence" shape used for
//! other startup-loaded configuration in this workspace.

use std::collections::HashMap;
use std::path::Path;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use dockgate_core::Error;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

/// One registry's stored credentials, in the engine's `AuthConfig` wire
/// shape (what gets base64-encoded into `X-Registry-Auth`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryCredential {
    #[serde(default)]
    pub anonymous: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serveraddress: Option<String>,
}

impl RegistryCredential {
    /// Encode this credential as the base64url JSON payload the engine
    /// expects in `X-Registry-Auth`. Anonymous
    /// credentials (no username set) are never encoded — callers should
    /// check `is_anonymous` first and omit the header entirely.
    pub fn encode_header_value(&self) -> Result<String, Error> {
        let auth_config = Value::Object(
            [
                self.username
                    .as_ref()
                    .map(|u| ("username".to_string(), Value::String(u.clone()))),
                self.password
                    .as_ref()
                    .map(|p| ("password".to_string(), Value::String(p.clone()))),
                self.email
                    .as_ref()
                    .map(|e| ("email".to_string(), Value::String(e.clone()))),
                self.serveraddress
                    .as_ref()
                    .map(|s| ("serveraddress".to_string(), Value::String(s.clone()))),
            ]
            .into_iter()
            .flatten()
            .collect(),
        );
        let json = serde_json::to_vec(&auth_config)?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous || self.username.is_none()
    }
}

/// Read-only map of registry host -> stored credentials.
#[derive(Debug, Default, Clone)]
pub struct RegistryAuthStore {
    credentials: HashMap<String, RegistryCredential>,
}

impl RegistryAuthStore {
    /// Load the store from `path`. A missing file is non-fatal and yields
    /// an empty store; a malformed file is logged and also yields an empty
    /// store.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "registry-auth file not present, using empty store");
                return Self::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read registry-auth file, using empty store");
                return Self::default();
            }
        };

        match serde_json::from_str::<HashMap<String, RegistryCredential>>(&content) {
            Ok(credentials) => {
                info!(count = credentials.len(), "loaded registry-auth overrides");
                Self { credentials }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "malformed registry-auth file, using empty store");
                Self::default()
            }
        }
    }

    /// Look up stored credentials for a registry host.
    pub fn get(&self, registry_host: &str) -> Option<&RegistryCredential> {
        self.credentials.get(registry_host)
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

/// Resolve the registry host an image reference pulls from:
/// the segment before the first `/`, when that segment looks like a host
/// (contains a `.` or `:`, or is literally `localhost`); otherwise the
/// reference is unqualified and defaults to the public hub.
pub const DEFAULT_REGISTRY: &str = "registry-1.docker.io";

pub fn resolve_registry(image_reference: &str) -> String {
    match image_reference.split_once('/') {
        Some((first_segment, _rest))
            if first_segment.contains('.')
                || first_segment.contains(':')
                || first_segment == "localhost" =>
        {
            first_segment.to_string()
        }
        _ => DEFAULT_REGISTRY.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_registry_detects_qualified_host() {
        assert_eq!(
            resolve_registry("registry.example.com/app:1"),
            "registry.example.com"
        );
        assert_eq!(resolve_registry("localhost:5000/app"), "localhost:5000");
    }

    #[test]
    fn resolve_registry_defaults_to_public_hub() {
        assert_eq!(resolve_registry("nginx"), DEFAULT_REGISTRY);
        assert_eq!(resolve_registry("library/nginx"), DEFAULT_REGISTRY);
    }

    #[test]
    fn missing_file_yields_empty_store() {
        let store = RegistryAuthStore::load(Path::new("/nonexistent/path/to/auth.json"));
        assert!(store.is_empty());
    }

    #[test]
    fn malformed_file_yields_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");
        std::fs::write(&path, "not json").unwrap();
        let store = RegistryAuthStore::load(&path);
        assert!(store.is_empty());
    }

    #[test]
    fn loads_credentials_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");
        std::fs::write(
            &path,
            r#"{"registry.example.com":{"username":"u","password":"p"}}"#,
        )
        .unwrap();
        let store = RegistryAuthStore::load(&path);
        let cred = store.get("registry.example.com").unwrap();
        assert_eq!(cred.username.as_deref(), Some("u"));
        assert!(!cred.is_anonymous());
    }

    #[test]
    fn encode_header_value_is_base64url_json() {
        let cred = RegistryCredential {
            username: Some("u".to_string()),
            password: Some("p".to_string()),
            ..Default::default()
        };
        let encoded = cred.encode_header_value().unwrap();
        let decoded = URL_SAFE_NO_PAD.decode(encoded).unwrap();
        let value: Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(value["username"], "u");
        assert_eq!(value["password"], "p");
    }
}
