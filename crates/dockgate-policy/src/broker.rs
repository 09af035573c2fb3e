//! Registry-auth brokering: resolve an image's registry, look up stored
//! credentials, run the permission probe, and decide what (if anything)
//! goes into the outbound `X-Registry-Auth` header. Client-supplied
//! registry headers are handled by `dockgate-proxy::security`, not here —
//! this is purely the decision of what the proxy injects.

use std::sync::Arc;

use dockgate_engine::{registry_auth, EngineClient, RegistryAuthStore};
use tracing::debug;

use crate::error::{PolicyError, PolicyResult};

pub struct RegistryBroker {
    engine: Arc<EngineClient>,
    auth_store: Arc<RegistryAuthStore>,
    only_known_registries: bool,
}

/// Outcome of brokering: either no header is needed (anonymous pull from a
/// registry with no stored credentials, probe still succeeded), or the
/// base64url JSON header value to inject.
pub struct BrokeredAuth {
    pub header_value: Option<String>,
}

impl RegistryBroker {
    pub fn new(
        engine: Arc<EngineClient>,
        auth_store: Arc<RegistryAuthStore>,
        only_known_registries: bool,
    ) -> Self {
        Self {
            engine,
            auth_store,
            only_known_registries,
        }
    }

    /// Resolve credentials for `image`, probe the engine's distribution
    /// endpoint, and return the header to inject on success.
    pub async fn broker(&self, image: &str) -> PolicyResult<BrokeredAuth> {
        let registry = registry_auth::resolve_registry(image);
        let credential = self.auth_store.get(&registry);

        if self.only_known_registries && credential.is_none() {
            return Err(PolicyError::forbidden(format!(
                "Registry {registry} is not known"
            )));
        }

        let header_value = match credential {
            Some(cred) if !cred.is_anonymous() => Some(cred.encode_header_value()?),
            _ => None,
        };

        debug!(image, registry, has_credential = header_value.is_some(), "probing distribution endpoint");

        let status = self
            .engine
            .check_distribution(image, header_value.as_deref())
            .await?;

        if !status.is_success() {
            return Err(PolicyError::forbidden(format!(
                "Permission probe for image {image} failed: engine returned {status}"
            )));
        }

        Ok(BrokeredAuth { header_value })
    }
}
