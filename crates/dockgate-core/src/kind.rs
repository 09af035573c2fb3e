//! The resource kinds this proxy understands.

use serde::{Deserialize, Serialize};

/// Every engine resource kind this proxy fronts.
///
/// This is a closed set ("Resource kinds handled: service,
/// task, network, secret, config, volume"), so a plain enum rather than a
/// trait object is the right tool — every call site that needs kind-specific
/// behavior (the oracle's label lookup, the stamper's dispatch, the
/// not-owned-inspect status) matches on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Service,
    Task,
    Network,
    Secret,
    Config,
    Volume,
}

impl ResourceKind {
    /// The engine's URL path segment for this kind, e.g. `services`.
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::Service => "services",
            Self::Task => "tasks",
            Self::Network => "networks",
            Self::Secret => "secrets",
            Self::Config => "configs",
            Self::Volume => "volumes",
        }
    }

    /// Human-readable singular name, used in rejection messages so they
    /// name the offending entity.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Service => "Service",
            Self::Task => "Task",
            Self::Network => "Network",
            Self::Secret => "Secret",
            Self::Config => "Config",
            Self::Volume => "Volume",
        }
    }

    /// Whether the engine persists this kind's user-chosen labels and name
    /// directly on the inspect payload (`Name`/`Labels` at the top level) or
    /// nested under `Spec` (`Spec.Name`/`Spec.Labels`).
    ///
    /// Services, secrets, and configs are spec-wrapped; networks and
    /// volumes are flat. Tasks have neither — ownership is derived from the
    /// parent service, never checked directly.
    pub const fn labels_are_spec_nested(self) -> bool {
        matches!(self, Self::Service | Self::Secret | Self::Config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_segments_are_plural_lowercase() {
        assert_eq!(ResourceKind::Service.path_segment(), "services");
        assert_eq!(ResourceKind::Volume.path_segment(), "volumes");
    }

    #[test]
    fn nesting_matches_engine_api_shape() {
        assert!(ResourceKind::Service.labels_are_spec_nested());
        assert!(ResourceKind::Secret.labels_are_spec_nested());
        assert!(!ResourceKind::Network.labels_are_spec_nested());
        assert!(!ResourceKind::Volume.labels_are_spec_nested());
    }
}
