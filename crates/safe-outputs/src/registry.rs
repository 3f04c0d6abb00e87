//! Ordered kind registry and the merged dispatch configuration

use crate::builders::default_registry;
use crate::kind::SafeOutputKind;
use awc_config::{Permissions, SafeOutputsConfig};
use awc_core::{Result, SAFE_OUTPUTS_CONFIG_ENV};
use awc_utils::check_value_size;
use serde_json::{Map, Value};
use tracing::debug;

/// Builds one kind's options object, or `None` when the kind is unconfigured
pub type KindBuilder = fn(&SafeOutputsConfig) -> Option<Map<String, Value>>;

/// Collapses every configured kind into one dispatch configuration.
///
/// The registry is constructed once per builder and walked in order, so the
/// resulting object's key order is fixed.
pub struct DispatchConfigBuilder {
    registry: Vec<(SafeOutputKind, KindBuilder)>,
}

impl Default for DispatchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchConfigBuilder {
    pub fn new() -> Self {
        Self {
            registry: default_registry(),
        }
    }

    /// A builder over a custom registry
    pub fn with_registry(registry: Vec<(SafeOutputKind, KindBuilder)>) -> Self {
        Self { registry }
    }

    /// Registered kinds in dispatch order
    pub fn kinds(&self) -> impl Iterator<Item = SafeOutputKind> + '_ {
        self.registry.iter().map(|(kind, _)| *kind)
    }

    /// Build and serialize the dispatch configuration.
    ///
    /// Fails only when the serialized object exceeds the platform ceiling for
    /// a single environment value.
    pub fn build(&self, config: &SafeOutputsConfig) -> Result<DispatchConfig> {
        let mut kinds = Vec::new();
        let mut options = Map::new();

        for (kind, builder) in &self.registry {
            if let Some(kind_options) = builder(config) {
                kinds.push(*kind);
                options.insert(kind.key().to_string(), Value::Object(kind_options));
            }
        }

        let json = serde_json::to_string(&options)?;
        check_value_size(SAFE_OUTPUTS_CONFIG_ENV, &json)?;
        debug!(kinds = kinds.len(), bytes = json.len(), "built safe-output dispatch config");

        Ok(DispatchConfig {
            kinds,
            options,
            json,
        })
    }
}

/// The merged per-kind options, serialized exactly once
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchConfig {
    kinds: Vec<SafeOutputKind>,
    options: Map<String, Value>,
    json: String,
}

impl DispatchConfig {
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Enabled kinds in dispatch order
    pub fn kinds(&self) -> &[SafeOutputKind] {
        &self.kinds
    }

    pub fn is_enabled(&self, kind: SafeOutputKind) -> bool {
        self.kinds.contains(&kind)
    }

    pub fn get(&self, kind: SafeOutputKind) -> Option<&Map<String, Value>> {
        self.options.get(kind.key()).and_then(Value::as_object)
    }

    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    /// The serialized form embedded in the dispatcher environment
    pub fn as_json(&self) -> &str {
        &self.json
    }

    /// Union of the token scopes every enabled kind needs
    pub fn permissions(&self) -> Permissions {
        let mut permissions = Permissions::default();
        for kind in &self.kinds {
            for (scope, level) in kind.permissions() {
                permissions.grant(scope, level);
            }
        }
        permissions
    }
}
