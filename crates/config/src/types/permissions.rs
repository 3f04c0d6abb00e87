//! Token permission blocks

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Permission block for a job, carried opaquely to the emission layer.
///
/// Either a shorthand (`read-all`, `write-all`, `{}`-equivalent `none`) or a
/// map of scope to access level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Permissions {
    Shorthand(String),
    Scopes(IndexMap<String, String>),
}

impl Default for Permissions {
    fn default() -> Self {
        Permissions::Scopes(IndexMap::new())
    }
}

impl Permissions {
    /// Build a scope map from `(scope, level)` pairs
    pub fn scopes(pairs: &[(&str, &str)]) -> Self {
        Permissions::Scopes(
            pairs
                .iter()
                .map(|(scope, level)| (scope.to_string(), level.to_string()))
                .collect(),
        )
    }

    /// Access level granted for `scope`, if the block is a scope map
    pub fn level(&self, scope: &str) -> Option<&str> {
        match self {
            Permissions::Scopes(scopes) => scopes.get(scope).map(String::as_str),
            Permissions::Shorthand(_) => None,
        }
    }

    /// Grant `level` on `scope`, never downgrading an existing `write`
    pub fn grant(&mut self, scope: &str, level: &str) {
        if let Permissions::Shorthand(_) = self {
            *self = Permissions::default();
        }
        if let Permissions::Scopes(scopes) = self {
            match scopes.get(scope).map(String::as_str) {
                Some("write") => {}
                _ => {
                    scopes.insert(scope.to_string(), level.to_string());
                }
            }
        }
    }

    /// Union of two scope maps (write wins over read)
    pub fn merge(&mut self, other: &Permissions) {
        if let Permissions::Scopes(scopes) = other {
            for (scope, level) in scopes {
                self.grant(scope, level);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Permissions::Scopes(scopes) => scopes.is_empty(),
            Permissions::Shorthand(value) => value.is_empty(),
        }
    }
}
