//! Trigger (`on:`) configuration and activation gates

use super::{deserialize_block, StringOrList};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

/// Parsed `on:` block.
///
/// Platform events are kept opaquely in `events`; the gate keys the compiler
/// acts on are pulled out into their own fields.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawTriggers")]
pub struct Triggers {
    pub events: IndexMap<String, serde_json::Value>,
    pub command: Option<CommandTrigger>,
    pub stop_after: Option<String>,
    pub skip_if_match: Option<SkipQuery>,
    pub skip_if_no_match: Option<SkipQuery>,
    pub skip_roles: Vec<String>,
    pub reaction: Option<String>,
}

impl Triggers {
    /// Names of the configured platform events, in declaration order
    pub fn event_names(&self) -> Vec<&str> {
        self.events.keys().map(String::as_str).collect()
    }

    pub fn has_event(&self, event: &str) -> bool {
        self.events.contains_key(event)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTriggers {
    Event(String),
    Events(Vec<String>),
    Map(Box<TriggerMap>),
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct TriggerMap {
    #[serde(default, deserialize_with = "deserialize_block")]
    command: Option<CommandTrigger>,
    #[serde(default)]
    stop_after: Option<String>,
    #[serde(default)]
    skip_if_match: Option<SkipQuery>,
    #[serde(default)]
    skip_if_no_match: Option<SkipQuery>,
    #[serde(default)]
    skip_roles: Option<StringOrList>,
    #[serde(default, deserialize_with = "deserialize_reaction")]
    reaction: Option<String>,
    #[serde(flatten)]
    events: IndexMap<String, serde_json::Value>,
}

impl From<RawTriggers> for Triggers {
    fn from(raw: RawTriggers) -> Self {
        match raw {
            RawTriggers::Event(name) => Triggers {
                events: IndexMap::from([(name, serde_json::Value::Null)]),
                ..Default::default()
            },
            RawTriggers::Events(names) => Triggers {
                events: names
                    .into_iter()
                    .map(|name| (name, serde_json::Value::Null))
                    .collect(),
                ..Default::default()
            },
            RawTriggers::Map(map) => {
                let map = *map;
                Triggers {
                    events: map.events,
                    command: map.command,
                    stop_after: map.stop_after,
                    skip_if_match: map.skip_if_match,
                    skip_if_no_match: map.skip_if_no_match,
                    skip_roles: map.skip_roles.map(|r| r.to_vec()).unwrap_or_default(),
                    reaction: map.reaction,
                }
            }
        }
    }
}

/// YAML reads `reaction: +1` as an integer
fn deserialize_reaction<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(1) => Some("+1".to_string()),
            Some(-1) => Some("-1".to_string()),
            _ => Some(n.to_string()),
        },
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }))
}

/// Slash-command style trigger (`/name` in an issue or comment body)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandTrigger {
    /// Command name; defaults to the workflow name when unset
    pub name: Option<String>,
    /// Events the command listens on; empty means all comment-capable events
    pub events: Vec<String>,
}

impl<'de> Deserialize<'de> for CommandTrigger {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Name(String),
            Full {
                #[serde(default)]
                name: Option<String>,
                #[serde(default)]
                events: Option<StringOrList>,
            },
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Name(name) => CommandTrigger {
                name: Some(name),
                events: Vec::new(),
            },
            Raw::Full { name, events } => CommandTrigger {
                name,
                events: events.map(|e| e.to_vec()).unwrap_or_default(),
            },
        })
    }
}

/// Search query gate for `skip-if-match` / `skip-if-no-match`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipQuery {
    pub query: String,
    /// Skip when at least this many results match (`skip-if-match`)
    pub max: Option<u32>,
    /// Skip when fewer than this many results match (`skip-if-no-match`)
    pub min: Option<u32>,
}

impl<'de> Deserialize<'de> for SkipQuery {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Query(String),
            Full {
                query: String,
                #[serde(default)]
                max: Option<u32>,
                #[serde(default)]
                min: Option<u32>,
            },
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Query(query) => SkipQuery {
                query,
                ..Default::default()
            },
            Raw::Full { query, max, min } => SkipQuery { query, max, min },
        })
    }
}

/// Roles permitted to trigger the workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Roles {
    All,
    Only(Vec<String>),
}

impl Roles {
    pub fn is_all(&self) -> bool {
        matches!(self, Roles::All)
    }
}

impl<'de> Deserialize<'de> for Roles {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let roles = StringOrList::deserialize(deserializer)?.to_vec();
        if roles.iter().any(|role| role == "all") {
            Ok(Roles::All)
        } else {
            Ok(Roles::Only(roles))
        }
    }
}

/// Per-actor rate limit on workflow activation
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RateLimit {
    /// Maximum runs per actor within the window
    #[serde(default)]
    pub max: Option<u32>,
    /// Window length in minutes
    #[serde(default)]
    pub window: Option<u32>,
    /// Events the limit applies to; empty means all
    #[serde(default)]
    pub events: Vec<String>,
}
