//! Advisory check that pinned hashes still match their version tags
//!
//! Tags move. A compiled workflow pinned to `actions/checkout@<sha> # v5`
//! keeps running the old commit after `v5` is re-tagged. The check scans the
//! compiled text, re-resolves every version comment and reports mismatches.
//! It never fails compilation.

use crate::reference::root_repository;
use crate::resolver::ActionResolver;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, warn};

static PINNED_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"([A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+(?:/[A-Za-z0-9_./-]+)?)@([0-9a-f]{40})\b(?:[ \t]*#[ \t]*([^\s'"]+))?"#,
    )
    .expect("pinned reference pattern is valid")
});

/// A pinned reference found in compiled output
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PinnedMention {
    pub repository: String,
    pub sha: String,
    /// From the trailing `# <version>` comment, when present
    pub version: Option<String>,
}

/// A pin whose version now resolves to a different commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleAction {
    pub action: String,
    pub version: String,
    pub pinned: String,
    pub current: String,
}

impl StaleAction {
    pub fn remediation(&self) -> String {
        format!(
            "recompile to pin {}@{} to {}",
            self.action, self.version, self.current
        )
    }
}

impl fmt::Display for StaleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} is pinned to {} but {} now resolves to {}; {}",
            self.action,
            self.version,
            self.pinned,
            self.version,
            self.current,
            self.remediation()
        )
    }
}

/// Every distinct `repo@<40-hex>` occurrence in `content`, in sorted order
pub fn find_pinned_references(content: &str) -> Vec<PinnedMention> {
    let mentions: BTreeSet<PinnedMention> = PINNED_REF
        .captures_iter(content)
        .map(|caps| PinnedMention {
            repository: caps[1].to_string(),
            sha: caps[2].to_string(),
            version: caps.get(3).map(|m| m.as_str().to_string()),
        })
        .collect();
    mentions.into_iter().collect()
}

/// Re-resolve every versioned pin in `content` and report the stale ones.
///
/// Lookups ignore entries loaded from disk but share the resolver's failed
/// and refreshed sets, so checking many files costs one lookup per key;
/// failures are logged and skipped. Fresh hashes are written into the
/// resolver's cache and the caller decides when to persist it.
pub async fn validate_pins(resolver: &mut ActionResolver, content: &str) -> Vec<StaleAction> {
    let mut checked = BTreeSet::new();
    let mut stale = Vec::new();

    for mention in find_pinned_references(content) {
        let Some(version) = mention.version else {
            debug!(repository = %mention.repository, "pin has no version comment, skipping");
            continue;
        };
        let root = root_repository(&mention.repository).to_string();
        if !checked.insert((root.clone(), mention.sha.clone(), version.clone())) {
            continue;
        }

        let current = match resolver.refresh_sha(&root, &version).await {
            Ok(current) => current,
            Err(e) => {
                debug!(repository = %root, %version, error = %e, "skipping staleness check");
                continue;
            }
        };

        if current != mention.sha {
            let finding = StaleAction {
                action: root,
                version,
                pinned: mention.sha,
                current,
            };
            warn!("stale action pin: {finding}");
            stale.push(finding);
        }
    }

    stale
}
