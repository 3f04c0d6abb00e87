//! Action reference parsing

use awc_core::{Error, Result};
use std::fmt;

/// A pinned action reference.
///
/// The `uses:` value is [`ActionReference::pinned`]. Display adds the
/// version as a trailing ` # <version>` comment, the form written into
/// compiled workflows and read back by the staleness check.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionReference {
    /// Full path as written, including any subpath
    pub repository: String,
    pub version: String,
    pub sha: String,
}

impl ActionReference {
    pub fn new(
        repository: impl Into<String>,
        version: impl Into<String>,
        sha: impl Into<String>,
    ) -> Self {
        Self {
            repository: repository.into(),
            version: version.into(),
            sha: sha.into(),
        }
    }

    /// `owner/repo` with any subpath removed
    pub fn root(&self) -> &str {
        root_repository(&self.repository)
    }

    /// `owner/repo[/subpath]@<sha>`, the value placed in a step's `uses:`
    pub fn pinned(&self) -> String {
        format!("{}@{}", self.repository, self.sha)
    }
}

impl fmt::Display for ActionReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} # {}", self.repository, self.sha, self.version)
    }
}

/// A `uses:` value classified by how it must be pinned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsesRef<'a> {
    /// `./path` or `../path` inside the repository
    Local(&'a str),
    /// `docker://image`
    Docker(&'a str),
    /// `owner/repo[/subpath]@<40-hex>`, with the version from a trailing
    /// `# <version>` comment when one is written
    Pinned {
        repository: &'a str,
        sha: &'a str,
        version: Option<&'a str>,
    },
    /// `owner/repo[/subpath]@<tag or branch>`
    Remote { repository: &'a str, version: &'a str },
}

impl<'a> UsesRef<'a> {
    pub fn parse(uses: &'a str) -> Result<Self> {
        let uses = uses.trim();
        if uses.starts_with("./") || uses.starts_with("../") {
            return Ok(UsesRef::Local(uses));
        }
        if uses.starts_with("docker://") {
            return Ok(UsesRef::Docker(uses));
        }

        // An existing pin may carry a trailing comment
        let (uses, comment) = match uses.split_once('#') {
            Some((value, comment)) => (value.trim(), Some(comment.trim()).filter(|c| !c.is_empty())),
            None => (uses, None),
        };

        let (repository, version) = uses.rsplit_once('@').ok_or_else(|| {
            Error::configuration(format!(
                "action reference '{uses}' has no version; expected owner/repo@version"
            ))
        })?;
        let version = version.trim();

        if repository.split('/').filter(|s| !s.is_empty()).count() < 2 || version.is_empty() {
            return Err(Error::configuration(format!(
                "malformed action reference '{uses}'; expected owner/repo@version"
            )));
        }

        if is_commit_sha(version) {
            Ok(UsesRef::Pinned {
                repository,
                sha: version,
                version: comment,
            })
        } else {
            Ok(UsesRef::Remote {
                repository,
                version,
            })
        }
    }
}

/// `owner/repo` part of a repository path. Actions in subdirectories share
/// the root repository's tags and history.
pub fn root_repository(repository: &str) -> &str {
    match repository.match_indices('/').nth(1) {
        Some((index, _)) => &repository[..index],
        None => repository,
    }
}

/// Whether `value` is a full 40-character hexadecimal commit hash
pub fn is_commit_sha(value: &str) -> bool {
    value.len() == 40 && value.bytes().all(|b| b.is_ascii_hexdigit())
}
