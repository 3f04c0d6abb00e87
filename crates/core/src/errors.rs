use std::path::PathBuf;

/// Result type alias for awc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of a failure, used by the driver to decide whether a
/// finding is fatal and how to report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Specification-authoring errors (duplicate jobs, dangling dependencies, ...)
    Configuration,
    /// An action reference could not be pinned to a content hash
    Resolution,
    /// An emitted value exceeds the platform ceiling
    SizeLimit,
    /// File system, serialization and transport failures
    Io,
}

/// Core error type for awc operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Generic configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// A job identifier was added to a graph twice
    #[error("configuration error: duplicate job identifier '{job}'")]
    DuplicateJob { job: String },

    /// A job depends on an identifier that is not part of the graph
    #[error("configuration error: job '{job}' depends on unknown job '{dependency}'")]
    UnknownDependency { job: String, dependency: String },

    /// Action reference resolution errors
    #[error("failed to resolve action '{repository}@{version}': {message}")]
    Resolution {
        repository: String,
        version: String,
        message: String,
    },

    /// An emitted value is larger than the platform allows
    #[error("value '{name}' is {size} bytes, which exceeds the {limit} byte limit")]
    SizeLimit {
        name: String,
        size: usize,
        limit: usize,
    },

    /// File system operations
    #[error("file system {operation} operation failed for '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// YAML serialization/deserialization errors
    #[error("YAML error: {message}")]
    Yaml {
        message: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// Network-related errors
    #[error("network error for '{endpoint}': {message}")]
    Network { endpoint: String, message: String },

    /// Operation timeout errors
    #[error("operation '{operation}' timed out after {duration:?}")]
    Timeout {
        operation: String,
        duration: std::time::Duration,
    },

    /// An error annotated with the operation that produced it
    #[error("{message}: {source}")]
    Context {
        message: String,
        #[source]
        source: Box<Error>,
    },
}

// Conversion implementations
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::FileSystem {
            path: PathBuf::new(),
            operation: "unknown".to_string(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Json {
            message: error.to_string(),
            source: error,
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(error: serde_yaml::Error) -> Self {
        Error::Yaml {
            message: error.to_string(),
            source: error,
        }
    }
}

// Helper methods for creating errors with context
impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a duplicate job identifier error
    #[must_use]
    pub fn duplicate_job(job: impl Into<String>) -> Self {
        Error::DuplicateJob { job: job.into() }
    }

    /// Create an unknown dependency error naming both ends of the edge
    #[must_use]
    pub fn unknown_dependency(job: impl Into<String>, dependency: impl Into<String>) -> Self {
        Error::UnknownDependency {
            job: job.into(),
            dependency: dependency.into(),
        }
    }

    /// Create an action resolution error
    #[must_use]
    pub fn resolution(
        repository: impl Into<String>,
        version: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Resolution {
            repository: repository.into(),
            version: version.into(),
            message: message.into(),
        }
    }

    /// Create a size limit error
    #[must_use]
    pub fn size_limit(name: impl Into<String>, size: usize, limit: usize) -> Self {
        Error::SizeLimit {
            name: name.into(),
            size,
            limit,
        }
    }

    /// Create a file system error with context
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Create a network error
    #[must_use]
    pub fn network(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Network {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a timeout error
    #[must_use]
    pub fn timeout(operation: impl Into<String>, duration: std::time::Duration) -> Self {
        Error::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Classify this error. Context wrappers report the kind of the error
    /// they wrap.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Configuration { .. }
            | Error::DuplicateJob { .. }
            | Error::UnknownDependency { .. } => ErrorKind::Configuration,
            Error::Resolution { .. } => ErrorKind::Resolution,
            Error::SizeLimit { .. } => ErrorKind::SizeLimit,
            Error::FileSystem { .. }
            | Error::Json { .. }
            | Error::Yaml { .. }
            | Error::Network { .. }
            | Error::Timeout { .. } => ErrorKind::Io,
            Error::Context { source, .. } => source.kind(),
        }
    }

    /// The innermost error, with all context wrappers removed
    pub fn root(&self) -> &Error {
        match self {
            Error::Context { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to a Result
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a lazy message
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Context {
            message: message.into(),
            source: Box::new(e.into()),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| Error::Context {
            message: f(),
            source: Box::new(e.into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_dependency_names_both_jobs() {
        let err = Error::unknown_dependency("deploy", "build");
        let msg = err.to_string();
        assert!(msg.contains("deploy"));
        assert!(msg.contains("build"));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_size_limit_names_value() {
        let err = Error::size_limit("GH_AW_SAFE_OUTPUTS_HANDLER_CONFIG", 21505, 21504);
        assert!(err.to_string().contains("GH_AW_SAFE_OUTPUTS_HANDLER_CONFIG"));
        assert_eq!(err.kind(), ErrorKind::SizeLimit);
    }

    #[test]
    fn test_context_preserves_kind() {
        let result: Result<()> = Err(Error::resolution("actions/checkout", "v5", "not found"));
        let err = result.context("pinning agent checkout").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resolution);
        assert!(err.to_string().starts_with("pinning agent checkout: "));
        assert!(matches!(err.root(), Error::Resolution { .. }));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
