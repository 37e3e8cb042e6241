use std::path::PathBuf;

/// Failure of a single decoration pass. Contained to one decorator and one
/// frame by `DecoratorRegistry::decorate_all`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecorateError {
    /// An empty cluster reached representative selection and there is no
    /// viewport to place a placeholder with.
    NoViewport,
}

impl std::fmt::Display for DecorateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecorateError::NoViewport => {
                write!(f, "empty cluster has no viewport to place a placeholder marker")
            }
        }
    }
}

impl std::error::Error for DecorateError {}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config {}: {source}", path.display())
            }
            ConfigError::Parse(e) => write!(f, "failed to parse config: {e}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}
