//! Configuration error types

use std::fmt;

use thiserror::Error;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported config format: {0}. Must be .toml or .json")]
    UnsupportedFormat(String),

    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    #[error("Unknown compiler: {0}")]
    UnknownCompiler(String),

    #[error("Network '{0}' accepts any chain id but a concrete network_id is required")]
    WildcardNetworkId(String),
}

impl ConfigError {
    /// True when the document could not be read into the expected shape,
    /// either at parse time or during validation.
    pub fn is_malformed(&self) -> bool {
        match self {
            ConfigError::Toml(_) | ConfigError::Json(_) => true,
            ConfigError::Validation(errors) => errors.has(IssueKind::MalformedConfig),
            _ => false,
        }
    }

    /// Validation issues carried by this error, empty for every other variant.
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            ConfigError::Validation(errors) => errors.issues(),
            _ => &[],
        }
    }
}

/// Category of a single validation problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    /// Missing section or field, or a value of the wrong type.
    MalformedConfig,
    /// Compiler version constraint is not a semver range.
    InvalidCompilerSpec,
    /// Port out of range, empty host or unusable network_id.
    InvalidNetworkProfile,
    /// Network declared more than once (strict mode).
    DuplicateNetwork,
    /// Compiler declared more than once (strict mode).
    DuplicateCompiler,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::MalformedConfig => "malformed config",
            IssueKind::InvalidCompilerSpec => "invalid compiler spec",
            IssueKind::InvalidNetworkProfile => "invalid network profile",
            IssueKind::DuplicateNetwork => "duplicate network",
            IssueKind::DuplicateCompiler => "duplicate compiler",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single problem found in the document, located by dotted field path
/// (e.g. `networks.development.port`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(kind: IssueKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}: {}", self.kind, self.message)
        } else {
            write!(f, "{} at {}: {}", self.kind, self.path, self.message)
        }
    }
}

/// Every issue found by one validation pass, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    issues: Vec<ValidationIssue>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: IssueKind, path: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue::new(kind, path, message));
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn has(&self, kind: IssueKind) -> bool {
        self.issues.iter().any(|issue| issue.kind == kind)
    }

    /// First issue reported at exactly `path`.
    pub fn at(&self, path: &str) -> Option<&ValidationIssue> {
        self.issues.iter().find(|issue| issue.path == path)
    }

    /// `Ok(())` when nothing was collected, otherwise the whole set as one error.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration validation failed with {} issue(s)", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "\n  - {}", issue)?;
        }
        Ok(())
    }
}

/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_errors_is_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_collected_issues_become_validation_error() {
        let mut errors = ValidationErrors::new();
        errors.push(IssueKind::MalformedConfig, "networks", "missing required section");

        match errors.into_result() {
            Err(ConfigError::Validation(collected)) => assert_eq!(collected.len(), 1),
            other => panic!("expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_display_lists_every_issue() {
        let mut errors = ValidationErrors::new();
        errors.push(IssueKind::InvalidNetworkProfile, "networks.dev.port", "out of range");
        errors.push(IssueKind::InvalidCompilerSpec, "compilers.solc.version", "bad range");

        let rendered = errors.to_string();
        assert!(rendered.contains("2 issue(s)"));
        assert!(rendered.contains("invalid network profile at networks.dev.port"));
        assert!(rendered.contains("invalid compiler spec at compilers.solc.version"));
    }

    #[test]
    fn test_lookup_by_path_and_kind() {
        let mut errors = ValidationErrors::new();
        errors.push(IssueKind::MalformedConfig, "networks", "missing section");

        assert!(errors.has(IssueKind::MalformedConfig));
        assert!(!errors.has(IssueKind::DuplicateNetwork));
        assert_eq!(errors.at("networks").map(|i| i.kind), Some(IssueKind::MalformedConfig));
        assert!(errors.at("compilers").is_none());
    }

    #[test]
    fn test_is_malformed() {
        let mut errors = ValidationErrors::new();
        errors.push(IssueKind::InvalidNetworkProfile, "networks.dev.host", "empty");
        assert!(!ConfigError::Validation(errors.clone()).is_malformed());

        errors.push(IssueKind::MalformedConfig, "networks.dev.port", "missing");
        let err = ConfigError::Validation(errors);
        assert!(err.is_malformed());
        assert_eq!(err.issues().len(), 2);

        assert!(!ConfigError::UnknownNetwork("x".to_string()).is_malformed());
        assert!(ConfigError::UnknownNetwork("x".to_string()).issues().is_empty());
    }
}
