//! Error types for the import pipeline
//!
//! Every stage returns [`ImportError`]; the command layer wraps it with
//! `anyhow` context before it reaches the user.

use std::fmt;
use std::path::PathBuf;

/// Result alias used by the pipeline stages
pub type Result<T, E = ImportError> = std::result::Result<T, E>;

/// Errors raised while staging or dispatching an artifact
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// Artifact, params file or other required input is missing
    #[error("{what} not found: {path}")]
    NotFound { what: &'static str, path: PathBuf },

    /// Neither `<base>.yaml` nor `<base>.json` exists
    #[error("{} was not found as a YAML or JSON", .0.display())]
    DefinitionNotFound(PathBuf),

    /// Zip archive is malformed or extracted to nothing
    #[error("invalid archive {path}: {reason}")]
    InvalidArchive { path: PathBuf, reason: String },

    /// Definition file failed to parse or has ill-typed known fields
    #[error("malformed definition {path}: {message}")]
    MalformedDefinition { path: PathBuf, message: String },

    /// Params file failed to parse
    #[error("invalid parameters file {path}: {message}")]
    InvalidParams { path: PathBuf, message: String },

    /// Endpoint security enabled without all required fields
    #[error("endpoint security is enabled but the {missing} is not set in the parameters file")]
    IncompleteSecurityConfig { missing: &'static str },

    /// Endpoint security type other than `basic` or `digest`
    #[error("invalid endpoint security type '{0}' in the parameters file, expected basic or digest")]
    InvalidSecurityType(String),

    /// A generated document could not be serialized
    #[error("could not encode {path}: {message}")]
    Encode { path: PathBuf, message: String },

    /// Certificate could not be PEM-decoded
    #[error("invalid certificate {path}: {message}")]
    InvalidCertificate { path: PathBuf, message: String },

    /// `${VAR}` placeholder references an unset variable
    #[error("environment variable '{variable}' referenced in {path} is not set")]
    UnsetVariable { variable: String, path: PathBuf },

    /// A structural rule rejected the definition
    #[error("validation failed: {0}")]
    ValidationFailed(ValidationRule),

    /// Remote service answered with a failure status
    #[error("remote call failed with status {status}: {body}")]
    RemoteFailure { status: u16, body: String },

    /// Transport could not complete the request (includes timeouts)
    #[error("transport error: {0}")]
    Transport(String),

    /// Token provider could not produce a token
    #[error("authentication error: {0}")]
    Auth(String),

    /// Filesystem error during copy, extract or write
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ImportError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        Self::MalformedDefinition {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn invalid_archive(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self::InvalidArchive {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Structural rules enforced on API and API Product definitions, in check order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationRule {
    NameRequired,
    NameIllegalCharacters,
    VersionRequired,
    ContextRequired,
    ContextTemplateRequired,
    ContextLeadingSlash,
    ContextTemplateLeadingSlash,
}

impl fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ValidationRule::NameRequired => "name is required",
            ValidationRule::NameIllegalCharacters => {
                r#"name contains one or more illegal characters (~!@#;:%^*()+={}|\<>"',&/$)"#
            }
            ValidationRule::VersionRequired => "version is required",
            ValidationRule::ContextRequired => "context is required",
            ValidationRule::ContextTemplateRequired => "contextTemplate is required",
            ValidationRule::ContextLeadingSlash => "context should begin with a /",
            ValidationRule::ContextTemplateLeadingSlash => "contextTemplate should begin with a /",
        };
        f.write_str(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_failures_are_not_reported_as_io() {
        let err = ImportError::Encode {
            path: PathBuf::from("Meta-information/endpoint_certificates.yaml"),
            message: "unsupported value".into(),
        };
        assert_eq!(
            err.to_string(),
            "could not encode Meta-information/endpoint_certificates.yaml: unsupported value"
        );
        assert!(std::error::Error::source(&err).is_none());
    }
}
