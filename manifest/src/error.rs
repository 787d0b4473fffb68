//! Error types for manifest reading and decoding.
//!
//! Covers every way a manifest source can fail before a cron workflow is
//! produced: unreadable sources, malformed documents and, in strict mode,
//! unrecognized fields.

use thiserror::Error;

/// Errors that can occur while reading or decoding manifests.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// A file or stdin could not be read.
    #[error("failed to read '{source_name}': {error}")]
    Read {
        source_name: String,
        #[source]
        error: std::io::Error,
    },

    /// A manifest URL could not be fetched.
    #[error("failed to fetch '{url}': {message}")]
    Fetch { url: String, message: String },

    /// A document is not valid YAML.
    #[error("document {document}: YAML error: {error}")]
    Yaml {
        document: usize,
        #[source]
        error: serde_yaml::Error,
    },

    /// A document is valid YAML but not a valid cron workflow.
    #[error("document {document}: invalid cron workflow: {error}")]
    InvalidDocument {
        document: usize,
        #[source]
        error: serde_json::Error,
    },

    /// Strict mode found a field the cron workflow model does not recognize.
    #[error("document {document}: unknown field \"{field}\"")]
    UnknownField { document: usize, field: String },
}

/// Convenience alias for results with [`ManifestError`].
pub type Result<T> = std::result::Result<T, ManifestError>;
