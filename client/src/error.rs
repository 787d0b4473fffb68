//! Error types for configuration, remote calls and update runs.

use cronwf_core::SubmitError;
use cronwf_manifest::ManifestError;
use thiserror::Error;

/// Client configuration failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Config file YAML parsing failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// No server address was configured.
    #[error("no server configured: set --argo-server, ARGO_SERVER or `server` in the config file")]
    MissingServer,

    /// The server address cannot be turned into a URL.
    #[error("invalid server address: {0}")]
    InvalidServer(String),
}

/// Failures reported by a [`CronWorkflowService`](crate::CronWorkflowService).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The cron workflow does not exist on the server.
    #[error("not found: {0}")]
    NotFound(String),

    /// The server rejected the update as conflicting (e.g. stale resourceVersion).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Any other non-success status.
    #[error("server returned {code}: {message}")]
    Status { code: u16, message: String },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body was not a cron workflow.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The request cannot be sent as built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Fatal outcomes of an update run. The first one encountered ends the run.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// A manifest source could not be read.
    #[error(transparent)]
    Read(ManifestError),

    /// A manifest could not be decoded.
    #[error("failed to parse '{manifest}': {error}")]
    Parse {
        manifest: String,
        #[source]
        error: ManifestError,
    },

    /// Decoding produced no cron workflows at all.
    #[error("no CronWorkflows found in given files")]
    NoCronWorkflows,

    /// Submission options could not be applied to a cron workflow.
    #[error("cron workflow '{name}': {error}")]
    Validation {
        name: String,
        #[source]
        error: SubmitError,
    },

    /// The run was cancelled before this cron workflow was sent.
    #[error("cancelled before updating cron workflow '{name}'")]
    Cancelled { name: String },

    /// The update call failed.
    #[error("failed to update cron workflow '{namespace}/{name}': {error}")]
    Remote {
        namespace: String,
        name: String,
        #[source]
        error: ServiceError,
    },
}
