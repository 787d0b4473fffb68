//! HTTP implementation of [`CronWorkflowService`] for an Argo-compatible server.
//!
//! Updates are sent as `PUT {server}/api/v1/cron-workflows/{namespace}/{name}`
//! with the [`UpdateCronWorkflowRequest`] as the JSON body.

use cronwf_core::CronWorkflow;
use serde::Deserialize;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ConfigError, ServiceError};
use crate::service::{CronWorkflowService, UpdateCronWorkflowRequest};

/// Blocking client for the server's cron workflow API.
///
/// # Examples
///
/// ```no_run
/// use cronwf_client::{ArgoServerClient, ClientConfig, CronWorkflowService, UpdateCronWorkflowRequest};
/// use cronwf_core::CronWorkflow;
///
/// let config = ClientConfig {
///     server: Some("localhost:2746".into()),
///     ..Default::default()
/// };
/// let client = ArgoServerClient::new(&config).unwrap();
///
/// let mut cron = CronWorkflow::new("nightly", "0 2 * * *");
/// cron.metadata.namespace = "argo".into();
/// let updated = client
///     .update_cron_workflow(&UpdateCronWorkflowRequest::new(cron))
///     .unwrap();
/// println!("resourceVersion {}", updated.metadata.resource_version);
/// ```
pub struct ArgoServerClient {
    agent: ureq::Agent,
    base_url: String,
    authorization: Option<String>,
}

impl ArgoServerClient {
    /// Builds a client from resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the server address is missing or invalid.
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        let base_url = config.server_url()?;

        let mut builder = ureq::Agent::config_builder()
            .timeout_global(Some(config.request_timeout()))
            .http_status_as_error(false);
        if config.insecure_skip_verify.unwrap_or(false) {
            builder = builder.tls_config(
                ureq::tls::TlsConfig::builder()
                    .disable_verification(true)
                    .build(),
            );
        }

        Ok(Self {
            agent: builder.build().into(),
            base_url,
            authorization: config.authorization(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn cron_workflow_url(&self, namespace: &str, name: &str) -> String {
        format!(
            "{}api/v1/cron-workflows/{namespace}/{name}",
            self.base_url
        )
    }
}

impl CronWorkflowService for ArgoServerClient {
    fn update_cron_workflow(
        &self,
        request: &UpdateCronWorkflowRequest,
    ) -> Result<CronWorkflow, ServiceError> {
        let name = &request.cron_workflow.metadata.name;
        if name.is_empty() {
            return Err(ServiceError::InvalidRequest(
                "an existing cron workflow can only be updated by metadata.name".to_string(),
            ));
        }
        if request.namespace.is_empty() {
            return Err(ServiceError::InvalidRequest(
                "namespace must not be empty".to_string(),
            ));
        }
        for (field, value) in [("metadata.name", name), ("namespace", &request.namespace)] {
            if !is_dns_subdomain(value) {
                return Err(ServiceError::InvalidRequest(format!(
                    "{field} {value:?} is not a valid resource name"
                )));
            }
        }

        let url = self.cron_workflow_url(&request.namespace, name);
        debug!(%url, "Sending cron workflow update");

        let mut call = self.agent.put(url.as_str()).header("Accept", "application/json");
        if let Some(authorization) = &self.authorization {
            call = call.header("Authorization", authorization.as_str());
        }

        let mut response = call
            .send_json(request)
            .map_err(|err| ServiceError::Transport(err.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|err| ServiceError::Transport(err.to_string()))?;

        if !(200..300).contains(&status) {
            debug!(status, body = %body, "Cron workflow update rejected");
            return Err(status_error(status, &body));
        }
        serde_json::from_str(&body).map_err(|err| ServiceError::Decode(err.to_string()))
    }
}

/// Checks the Kubernetes object name rule (RFC 1123 subdomain), which also
/// keeps the value safe to place in a URL path segment.
fn is_dns_subdomain(value: &str) -> bool {
    let bytes = value.as_bytes();
    let alphanumeric = |b: &u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    !bytes.is_empty()
        && bytes.len() <= 253
        && bytes.first().is_some_and(alphanumeric)
        && bytes.last().is_some_and(alphanumeric)
        && bytes.iter().all(|b| alphanumeric(b) || *b == b'-' || *b == b'.')
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Maps a non-success response to a [`ServiceError`], preferring the
/// server's `{"message": ...}` body.
fn status_error(status: u16, body: &str) -> ServiceError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|b| b.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                format!("HTTP {status}")
            } else {
                trimmed.to_string()
            }
        });

    match status {
        404 => ServiceError::NotFound(message),
        409 => ServiceError::Conflict(message),
        code => ServiceError::Status { code, message },
    }
}
