//! The remote update contract.

use cronwf_core::CronWorkflow;
use serde::Serialize;

use crate::error::ServiceError;

/// Body of an update call: the target namespace and the finalized definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCronWorkflowRequest {
    pub namespace: String,
    pub cron_workflow: CronWorkflow,
}

impl UpdateCronWorkflowRequest {
    /// Builds a request targeting the cron workflow's own namespace.
    pub fn new(cron_workflow: CronWorkflow) -> Self {
        Self {
            namespace: cron_workflow.metadata.namespace.clone(),
            cron_workflow,
        }
    }
}

/// A server that stores cron workflows.
///
/// Implementations make exactly one attempt per call; retrying is left to
/// whoever re-runs the update.
pub trait CronWorkflowService {
    /// Replaces the stored cron workflow and returns the server's copy.
    fn update_cron_workflow(
        &self,
        request: &UpdateCronWorkflowRequest,
    ) -> Result<CronWorkflow, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let mut cron = CronWorkflow::new("nightly", "@daily");
        cron.metadata.namespace = "argo".into();
        let request = UpdateCronWorkflowRequest::new(cron);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["namespace"], "argo");
        assert_eq!(json["cronWorkflow"]["metadata"]["name"], "nightly");
        assert_eq!(json["cronWorkflow"]["spec"]["schedule"], "@daily");
    }
}
