//! The batch update driver.
//!
//! [`CronUpdater`] reads every manifest source, decodes all cron workflows in
//! source order, then merges and submits them one at a time. The first error
//! of any kind ends the run: definitions after it are never sent, and
//! definitions before it stay updated on the server.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use cronwf_core::{CronWorkflow, SubmitOpts, merge_submit_opts};
use cronwf_manifest::{ManifestReader, decode_all};
use tracing::{debug, info};

use crate::error::UpdateError;
use crate::service::{CronWorkflowService, UpdateCronWorkflowRequest};

/// Shared flag for stopping a run between remote calls.
///
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Updates cron workflows from manifests.
///
/// All collaborators are passed in explicitly so runs can be driven by
/// in-memory readers and services.
///
/// # Examples
///
/// ```
/// use std::cell::RefCell;
///
/// use cronwf_client::{CronUpdater, CronWorkflowService, ServiceError, UpdateCronWorkflowRequest};
/// use cronwf_core::{CronWorkflow, SubmitOpts};
/// use cronwf_manifest::{ManifestReader, RawManifest};
///
/// struct OneFile;
/// impl ManifestReader for OneFile {
///     fn read(&self, sources: &[String]) -> cronwf_manifest::Result<Vec<RawManifest>> {
///         Ok(vec![RawManifest::new(
///             sources[0].as_str(),
///             "kind: CronWorkflow\nmetadata: {name: nightly}\nspec: {schedule: '@daily'}\n",
///         )])
///     }
/// }
///
/// #[derive(Default)]
/// struct Echo(RefCell<Vec<String>>);
/// impl CronWorkflowService for Echo {
///     fn update_cron_workflow(
///         &self,
///         request: &UpdateCronWorkflowRequest,
///     ) -> Result<CronWorkflow, ServiceError> {
///         self.0.borrow_mut().push(request.namespace.clone());
///         Ok(request.cron_workflow.clone())
///     }
/// }
///
/// let service = Echo::default();
/// let updater = CronUpdater::new(&OneFile, &service, "argo");
/// let updated = updater
///     .run(&["cron.yaml".to_string()], true, &SubmitOpts::default(), |_| {})
///     .unwrap();
///
/// assert_eq!(updated[0].metadata.name, "nightly");
/// assert_eq!(*service.0.borrow(), ["argo"]);
/// ```
pub struct CronUpdater<'a> {
    reader: &'a dyn ManifestReader,
    service: &'a dyn CronWorkflowService,
    active_namespace: String,
    cancel: CancelToken,
}

impl<'a> CronUpdater<'a> {
    pub fn new(
        reader: &'a dyn ManifestReader,
        service: &'a dyn CronWorkflowService,
        active_namespace: impl Into<String>,
    ) -> Self {
        Self {
            reader,
            service,
            active_namespace: active_namespace.into(),
            cancel: CancelToken::new(),
        }
    }

    /// Uses `cancel` to stop the run before the next remote call.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Reads and decodes every source, preserving source and document order.
    ///
    /// # Errors
    ///
    /// [`UpdateError::Read`] if a source cannot be read,
    /// [`UpdateError::Parse`] naming the first source that fails to decode.
    pub fn collect(&self, sources: &[String], strict: bool) -> Result<Vec<CronWorkflow>, UpdateError> {
        let manifests = self.reader.read(sources).map_err(UpdateError::Read)?;

        let mut crons = Vec::new();
        for manifest in &manifests {
            let decoded =
                decode_all(&manifest.content, strict).map_err(|error| UpdateError::Parse {
                    manifest: manifest.source.clone(),
                    error,
                })?;
            debug!(
                source = %manifest.source,
                count = decoded.len(),
                "Decoded manifest"
            );
            crons.extend(decoded);
        }
        Ok(crons)
    }

    /// Updates every cron workflow found in `sources`.
    ///
    /// `on_updated` is called with each server response as soon as it
    /// arrives; the responses are also returned in processing order.
    ///
    /// # Errors
    ///
    /// Returns the first [`UpdateError`]. [`UpdateError::NoCronWorkflows`] is
    /// returned before any remote call when the sources hold no cron
    /// workflows.
    pub fn run(
        &self,
        sources: &[String],
        strict: bool,
        opts: &SubmitOpts,
        mut on_updated: impl FnMut(&CronWorkflow),
    ) -> Result<Vec<CronWorkflow>, UpdateError> {
        let crons = self.collect(sources, strict)?;
        if crons.is_empty() {
            return Err(UpdateError::NoCronWorkflows);
        }
        info!(count = crons.len(), strict, "Updating cron workflows");

        let mut updated = Vec::with_capacity(crons.len());
        for mut cron in crons {
            merge_submit_opts(&mut cron, opts, &self.active_namespace).map_err(|error| {
                UpdateError::Validation {
                    name: cron.display_name().to_string(),
                    error,
                }
            })?;

            let name = cron.display_name().to_string();
            if self.cancel.is_cancelled() {
                return Err(UpdateError::Cancelled { name });
            }

            let request = UpdateCronWorkflowRequest::new(cron);
            let response = self
                .service
                .update_cron_workflow(&request)
                .map_err(|error| UpdateError::Remote {
                    namespace: request.namespace.clone(),
                    name: name.clone(),
                    error,
                })?;
            info!(namespace = %request.namespace, name = %name, "Updated cron workflow");

            on_updated(&response);
            updated.push(response);
        }
        Ok(updated)
    }
}
