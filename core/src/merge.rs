//! Reconciling submission options into a cron workflow.
//!
//! A cron workflow embeds a workflow spec but has its own metadata. Options
//! are applied to a scratch [`Workflow`] built from the embedded spec, then the
//! resulting spec and the identity (name or generate-name) are folded back.
//!
//! # Example
//!
//! ```
//! use cronwf_core::*;
//!
//! let mut cron = CronWorkflow::new("nightly", "0 2 * * *");
//! let opts = SubmitOpts {
//!     generate_name: Some("nightly-".into()),
//!     entrypoint: Some("report".into()),
//!     ..Default::default()
//! };
//!
//! merge_submit_opts(&mut cron, &opts, "argo").unwrap();
//!
//! assert_eq!(cron.metadata.generate_name, "nightly-");
//! assert!(cron.metadata.name.is_empty());
//! assert_eq!(cron.metadata.namespace, "argo");
//! assert_eq!(cron.spec.workflow_spec.entrypoint, "report");
//! ```

use crate::submit::{SubmitError, SubmitOpts, apply_submit_opts};
use crate::types::{CronWorkflow, ObjectMeta, Workflow};

/// How a definition is identified on the server.
///
/// `name` and `generateName` are mutually exclusive; this enum makes the
/// "both set" state unrepresentable once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// Exact `metadata.name`.
    Named(String),
    /// `metadata.generateName` prefix.
    Generated(String),
    /// Neither field is set.
    Unset,
}

impl Identity {
    /// Reads the identity of existing metadata. An exact name wins if both
    /// fields are set.
    pub fn of(meta: &ObjectMeta) -> Self {
        if !meta.name.is_empty() {
            Identity::Named(meta.name.clone())
        } else if !meta.generate_name.is_empty() {
            Identity::Generated(meta.generate_name.clone())
        } else {
            Identity::Unset
        }
    }

    /// Applies the overrides produced by the scratch workflow.
    ///
    /// A generate-name switches to [`Identity::Generated`], then a name
    /// switches to [`Identity::Named`], so an exact name always wins.
    ///
    /// # Examples
    ///
    /// ```
    /// use cronwf_core::Identity;
    ///
    /// let id = Identity::Generated("old-".into());
    /// assert_eq!(id.clone().resolve("", ""), Identity::Generated("old-".into()));
    /// assert_eq!(id.clone().resolve("new-", ""), Identity::Generated("new-".into()));
    /// assert_eq!(id.resolve("new-", "exact"), Identity::Named("exact".into()));
    /// ```
    pub fn resolve(self, generate_name: &str, name: &str) -> Self {
        let mut identity = self;
        if !generate_name.is_empty() {
            identity = Identity::Generated(generate_name.to_string());
        }
        if !name.is_empty() {
            identity = Identity::Named(name.to_string());
        }
        identity
    }

    /// Writes the identity into `meta`, clearing the other field.
    pub fn apply_to(self, meta: &mut ObjectMeta) {
        match self {
            Identity::Named(name) => {
                meta.name = name;
                meta.generate_name.clear();
            }
            Identity::Generated(prefix) => {
                meta.generate_name = prefix;
                meta.name.clear();
            }
            Identity::Unset => {
                meta.name.clear();
                meta.generate_name.clear();
            }
        }
    }
}

/// Merges `opts` into `cron` and fills in the namespace.
///
/// 1. Apply the options to a scratch workflow holding the embedded spec.
/// 2. Copy the resulting spec back.
/// 3. Resolve the identity (generate-name first, exact name second).
/// 4. Default an empty namespace to `active_namespace`.
///
/// Labels and annotations are validated as part of step 1 but only the spec
/// and the identity are copied back. With empty `opts` steps 1 and 2 are
/// skipped; the identity is still normalized.
///
/// # Errors
///
/// Returns [`SubmitError`] if an option cannot be applied. `cron` is left
/// unchanged in that case.
pub fn merge_submit_opts(
    cron: &mut CronWorkflow,
    opts: &SubmitOpts,
    active_namespace: &str,
) -> Result<(), SubmitError> {
    let identity = Identity::of(&cron.metadata);
    let identity = if opts.is_empty() {
        identity
    } else {
        let mut workflow = Workflow {
            metadata: ObjectMeta::default(),
            spec: cron.spec.workflow_spec.clone(),
        };
        apply_submit_opts(&mut workflow, opts)?;
        cron.spec.workflow_spec = workflow.spec;
        identity.resolve(&workflow.metadata.generate_name, &workflow.metadata.name)
    };
    identity.apply_to(&mut cron.metadata);

    if cron.metadata.namespace.is_empty() {
        cron.metadata.namespace = active_namespace.to_string();
    }
    Ok(())
}
