//! Core cron workflow types and the submission-option merger.
//!
//! This crate defines the data model for updating cron workflows:
//!
//! - [`CronWorkflow`]: a recurring workflow definition with its metadata,
//!   schedule settings and embedded [`WorkflowSpec`].
//! - [`SubmitOpts`]: the overrides a caller may pass at update time
//!   (parameters, entrypoint, labels, name strategy, ...).
//! - [`Identity`]: the name / generate-name state of a definition.
//!
//! Merging ([`merge_submit_opts`]) folds a [`SubmitOpts`] into a definition
//! while keeping exactly one of `name` / `generateName` set.
//!
//! Field recognition ([`unrecognized_fields`], [`strip_unrecognized_fields`])
//! backs strict and lenient manifest decoding.
//!
//! # Example
//!
//! ```
//! use cronwf_core::*;
//!
//! let mut cron = CronWorkflow::new("backup", "0 3 * * *");
//! cron.spec.workflow_spec.arguments.parameters.push(Parameter::new("target", "s3"));
//!
//! let opts = SubmitOpts {
//!     parameters: vec!["target=gcs".into()],
//!     ..Default::default()
//! };
//! merge_submit_opts(&mut cron, &opts, "default").unwrap();
//!
//! let target = cron.spec.workflow_spec.arguments.parameter("target").unwrap();
//! assert_eq!(target.value.as_deref(), Some("gcs"));
//! assert_eq!(cron.metadata.namespace, "default");
//! ```

mod merge;
mod submit;
mod types;
mod validate;

pub use merge::{Identity, merge_submit_opts};
pub use submit::{
    SubmitError, SubmitOpts, apply_submit_opts, parameters_from_file, parse_key_values,
};
pub use types::*;
pub use validate::{strip_unrecognized_fields, unrecognized_fields};
