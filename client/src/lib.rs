//! Updating cron workflows on a workflow server.
//!
//! The pieces, from the outside in:
//!
//! - [`CronUpdater`] runs a whole update: read manifests, decode, merge
//!   submission options, send each definition, report each result.
//! - [`CronWorkflowService`] is the remote contract;
//!   [`ArgoServerClient`] implements it over HTTP.
//! - [`ClientConfig`] holds the server address, token and active namespace.
//! - [`format_cron_workflow`] renders updated definitions for the terminal.
//!
//! # Quick start
//!
//! ```no_run
//! use cronwf_client::{ArgoServerClient, ClientConfig, CronUpdater, OutputFormat, format_cron_workflow};
//! use cronwf_core::SubmitOpts;
//! use cronwf_manifest::FsManifestReader;
//!
//! let config = ClientConfig::discover(None).unwrap();
//! let client = ArgoServerClient::new(&config).unwrap();
//! let reader = FsManifestReader::with_timeout(config.request_timeout());
//!
//! let updater = CronUpdater::new(&reader, &client, config.namespace());
//! updater
//!     .run(&["nightly.yaml".to_string()], true, &SubmitOpts::default(), |cron| {
//!         print!("{}", format_cron_workflow(cron, OutputFormat::Summary).unwrap());
//!     })
//!     .unwrap();
//! ```

mod config;
mod error;
mod http;
mod output;
mod service;
mod update;

pub use config::{ClientConfig, DEFAULT_NAMESPACE, DEFAULT_REQUEST_TIMEOUT_SECS};
pub use error::{ConfigError, ServiceError, UpdateError};
pub use http::ArgoServerClient;
pub use output::{OutputFormat, cron_workflow_summary, format_cron_workflow};
pub use service::{CronWorkflowService, UpdateCronWorkflowRequest};
pub use update::{CancelToken, CronUpdater};
