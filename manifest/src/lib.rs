//! Manifest reading and cron workflow decoding.
//!
//! This crate turns user-supplied manifest sources into
//! [`CronWorkflow`](cronwf_core::CronWorkflow) values:
//!
//! - [`ManifestReader`] / [`FsManifestReader`] read raw bytes from files,
//!   stdin (`-`) and HTTP(S) URLs.
//! - [`decode_cron_workflows`] lazily decodes one manifest's documents,
//!   honoring strict or lenient field validation.
//!
//! # Quick start
//!
//! ```no_run
//! use cronwf_manifest::{FsManifestReader, ManifestReader, decode_all};
//!
//! let reader = FsManifestReader::default();
//! for manifest in reader.read(&["crons.yaml".to_string()]).unwrap() {
//!     let crons = decode_all(&manifest.content, true).unwrap();
//!     println!("{}: {} cron workflow(s)", manifest.source, crons.len());
//! }
//! ```

mod decode;
mod error;
mod reader;

pub use decode::{CronWorkflowDocuments, decode_all, decode_cron_workflows};
pub use error::{ManifestError, Result};
pub use reader::{FsManifestReader, ManifestReader, ManifestSource, RawManifest};
