//! Reading raw manifest content from files, stdin and URLs.
//!
//! [`ManifestReader`] is the seam the update driver reads through. The
//! default [`FsManifestReader`] understands three kinds of source:
//!
//! - `-` reads standard input,
//! - `http://` and `https://` URLs are fetched,
//! - anything else is a file path.
//!
//! # Examples
//!
//! ```no_run
//! use cronwf_manifest::{FsManifestReader, ManifestReader};
//!
//! let reader = FsManifestReader::default();
//! let manifests = reader
//!     .read(&["cron.yaml".to_string(), "-".to_string()])
//!     .unwrap();
//! for manifest in &manifests {
//!     println!("{}: {} bytes", manifest.source, manifest.content.len());
//! }
//! ```

use std::fmt;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use crate::error::{ManifestError, Result};

/// Where a manifest comes from.
///
/// # Examples
///
/// ```
/// use cronwf_manifest::ManifestSource;
///
/// assert_eq!(ManifestSource::parse("-"), ManifestSource::Stdin);
/// assert!(matches!(ManifestSource::parse("https://example.com/c.yaml"), ManifestSource::Url(_)));
/// assert!(matches!(ManifestSource::parse("crons/nightly.yaml"), ManifestSource::File(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSource {
    Stdin,
    Url(String),
    File(PathBuf),
}

impl ManifestSource {
    pub fn parse(raw: &str) -> Self {
        if raw == "-" {
            ManifestSource::Stdin
        } else if raw.starts_with("http://") || raw.starts_with("https://") {
            ManifestSource::Url(raw.to_string())
        } else {
            ManifestSource::File(PathBuf::from(raw))
        }
    }
}

impl fmt::Display for ManifestSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestSource::Stdin => f.write_str("<stdin>"),
            ManifestSource::Url(url) => f.write_str(url),
            ManifestSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Raw bytes of one manifest source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawManifest {
    /// Source identifier as given by the caller, used in error messages.
    pub source: String,
    pub content: Vec<u8>,
}

impl RawManifest {
    pub fn new(source: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
        }
    }
}

/// Reads raw manifest content for a list of source identifiers.
pub trait ManifestReader {
    /// Returns one [`RawManifest`] per source, in the order given.
    ///
    /// # Errors
    ///
    /// Fails on the first source that cannot be read.
    fn read(&self, sources: &[String]) -> Result<Vec<RawManifest>>;
}

/// Reads manifests from the local filesystem, stdin and HTTP(S) URLs.
#[derive(Debug, Clone, Default)]
pub struct FsManifestReader {
    /// Global timeout for URL fetches. `None` means no timeout.
    pub timeout: Option<Duration>,
}

impl FsManifestReader {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }

    fn read_one(&self, raw: &str) -> Result<Vec<u8>> {
        match ManifestSource::parse(raw) {
            ManifestSource::Stdin => {
                let mut content = Vec::new();
                std::io::stdin()
                    .read_to_end(&mut content)
                    .map_err(|error| ManifestError::Read {
                        source_name: raw.to_string(),
                        error,
                    })?;
                Ok(content)
            }
            ManifestSource::Url(url) => self.fetch(&url),
            ManifestSource::File(path) => {
                std::fs::read(&path).map_err(|error| ManifestError::Read {
                    source_name: raw.to_string(),
                    error,
                })
            }
        }
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(self.timeout)
            .build()
            .into();
        let fetch_error = |message: String| ManifestError::Fetch {
            url: url.to_string(),
            message,
        };

        let mut response = agent
            .get(url)
            .call()
            .map_err(|err| fetch_error(err.to_string()))?;
        response
            .body_mut()
            .read_to_vec()
            .map_err(|err| fetch_error(err.to_string()))
    }
}

impl ManifestReader for FsManifestReader {
    fn read(&self, sources: &[String]) -> Result<Vec<RawManifest>> {
        sources
            .iter()
            .map(|source| {
                let content = self.read_one(source)?;
                debug!(source = %source, bytes = content.len(), "Read manifest");
                Ok(RawManifest::new(source.as_str(), content))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_reads_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.yaml");
        let second = dir.path().join("second.yaml");
        std::fs::File::create(&first).unwrap().write_all(b"one").unwrap();
        std::fs::File::create(&second).unwrap().write_all(b"two").unwrap();

        let sources = vec![
            second.display().to_string(),
            first.display().to_string(),
        ];
        let manifests = FsManifestReader::default().read(&sources).unwrap();

        assert_eq!(manifests.len(), 2);
        assert_eq!(manifests[0].content, b"two");
        assert_eq!(manifests[1].content, b"one");
        assert_eq!(manifests[0].source, sources[0]);
    }

    #[test]
    fn test_missing_file_names_the_source() {
        let err = FsManifestReader::default()
            .read(&["/definitely/not/here.yaml".to_string()])
            .unwrap_err();
        assert!(matches!(err, ManifestError::Read { .. }));
        assert!(err.to_string().contains("/definitely/not/here.yaml"));
    }

    #[test]
    fn test_source_display() {
        assert_eq!(ManifestSource::Stdin.to_string(), "<stdin>");
        assert_eq!(
            ManifestSource::parse("http://host/x.yaml").to_string(),
            "http://host/x.yaml"
        );
        assert_eq!(ManifestSource::parse("a/b.yaml").to_string(), "a/b.yaml");
    }
}
