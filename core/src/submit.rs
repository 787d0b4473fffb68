//! Submission options and their application to a workflow.
//!
//! [`SubmitOpts`] is the bag of overrides a caller may pass at update time.
//! Every option follows the same rule: when set it replaces the corresponding
//! field, when absent the existing value is left alone.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::types::{Parameter, Workflow};

/// Errors raised while applying submission options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// A `-p` entry was not of the form `NAME=VALUE`.
    #[error("expected parameter of the form: NAME=VALUE. Received: {0}")]
    InvalidParameter(String),
    /// The parameter file was not a YAML or JSON mapping.
    #[error("invalid parameter file: {0}")]
    InvalidParameterFile(String),
    /// The labels string was not a `k=v` list.
    #[error("expected labels of the form: NAME1=VALUE1,NAME2=VALUE2. Received: {0}")]
    InvalidLabels(String),
    /// The annotations string was not a `k=v` list.
    #[error("expected annotations of the form: NAME1=VALUE1,NAME2=VALUE2. Received: {0}")]
    InvalidAnnotations(String),
}

/// Overrides supplied when updating a cron workflow.
///
/// # Examples
///
/// ```
/// use cronwf_core::SubmitOpts;
///
/// let opts = SubmitOpts {
///     entrypoint: Some("main".into()),
///     parameters: vec!["message=hello".into()],
///     ..Default::default()
/// };
/// assert!(!opts.is_empty());
/// assert!(SubmitOpts::default().is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitOpts {
    /// Exact name override.
    pub name: Option<String>,
    /// Generate-name override.
    pub generate_name: Option<String>,
    pub entrypoint: Option<String>,
    /// `NAME=VALUE` entries, applied after [`parameter_file`](Self::parameter_file) entries.
    pub parameters: Vec<String>,
    /// `NAME=VALUE` entries read from a parameter file.
    pub parameter_file: Vec<String>,
    pub service_account: Option<String>,
    /// Comma separated `k=v` labels.
    pub labels: Option<String>,
    /// Comma separated `k=v` annotations.
    pub annotations: Option<String>,
    pub pod_priority_class_name: Option<String>,
    pub priority: Option<i32>,
}

impl SubmitOpts {
    /// Returns `true` if no option is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Applies `opts` to `workflow` in place.
///
/// Parameters are rebuilt as: every supplied parameter in supplied order
/// (a later entry with the same name replaces the earlier value), followed by
/// the existing parameters that were not overridden, in their original order.
///
/// # Errors
///
/// Returns [`SubmitError`] when a parameter, label or annotation string is
/// malformed. The workflow may be partially updated in that case and should
/// be discarded.
///
/// # Examples
///
/// ```
/// use cronwf_core::*;
///
/// let mut wf = Workflow::default();
/// wf.spec.arguments.parameters.push(Parameter::new("a", "1"));
/// wf.spec.arguments.parameters.push(Parameter::new("b", "2"));
///
/// let opts = SubmitOpts {
///     parameters: vec!["b=20".into(), "c=30".into()],
///     ..Default::default()
/// };
/// apply_submit_opts(&mut wf, &opts).unwrap();
///
/// let names: Vec<_> = wf.spec.arguments.parameters.iter().map(|p| p.name.as_str()).collect();
/// assert_eq!(names, ["b", "c", "a"]);
/// ```
pub fn apply_submit_opts(workflow: &mut Workflow, opts: &SubmitOpts) -> Result<(), SubmitError> {
    let spec = &mut workflow.spec;
    if let Some(entrypoint) = non_empty(&opts.entrypoint) {
        spec.entrypoint = entrypoint.to_string();
    }
    if let Some(account) = non_empty(&opts.service_account) {
        spec.service_account_name = account.to_string();
    }
    if let Some(class) = non_empty(&opts.pod_priority_class_name) {
        spec.pod_priority_class_name = class.to_string();
    }
    if opts.priority.is_some() {
        spec.priority = opts.priority;
    }

    if let Some(raw) = non_empty(&opts.labels) {
        let labels =
            parse_key_values(raw).map_err(|_| SubmitError::InvalidLabels(raw.to_string()))?;
        workflow.metadata.labels.extend(labels);
    }
    if let Some(raw) = non_empty(&opts.annotations) {
        let annotations =
            parse_key_values(raw).map_err(|_| SubmitError::InvalidAnnotations(raw.to_string()))?;
        workflow.metadata.annotations.extend(annotations);
    }

    override_parameters(workflow, opts)?;

    if let Some(generate_name) = non_empty(&opts.generate_name) {
        workflow.metadata.generate_name = generate_name.to_string();
    }
    if let Some(name) = non_empty(&opts.name) {
        workflow.metadata.name = name.to_string();
    }
    Ok(())
}

fn override_parameters(workflow: &mut Workflow, opts: &SubmitOpts) -> Result<(), SubmitError> {
    if opts.parameters.is_empty() && opts.parameter_file.is_empty() {
        return Ok(());
    }

    let mut supplied: Vec<Parameter> = Vec::new();
    for entry in opts.parameter_file.iter().chain(&opts.parameters) {
        let (name, value) = entry
            .split_once('=')
            .ok_or_else(|| SubmitError::InvalidParameter(entry.clone()))?;
        match supplied.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.value = Some(value.to_string()),
            None => supplied.push(Parameter::new(name, value)),
        }
    }

    let mut existing = std::mem::take(&mut workflow.spec.arguments.parameters);
    existing.retain(|p| !supplied.iter().any(|s| s.name == p.name));
    supplied.extend(existing);
    workflow.spec.arguments.parameters = supplied;
    Ok(())
}

/// Parses a `k=v,k2=v2` list.
///
/// Whitespace around entries is trimmed. Every entry needs a non-empty key and
/// an `=`; values may be empty.
///
/// # Examples
///
/// ```
/// use cronwf_core::parse_key_values;
///
/// let parsed = parse_key_values("team=data, tier=").unwrap();
/// assert_eq!(parsed["team"], "data");
/// assert_eq!(parsed["tier"], "");
/// assert!(parse_key_values("team").is_err());
/// ```
pub fn parse_key_values(raw: &str) -> Result<BTreeMap<String, String>, String> {
    let mut parsed = BTreeMap::new();
    for entry in raw.split(',') {
        let entry = entry.trim();
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| format!("missing '=' in '{entry}'"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("empty key in '{entry}'"));
        }
        parsed.insert(key.to_string(), value.trim().to_string());
    }
    Ok(parsed)
}

/// Reads `NAME=VALUE` parameter entries from a YAML or JSON mapping.
///
/// Entries keep the file's order. String values are used as-is; any other
/// value is encoded as JSON.
///
/// # Examples
///
/// ```
/// use cronwf_core::parameters_from_file;
///
/// let entries = parameters_from_file("message: hi\ncount: 3\nlist: [1, 2]\n").unwrap();
/// assert_eq!(entries, ["message=hi", "count=3", "list=[1,2]"]);
/// ```
pub fn parameters_from_file(content: &str) -> Result<Vec<String>, SubmitError> {
    let mapping: serde_yaml::Mapping = serde_yaml::from_str(content)
        .map_err(|err| SubmitError::InvalidParameterFile(err.to_string()))?;

    let mut entries = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        let key = match key {
            serde_yaml::Value::String(key) => key,
            other => {
                return Err(SubmitError::InvalidParameterFile(format!(
                    "parameter names must be strings, got {other:?}"
                )));
            }
        };
        let value = match value {
            serde_yaml::Value::String(value) => value,
            other => serde_json::to_string(&other)
                .map_err(|err| SubmitError::InvalidParameterFile(err.to_string()))?,
        };
        entries.push(format!("{key}={value}"));
    }
    Ok(entries)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
