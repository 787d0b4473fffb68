//! Cron workflow type definitions.
//!
//! This module defines the data model for cron workflows as they appear in
//! manifests and on the wire. The structure down to each template's
//! `container` or `script` is typed; deeper values (volumes, DAG tasks,
//! resource requests, ...) are carried as opaque JSON so that updates never
//! lose fields this crate does not model.
//!
//! Every struct keeps keys it does not recognize in a flattened `extra` map.
//! See [`unrecognized_fields`](crate::unrecognized_fields) for how those are
//! reported in strict mode and dropped in lenient mode.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The `kind` value carried by cron workflow documents.
pub const CRON_WORKFLOW_KIND: &str = "CronWorkflow";

/// Default `apiVersion` for cron workflow documents.
pub const API_VERSION: &str = "argoproj.io/v1alpha1";

/// Keys a struct did not map to a typed field.
pub type ExtraFields = BTreeMap<String, Value>;

/// A recurring workflow definition.
///
/// # Examples
///
/// ```
/// use cronwf_core::CronWorkflow;
///
/// let cron = CronWorkflow::new("nightly-report", "0 2 * * *");
/// assert_eq!(cron.metadata.name, "nightly-report");
/// assert_eq!(cron.spec.schedule, "0 2 * * *");
/// assert!(cron.is_cron_workflow_kind());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronWorkflow {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: CronWorkflowSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CronWorkflowStatus>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl CronWorkflow {
    /// Creates a cron workflow with an exact name and a single schedule.
    pub fn new(name: impl Into<String>, schedule: impl Into<String>) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: CRON_WORKFLOW_KIND.to_string(),
            metadata: ObjectMeta {
                name: name.into(),
                ..Default::default()
            },
            spec: CronWorkflowSpec {
                schedule: schedule.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Returns `true` if `kind` is unset or names a cron workflow.
    pub fn is_cron_workflow_kind(&self) -> bool {
        self.kind.is_empty() || self.kind == CRON_WORKFLOW_KIND
    }

    /// Name used in logs and error messages.
    ///
    /// Falls back to the generate-name prefix, then to `<unnamed>`.
    pub fn display_name(&self) -> &str {
        if !self.metadata.name.is_empty() {
            &self.metadata.name
        } else if !self.metadata.generate_name.is_empty() {
            &self.metadata.generate_name
        } else {
            "<unnamed>"
        }
    }

    /// All configured schedules, `schedule` first.
    pub fn schedules(&self) -> Vec<&str> {
        let mut schedules = Vec::with_capacity(self.spec.schedules.len() + 1);
        if !self.spec.schedule.is_empty() {
            schedules.push(self.spec.schedule.as_str());
        }
        schedules.extend(self.spec.schedules.iter().map(String::as_str));
        schedules
    }
}

/// Object metadata shared by all server-side resources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Exact name. Mutually exclusive with `generate_name` once merged.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Name prefix the server completes with a random suffix.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub generate_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uid: String,
    /// Optimistic concurrency token; the server rejects stale updates with a conflict.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<i64>,
    /// RFC 3339 timestamp set by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Schedule settings plus the embedded workflow template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronWorkflowSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub schedule: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schedules: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub timezone: String,
    /// `Allow`, `Forbid` or `Replace`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub concurrency_policy: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub suspend: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_deadline_seconds: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub successful_jobs_history_limit: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_jobs_history_limit: Option<i32>,
    #[serde(default)]
    pub workflow_spec: WorkflowSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_metadata: Option<WorkflowMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_strategy: Option<StopStrategy>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub when: String,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Labels and annotations stamped onto every workflow a cron workflow starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowMetadata {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Condition under which a cron workflow stops scheduling new runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopStrategy {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub expression: String,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// The specification of a single workflow run.
///
/// Submission options only touch the scalar fields and the arguments.
/// Templates and the other recognized keys pass through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub entrypoint: String,
    #[serde(default, skip_serializing_if = "Arguments::is_empty")]
    pub arguments: Arguments,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service_account_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pod_priority_class_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub templates: Vec<Template>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_defaults: Option<Template>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_template_ref: Option<Value>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// One template of a workflow.
///
/// Only the name and the `container`/`script` bodies are typed; steps, DAGs,
/// inputs and the other template kinds are recognized keys in `extra`.
///
/// # Examples
///
/// ```
/// use cronwf_core::Template;
///
/// let t: Template = serde_json::from_str(
///     r#"{"name": "main", "container": {"image": "alpine", "command": ["date"]}}"#,
/// ).unwrap();
/// assert_eq!(t.container.unwrap().image, "alpine");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<Container>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<Container>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// A container body, shared by `container` and `script` templates.
///
/// `source` is only meaningful for scripts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Workflow-level inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Arguments {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<Value>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Arguments {
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty() && self.artifacts.is_empty() && self.extra.is_empty()
    }

    /// Looks up a parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// A named workflow parameter.
///
/// Manifests often write scalar values unquoted; `value`, `default` and
/// `enum` accept numbers and booleans and store them as strings.
///
/// # Examples
///
/// ```
/// use cronwf_core::Parameter;
///
/// let p: Parameter = serde_json::from_str(r#"{"name": "retries", "value": 3}"#).unwrap();
/// assert_eq!(p.value.as_deref(), Some("3"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    #[serde(
        default,
        deserialize_with = "any_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<String>,
    #[serde(
        default,
        deserialize_with = "any_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        rename = "enum",
        deserialize_with = "any_string_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub enum_values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_from: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_name: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            ..Default::default()
        }
    }
}

/// Server-maintained state, only read for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronWorkflowStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub active: Vec<ObjectReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_scheduled_time: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub succeeded: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed: Option<i64>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub phase: String,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Reference to a workflow started by a cron workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub condition_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// A single workflow run.
///
/// Only used as the scratch value submission options are applied to before
/// the result is folded back into a [`CronWorkflow`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: WorkflowSpec,
}

fn any_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => scalar_to_string(value).map(Some).map_err(D::Error::custom),
    }
}

fn any_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Vec<Value>>::deserialize(deserializer)? {
        None => Ok(Vec::new()),
        Some(values) => values
            .into_iter()
            .map(|v| scalar_to_string(v).map_err(D::Error::custom))
            .collect(),
    }
}

fn scalar_to_string(value: Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!(
            "expected a string, number or boolean, got {other}"
        )),
    }
}
