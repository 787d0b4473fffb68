//! Field recognition for strict and lenient decoding.
//!
//! Each model struct captures keys it has no typed field for in its `extra`
//! map. Some of those keys are legitimate but opaque (a workflow's `volumes`,
//! a template's `dag`, an object's `finalizers`); the rest are unrecognized. Strict decoding
//! rejects a document with any unrecognized key, lenient decoding removes them
//! with [`strip_unrecognized_fields`].
//!
//! # Examples
//!
//! ```
//! use cronwf_core::*;
//!
//! let mut cron: CronWorkflow = serde_json::from_value(serde_json::json!({
//!     "metadata": {"name": "a"},
//!     "spec": {"schedule": "@hourly", "workflowSpec": {"volumes": [], "bogus": 1}}
//! })).unwrap();
//!
//! assert_eq!(unrecognized_fields(&cron), vec!["spec.workflowSpec.bogus"]);
//!
//! strip_unrecognized_fields(&mut cron);
//! assert!(unrecognized_fields(&cron).is_empty());
//! assert!(cron.spec.workflow_spec.extra.contains_key("volumes"));
//! ```

use crate::types::{
    Arguments, Condition, Container, CronWorkflow, CronWorkflowSpec, CronWorkflowStatus,
    ExtraFields, ObjectMeta, Parameter, Template, WorkflowSpec,
};

const OBJECT_META_PASSTHROUGH: &[&str] = &[
    "selfLink",
    "deletionTimestamp",
    "deletionGracePeriodSeconds",
    "ownerReferences",
    "finalizers",
    "managedFields",
];

const WORKFLOW_SPEC_PASSTHROUGH: &[&str] = &[
    "activeDeadlineSeconds",
    "affinity",
    "archiveLogs",
    "artifactGC",
    "artifactRepositoryRef",
    "automountServiceAccountToken",
    "dnsConfig",
    "dnsPolicy",
    "executor",
    "hooks",
    "hostAliases",
    "hostNetwork",
    "imagePullSecrets",
    "metrics",
    "nodeSelector",
    "onExit",
    "parallelism",
    "podDisruptionBudget",
    "podGC",
    "podMetadata",
    "podPriority",
    "podSpecPatch",
    "retryStrategy",
    "schedulerName",
    "securityContext",
    "shutdown",
    "suspend",
    "synchronization",
    "tolerations",
    "ttlStrategy",
    "volumeClaimGC",
    "volumeClaimTemplates",
    "volumes",
];

const WORKFLOW_METADATA_PASSTHROUGH: &[&str] = &["labelsFrom"];

const TEMPLATE_PASSTHROUGH: &[&str] = &[
    "activeDeadlineSeconds",
    "affinity",
    "archiveLocation",
    "automountServiceAccountToken",
    "containerSet",
    "daemon",
    "dag",
    "data",
    "executor",
    "failFast",
    "hostAliases",
    "http",
    "initContainers",
    "inputs",
    "memoize",
    "metadata",
    "metrics",
    "nodeSelector",
    "outputs",
    "parallelism",
    "plugin",
    "podSpecPatch",
    "priority",
    "priorityClassName",
    "resource",
    "retryStrategy",
    "schedulerName",
    "securityContext",
    "serviceAccountName",
    "sidecars",
    "steps",
    "suspend",
    "synchronization",
    "timeout",
    "tolerations",
    "volumes",
];

const CONTAINER_PASSTHROUGH: &[&str] = &[
    "args",
    "command",
    "env",
    "envFrom",
    "imagePullPolicy",
    "lifecycle",
    "livenessProbe",
    "ports",
    "readinessProbe",
    "resizePolicy",
    "resources",
    "restartPolicy",
    "securityContext",
    "startupProbe",
    "stdin",
    "stdinOnce",
    "terminationMessagePath",
    "terminationMessagePolicy",
    "tty",
    "volumeDevices",
    "volumeMounts",
    "workingDir",
];

const NONE: &[&str] = &[];

/// Returns the dotted path of every unrecognized key, in document order of
/// the model (metadata, spec, status).
pub fn unrecognized_fields(cron: &CronWorkflow) -> Vec<String> {
    let mut found = Vec::new();
    collect(&cron.extra, NONE, "", &mut found);
    collect_meta(&cron.metadata, "metadata", &mut found);
    collect_spec(&cron.spec, "spec", &mut found);
    if let Some(status) = &cron.status {
        collect_status(status, "status", &mut found);
    }
    found
}

/// Removes every unrecognized key, keeping recognized pass-through keys.
pub fn strip_unrecognized_fields(cron: &mut CronWorkflow) {
    retain(&mut cron.extra, NONE);
    retain(&mut cron.metadata.extra, OBJECT_META_PASSTHROUGH);
    strip_spec(&mut cron.spec);
    if let Some(status) = cron.status.as_mut() {
        retain(&mut status.extra, NONE);
        for condition in &mut status.conditions {
            retain(&mut condition.extra, NONE);
        }
    }
}

fn collect_meta(meta: &ObjectMeta, path: &str, found: &mut Vec<String>) {
    collect(&meta.extra, OBJECT_META_PASSTHROUGH, path, found);
}

fn collect_spec(spec: &CronWorkflowSpec, path: &str, found: &mut Vec<String>) {
    collect(&spec.extra, NONE, path, found);
    if let Some(stop) = &spec.stop_strategy {
        collect(&stop.extra, NONE, &join(path, "stopStrategy"), found);
    }
    if let Some(metadata) = &spec.workflow_metadata {
        collect(
            &metadata.extra,
            WORKFLOW_METADATA_PASSTHROUGH,
            &join(path, "workflowMetadata"),
            found,
        );
    }
    collect_workflow_spec(
        &spec.workflow_spec,
        &join(path, "workflowSpec"),
        found,
    );
}

fn collect_workflow_spec(spec: &WorkflowSpec, path: &str, found: &mut Vec<String>) {
    collect(&spec.extra, WORKFLOW_SPEC_PASSTHROUGH, path, found);
    collect_arguments(&spec.arguments, &join(path, "arguments"), found);
    for (i, template) in spec.templates.iter().enumerate() {
        collect_template(template, &format!("{path}.templates[{i}]"), found);
    }
    if let Some(defaults) = &spec.template_defaults {
        collect_template(defaults, &join(path, "templateDefaults"), found);
    }
}

fn collect_template(template: &Template, path: &str, found: &mut Vec<String>) {
    collect(&template.extra, TEMPLATE_PASSTHROUGH, path, found);
    if let Some(container) = &template.container {
        let path = join(path, "container");
        collect(&container.extra, CONTAINER_PASSTHROUGH, &path, found);
        // Only scripts carry a source.
        if container.source.is_some() {
            found.push(join(&path, "source"));
        }
    }
    if let Some(script) = &template.script {
        collect(&script.extra, CONTAINER_PASSTHROUGH, &join(path, "script"), found);
    }
}

fn collect_arguments(arguments: &Arguments, path: &str, found: &mut Vec<String>) {
    collect(&arguments.extra, NONE, path, found);
    for (i, parameter) in arguments.parameters.iter().enumerate() {
        collect_parameter(parameter, &format!("{path}.parameters[{i}]"), found);
    }
}

fn collect_parameter(parameter: &Parameter, path: &str, found: &mut Vec<String>) {
    collect(&parameter.extra, NONE, path, found);
}

fn collect_status(status: &CronWorkflowStatus, path: &str, found: &mut Vec<String>) {
    collect(&status.extra, NONE, path, found);
    // Active entries are object references; their extra keys are not checked.
    for (i, condition) in status.conditions.iter().enumerate() {
        collect_condition(condition, &format!("{path}.conditions[{i}]"), found);
    }
}

fn collect_condition(condition: &Condition, path: &str, found: &mut Vec<String>) {
    collect(&condition.extra, NONE, path, found);
}

fn strip_spec(spec: &mut CronWorkflowSpec) {
    retain(&mut spec.extra, NONE);
    if let Some(stop) = spec.stop_strategy.as_mut() {
        retain(&mut stop.extra, NONE);
    }
    if let Some(metadata) = spec.workflow_metadata.as_mut() {
        retain(&mut metadata.extra, WORKFLOW_METADATA_PASSTHROUGH);
    }
    let workflow_spec = &mut spec.workflow_spec;
    retain(&mut workflow_spec.extra, WORKFLOW_SPEC_PASSTHROUGH);
    retain(&mut workflow_spec.arguments.extra, NONE);
    for parameter in &mut workflow_spec.arguments.parameters {
        retain(&mut parameter.extra, NONE);
    }
    for template in workflow_spec
        .templates
        .iter_mut()
        .chain(workflow_spec.template_defaults.as_mut())
    {
        strip_template(template);
    }
}

fn strip_template(template: &mut Template) {
    retain(&mut template.extra, TEMPLATE_PASSTHROUGH);
    if let Some(container) = template.container.as_mut() {
        strip_container(container);
        container.source = None;
    }
    if let Some(script) = template.script.as_mut() {
        strip_container(script);
    }
}

fn strip_container(container: &mut Container) {
    retain(&mut container.extra, CONTAINER_PASSTHROUGH);
}

fn collect(extra: &ExtraFields, passthrough: &[&str], path: &str, found: &mut Vec<String>) {
    found.extend(
        extra
            .keys()
            .filter(|key| !passthrough.contains(&key.as_str()))
            .map(|key| join(path, key)),
    );
}

fn retain(extra: &mut ExtraFields, passthrough: &[&str]) {
    extra.retain(|key, _| passthrough.contains(&key.as_str()));
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}
