//! Decoding cron workflows from manifest bytes.
//!
//! A manifest holds one JSON object or a stream of `---` separated YAML
//! documents. [`decode_cron_workflows`] turns it into a lazy iterator of
//! [`CronWorkflow`] values in document order:
//!
//! - blank and `null` documents are skipped,
//! - YAML merge keys (`<<: *anchor`) are expanded,
//! - documents of another `kind` are skipped before any validation,
//! - in strict mode an unrecognized field is an error, in lenient mode it is
//!   dropped,
//! - after the first error the iterator yields nothing more.
//!
//! # Examples
//!
//! ```
//! use cronwf_manifest::{decode_all, decode_cron_workflows};
//!
//! let manifest = br#"
//! apiVersion: argoproj.io/v1alpha1
//! kind: CronWorkflow
//! metadata:
//!   name: first
//! spec:
//!   schedule: "0 * * * *"
//! ---
//! apiVersion: v1
//! kind: ConfigMap
//! metadata:
//!   name: not-a-cron
//! ---
//! kind: CronWorkflow
//! metadata:
//!   name: second
//! spec:
//!   schedule: "30 * * * *"
//! "#;
//!
//! let names: Vec<String> = decode_cron_workflows(manifest, true)
//!     .map(|cron| cron.unwrap().metadata.name)
//!     .collect();
//! assert_eq!(names, ["first", "second"]);
//!
//! assert!(decode_all(b"kind: CronWorkflow\nbogus: 1\n", true).is_err());
//! assert_eq!(decode_all(b"kind: CronWorkflow\nbogus: 1\n", false).unwrap().len(), 1);
//! ```

use std::iter::FusedIterator;

use cronwf_core::{
    CRON_WORKFLOW_KIND, CronWorkflow, strip_unrecognized_fields, unrecognized_fields,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{ManifestError, Result};

/// Lazy iterator over the cron workflows of one manifest.
///
/// Created by [`decode_cron_workflows`]. It cannot be restarted; decode the
/// bytes again to iterate a second time.
pub struct CronWorkflowDocuments<'a> {
    documents: Documents<'a>,
    strict: bool,
    index: usize,
    finished: bool,
}

enum Documents<'a> {
    Json(Option<Value>),
    Yaml(serde_yaml::Deserializer<'a>),
}

impl Documents<'_> {
    fn next_document(&mut self) -> Option<std::result::Result<Document, serde_yaml::Error>> {
        match self {
            Documents::Json(value) => value.take().map(|v| Ok(Document::Json(v))),
            Documents::Yaml(stream) => stream
                .next()
                .map(|doc| serde_yaml::Value::deserialize(doc).map(Document::Yaml)),
        }
    }
}

/// One parsed document, before it is checked against the model.
enum Document {
    Json(Value),
    Yaml(serde_yaml::Value),
}

impl Document {
    fn is_null(&self) -> bool {
        match self {
            Document::Json(value) => value.is_null(),
            Document::Yaml(value) => value.is_null(),
        }
    }

    fn kind(&self) -> Option<&str> {
        match self {
            Document::Json(value) => value.get("kind").and_then(Value::as_str),
            Document::Yaml(value) => value.get("kind").and_then(serde_yaml::Value::as_str),
        }
    }
}

fn is_other_kind(kind: Option<&str>) -> bool {
    kind.is_some_and(|kind| !kind.is_empty() && kind != CRON_WORKFLOW_KIND)
}

/// Decodes `content` into a lazy sequence of cron workflows.
///
/// Content starting with `{` that parses as a single JSON object is decoded
/// as that one object; anything else (including JSON that fails to parse) is
/// read as a YAML document stream.
pub fn decode_cron_workflows(content: &[u8], strict: bool) -> CronWorkflowDocuments<'_> {
    let documents = match json_object(content) {
        Some(value) => Documents::Json(Some(value)),
        None => Documents::Yaml(serde_yaml::Deserializer::from_slice(content)),
    };
    CronWorkflowDocuments {
        documents,
        strict,
        index: 0,
        finished: false,
    }
}

/// Decodes every cron workflow in `content`.
///
/// # Errors
///
/// Returns the first [`ManifestError`]; no cron workflows from this content
/// are returned in that case.
pub fn decode_all(content: &[u8], strict: bool) -> Result<Vec<CronWorkflow>> {
    decode_cron_workflows(content, strict).collect()
}

fn json_object(content: &[u8]) -> Option<Value> {
    let first = content.iter().find(|b| !b.is_ascii_whitespace())?;
    if *first != b'{' {
        return None;
    }
    match serde_json::from_slice::<Value>(content) {
        Ok(value) if value.is_object() => Some(value),
        Ok(_) => None,
        Err(err) => {
            debug!(error = %err, "Content is not a single JSON object, reading as YAML");
            None
        }
    }
}

impl CronWorkflowDocuments<'_> {
    fn decode_document(&self, document: Document) -> Result<Option<CronWorkflow>> {
        if document.is_null() {
            return Ok(None);
        }
        if is_other_kind(document.kind()) {
            debug!(
                document = self.index,
                kind = document.kind(),
                "Skipping document of another kind"
            );
            return Ok(None);
        }

        let value = match document {
            Document::Json(value) => value,
            Document::Yaml(mut value) => {
                value.apply_merge().map_err(|error| ManifestError::Yaml {
                    document: self.index,
                    error,
                })?;
                serde_json::to_value(&value).map_err(|error| ManifestError::InvalidDocument {
                    document: self.index,
                    error,
                })?
            }
        };
        // A merge key may have supplied the kind.
        if is_other_kind(value.get("kind").and_then(Value::as_str)) {
            return Ok(None);
        }

        let mut cron: CronWorkflow =
            serde_json::from_value(value).map_err(|error| ManifestError::InvalidDocument {
                document: self.index,
                error,
            })?;

        if self.strict {
            if let Some(field) = unrecognized_fields(&cron).into_iter().next() {
                return Err(ManifestError::UnknownField {
                    document: self.index,
                    field,
                });
            }
        } else {
            strip_unrecognized_fields(&mut cron);
        }
        Ok(Some(cron))
    }
}

impl Iterator for CronWorkflowDocuments<'_> {
    type Item = Result<CronWorkflow>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            let Some(next) = self.documents.next_document() else {
                self.finished = true;
                break;
            };
            self.index += 1;

            let decoded = match next {
                Ok(document) => self.decode_document(document),
                Err(error) => Err(ManifestError::Yaml {
                    document: self.index,
                    error,
                }),
            };
            match decoded {
                Ok(Some(cron)) => return Some(Ok(cron)),
                Ok(None) => continue,
                Err(err) => {
                    self.finished = true;
                    return Some(Err(err));
                }
            }
        }
        None
    }
}

impl FusedIterator for CronWorkflowDocuments<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE: &str = r#"
apiVersion: argoproj.io/v1alpha1
kind: CronWorkflow
metadata:
  name: hello-world
  namespace: argo
  labels:
    team: data
spec:
  schedule: "* * * * *"
  concurrencyPolicy: Replace
  startingDeadlineSeconds: 0
  workflowSpec:
    entrypoint: whalesay
    arguments:
      parameters:
        - name: message
          value: hello
        - name: count
          value: 3
    templates:
      - name: whalesay
        container:
          image: docker/whalesay:latest
          command: [cowsay]
"#;

    #[test]
    fn test_single_document_fields() {
        let crons = decode_all(SINGLE.as_bytes(), true).unwrap();
        assert_eq!(crons.len(), 1);

        let cron = &crons[0];
        assert_eq!(cron.api_version, "argoproj.io/v1alpha1");
        assert_eq!(cron.kind, "CronWorkflow");
        assert_eq!(cron.metadata.name, "hello-world");
        assert_eq!(cron.metadata.namespace, "argo");
        assert_eq!(cron.metadata.labels["team"], "data");
        assert_eq!(cron.spec.schedule, "* * * * *");
        assert_eq!(cron.spec.concurrency_policy, "Replace");
        assert_eq!(cron.spec.starting_deadline_seconds, Some(0));

        let spec = &cron.spec.workflow_spec;
        assert_eq!(spec.entrypoint, "whalesay");
        assert_eq!(spec.arguments.parameter("message").unwrap().value.as_deref(), Some("hello"));
        assert_eq!(spec.arguments.parameter("count").unwrap().value.as_deref(), Some("3"));
        let container = spec.templates[0].container.as_ref().unwrap();
        assert_eq!(container.image, "docker/whalesay:latest");
        assert_eq!(container.extra["command"][0], "cowsay");
    }

    #[test]
    fn test_json_object_manifest() {
        let json = serde_json::json!({
            "apiVersion": "argoproj.io/v1alpha1",
            "kind": "CronWorkflow",
            "metadata": {"name": "from-json"},
            "spec": {"schedule": "@daily", "workflowSpec": {"entrypoint": "main"}}
        });
        let content = serde_json::to_vec_pretty(&json).unwrap();
        let crons = decode_all(&content, true).unwrap();
        assert_eq!(crons.len(), 1);
        assert_eq!(crons[0].metadata.name, "from-json");
    }

    #[test]
    fn test_flow_mapping_falls_back_to_yaml() {
        // Not valid JSON (unquoted keys) but valid YAML flow mapping.
        let crons = decode_all(b"{kind: CronWorkflow, metadata: {name: flow}}", true).unwrap();
        assert_eq!(crons[0].metadata.name, "flow");
    }

    #[test]
    fn test_documents_preserve_order_and_skip_blanks() {
        let content = "---\nmetadata: {name: a}\n---\n---\n# comment only\n---\nmetadata: {name: b}\n---\nmetadata: {name: c}\n";
        let names: Vec<String> = decode_all(content.as_bytes(), true)
            .unwrap()
            .into_iter()
            .map(|c| c.metadata.name)
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_content_yields_nothing() {
        assert!(decode_all(b"", true).unwrap().is_empty());
        assert!(decode_all(b"   \n", true).unwrap().is_empty());
    }

    #[test]
    fn test_other_kinds_are_skipped_even_when_invalid() {
        let content = r#"
kind: Workflow
metadata:
  name: wf
totallyUnknown: true
spec: "not even a mapping"
---
kind: CronWorkflow
metadata:
  name: cron
"#;
        let crons = decode_all(content.as_bytes(), true).unwrap();
        assert_eq!(crons.len(), 1);
        assert_eq!(crons[0].metadata.name, "cron");
    }

    #[test]
    fn test_other_kind_with_complex_key_is_skipped() {
        let content = r#"
kind: ConfigMap
data:
  ? [a, b]
  : x
---
kind: CronWorkflow
metadata:
  name: after
"#;
        let crons = decode_all(content.as_bytes(), true).unwrap();
        assert_eq!(crons.len(), 1);
        assert_eq!(crons[0].metadata.name, "after");
    }

    #[test]
    fn test_complex_key_in_cron_workflow_is_invalid_document() {
        let content = "kind: CronWorkflow
metadata:
  ? [a, b]
  : x
";
        let err = decode_all(content.as_bytes(), false).unwrap_err();
        assert!(matches!(err, ManifestError::InvalidDocument { document: 1, .. }));
    }

    #[test]
    fn test_merge_keys_are_expanded() {
        let content = r#"
kind: CronWorkflow
metadata:
  name: merged
spec:
  schedule: "@daily"
  workflowSpec:
    arguments:
      parameters:
        - &base {name: p, value: x}
        - {<<: *base, name: q}
"#;
        for strict in [true, false] {
            let crons = decode_all(content.as_bytes(), strict).unwrap();
            let arguments = &crons[0].spec.workflow_spec.arguments;
            assert_eq!(arguments.parameter("p").unwrap().value.as_deref(), Some("x"));
            let q = arguments.parameter("q").unwrap();
            assert_eq!(q.value.as_deref(), Some("x"));
            assert!(q.extra.is_empty());
        }
    }

    #[test]
    fn test_strict_rejects_unknown_field_inside_template() {
        let content = r#"
kind: CronWorkflow
metadata:
  name: a
spec:
  schedule: "@daily"
  workflowSpec:
    templates:
      - name: main
        contianer:
          image: alpine
"#;
        let err = decode_all(content.as_bytes(), true).unwrap_err();
        assert_eq!(
            err.to_string(),
            "document 1: unknown field \"spec.workflowSpec.templates[0].contianer\""
        );

        let crons = decode_all(content.as_bytes(), false).unwrap();
        let wire = serde_json::to_value(&crons[0]).unwrap();
        assert!(wire["spec"]["workflowSpec"]["templates"][0].get("contianer").is_none());
    }

    #[test]
    fn test_strict_rejects_unknown_field() {
        let content = "kind: CronWorkflow\nmetadata:\n  name: a\nspec:\n  schedule: '@daily'\n  scheduel: typo\n";
        let err = decode_all(content.as_bytes(), true).unwrap_err();
        match err {
            ManifestError::UnknownField { document, field } => {
                assert_eq!(document, 1);
                assert_eq!(field, "spec.scheduel");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_lenient_drops_unknown_field() {
        let content = "kind: CronWorkflow\nmetadata:\n  name: a\nspec:\n  schedule: '@daily'\n  scheduel: typo\n";
        let crons = decode_all(content.as_bytes(), false).unwrap();
        assert_eq!(crons.len(), 1);
        assert!(crons[0].spec.extra.is_empty());
        let wire = serde_json::to_value(&crons[0]).unwrap();
        assert!(wire["spec"].get("scheduel").is_none());
    }

    #[test]
    fn test_strict_error_stops_source_without_partial_results() {
        let content = "metadata: {name: ok}\n---\nmetadata: {name: bad, oops: 1}\n---\nmetadata: {name: later}\n";
        let mut docs = decode_cron_workflows(content.as_bytes(), true);
        assert_eq!(docs.next().unwrap().unwrap().metadata.name, "ok");
        assert!(matches!(
            docs.next(),
            Some(Err(ManifestError::UnknownField { document: 2, .. }))
        ));
        assert!(docs.next().is_none());

        assert!(decode_all(content.as_bytes(), true).is_err());
        assert_eq!(decode_all(content.as_bytes(), false).unwrap().len(), 3);
    }

    #[test]
    fn test_type_error_is_invalid_document() {
        let content = "kind: CronWorkflow\nspec:\n  startingDeadlineSeconds: soon\n";
        let err = decode_all(content.as_bytes(), false).unwrap_err();
        assert!(matches!(err, ManifestError::InvalidDocument { document: 1, .. }));
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let err = decode_all(b"metadata: [unclosed\n", false).unwrap_err();
        assert!(matches!(err, ManifestError::Yaml { .. }));
    }

    #[test]
    fn test_lenient_counts_every_recognized_document() {
        let mut content = String::new();
        for i in 0..5 {
            content.push_str(&format!(
                "---\nkind: CronWorkflow\nmetadata:\n  name: cron-{i}\n  extraneous{i}: x\n"
            ));
        }
        let crons = decode_all(content.as_bytes(), false).unwrap();
        let names: Vec<_> = crons.iter().map(|c| c.metadata.name.as_str()).collect();
        assert_eq!(names, ["cron-0", "cron-1", "cron-2", "cron-3", "cron-4"]);
    }
}
