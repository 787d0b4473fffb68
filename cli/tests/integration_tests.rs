use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::thread::JoinHandle;

/// Helper to create a temp directory that is cleaned up on drop.
struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(name: &str) -> Self {
        let path =
            std::env::temp_dir().join(format!("cronwf_cli_test_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).expect("failed to create temp dir");
        Self { path }
    }

    fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    fn write(&self, name: &str, content: &str) -> String {
        let path = self.join(name);
        fs::write(&path, content).expect("failed to write file");
        path.display().to_string()
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Config file pointing at `server`, so runs never depend on the user's config.
fn write_config(dir: &TempDir, server: &str) -> String {
    dir.write(
        "config.yaml",
        &format!("server: {server}\nnamespace: from-config\nrequest_timeout_secs: 5\n"),
    )
}

fn cronwf(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cronwf"))
        .args(args)
        .env_remove("ARGO_SERVER")
        .env_remove("ARGO_BASE_HREF")
        .env_remove("ARGO_TOKEN")
        .env_remove("ARGO_NAMESPACE")
        .env_remove("ARGO_SECURE")
        .env_remove("ARGO_INSECURE_SKIP_VERIFY")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run cronwf")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

const NIGHTLY: &str = r#"apiVersion: argoproj.io/v1alpha1
kind: CronWorkflow
metadata:
  name: nightly
spec:
  schedule: "0 2 * * *"
  workflowSpec:
    entrypoint: main
    arguments:
      parameters:
        - name: target
          value: s3
"#;

/// Accepts `count` update calls, echoing each cron workflow back, and
/// returns the request paths and bodies.
fn echo_server(count: usize) -> (String, JoinHandle<Vec<(String, serde_json::Value)>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = format!("http://{}", listener.local_addr().unwrap());
    let handle = std::thread::spawn(move || {
        let mut seen = Vec::new();
        for _ in 0..count {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let path = request_line
                .split_whitespace()
                .nth(1)
                .unwrap_or_default()
                .to_string();

            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((k, v)) = line.split_once(':') {
                    if k.eq_ignore_ascii_case("content-length") {
                        content_length = v.trim().parse().unwrap();
                    }
                }
            }
            let mut body = vec![0; content_length];
            reader.read_exact(&mut body).unwrap();
            let request: serde_json::Value = serde_json::from_slice(&body).unwrap();

            let reply = request["cronWorkflow"].to_string();
            write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{reply}",
                reply.len()
            )
            .unwrap();
            stream.flush().unwrap();
            seen.push((path, request));
        }
        seen
    });
    (addr, handle)
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn update_without_cron_workflows_fails() {
    let dir = TempDir::new("no_crons");
    let config = write_config(&dir, "http://127.0.0.1:9");
    let manifest = dir.write(
        "configmap.yaml",
        "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: settings\n",
    );

    let out = cronwf(&["--config", &config, "cron", "update", &manifest]);
    assert_eq!(out.status.code(), Some(1));
    assert!(
        stderr(&out).contains("error: no CronWorkflows found in given files"),
        "stderr: {}",
        stderr(&out)
    );
    assert!(stdout(&out).is_empty());
}

#[test]
fn update_strict_rejects_unknown_field() {
    let dir = TempDir::new("strict");
    let config = write_config(&dir, "http://127.0.0.1:9");
    let manifest = dir.write(
        "typo.yaml",
        "kind: CronWorkflow\nmetadata:\n  name: a\nspec:\n  scheduel: '@daily'\n",
    );

    let out = cronwf(&["--config", &config, "cron", "update", &manifest]);
    assert_eq!(out.status.code(), Some(1));
    let err = stderr(&out);
    assert!(err.contains("spec.scheduel"), "stderr: {err}");
    assert!(err.contains("typo.yaml"), "stderr: {err}");
}

#[test]
fn update_missing_file_fails() {
    let dir = TempDir::new("missing");
    let config = write_config(&dir, "http://127.0.0.1:9");
    let missing = dir.join("nope.yaml").display().to_string();

    let out = cronwf(&["--config", &config, "cron", "update", &missing]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("nope.yaml"), "stderr: {}", stderr(&out));
}

#[test]
fn update_without_server_fails() {
    let dir = TempDir::new("no_server");
    let config = dir.write("config.yaml", "namespace: x\n");
    let manifest = dir.write("cron.yaml", NIGHTLY);

    let out = cronwf(&["--config", &config, "cron", "update", &manifest]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("no server configured"), "stderr: {}", stderr(&out));
}

#[test]
fn update_rejects_malformed_parameter() {
    let dir = TempDir::new("bad_param");
    let config = write_config(&dir, "http://127.0.0.1:9");
    let manifest = dir.write("cron.yaml", NIGHTLY);

    let out = cronwf(&["--config", &config, "cron", "update", &manifest, "-p", "oops"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(
        stderr(&out).contains("expected parameter of the form: NAME=VALUE. Received: oops"),
        "stderr: {}",
        stderr(&out)
    );
}

#[test]
fn update_requires_a_file() {
    let out = cronwf(&["cron", "update"]);
    assert!(!out.status.success());
}

// ---------------------------------------------------------------------------
// Successful updates
// ---------------------------------------------------------------------------

#[test]
fn update_sends_overrides_and_prints_summary() {
    let dir = TempDir::new("summary");
    let (server, handle) = echo_server(1);
    let config = write_config(&dir, &server);
    let manifest = dir.write("cron.yaml", NIGHTLY);
    let params = dir.write("params.yaml", "target: gcs\nretries: 3\n");

    let out = cronwf(&[
        "--config",
        &config,
        "-n",
        "team-a",
        "cron",
        "update",
        &manifest,
        "-f",
        &params,
        "-p",
        "retries=5",
        "--entrypoint",
        "alt",
        "-l",
        "team=data",
    ]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let seen = handle.join().unwrap();
    assert_eq!(seen.len(), 1);
    let (path, body) = &seen[0];
    assert_eq!(path, "/api/v1/cron-workflows/team-a/nightly");
    assert_eq!(body["namespace"], "team-a");

    let spec = &body["cronWorkflow"]["spec"]["workflowSpec"];
    assert_eq!(spec["entrypoint"], "alt");
    let params = spec["arguments"]["parameters"].as_array().unwrap();
    assert_eq!(params.len(), 2);
    assert_eq!(params[0]["name"], "target");
    assert_eq!(params[0]["value"], "gcs");
    assert_eq!(params[1]["name"], "retries");
    assert_eq!(params[1]["value"], "5");

    let printed = stdout(&out);
    assert!(
        printed.lines().any(|l| l.starts_with("Name:") && l.ends_with("nightly")),
        "stdout: {printed}"
    );
    assert!(printed.lines().any(|l| l.starts_with("Namespace:") && l.ends_with("team-a")));
    assert!(printed.contains("0 2 * * *"));
}

#[test]
fn update_lenient_drops_unknown_fields_and_prints_names() {
    let dir = TempDir::new("lenient");
    let (server, handle) = echo_server(2);
    let config = write_config(&dir, &server);
    let first = dir.write(
        "first.yaml",
        &format!("{NIGHTLY}  extraField: dropped\n"),
    );
    let second = dir.write(
        "second.json",
        r#"{"kind": "CronWorkflow", "metadata": {"name": "hourly"}, "spec": {"schedule": "@hourly"}}"#,
    );

    let out = cronwf(&[
        "--config",
        &config,
        "cron",
        "update",
        "--strict=false",
        "-o",
        "name",
        &first,
        &second,
    ]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "nightly\nhourly\n");

    let seen = handle.join().unwrap();
    assert_eq!(seen[0].0, "/api/v1/cron-workflows/from-config/nightly");
    assert!(seen[0].1["cronWorkflow"]["spec"].get("extraField").is_none());
    assert_eq!(seen[1].0, "/api/v1/cron-workflows/from-config/hourly");
}
