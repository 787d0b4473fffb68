use std::fs;
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use cronwf_client::{
    ArgoServerClient, ClientConfig, CronUpdater, OutputFormat, format_cron_workflow,
};
use cronwf_core::{SubmitOpts, parameters_from_file};
use cronwf_manifest::FsManifestReader;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "cronwf", version)]
#[command(about = "Manage cron workflows on an Argo-compatible workflow server")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Connection settings shared by every subcommand.
///
/// Flags win over environment variables, which win over the config file.
#[derive(Debug, Args)]
struct GlobalArgs {
    /// Server address, `host:port` or a full URL.
    #[arg(long, global = true, env = "ARGO_SERVER")]
    argo_server: Option<String>,
    /// Path prefix the server is mounted under.
    #[arg(long, global = true, env = "ARGO_BASE_HREF")]
    argo_base_href: Option<String>,
    /// Bearer token for the server.
    #[arg(long, global = true, env = "ARGO_TOKEN", hide_env_values = true)]
    token: Option<String>,
    /// Namespace for cron workflows that do not name one.
    #[arg(short, long, global = true, env = "ARGO_NAMESPACE")]
    namespace: Option<String>,
    /// Use HTTPS for servers given without a scheme.
    #[arg(
        long,
        global = true,
        env = "ARGO_SECURE",
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    secure: Option<bool>,
    /// Skip TLS certificate verification.
    #[arg(short = 'k', long, global = true, env = "ARGO_INSECURE_SKIP_VERIFY")]
    insecure_skip_verify: bool,
    /// Per-request timeout in seconds.
    #[arg(long, global = true)]
    request_timeout: Option<u64>,
    /// Config file (default: <config dir>/cronwf/config.yaml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Manage cron workflows.
    Cron(CronArgs),
}

#[derive(Debug, Args)]
struct CronArgs {
    #[command(subcommand)]
    command: CronCommand,
}

#[derive(Debug, Subcommand)]
enum CronCommand {
    /// Update existing cron workflows from manifest files.
    Update(UpdateArgs),
}

#[derive(Debug, Args)]
struct UpdateArgs {
    /// Manifest files, http(s) URLs, or `-` for stdin.
    #[arg(required = true)]
    files: Vec<String>,
    /// Reject unknown fields. Use `--strict=false` to drop them instead.
    #[arg(
        long,
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    strict: bool,
    /// Override metadata.name.
    #[arg(long)]
    name: Option<String>,
    /// Override metadata.generateName.
    #[arg(long)]
    generate_name: Option<String>,
    /// Override the workflow entrypoint.
    #[arg(long)]
    entrypoint: Option<String>,
    /// Input parameter as NAME=VALUE (repeatable).
    #[arg(short = 'p', long = "parameter")]
    parameters: Vec<String>,
    /// YAML or JSON file of parameter values.
    #[arg(short = 'f', long)]
    parameter_file: Option<PathBuf>,
    /// Service account the workflow pods run as.
    #[arg(long = "serviceaccount")]
    service_account: Option<String>,
    /// Comma-separated labels to apply (e.g. team=data,tier=batch).
    #[arg(short = 'l', long)]
    labels: Option<String>,
    /// Comma-separated annotations to apply.
    #[arg(long)]
    annotations: Option<String>,
    /// Priority class for the workflow pods.
    #[arg(long = "priority-class")]
    priority_class: Option<String>,
    /// Workflow priority.
    #[arg(long)]
    priority: Option<i32>,
    /// Output format for each updated cron workflow.
    #[arg(short, long, default_value = "summary")]
    output: OutputFormat,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let result = match cli.command {
        Command::Cron(CronArgs {
            command: CronCommand::Update(args),
        }) => run_update(&cli.global, args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn resolve_config(global: &GlobalArgs) -> Result<ClientConfig, String> {
    let file = ClientConfig::discover(global.config.as_deref())
        .map_err(|err| format!("Failed to load config: {err}"))?;
    let overrides = ClientConfig {
        server: global.argo_server.clone(),
        base_href: global.argo_base_href.clone(),
        token: global.token.clone(),
        namespace: global.namespace.clone(),
        secure: global.secure,
        insecure_skip_verify: global.insecure_skip_verify.then_some(true),
        request_timeout_secs: global.request_timeout,
    };
    Ok(file.overlay(overrides))
}

fn read_parameter_file(path: Option<&PathBuf>) -> Result<Vec<String>, String> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let content = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read parameter file '{}': {err}", path.display()))?;
    parameters_from_file(&content).map_err(|err| err.to_string())
}

fn run_update(global: &GlobalArgs, args: UpdateArgs) -> Result<(), String> {
    let config = resolve_config(global)?;
    let client = ArgoServerClient::new(&config).map_err(|err| err.to_string())?;
    debug!(
        server = client.base_url(),
        namespace = config.namespace(),
        "Resolved client configuration"
    );

    let opts = SubmitOpts {
        name: args.name,
        generate_name: args.generate_name,
        entrypoint: args.entrypoint,
        parameters: args.parameters,
        parameter_file: read_parameter_file(args.parameter_file.as_ref())?,
        service_account: args.service_account,
        labels: args.labels,
        annotations: args.annotations,
        pod_priority_class_name: args.priority_class,
        priority: args.priority,
    };

    let reader = FsManifestReader::with_timeout(config.request_timeout());
    let updater = CronUpdater::new(&reader, &client, config.namespace());

    let mut format_error = None;
    updater
        .run(&args.files, args.strict, &opts, |cron| {
            match format_cron_workflow(cron, args.output) {
                Ok(text) => print!("{text}"),
                Err(err) => {
                    format_error.get_or_insert(err);
                }
            }
        })
        .map_err(|err| err.to_string())?;

    format_error.map_or(Ok(()), Err)
}
