//! Output formatting for updated cron workflows.

use chrono::{DateTime, Utc};
use cronwf_core::CronWorkflow;

/// Supported output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    /// Human-readable key/value block.
    #[default]
    Summary,
    /// Just the name.
    Name,
    Json,
    Yaml,
}

/// Formats a cron workflow in the requested output format.
pub fn format_cron_workflow(cron: &CronWorkflow, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Summary => Ok(cron_workflow_summary(cron, Utc::now())),
        OutputFormat::Name => Ok(format!("{}\n", cron.display_name())),
        OutputFormat::Json => serde_json::to_string_pretty(cron)
            .map(|mut out| {
                out.push('\n');
                out
            })
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(cron).map_err(|e| format!("YAML serialization failed: {e}"))
        }
    }
}

const LABEL_WIDTH: usize = 30;

fn push_field(out: &mut String, label: &str, value: impl std::fmt::Display) {
    out.push_str(&format!("{:<LABEL_WIDTH$}{value}\n", format!("{label}:")));
}

/// Renders the summary block with ages measured from `now`.
pub fn cron_workflow_summary(cron: &CronWorkflow, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let spec = &cron.spec;

    push_field(&mut out, "Name", cron.display_name());
    push_field(&mut out, "Namespace", &cron.metadata.namespace);
    if let Some(created) = &cron.metadata.creation_timestamp {
        push_field(&mut out, "Created", timestamp_with_age(created, now));
    }

    let schedules = cron.schedules();
    if schedules.len() > 1 {
        push_field(&mut out, "Schedules", schedules.join(","));
    } else {
        push_field(&mut out, "Schedule", schedules.first().copied().unwrap_or(""));
    }
    if !spec.timezone.is_empty() {
        push_field(&mut out, "Timezone", &spec.timezone);
    }
    push_field(&mut out, "Suspended", spec.suspend);
    if let Some(deadline) = spec.starting_deadline_seconds {
        push_field(&mut out, "StartingDeadlineSeconds", deadline);
    }
    if !spec.concurrency_policy.is_empty() {
        push_field(&mut out, "ConcurrencyPolicy", &spec.concurrency_policy);
    }

    let Some(status) = &cron.status else {
        return out;
    };
    if let Some(last) = &status.last_scheduled_time {
        push_field(&mut out, "LastScheduledTime", timestamp_with_age(last, now));
    }
    if !status.active.is_empty() {
        let active: Vec<&str> = status.active.iter().map(|r| r.name.as_str()).collect();
        push_field(&mut out, "Active Workflows", active.join(", "));
    }
    if !status.conditions.is_empty() {
        out.push_str("Conditions:\n");
        for condition in &status.conditions {
            out.push_str(&format!(
                "  {}={}",
                condition.condition_type, condition.status
            ));
            if !condition.message.is_empty() {
                out.push_str(&format!(" ({})", condition.message));
            }
            out.push('\n');
        }
    }
    out
}

/// `"<rfc3339> (<age> ago)"`, or the raw value if it does not parse.
fn timestamp_with_age(raw: &str, now: DateTime<Utc>) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => {
            let ts = ts.with_timezone(&Utc);
            format!("{} ({} ago)", ts.to_rfc3339(), human_age(now - ts))
        }
        Err(_) => raw.to_string(),
    }
}

fn human_age(age: chrono::Duration) -> String {
    let secs = age.num_seconds().max(0);
    match secs {
        s if s < 60 => format!("{s}s"),
        s if s < 3600 => format!("{}m", s / 60),
        s if s < 86_400 => format!("{}h", s / 3600),
        s => format!("{}d", s / 86_400),
    }
}
