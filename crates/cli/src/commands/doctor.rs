use std::path::Path;

use autostream_core::config::{AppConfig, LeadSinkKind, LoadOptions};
use autostream_core::knowledge::KnowledgeBase;
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(options: LoadOptions, json_output: bool) -> CommandResult {
    let report = build_report(options);
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    if json_output {
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
        return CommandResult { exit_code, output };
    }

    CommandResult { exit_code, output: render_human(&report) }
}

fn build_report(options: LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_knowledge(&config));
            checks.push(check_lead_sink(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["knowledge_load", "lead_sink_target"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_knowledge(config: &AppConfig) -> DoctorCheck {
    match KnowledgeBase::load(config.knowledge.path.as_deref()) {
        Ok(knowledge) => {
            let catalog = knowledge.catalog();
            let source = match &config.knowledge.path {
                Some(path) => format!("`{}`", path.display()),
                None => "builtin catalog".to_string(),
            };
            DoctorCheck {
                name: "knowledge_load",
                status: CheckStatus::Pass,
                details: format!(
                    "loaded {} plans and {} policies from {source}",
                    catalog.plans.len(),
                    catalog.policies.len()
                ),
            }
        }
        Err(error) => DoctorCheck {
            name: "knowledge_load",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn check_lead_sink(config: &AppConfig) -> DoctorCheck {
    let path = match (config.leads.sink, config.leads.path.as_deref()) {
        (LeadSinkKind::Jsonl, Some(path)) => path,
        _ => {
            return DoctorCheck {
                name: "lead_sink_target",
                status: CheckStatus::Pass,
                details: "leads are written to the structured log".to_string(),
            };
        }
    };

    match jsonl_target_problem(path) {
        None => DoctorCheck {
            name: "lead_sink_target",
            status: CheckStatus::Pass,
            details: format!("leads are appended to `{}`", path.display()),
        },
        Some(problem) => {
            DoctorCheck { name: "lead_sink_target", status: CheckStatus::Fail, details: problem }
        }
    }
}

fn jsonl_target_problem(path: &Path) -> Option<String> {
    if path.is_dir() {
        return Some(format!("`{}` is a directory, expected a file", path.display()));
    }

    let parent = path.parent().filter(|parent| !parent.as_os_str().is_empty())?;
    if parent.exists() && !parent.is_dir() {
        return Some(format!("parent `{}` is not a directory", parent.display()));
    }

    None
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
