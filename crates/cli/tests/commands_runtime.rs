use std::env;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use autostream_agent::controller::{
    GREETING_RESPONSE, LEAD_CAPTURED_RESPONSE, PARSE_FAILURE_RESPONSE, SLOT_PROMPT_RESPONSE,
};
use autostream_agent::lead_capture::InMemoryLeadSink;
use autostream_agent::runtime::{AgentRuntime, RuntimePolicy};
use autostream_cli::commands::{chat, classify, config, doctor};
use autostream_core::audit::InMemoryAuditSink;
use autostream_core::config::{AppConfig, LoadOptions};
use autostream_core::domain::lead::Lead;
use autostream_core::knowledge::{KnowledgeBase, KnowledgeSource};
use serde_json::Value;
use tempfile::TempDir;

#[test]
fn classify_reports_intent_tag() {
    let cases = [
        ("hello", "greeting"),
        ("what's your pricing?", "pricing"),
        ("I want to buy", "high_intent"),
        ("", "unknown"),
    ];
    for (text, expected) in cases {
        let result = classify::run(text);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "classify");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["message"], expected, "text: {text}");
    }
}

#[test]
fn chat_session_runs_greeting_pricing_and_lead_capture() {
    let (runtime, leads) = runtime(RuntimePolicy::default());
    let input = "hello\n\
                 what's your pricing?\n\
                 I want to buy\n\
                 Name: A, Email: a@b.com, Platform: YouTube\n\
                 exit\n\
                 hello\n";
    let mut output = Vec::new();

    let summary =
        chat::run_session(&runtime, &AppConfig::default(), Cursor::new(input), &mut output)
            .expect("session should complete");
    let transcript = String::from_utf8(output).expect("utf8 transcript");

    assert_eq!(summary.turns, 4, "input after the exit word is not read");
    assert_eq!(summary.leads_captured, 1);
    assert_eq!(leads.leads(), vec![Lead::new("A", "a@b.com", "YouTube")]);

    assert!(transcript.contains(&format!("Agent: {GREETING_RESPONSE}\n")));
    let pricing = KnowledgeBase::builtin().context().trim_end_matches('\n').to_string();
    assert!(transcript.contains(&format!("Agent: {pricing}\nUser: ")));
    assert!(!transcript.contains("\n\nUser: "), "replies end with exactly one newline");
    assert!(transcript.contains(&format!("Agent: {SLOT_PROMPT_RESPONSE}\n")));
    assert!(transcript.contains(&format!("Agent: {LEAD_CAPTURED_RESPONSE}\n")));
    assert_eq!(transcript.matches("User: ").count(), 5);
}

#[test]
fn chat_session_recovers_from_malformed_slot_reply() {
    let (runtime, leads) = runtime(RuntimePolicy::default());
    let input = "sign up please\r\n\
                 Name: A\r\n\
                 A at example dot com\r\n\
                 I want to buy\r\n\
                 Name: B, Email: b@c.com, Platform: Instagram\r\n";
    let mut output = Vec::new();

    let summary =
        chat::run_session(&runtime, &AppConfig::default(), Cursor::new(input), &mut output)
            .expect("session should complete");
    let transcript = String::from_utf8(output).expect("utf8 transcript");

    assert_eq!(summary.turns, 5);
    assert!(transcript.contains(&format!("Agent: {PARSE_FAILURE_RESPONSE}\n")));
    assert_eq!(
        leads.leads(),
        vec![Lead::new("B", "b@c.com", "Instagram")],
        "slots collected before the parse failure must not leak into the next lead"
    );
}

#[test]
fn chat_session_ends_cleanly_at_end_of_input() {
    let (runtime, leads) = runtime(RuntimePolicy::default());
    let mut output = Vec::new();

    let summary =
        chat::run_session(&runtime, &AppConfig::default(), Cursor::new("hey"), &mut output)
            .expect("session should complete");

    assert_eq!(summary.turns, 1);
    assert!(leads.leads().is_empty());
    let transcript = String::from_utf8(output).expect("utf8 transcript");
    assert!(transcript.ends_with("User: \n"));
}

#[test]
fn chat_returns_config_failure_for_jsonl_sink_without_path() {
    with_env(&[("AUTOSTREAM_LEADS_SINK", "jsonl")], || {
        let result = chat::run(LoadOptions::default());
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "chat");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn chat_returns_knowledge_failure_for_missing_file() {
    with_env(&[("AUTOSTREAM_KNOWLEDGE_PATH", "/nonexistent/autostream_knowledge.json")], || {
        let result = chat::run(LoadOptions::default());
        assert_eq!(result.exit_code, 3, "expected knowledge load failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "knowledge_load");
    });
}

#[test]
fn bundled_knowledge_file_matches_builtin_catalog() {
    let knowledge = KnowledgeBase::load(Some(&bundled_knowledge_path()))
        .expect("bundled knowledge file should load");
    assert_eq!(knowledge.context(), KnowledgeBase::builtin().context());
}

#[test]
fn doctor_passes_with_bundled_knowledge() {
    let knowledge_path = bundled_knowledge_path();
    let knowledge_path = knowledge_path.to_str().expect("utf8 path");
    with_env(&[("AUTOSTREAM_KNOWLEDGE_PATH", knowledge_path)], || {
        let result = doctor::run(LoadOptions::default(), true);
        assert_eq!(result.exit_code, 0, "expected doctor success: {}", result.output);

        let report = parse_payload(&result.output);
        assert_eq!(report["overall_status"], "pass");
        let checks = report["checks"].as_array().cloned().unwrap_or_default();
        let names = checks.iter().filter_map(|check| check["name"].as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["config_validation", "knowledge_load", "lead_sink_target"]);
    });
}

#[test]
fn doctor_reports_missing_knowledge_file() {
    with_env(&[("AUTOSTREAM_KNOWLEDGE_PATH", "/nonexistent/knowledge.json")], || {
        let result = doctor::run(LoadOptions::default(), false);
        assert_eq!(result.exit_code, 1);
        assert!(result.output.starts_with("doctor: one or more readiness checks failed"));
        assert!(result.output.contains("- [fail] knowledge_load:"));
    });
}

#[test]
fn doctor_skips_dependent_checks_when_config_is_invalid() {
    with_env(&[("AUTOSTREAM_LOG_LEVEL", "loud")], || {
        let result = doctor::run(LoadOptions::default(), false);
        assert_eq!(result.exit_code, 1);
        assert!(result.output.contains("- [fail] config_validation:"));
        assert!(result.output.contains("- [skip] knowledge_load:"));
        assert!(result.output.contains("- [skip] lead_sink_target:"));
    });
}

#[test]
fn doctor_rejects_directory_as_jsonl_lead_target() {
    let dir = TempDir::new().expect("temp dir");
    let target = dir.path().to_str().expect("utf8 path");
    with_env(&[("AUTOSTREAM_LEADS_SINK", "jsonl"), ("AUTOSTREAM_LEADS_PATH", target)], || {
        let result = doctor::run(LoadOptions::default(), false);
        assert_eq!(result.exit_code, 1);
        assert!(result.output.contains("- [ok] knowledge_load:"));
        assert!(result.output.contains("is a directory, expected a file"));
    });
}

#[test]
fn config_file_values_are_attributed_to_file() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("autostream.toml");
    std::fs::write(&path, "[conversation]\nexit_words = [\"bye\"]\n").expect("write config");

    with_env(&[], || {
        let output = config::run(LoadOptions {
            config_path: Some(path.clone()),
            require_file: true,
            ..LoadOptions::default()
        });
        let expected =
            format!("- conversation.exit_words = bye (source: file ({}))", path.display());
        assert!(output.contains(&expected), "unexpected output: {output}");
    });
}

#[test]
fn config_attributes_env_sources() {
    with_env(&[("AUTOSTREAM_LOG_LEVEL", "debug")], || {
        let output = config::run(LoadOptions::default());
        assert!(output.starts_with("effective config"));
        assert!(output.contains("- logging.level = debug (source: env (AUTOSTREAM_LOG_LEVEL))"));
        assert!(output.contains("- knowledge.path = <builtin> (source: default)"));
        assert!(output.contains("- leads.sink = Log (source: default)"));
    });
}

fn runtime(
    policy: RuntimePolicy,
) -> (AgentRuntime<KnowledgeBase, InMemoryLeadSink>, InMemoryLeadSink) {
    let leads = InMemoryLeadSink::default();
    let runtime = AgentRuntime::new(KnowledgeBase::builtin(), leads.clone(), policy)
        .with_audit_sink(InMemoryAuditSink::default());
    (runtime, leads)
}

fn bundled_knowledge_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../knowledge/autostream_knowledge.json")
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "AUTOSTREAM_KNOWLEDGE_PATH",
        "AUTOSTREAM_LEADS_SINK",
        "AUTOSTREAM_LEADS_PATH",
        "AUTOSTREAM_CONVERSATION_RESET_SLOTS_AFTER_CAPTURE",
        "AUTOSTREAM_CONVERSATION_EXIT_WORDS",
        "AUTOSTREAM_LOGGING_LEVEL",
        "AUTOSTREAM_LOGGING_FORMAT",
        "AUTOSTREAM_LOG_LEVEL",
        "AUTOSTREAM_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
