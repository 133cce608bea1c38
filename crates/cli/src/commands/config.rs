use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use autostream_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run(options: LoadOptions) -> String {
    let explicit_path = options.config_path.clone();
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path(explicit_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "knowledge.path",
        &display_path(config.knowledge.path.as_deref(), "<builtin>"),
        source("knowledge.path", &["AUTOSTREAM_KNOWLEDGE_PATH"]),
    ));
    lines.push(render_line(
        "leads.sink",
        &format!("{:?}", config.leads.sink),
        source("leads.sink", &["AUTOSTREAM_LEADS_SINK"]),
    ));
    lines.push(render_line(
        "leads.path",
        &display_path(config.leads.path.as_deref(), "<unset>"),
        source("leads.path", &["AUTOSTREAM_LEADS_PATH"]),
    ));
    lines.push(render_line(
        "conversation.reset_slots_after_capture",
        &config.conversation.reset_slots_after_capture.to_string(),
        source(
            "conversation.reset_slots_after_capture",
            &["AUTOSTREAM_CONVERSATION_RESET_SLOTS_AFTER_CAPTURE"],
        ),
    ));
    lines.push(render_line(
        "conversation.exit_words",
        &config.conversation.exit_words.join(","),
        source("conversation.exit_words", &["AUTOSTREAM_CONVERSATION_EXIT_WORDS"]),
    ));
    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["AUTOSTREAM_LOGGING_LEVEL", "AUTOSTREAM_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["AUTOSTREAM_LOGGING_FORMAT", "AUTOSTREAM_LOG_FORMAT"]),
    ));

    lines.join("\n")
}

fn detect_config_path(explicit_path: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path);
    }

    let root = PathBuf::from("autostream.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/autostream.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn display_path(path: Option<&Path>, fallback: &str) -> String {
    path.map(|path| path.display().to_string()).unwrap_or_else(|| fallback.to_string())
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
